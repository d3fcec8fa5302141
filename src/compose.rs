//! Preview compositor: rasterizes one side of the card into an exportable
//! PNG, in two modes — the full bleed-inclusive card and the safe-area
//! print crop.
//!
//! The renderer does no IO: pixels come in through [`PixelSource`] and
//! fonts through [`FontCatalog`]. A source with no prepared pixels (a
//! reference-only load) short-circuits to [`SidePreview::Reference`] so
//! the caller can still display something instead of getting an error.

use std::collections::HashMap;
use std::io::Cursor;
use std::time::{Duration, Instant};

use anyhow::Context;
use kurbo::{Affine, Point};

use crate::assets::{FontCatalog, PixelSource, PreparedImage};
use crate::clip_cpu::round_corners_in_place;
use crate::error::{CardproofError, CardproofResult};
use crate::layout::SafeArea;
use crate::model::{EditorState, ImageLayer, Side, SideId, TextLayer};
use crate::preset::{CardPreset, Orientation};

/// Quiet period before a marked side is recomposited, unless overridden
/// by `CARDPROOF_QUIET_MS`.
pub const DEFAULT_QUIET_MS: u64 = 300;

/// Physical card outline, derived from the corner radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardShape {
    Rounded,
    Rectangle,
}

impl CardShape {
    pub fn of_radius(corner_radius: f64) -> Self {
        if corner_radius > 0.0 {
            Self::Rounded
        } else {
            Self::Rectangle
        }
    }
}

/// One side's rendered preview.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SidePreview {
    /// PNG-encoded pixels.
    Encoded(Vec<u8>),
    /// The original image reference, passed through because its pixels
    /// could not be rasterized.
    Reference(String),
}

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Parse a CSS hex color (`#rgb`, `#rrggbb`, `#rrggbbaa`).
fn parse_css_color(color: &str) -> Option<TextBrush> {
    let hex = color.strip_prefix('#')?;
    let nibble = |c: u8| -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    };
    let byte = |hi: u8, lo: u8| -> Option<u8> { Some(nibble(hi)? << 4 | nibble(lo)?) };

    let b = hex.as_bytes();
    match b.len() {
        3 => Some(TextBrush {
            r: byte(b[0], b[0])?,
            g: byte(b[1], b[1])?,
            b: byte(b[2], b[2])?,
            a: 255,
        }),
        6 => Some(TextBrush {
            r: byte(b[0], b[1])?,
            g: byte(b[2], b[3])?,
            b: byte(b[4], b[5])?,
            a: 255,
        }),
        8 => Some(TextBrush {
            r: byte(b[0], b[1])?,
            g: byte(b[2], b[3])?,
            b: byte(b[4], b[5])?,
            a: byte(b[6], b[7])?,
        }),
        _ => None,
    }
}

/// Rasterizes sides of the card. Owns the Parley contexts and per-family
/// font paints so repeated recompositions reuse shaped resources.
pub struct Compositor {
    fonts: FontCatalog,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    font_cache: HashMap<String, vello_cpu::peniko::FontData>,
}

impl Compositor {
    pub fn new(fonts: FontCatalog) -> Self {
        Self {
            fonts,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            font_cache: HashMap::new(),
        }
    }

    pub fn fonts_mut(&mut self) -> &mut FontCatalog {
        &mut self.fonts
    }

    /// Full-card preview: white card, optional rounded-corner clip, the
    /// image at its exact stored geometry, then text in insertion order.
    pub fn render_full_card(
        &mut self,
        side: &Side,
        preset: &CardPreset,
        corner_radius: f64,
        pixels: &PixelSource,
    ) -> CardproofResult<Option<SidePreview>> {
        self.render_surface(
            side,
            Point::ZERO,
            preset.width_px,
            preset.height_px,
            corner_radius,
            pixels,
        )
    }

    /// Print crop: the same pipeline sized to the safe area, with all
    /// layer coordinates translated into crop space.
    pub fn render_print_crop(
        &mut self,
        side: &Side,
        preset: &CardPreset,
        pixels: &PixelSource,
    ) -> CardproofResult<Option<SidePreview>> {
        let safe = SafeArea::of(preset);
        self.render_surface(
            side,
            Point::new(safe.left, safe.top),
            safe.width,
            safe.height,
            0.0,
            pixels,
        )
    }

    fn render_surface(
        &mut self,
        side: &Side,
        origin: Point,
        width: f64,
        height: f64,
        corner_radius: f64,
        pixels: &PixelSource,
    ) -> CardproofResult<Option<SidePreview>> {
        if !side.has_content() {
            return Ok(None);
        }

        // A reference-only source cannot be rasterized; hand the original
        // reference back instead of failing the preview.
        if let Some(image) = side.image.as_ref() {
            if pixels.get(&image.source).is_none() {
                tracing::warn!(
                    source = %image.source.0,
                    "image pixels unavailable, returning reference preview"
                );
                return Ok(Some(SidePreview::Reference(image.source.0.clone())));
            }
        }

        let width_px = width.round().max(1.0) as u32;
        let height_px = height.round().max(1.0) as u32;
        let width_u16: u16 = width_px
            .try_into()
            .map_err(|_| CardproofError::render("surface width exceeds u16"))?;
        let height_u16: u16 = height_px
            .try_into()
            .map_err(|_| CardproofError::render("surface height exceeds u16"))?;

        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        // Card stock is white; premultiplied opaque white.
        for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&[255, 255, 255, 255]);
        }

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        let shift = Affine::translate((-origin.x, -origin.y));

        if let Some(image) = side.image.as_ref() {
            draw_image(&mut ctx, image, pixels, shift)?;
        }
        for text in &side.texts {
            self.draw_text(&mut ctx, text, shift)?;
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        let mut data = pixmap.data_as_u8_slice().to_vec();
        if corner_radius > 0.0 {
            round_corners_in_place(&mut data, width_px, height_px, corner_radius)?;
        }

        let mut encoded = Vec::new();
        image::write_buffer_with_format(
            &mut Cursor::new(&mut encoded),
            &data,
            width_px,
            height_px,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .context("encode side preview png")?;

        Ok(Some(SidePreview::Encoded(encoded)))
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: &TextLayer,
        shift: Affine,
    ) -> CardproofResult<()> {
        if layer.text.is_empty() {
            return Ok(());
        }
        let Some(font_bytes) = self.fonts.resolve(&layer.style.font_family) else {
            tracing::warn!(
                family = %layer.style.font_family,
                "no registered font, skipping text layer"
            );
            return Ok(());
        };

        let brush = parse_css_color(&layer.style.color).unwrap_or(TextBrush {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        });

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CardproofError::render("no font families registered from font bytes"))?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardproofError::render("registered font family has no name"))?
            .to_string();

        let style = &layer.style;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, &layer.text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(
            style.font_size as f32,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(font_weight_value(&style.font_weight)),
        ));
        if style.font_style == "italic" {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::LetterSpacing(
            style.letter_spacing as f32,
        ));
        builder.push_default(parley::style::StyleProperty::LineHeight(
            parley::style::LineHeight::FontSizeRelative(style.line_height as f32),
        ));
        builder.push_default(parley::style::StyleProperty::Underline(
            style.text_decoration == "underline",
        ));
        builder.push_default(parley::style::StyleProperty::Strikethrough(
            style.text_decoration == "line-through",
        ));

        let max_width = layer.width as f32;
        let mut layout: parley::Layout<TextBrush> = builder.build(&layer.text);
        layout.break_all_lines(Some(max_width));
        layout.align(
            Some(max_width),
            text_alignment(&style.text_align),
            parley::AlignmentOptions::default(),
        );

        let font = self.font_data_for(&style.font_family, &font_bytes);

        let transform = shift
            * Affine::translate((layer.x, layer.y))
            * Affine::rotate(layer.rotation.to_radians())
            * Affine::translate((-layer.width / 2.0, -layer.height / 2.0));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(transform));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        Ok(())
    }

    fn font_data_for(&mut self, family: &str, bytes: &[u8]) -> vello_cpu::peniko::FontData {
        let key = family.to_ascii_lowercase();
        if let Some(font) = self.font_cache.get(&key) {
            return font.clone();
        }
        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes.to_vec()), 0);
        self.font_cache.insert(key, font.clone());
        font
    }
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    layer: &ImageLayer,
    pixels: &PixelSource,
    shift: Affine,
) -> CardproofResult<()> {
    let prepared = pixels
        .get(&layer.source)
        .ok_or_else(|| CardproofError::render("image pixels missing at draw time"))?;
    if prepared.width == 0 || prepared.height == 0 {
        return Err(CardproofError::render("prepared image has zero extent"));
    }

    let paint = image_paint(prepared)?;
    let transform = shift
        * Affine::translate((layer.x, layer.y))
        * Affine::rotate(layer.rotation.to_radians())
        * Affine::translate((-layer.width / 2.0, -layer.height / 2.0))
        * Affine::scale_non_uniform(
            layer.width / f64::from(prepared.width),
            layer.height / f64::from(prepared.height),
        );

    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(prepared.width),
        f64::from(prepared.height),
    ));
    Ok(())
}

fn image_paint(prepared: &PreparedImage) -> CardproofResult<vello_cpu::Image> {
    let width_u16: u16 = prepared
        .width
        .try_into()
        .map_err(|_| CardproofError::render("image width exceeds u16"))?;
    let height_u16: u16 = prepared
        .height
        .try_into()
        .map_err(|_| CardproofError::render("image height exceeds u16"))?;
    if prepared.rgba8_premul.len() != prepared.width as usize * prepared.height as usize * 4 {
        return Err(CardproofError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut px_out = Vec::with_capacity(prepared.width as usize * prepared.height as usize);
    for px in prepared.rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        px_out.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    let pixmap =
        vello_cpu::Pixmap::from_parts_with_opacity(px_out, width_u16, height_u16, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn font_weight_value(weight: &str) -> f32 {
    match weight {
        "bold" => 700.0,
        "normal" | "" => 400.0,
        other => other.parse().unwrap_or(400.0),
    }
}

fn text_alignment(align: &str) -> parley::Alignment {
    match align {
        "center" => parley::Alignment::Center,
        "right" => parley::Alignment::End,
        _ => parley::Alignment::Start,
    }
}

/// Coalesced recomposition: one pending slot per side. A new mark
/// supersedes the pending one; a side becomes due once its quiet period
/// elapses with no further marks.
#[derive(Clone, Debug)]
pub struct RecomposeQueue {
    quiet: Duration,
    pending: HashMap<SideId, Instant>,
}

impl Default for RecomposeQueue {
    fn default() -> Self {
        let quiet_ms = std::env::var("CARDPROOF_QUIET_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_QUIET_MS);
        Self::with_quiet(Duration::from_millis(quiet_ms))
    }
}

impl RecomposeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quiet(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: HashMap::new(),
        }
    }

    /// Record a layer-set change on `side` at `now`.
    pub fn mark(&mut self, side: SideId, now: Instant) {
        self.pending.insert(side, now);
    }

    pub fn is_pending(&self, side: SideId) -> bool {
        self.pending.contains_key(&side)
    }

    /// Drain the sides whose quiet period has elapsed by `now`.
    pub fn due(&mut self, now: Instant) -> Vec<SideId> {
        let quiet = self.quiet;
        let mut ready: Vec<SideId> = self
            .pending
            .iter()
            .filter(|&(_, &marked)| now.duration_since(marked) >= quiet)
            .map(|(&side, _)| side)
            .collect();
        ready.sort_by_key(|side| matches!(side, SideId::Back));
        for side in &ready {
            self.pending.remove(side);
        }
        ready
    }
}

/// What the editor hands its host on every settled change and on the
/// explicit continue action.
#[derive(Clone, Debug)]
pub struct DesignArtifact {
    pub front: SideArtifact,
    pub back: SideArtifact,
    pub orientation: Orientation,
    pub shape: CardShape,
    pub card_dimensions: CardDimensions,
}

#[derive(Clone, Debug)]
pub struct SideArtifact {
    pub preview: Option<SidePreview>,
    pub has_content: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardDimensions {
    pub width: f64,
    pub height: f64,
}

/// Render both sides and assemble the host-facing artifact.
#[tracing::instrument(skip(compositor, editor, pixels))]
pub fn compose_artifact(
    compositor: &mut Compositor,
    editor: &EditorState,
    corner_radius: f64,
    pixels: &PixelSource,
) -> CardproofResult<DesignArtifact> {
    let preset = &editor.preset;
    let front = compositor.render_full_card(&editor.front, preset, corner_radius, pixels)?;
    let back = compositor.render_full_card(&editor.back, preset, corner_radius, pixels)?;

    Ok(DesignArtifact {
        front: SideArtifact {
            preview: front,
            has_content: editor.front.has_content(),
        },
        back: SideArtifact {
            preview: back,
            has_content: editor.back.has_content(),
        },
        orientation: editor.orientation,
        shape: CardShape::of_radius(corner_radius),
        card_dimensions: CardDimensions {
            width: preset.width_px,
            height: preset.height_px,
        },
    })
}
