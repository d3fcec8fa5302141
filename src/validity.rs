//! Layout-validity classification against print constraints.
//!
//! A layer's axis-aligned box is judged against the safe area and the
//! bleed margin in a strict precedence order; exactly one class comes
//! back for any input.

use kurbo::Rect;

use crate::layout::SafeArea;
use crate::model::{EditorState, ImageLayer, SideId, TextLayer};
use crate::preset::CardPreset;

/// How a layer sits relative to the print constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// The layer bleeds past all four safe-area edges.
    Perfect,
    /// The layer sits entirely inside the safe area.
    Safe,
    /// The layer crosses the bleed margin into the strip that is
    /// physically trimmed away.
    Exceeds,
    /// The layer straddles the safe-area boundary but stays within bleed.
    Partial,
    /// Nothing to classify.
    Empty,
}

impl Placement {
    /// User-facing status message.
    pub fn message(self) -> &'static str {
        match self {
            Self::Perfect => "covers full print area.",
            Self::Safe => "within safe area.",
            Self::Exceeds => "extends beyond bleed — will be trimmed.",
            Self::Partial => "content may be near edge.",
            Self::Empty => "no content placed.",
        }
    }
}

/// Center-plus-size bounds of any layer kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayerBounds {
    fn rect(&self) -> Rect {
        Rect::new(
            self.x - self.width / 2.0,
            self.y - self.height / 2.0,
            self.x + self.width / 2.0,
            self.y + self.height / 2.0,
        )
    }
}

impl From<&ImageLayer> for LayerBounds {
    fn from(layer: &ImageLayer) -> Self {
        Self {
            x: layer.x,
            y: layer.y,
            width: layer.width,
            height: layer.height,
        }
    }
}

impl From<&TextLayer> for LayerBounds {
    fn from(layer: &TextLayer) -> Self {
        Self {
            x: layer.x,
            y: layer.y,
            width: layer.width,
            height: layer.height,
        }
    }
}

fn rect_contains(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Classify a layer's box. Precedence: perfect, then safe, then exceeds,
/// then partial; an absent layer is empty.
pub fn classify(
    bounds: Option<LayerBounds>,
    safe: &SafeArea,
    preset: &CardPreset,
) -> Placement {
    let Some(bounds) = bounds else {
        return Placement::Empty;
    };
    let rect = bounds.rect();
    let safe_rect = safe.rect();

    if rect_contains(rect, safe_rect) {
        return Placement::Perfect;
    }
    if rect_contains(safe_rect, rect) {
        return Placement::Safe;
    }

    let bleed = preset.bleed_margin_px;
    let past_bleed = rect.x0 < bleed
        || rect.y0 < bleed
        || rect.x1 > preset.width_px - bleed
        || rect.y1 > preset.height_px - bleed;
    if past_bleed {
        return Placement::Exceeds;
    }

    Placement::Partial
}

/// Classify one side's image layer within an editor state.
pub fn classify_side_image(editor: &EditorState, side: SideId) -> Placement {
    classify(
        editor.side(side).image.as_ref().map(LayerBounds::from),
        &editor.safe_area(),
        &editor.preset,
    )
}

/// The order gate: both sides must carry content (an image or at least
/// one text layer). Placement quality is advisory and does not gate.
pub fn can_proceed(editor: &EditorState) -> bool {
    editor.side_has_content(SideId::Front) && editor.side_has_content(SideId::Back)
}
