//! Layer model: the two per-side layer sets, selection, and the editor
//! state that owns them.
//!
//! Geometry is center-based canvas-space pixels throughout. Mutations go
//! through [`EditorState`] methods; every operation that changes layer
//! data marks the state dirty until the next successful save.

use crate::layout::{SafeArea, fill_over, fit_within, initial_placement};
use crate::preset::{CardPreset, Orientation, PrintSize};

/// Offset applied to a duplicated image, on both axes.
pub const DUPLICATE_OFFSET_PX: f64 = 20.0;

/// Bounding box given to a newly added text layer.
pub const DEFAULT_TEXT_BOX_PX: (f64, f64) = (200.0, 50.0);

/// Opaque reference to image pixels: an uploaded-file URL or an embedded
/// raster reference. The model never looks inside it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageSourceRef(pub String);

/// Identifier for a text layer, stable across save/restore.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TextLayerId(pub u64);

/// The uploaded image placed on one side of the card.
///
/// `x`/`y` are the layer center; `natural_*` is the source pixel size and
/// never changes after creation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageLayer {
    pub source: ImageSourceRef,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, clockwise about the center. Reserved; all producers
    /// currently write 0.
    pub rotation: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

/// Sparse update for an image layer. Only present fields are applied.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ImageLayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ImageSourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

/// Typography attributes of a text layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: String,
    pub font_style: String,
    pub text_align: String,
    /// CSS hex color, e.g. `"#1F1A17"`.
    pub color: String,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub text_decoration: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 16.0,
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            text_align: "center".to_string(),
            color: "#000000".to_string(),
            line_height: 1.2,
            letter_spacing: 0.0,
            text_decoration: "none".to_string(),
        }
    }
}

/// A floating text field on one side of the card.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    pub id: TextLayerId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub style: TextStyle,
}

/// Sparse update for a text layer. Only present fields are applied.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct TextLayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
}

/// Front or back face of the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideId {
    Front,
    Back,
}

/// One face's layer set: at most one image, any number of text fields.
/// Paint order for text is insertion order; later wins on overlap.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Side {
    pub image: Option<ImageLayer>,
    pub texts: Vec<TextLayer>,
}

impl Side {
    pub fn has_content(&self) -> bool {
        self.image.is_some() || !self.texts.is_empty()
    }

    pub fn text(&self, id: TextLayerId) -> Option<&TextLayer> {
        self.texts.iter().find(|t| t.id == id)
    }

    fn text_mut(&mut self, id: TextLayerId) -> Option<&mut TextLayer> {
        self.texts.iter_mut().find(|t| t.id == id)
    }
}

/// What the user currently has selected. A tagged union, so image and
/// text selection cannot coexist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Image,
    Text(TextLayerId),
}

/// One-shot guard for design restoration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestorationStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

/// Full editor state for one design session.
#[derive(Clone, Debug)]
pub struct EditorState {
    pub preset: CardPreset,
    pub orientation: Orientation,
    pub active_side: SideId,
    pub front: Side,
    pub back: Side,
    pub selection: Selection,
    pub restoration: RestorationStatus,
    pub has_unsaved_changes: bool,
    next_text_id: u64,
}

impl EditorState {
    pub fn new(size: Option<PrintSize>, orientation: Orientation) -> Self {
        Self {
            preset: CardPreset::derive(size, orientation),
            orientation,
            active_side: SideId::Front,
            front: Side::default(),
            back: Side::default(),
            selection: Selection::None,
            restoration: RestorationStatus::default(),
            has_unsaved_changes: false,
            next_text_id: 1,
        }
    }

    /// Re-derive the preset after a print-size or orientation change.
    /// Layer data is untouched; presets are never persisted.
    pub fn set_dimensions(&mut self, size: Option<PrintSize>, orientation: Orientation) {
        self.preset = CardPreset::derive(size, orientation);
        self.orientation = orientation;
    }

    pub fn safe_area(&self) -> SafeArea {
        SafeArea::of(&self.preset)
    }

    pub fn side(&self, id: SideId) -> &Side {
        match id {
            SideId::Front => &self.front,
            SideId::Back => &self.back,
        }
    }

    pub fn side_mut(&mut self, id: SideId) -> &mut Side {
        match id {
            SideId::Front => &mut self.front,
            SideId::Back => &mut self.back,
        }
    }

    pub fn active(&self) -> &Side {
        self.side(self.active_side)
    }

    fn active_mut(&mut self) -> &mut Side {
        self.side_mut(self.active_side)
    }

    pub fn side_has_content(&self, id: SideId) -> bool {
        self.side(id).has_content()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    fn dirty(&mut self) {
        self.has_unsaved_changes = true;
    }

    /// Clear the dirty flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    // --- Image operations ---

    /// Replace a side's image layer wholesale.
    pub fn set_image_for_side(&mut self, side: SideId, image: ImageLayer) {
        self.side_mut(side).image = Some(image);
        self.dirty();
    }

    /// Attach a freshly uploaded or library-selected image using the
    /// placement-on-insert rule, selecting it when it lands on the active
    /// side.
    pub fn attach_image(
        &mut self,
        side: SideId,
        source: ImageSourceRef,
        natural_width: f64,
        natural_height: f64,
    ) {
        let placed = initial_placement(natural_width, natural_height, &self.safe_area());
        self.side_mut(side).image = Some(ImageLayer {
            source,
            x: placed.x,
            y: placed.y,
            width: placed.width,
            height: placed.height,
            rotation: 0.0,
            natural_width,
            natural_height,
        });
        if side == self.active_side {
            self.selection = Selection::Image;
        }
        self.dirty();
    }

    /// Apply a sparse patch to the active side's image. Returns false when
    /// there is no image to patch.
    pub fn update_current_image(&mut self, patch: &ImageLayerPatch) -> bool {
        let Some(image) = self.active_mut().image.as_mut() else {
            return false;
        };
        if let Some(ref source) = patch.source {
            image.source = source.clone();
        }
        if let Some(x) = patch.x {
            image.x = x;
        }
        if let Some(y) = patch.y {
            image.y = y;
        }
        if let Some(w) = patch.width {
            image.width = w;
        }
        if let Some(h) = patch.height {
            image.height = h;
        }
        if let Some(r) = patch.rotation {
            image.rotation = r;
        }
        self.dirty();
        true
    }

    /// Remove the active side's image and any selection of it.
    pub fn remove_image(&mut self) {
        self.active_mut().image = None;
        if self.selection == Selection::Image {
            self.selection = Selection::None;
        }
        self.dirty();
    }

    /// Duplicate the active image offset by [`DUPLICATE_OFFSET_PX`] on both
    /// axes. A side holds at most one image, so the copy takes the
    /// original's place and becomes the selection.
    pub fn duplicate_image(&mut self) -> bool {
        let Some(image) = self.active().image.as_ref() else {
            return false;
        };
        let mut copy = image.clone();
        copy.x += DUPLICATE_OFFSET_PX;
        copy.y += DUPLICATE_OFFSET_PX;
        self.active_mut().image = Some(copy);
        self.selection = Selection::Image;
        self.dirty();
        true
    }

    /// Scale the active image to fit entirely inside the safe area,
    /// re-centered on it.
    pub fn fit_image_to_safe_area(&mut self) -> bool {
        let safe = self.safe_area();
        let Some(image) = self.active().image.as_ref() else {
            return false;
        };
        let (w, h) = fit_within(
            image.natural_width,
            image.natural_height,
            safe.width,
            safe.height,
        );
        self.place_image(w, h, safe.center())
    }

    /// Scale the active image to cover the safe area, re-centered on it.
    pub fn fill_safe_area(&mut self) -> bool {
        let safe = self.safe_area();
        let Some(image) = self.active().image.as_ref() else {
            return false;
        };
        let (w, h) = fill_over(
            image.natural_width,
            image.natural_height,
            safe.width,
            safe.height,
        );
        self.place_image(w, h, safe.center())
    }

    /// Scale the active image to cover the full bleed-inclusive canvas.
    pub fn fill_canvas(&mut self) -> bool {
        let preset = self.preset;
        let Some(image) = self.active().image.as_ref() else {
            return false;
        };
        let (w, h) = fill_over(
            image.natural_width,
            image.natural_height,
            preset.width_px,
            preset.height_px,
        );
        self.place_image(w, h, preset.rect().center())
    }

    fn place_image(&mut self, width: f64, height: f64, center: kurbo::Point) -> bool {
        let Some(image) = self.active_mut().image.as_mut() else {
            return false;
        };
        image.width = width;
        image.height = height;
        image.x = center.x;
        image.y = center.y;
        self.dirty();
        true
    }

    // --- Side switching ---

    /// Change the active side. Clears selection; never touches layer data.
    pub fn switch_side(&mut self, side: SideId) {
        if side != self.active_side {
            self.active_side = side;
            self.selection = Selection::None;
        }
    }

    // --- Text operations ---

    fn alloc_text_id(&mut self) -> TextLayerId {
        let id = TextLayerId(self.next_text_id);
        self.next_text_id += 1;
        id
    }

    /// Note an externally supplied id (restore path) so future allocations
    /// stay unique.
    pub(crate) fn reserve_text_id(&mut self, id: TextLayerId) {
        self.next_text_id = self.next_text_id.max(id.0 + 1);
    }

    /// Add a text layer at the safe-area center with the default bounding
    /// box; it becomes the selection.
    pub fn add_text(&mut self, text: impl Into<String>, style: TextStyle) -> TextLayerId {
        let id = self.alloc_text_id();
        let center = self.safe_area().center();
        let (width, height) = DEFAULT_TEXT_BOX_PX;
        self.active_mut().texts.push(TextLayer {
            id,
            text: text.into(),
            x: center.x,
            y: center.y,
            width,
            height,
            rotation: 0.0,
            style,
        });
        self.selection = Selection::Text(id);
        self.dirty();
        id
    }

    /// Apply a sparse patch to a text layer on the active side. Returns
    /// false when the id is unknown there.
    pub fn update_text(&mut self, id: TextLayerId, patch: &TextLayerPatch) -> bool {
        let Some(layer) = self.active_mut().text_mut(id) else {
            return false;
        };
        if let Some(ref text) = patch.text {
            layer.text = text.clone();
        }
        if let Some(x) = patch.x {
            layer.x = x;
        }
        if let Some(y) = patch.y {
            layer.y = y;
        }
        if let Some(w) = patch.width {
            layer.width = w;
        }
        if let Some(h) = patch.height {
            layer.height = h;
        }
        if let Some(r) = patch.rotation {
            layer.rotation = r;
        }
        if let Some(ref v) = patch.font_family {
            layer.style.font_family = v.clone();
        }
        if let Some(v) = patch.font_size {
            layer.style.font_size = v;
        }
        if let Some(ref v) = patch.font_weight {
            layer.style.font_weight = v.clone();
        }
        if let Some(ref v) = patch.font_style {
            layer.style.font_style = v.clone();
        }
        if let Some(ref v) = patch.text_align {
            layer.style.text_align = v.clone();
        }
        if let Some(ref v) = patch.color {
            layer.style.color = v.clone();
        }
        if let Some(v) = patch.line_height {
            layer.style.line_height = v;
        }
        if let Some(v) = patch.letter_spacing {
            layer.style.letter_spacing = v;
        }
        if let Some(ref v) = patch.text_decoration {
            layer.style.text_decoration = v.clone();
        }
        self.dirty();
        true
    }

    /// Remove a text layer from the active side, clearing its selection.
    pub fn remove_text(&mut self, id: TextLayerId) -> bool {
        let side = self.active_mut();
        let before = side.texts.len();
        side.texts.retain(|t| t.id != id);
        if side.texts.len() == before {
            return false;
        }
        if self.selection == Selection::Text(id) {
            self.selection = Selection::None;
        }
        self.dirty();
        true
    }

    /// Select a text layer on the active side. Any image selection is
    /// replaced by construction.
    pub fn select_text(&mut self, id: TextLayerId) -> bool {
        if self.active().text(id).is_none() {
            return false;
        }
        self.selection = Selection::Text(id);
        true
    }

    /// Select the active side's image, replacing any text selection.
    pub fn select_image(&mut self) -> bool {
        if self.active().image.is_none() {
            return false;
        }
        self.selection = Selection::Image;
        true
    }

    pub fn deselect(&mut self) {
        self.selection = Selection::None;
    }
}
