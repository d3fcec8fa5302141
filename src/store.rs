//! Persistence adapter: maps editor state to and from the external
//! stores' geometry-only wire shapes, plus upload validation.
//!
//! Only geometry and text attributes cross this boundary — never raw
//! pixels. The stores themselves are external collaborators reached
//! through the [`DesignStore`] trait; an in-memory implementation backs
//! tests and the CLI.

use std::collections::HashMap;

use crate::error::{CardproofError, CardproofResult};
use crate::layout::initial_placement;
use crate::model::{
    EditorState, ImageLayer, ImageSourceRef, RestorationStatus, Side, SideId, TextLayer,
    TextLayerId, TextStyle,
};

/// Per-side image geometry as stored on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasStateDto {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

impl From<&ImageLayer> for CanvasStateDto {
    fn from(layer: &ImageLayer) -> Self {
        Self {
            x: layer.x,
            y: layer.y,
            width: layer.width,
            height: layer.height,
            rotation: layer.rotation,
            natural_width: layer.natural_width,
            natural_height: layer.natural_height,
        }
    }
}

/// A text layer on the wire. Styling fields are optional; restore fills
/// the documented defaults for anything missing.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayerDto {
    pub id: u64,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
}

impl From<&TextLayer> for TextLayerDto {
    fn from(layer: &TextLayer) -> Self {
        Self {
            id: layer.id.0,
            text: layer.text.clone(),
            x: layer.x,
            y: layer.y,
            width: layer.width,
            height: layer.height,
            rotation: layer.rotation,
            font_family: Some(layer.style.font_family.clone()),
            font_size: Some(layer.style.font_size),
            font_weight: Some(layer.style.font_weight.clone()),
            font_style: Some(layer.style.font_style.clone()),
            text_align: Some(layer.style.text_align.clone()),
            color: Some(layer.style.color.clone()),
            line_height: Some(layer.style.line_height),
            letter_spacing: Some(layer.style.letter_spacing),
            text_decoration: Some(layer.style.text_decoration.clone()),
        }
    }
}

fn text_layer_from_dto(dto: &TextLayerDto) -> TextLayer {
    let defaults = TextStyle::default();
    TextLayer {
        id: TextLayerId(dto.id),
        text: dto.text.clone(),
        x: dto.x,
        y: dto.y,
        width: dto.width,
        height: dto.height,
        rotation: dto.rotation,
        style: TextStyle {
            font_family: dto.font_family.clone().unwrap_or(defaults.font_family),
            font_size: dto.font_size.unwrap_or(defaults.font_size),
            font_weight: dto.font_weight.clone().unwrap_or(defaults.font_weight),
            font_style: dto.font_style.clone().unwrap_or(defaults.font_style),
            text_align: dto.text_align.clone().unwrap_or(defaults.text_align),
            color: dto.color.clone().unwrap_or(defaults.color),
            line_height: dto.line_height.unwrap_or(defaults.line_height),
            letter_spacing: dto.letter_spacing.unwrap_or(defaults.letter_spacing),
            text_decoration: dto
                .text_decoration
                .clone()
                .unwrap_or(defaults.text_decoration),
        },
    }
}

/// What `GET design/{id}/edit` returns. `*_image_url` is the raw rendered
/// preview; `*_background_url` is the template/background asset that text
/// layers float over.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DesignEditPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_canvas_state: Option<CanvasStateDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_canvas_state: Option<CanvasStateDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_background_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_background_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_text_layers: Option<Vec<TextLayerDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_text_layers: Option<Vec<TextLayerDto>>,
}

/// Body of `POST design/{id}/canvas-state`. Safe to send with only one
/// side populated; the upsert is idempotent.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasStateSave {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_canvas_state: Option<CanvasStateDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_canvas_state: Option<CanvasStateDto>,
    #[serde(default)]
    pub front_text_layers: Vec<TextLayerDto>,
    #[serde(default)]
    pub back_text_layers: Vec<TextLayerDto>,
}

/// Serialize the editor's layer geometry for persistence. Geometry and
/// text attributes only; pixel data never leaves through here.
pub fn save_state(editor: &EditorState) -> CanvasStateSave {
    CanvasStateSave {
        front_canvas_state: editor.front.image.as_ref().map(CanvasStateDto::from),
        back_canvas_state: editor.back.image.as_ref().map(CanvasStateDto::from),
        front_text_layers: editor.front.texts.iter().map(TextLayerDto::from).collect(),
        back_text_layers: editor.back.texts.iter().map(TextLayerDto::from).collect(),
    }
}

/// Restore a design into a fresh editor.
///
/// Idempotent by state machine: the [`RestorationStatus`] field is checked
/// and advanced before any side effect, so a second call is a no-op rather
/// than a duplicate-layer source. Restoration never marks the state dirty.
pub fn load_initial(editor: &mut EditorState, payload: &DesignEditPayload) {
    if editor.restoration != RestorationStatus::NotStarted {
        return;
    }
    editor.restoration = RestorationStatus::InProgress;

    restore_side(
        editor,
        SideId::Front,
        payload.front_canvas_state.as_ref(),
        payload.front_image_url.as_deref(),
        payload.front_background_url.as_deref(),
        payload.front_text_layers.as_deref(),
    );
    restore_side(
        editor,
        SideId::Back,
        payload.back_canvas_state.as_ref(),
        payload.back_image_url.as_deref(),
        payload.back_background_url.as_deref(),
        payload.back_text_layers.as_deref(),
    );

    editor.restoration = RestorationStatus::Done;
}

fn restore_side(
    editor: &mut EditorState,
    side: SideId,
    canvas_state: Option<&CanvasStateDto>,
    image_url: Option<&str>,
    background_url: Option<&str>,
    text_layers: Option<&[TextLayerDto]>,
) {
    let safe = editor.safe_area();
    let has_text = text_layers.is_some_and(|t| !t.is_empty());

    // With text layers present, the raw preview already has the text baked
    // into its pixels; loading it would double-render. Only the background
    // asset becomes the image layer.
    let source = if has_text {
        background_url
    } else {
        image_url
    };

    let image = source.map(|url| match canvas_state {
        Some(cs) => ImageLayer {
            source: ImageSourceRef(url.to_string()),
            x: cs.x,
            y: cs.y,
            width: cs.width,
            height: cs.height,
            rotation: cs.rotation,
            natural_width: cs.natural_width,
            natural_height: cs.natural_height,
        },
        // No stored geometry: center a safe-area-sized box; the natural
        // size gets corrected when the decode completes.
        None => {
            let placed = initial_placement(safe.width, safe.height, &safe);
            ImageLayer {
                source: ImageSourceRef(url.to_string()),
                x: placed.x,
                y: placed.y,
                width: placed.width,
                height: placed.height,
                rotation: 0.0,
                natural_width: placed.width,
                natural_height: placed.height,
            }
        }
    });

    let texts: Vec<TextLayer> = if has_text {
        let dtos = text_layers.unwrap_or_default();
        for dto in dtos {
            editor.reserve_text_id(TextLayerId(dto.id));
        }
        dtos.iter().map(text_layer_from_dto).collect()
    } else {
        Vec::new()
    };

    *editor.side_mut(side) = Side { image, texts };
}

// --- Upload Store contract ---

/// Descriptor returned by the Upload Store for a stored file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredUpload {
    pub id: String,
    pub file_url: String,
    pub thumbnail_url: String,
}

/// Accepted file types and the size ceiling for one upload call site.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadPolicy {
    /// Accepted MIME subtypes (the part after `image/`).
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
}

const MB: u64 = 1024 * 1024;

fn max_upload_override_mb() -> Option<u64> {
    std::env::var("CARDPROOF_MAX_UPLOAD_MB")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&n| n > 0)
}

impl UploadPolicy {
    /// The strict call sites: jpeg/jpg/png/webp up to 20MB.
    pub fn strict() -> Self {
        Self {
            allowed_types: ["jpeg", "jpg", "png", "webp"]
                .map(String::from)
                .to_vec(),
            max_bytes: max_upload_override_mb().unwrap_or(20) * MB,
        }
    }

    /// The permissive call sites: gif allowed, ceiling at 25MB.
    pub fn extended() -> Self {
        Self {
            allowed_types: ["jpeg", "jpg", "png", "webp", "gif"]
                .map(String::from)
                .to_vec(),
            max_bytes: max_upload_override_mb().unwrap_or(25) * MB,
        }
    }
}

/// A pending upload, before any state change happens.
#[derive(Clone, Copy, Debug)]
pub struct UploadRequest<'a> {
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: u64,
}

/// Validate an upload against a policy. Errors are local and non-fatal:
/// the pending operation aborts and no layer state changes.
pub fn validate_upload(request: &UploadRequest<'_>, policy: &UploadPolicy) -> CardproofResult<()> {
    let subtype = request
        .mime_type
        .strip_prefix("image/")
        .unwrap_or(request.mime_type);
    if !policy
        .allowed_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(subtype))
    {
        return Err(CardproofError::validation(format!(
            "unsupported file type '{}' for '{}'",
            request.mime_type, request.file_name
        )));
    }
    if request.size_bytes > policy.max_bytes {
        return Err(CardproofError::validation(format!(
            "'{}' exceeds the {}MB upload limit",
            request.file_name,
            policy.max_bytes / MB
        )));
    }
    Ok(())
}

// --- Design Store contract ---

/// The external Design Store, reduced to the calls this editor makes.
/// Transport lives with the host; failures surface as
/// [`CardproofError::Store`] and never corrupt in-memory state.
pub trait DesignStore {
    /// `GET design/{id}/edit`.
    fn load(&mut self, design_id: &str) -> CardproofResult<DesignEditPayload>;

    /// `POST design/{id}/canvas-state` — idempotent upsert.
    fn save_canvas_state(
        &mut self,
        design_id: &str,
        state: &CanvasStateSave,
    ) -> CardproofResult<()>;

    /// `POST design/{id}/upload` — associate a raw file with a side,
    /// independent of geometry saves.
    fn attach_upload(
        &mut self,
        design_id: &str,
        side: SideId,
        bytes: &[u8],
    ) -> CardproofResult<StoredUpload>;

    /// `POST design/{id}/copy-from-upload` — promote a library image into
    /// the design's own asset set.
    fn copy_from_upload(
        &mut self,
        design_id: &str,
        upload_id: &str,
        side: SideId,
    ) -> CardproofResult<StoredUpload>;
}

/// Save the editor's geometry through a store, clearing the dirty flag
/// only on success. On failure local state stays authoritative.
pub fn save_design(
    store: &mut dyn DesignStore,
    design_id: &str,
    editor: &mut EditorState,
) -> CardproofResult<()> {
    let state = save_state(editor);
    match store.save_canvas_state(design_id, &state) {
        Ok(()) => {
            editor.mark_saved();
            Ok(())
        }
        Err(err) => {
            tracing::warn!(design_id, %err, "canvas-state save failed, keeping local state");
            Err(err)
        }
    }
}

#[derive(Clone, Debug, Default)]
struct DesignRecord {
    state: Option<CanvasStateSave>,
    image_urls: HashMap<SideId, String>,
}

/// In-memory Design Store double with the real store's upsert semantics.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDesignStore {
    designs: HashMap<String, DesignRecord>,
    upload_counter: u64,
}

impl InMemoryDesignStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn stored(&mut self, design_id: &str, side: SideId, tag: &str) -> StoredUpload {
        self.upload_counter += 1;
        let id = format!("up_{}", self.upload_counter);
        let file_url = format!(
            "mem://designs/{design_id}/{}-{tag}.png",
            match side {
                SideId::Front => "front",
                SideId::Back => "back",
            }
        );
        let record = self.designs.entry(design_id.to_string()).or_default();
        record.image_urls.insert(side, file_url.clone());
        StoredUpload {
            id,
            thumbnail_url: format!("{file_url}?thumb"),
            file_url,
        }
    }
}

impl DesignStore for InMemoryDesignStore {
    fn load(&mut self, design_id: &str) -> CardproofResult<DesignEditPayload> {
        let Some(record) = self.designs.get(design_id) else {
            return Ok(DesignEditPayload::default());
        };
        let state = record.state.clone().unwrap_or_default();
        Ok(DesignEditPayload {
            front_canvas_state: state.front_canvas_state,
            back_canvas_state: state.back_canvas_state,
            front_image_url: record.image_urls.get(&SideId::Front).cloned(),
            back_image_url: record.image_urls.get(&SideId::Back).cloned(),
            front_background_url: None,
            back_background_url: None,
            front_text_layers: (!state.front_text_layers.is_empty())
                .then_some(state.front_text_layers),
            back_text_layers: (!state.back_text_layers.is_empty())
                .then_some(state.back_text_layers),
        })
    }

    fn save_canvas_state(
        &mut self,
        design_id: &str,
        state: &CanvasStateSave,
    ) -> CardproofResult<()> {
        self.designs
            .entry(design_id.to_string())
            .or_default()
            .state = Some(state.clone());
        Ok(())
    }

    fn attach_upload(
        &mut self,
        design_id: &str,
        side: SideId,
        bytes: &[u8],
    ) -> CardproofResult<StoredUpload> {
        if bytes.is_empty() {
            return Err(CardproofError::store("upload body was empty"));
        }
        Ok(self.stored(design_id, side, "upload"))
    }

    fn copy_from_upload(
        &mut self,
        design_id: &str,
        upload_id: &str,
        side: SideId,
    ) -> CardproofResult<StoredUpload> {
        let _ = upload_id;
        Ok(self.stored(design_id, side, "library"))
    }
}
