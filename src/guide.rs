//! # Cardproof guide
//!
//! This module is a standalone walkthrough of the engine's architecture
//! and public API. If you are integrating the editor into a host UI,
//! start here; if you are looking for copy/paste commands, start with the
//! repository `README.md`.
//!
//! ---
//!
//! ## Core concepts
//!
//! - [`CardPreset`](crate::CardPreset): physical print size + orientation
//!   resolved into the bleed-inclusive pixel canvas and its margins
//! - [`SafeArea`](crate::SafeArea): the inner region guaranteed not to be
//!   trimmed; the primary placement target
//! - [`EditorState`](crate::EditorState): the two independent [`Side`](crate::Side)
//!   layer sets (front/back), the active side, selection, and the dirty flag
//! - [`InteractionEngine`](crate::InteractionEngine): pointer gestures
//!   (drag, corner resize) turned into layer mutations
//! - [`Placement`](crate::Placement): where a layer sits relative to the
//!   safe area and the bleed line
//! - [`Compositor`](crate::Compositor): rasterizes a side into a PNG
//!   preview, full-card or print-crop
//! - [`PixelSource`](crate::PixelSource) / [`FontCatalog`](crate::FontCatalog):
//!   the only places decoded bytes enter the renderer
//!
//! ---
//!
//! ## "No IO in the renderer" (and why)
//!
//! Composition must be deterministic and testable, so renderer code never
//! reaches into the filesystem or network. Remote bytes come through the
//! [`ImageFetcher`](crate::ImageFetcher) seam and land as prepared,
//! **premultiplied RGBA8** pixels ([`PreparedImage`](crate::PreparedImage))
//! in a [`PixelSource`](crate::PixelSource). A source whose pixels never
//! arrived (a reference-only load) makes the compositor return
//! [`SidePreview::Reference`](crate::SidePreview) instead of failing —
//! the host can still show *something*.
//!
//! ---
//!
//! ## Coordinates
//!
//! Everything is canvas-space pixels at 100 px/inch. Layer `x`/`y` is the
//! layer **center**; boxes derive as center ± size/2. Pointer input is
//! screen-space and every delta is divided by the zoom factor on the way
//! in, so gestures behave identically at any zoom level.
//!
//! ---
//!
//! ## A minimal session
//!
//! ```rust,no_run
//! use cardproof::{
//!     CardproofResult, Compositor, EditorState, FontCatalog, ImageSourceRef, Orientation,
//!     PixelSource, SideId, compose_artifact,
//! };
//!
//! # fn main() -> CardproofResult<()> {
//! // Derive the canvas from the product's print size (falls back to
//! // 3.5in x 2in when absent) and attach an uploaded image; it lands
//! // centered in the safe area, scaled down only if it doesn't fit.
//! let mut editor = EditorState::new(None, Orientation::Horizontal);
//! let source = ImageSourceRef("uploads/logo.png".to_string());
//! editor.attach_image(SideId::Front, source.clone(), 2000.0, 1000.0);
//!
//! // Decode pixels outside the renderer and hand them over.
//! let bytes = std::fs::read("uploads/logo.png").map_err(anyhow::Error::from)?;
//! let mut pixels = PixelSource::new();
//! pixels.insert(source, cardproof::assets::decode_image(&bytes)?);
//!
//! // Rasterize both sides and hand the artifact to the host UI.
//! let mut compositor = Compositor::new(FontCatalog::new());
//! let artifact = compose_artifact(&mut compositor, &editor, 12.0, &pixels)?;
//! assert!(artifact.front.has_content);
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! ## Recomposition is coalesced, not queued
//!
//! Rapid changes (text typed character by character) must not rerender on
//! every keystroke. [`RecomposeQueue`](crate::RecomposeQueue) keeps one
//! pending slot per side: a new mark supersedes the pending one, and a
//! side becomes due only after a quiet period with no further marks
//! (default 300ms, `CARDPROOF_QUIET_MS` to override). Time is passed in
//! as `Instant` values, so hosts drive it from their own event loop and
//! tests drive it synthetically.
//!
//! ---
//!
//! ## Persistence is geometry-only
//!
//! [`save_state`](crate::save_state) serializes layer geometry and text
//! attributes — never pixels. [`load_initial`](crate::load_initial)
//! rebuilds layers from a [`DesignEditPayload`](crate::DesignEditPayload)
//! exactly once per editor (an explicit
//! [`RestorationStatus`](crate::RestorationStatus) field guards reruns).
//! When a side arrives with text layers, its raw preview image is *not*
//! loaded — the text is already baked into those pixels — and the
//! background asset plus independent, editable text layers are
//! reconstructed instead.
