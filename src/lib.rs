#![forbid(unsafe_code)]

pub mod assets;
pub mod clip_cpu;
pub mod compose;
pub mod error;
pub mod guide;
pub mod interact;
pub mod layout;
pub mod model;
pub mod preset;
pub mod store;
pub mod validity;

pub use assets::{FontCatalog, ImageFetcher, ImageLoad, PixelSource, PreparedImage, load_image};
pub use compose::{
    CardDimensions, CardShape, Compositor, DesignArtifact, RecomposeQueue, SideArtifact,
    SidePreview, compose_artifact,
};
pub use error::{CardproofError, CardproofResult};
pub use interact::{InteractionEngine, PointerState, ResizeHandle, handle_positions};
pub use layout::{PlacedRect, SafeArea, fill_over, fit_within, initial_placement};
pub use model::{
    EditorState, ImageLayer, ImageLayerPatch, ImageSourceRef, RestorationStatus, Selection, Side,
    SideId, TextLayer, TextLayerId, TextLayerPatch, TextStyle,
};
pub use preset::{CardPreset, Orientation, PrintSize};
pub use store::{
    CanvasStateDto, CanvasStateSave, DesignEditPayload, DesignStore, InMemoryDesignStore,
    StoredUpload, TextLayerDto, UploadPolicy, UploadRequest, load_initial, save_design,
    save_state, validate_upload,
};
pub use validity::{LayerBounds, Placement, can_proceed, classify, classify_side_image};
