//! Asset ingest: image decoding, the load-strategy cascade, and the
//! prepared-pixel/font stores the compositor reads from.
//!
//! No IO happens inside the renderer. Fetching goes through the
//! [`ImageFetcher`] seam the host implements; everything downstream
//! consumes prepared, premultiplied pixels.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use crate::error::CardproofResult;
use crate::model::ImageSourceRef;

/// Prepared raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

pub fn decode_image(bytes: &[u8]) -> CardproofResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// The engine's only IO seam for remote image bytes. Hosts implement this
/// over whatever transport they have; tests use canned stubs.
pub trait ImageFetcher {
    /// Retrieve the raw bytes behind `url`. `credentialed` asks for the
    /// retry flavor that sends credentials along.
    fn fetch(&mut self, url: &str, credentialed: bool) -> CardproofResult<Vec<u8>>;
}

/// Outcome of loading one remote image.
#[derive(Clone, Debug)]
pub enum ImageLoad {
    /// Pixels are available; the compositor can rasterize this source.
    Decoded(PreparedImage),
    /// Pixels could not be obtained; the raw reference is usable for
    /// on-screen display only.
    Reference(String),
    /// Nothing usable. Callers treat this as "no image" and stay usable.
    Failed,
}

/// Load an image by trying each strategy in sequence: plain fetch and
/// decode, credentialed fetch and decode, then the raw reference
/// undecoded. Never returns an error; the editor must survive any side
/// being left blank.
pub fn load_image(url: &str, fetcher: &mut dyn ImageFetcher) -> ImageLoad {
    if url.is_empty() {
        return ImageLoad::Failed;
    }

    match fetcher.fetch(url, false).and_then(|b| decode_image(&b)) {
        Ok(img) => return ImageLoad::Decoded(img),
        Err(err) => {
            tracing::debug!(url, %err, "plain image load failed, retrying credentialed");
        }
    }

    match fetcher.fetch(url, true).and_then(|b| decode_image(&b)) {
        Ok(img) => ImageLoad::Decoded(img),
        Err(err) => {
            tracing::warn!(url, %err, "image decode failed, falling back to reference");
            ImageLoad::Reference(url.to_string())
        }
    }
}

/// Prepared pixels keyed by the layer's opaque source reference. Sources
/// that were loaded reference-only simply have no entry here.
#[derive(Clone, Debug, Default)]
pub struct PixelSource {
    pixels: HashMap<ImageSourceRef, PreparedImage>,
}

impl PixelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; a stale decode completing late just overwrites.
    pub fn insert(&mut self, source: ImageSourceRef, image: PreparedImage) {
        self.pixels.insert(source, image);
    }

    pub fn get(&self, source: &ImageSourceRef) -> Option<&PreparedImage> {
        self.pixels.get(source)
    }
}

/// Raw font bytes keyed by family name, registered by the host.
/// Resolution is case-insensitive; unknown families fall back to the
/// first registered family.
#[derive(Clone, Debug, Default)]
pub struct FontCatalog {
    families: Vec<(String, Arc<Vec<u8>>)>,
}

impl FontCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, family: impl Into<String>, bytes: Vec<u8>) {
        self.families.push((family.into(), Arc::new(bytes)));
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Resolve a family name, falling back to the first registered family
    /// when the name is unknown.
    pub fn resolve(&self, family: &str) -> Option<Arc<Vec<u8>>> {
        self.families
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(family))
            .or_else(|| self.families.first())
            .map(|(_, bytes)| bytes.clone())
    }
}
