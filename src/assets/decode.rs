use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::raster::RasterImage;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Where an image comes from: a file on disk or bytes already handed over by the host.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes { label: String, data: Arc<Vec<u8>> },
}

impl ImageSource {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        Self::Path(p.into())
    }

    pub fn bytes(label: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Bytes {
            label: label.into(),
            data: Arc::new(data),
        }
    }

    /// Short human-readable name for logs.
    pub fn label(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Bytes { label, .. } => label.clone(),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Bytes { label, data } => f
                .debug_struct("Bytes")
                .field("label", label)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// Image-loading collaborator.
///
/// Implementations turn an [`ImageSource`] into a decoded raster. Failures are reported, never
/// panicked on; the editor treats them as "entity absent".
pub trait ImageLoader {
    fn load(&self, source: &ImageSource) -> CardResult<RasterImage>;
}

/// Loader backed by the local filesystem and the `image` crate decoders.
#[derive(Clone, Debug, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, source: &ImageSource) -> CardResult<RasterImage> {
        match source {
            ImageSource::Path(p) => {
                let bytes = std::fs::read(p)
                    .with_context(|| format!("read image '{}'", p.display()))?;
                decode_image(&bytes)
            }
            ImageSource::Bytes { data, .. } => decode_image(data),
        }
    }
}

/// Decode any format supported by `image` into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CardResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| CardError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    RasterImage::from_premul(width, height, rgba8_premul)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
