use std::sync::Arc;

use crate::foundation::core::{Rgba8, Rgba8Premul};
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::Fnv1a64;

/// Content-derived identity of a raster; equal pixels and dimensions give equal ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RasterId(pub u64);

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct RasterImage {
    id: RasterId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap premultiplied RGBA8 bytes, checking that the length matches `width * height * 4`.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CardResult<Self> {
        if width == 0 || height == 0 {
            return Err(CardError::decode("raster width/height must be non-zero"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| CardError::decode("raster size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(CardError::decode(format!(
                "raster byte length mismatch: expected {expected}, got {}",
                rgba8_premul.len()
            )));
        }

        let mut h = Fnv1a64::new_default();
        h.write_u32(width);
        h.write_u32(height);
        h.write_bytes(&rgba8_premul);

        Ok(Self {
            id: RasterId(h.finish()),
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Single-colour raster, mostly useful for placeholders and tests.
    pub fn solid(width: u32, height: u32, color: Rgba8) -> CardResult<Self> {
        let px = color.to_premul().to_array();
        let bytes = px.repeat((width as usize).saturating_mul(height as usize));
        Self::from_premul(width, height, bytes)
    }

    pub fn id(&self) -> RasterId {
        self.id
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[i..i + 4];
        Some(Rgba8Premul {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
    }
}

impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.width == other.width
            && self.height == other.height
            && self.rgba8_premul == other.rgba8_premul
    }
}
