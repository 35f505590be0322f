use crate::assets::raster::RasterImage;
use crate::foundation::error::{CardError, CardResult};

/// Crop rectangle in source-photo pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect with a `width x height` raster; `None` when nothing is left.
    pub fn clamp_to(self, width: u32, height: u32) -> Option<CropRect> {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(CropRect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Pluggable crop strategy.
///
/// Given the loaded photo and the region chosen in the crop UI, return a raster of exactly
/// `requested` pixels. The compositor treats the call as synchronous.
pub trait CropProvider {
    fn cropped_region(
        &self,
        photo: &RasterImage,
        region: CropRect,
        requested: (u32, u32),
    ) -> CardResult<RasterImage>;
}

/// Default strategy: copy the sub-rectangle, resampling only when the requested size differs.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionCrop;

impl CropProvider for RegionCrop {
    fn cropped_region(
        &self,
        photo: &RasterImage,
        region: CropRect,
        requested: (u32, u32),
    ) -> CardResult<RasterImage> {
        let r = region
            .clamp_to(photo.width, photo.height)
            .ok_or_else(|| CardError::validation("crop region does not intersect the photo"))?;
        if requested.0 == 0 || requested.1 == 0 {
            return Err(CardError::validation("requested crop size must be non-zero"));
        }

        let stride = photo.width as usize * 4;
        let row_len = r.width as usize * 4;
        let mut out = Vec::with_capacity(row_len * r.height as usize);
        for y in r.y..r.y + r.height {
            let start = y as usize * stride + r.x as usize * 4;
            out.extend_from_slice(&photo.rgba8_premul[start..start + row_len]);
        }

        if (r.width, r.height) == requested {
            return RasterImage::from_premul(r.width, r.height, out);
        }

        // Premultiplied data resamples without dark fringes.
        let buf = image::RgbaImage::from_raw(r.width, r.height, out)
            .ok_or_else(|| CardError::render("crop buffer size mismatch"))?;
        let resized = image::imageops::resize(
            &buf,
            requested.0,
            requested.1,
            image::imageops::FilterType::Triangle,
        );
        RasterImage::from_premul(requested.0, requested.1, resized.into_raw())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/crop.rs"]
mod tests;
