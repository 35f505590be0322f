use crate::assets::raster::RasterImage;
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::Fnv1a64;

/// The authoritative composite: premultiplied RGBA8 at template resolution.
pub struct Surface {
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    pub fn new(canvas: Canvas) -> CardResult<Self> {
        let (w, h) = pixmap_dims(canvas)?;
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Match `canvas` and clear to transparent, reallocating only on a size change.
    pub fn resize_clear(&mut self, canvas: Canvas) -> CardResult<()> {
        let (w, h) = pixmap_dims(canvas)?;
        if self.pixmap.width() != w || self.pixmap.height() != h {
            self.pixmap = vello_cpu::Pixmap::new(w, h);
            return Ok(());
        }
        self.pixmap.data_as_u8_slice_mut().fill(0);
        Ok(())
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let i = ((y as usize) * (self.width() as usize) + (x as usize)) * 4;
        let p = &self.data()[i..i + 4];
        Some(Rgba8Premul {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }

    /// Snapshot of the full-resolution pixels.
    pub fn to_raster(&self) -> CardResult<RasterImage> {
        RasterImage::from_premul(self.width(), self.height(), self.data().to_vec())
    }

    /// Stable digest of dimensions and pixels; equal digests mean identical output.
    pub fn digest(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.width());
        h.write_u32(self.height());
        h.write_bytes(self.data());
        h.finish()
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

fn pixmap_dims(canvas: Canvas) -> CardResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| CardError::render("surface width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| CardError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(CardError::render("surface width/height must be non-zero"));
    }
    Ok((w, h))
}
