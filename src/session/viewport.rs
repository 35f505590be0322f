use crate::foundation::core::Canvas;

/// How the full-resolution surface is presented on screen.
///
/// Purely presentational: computing a fit never touches surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayFit {
    /// Screen pixels per canvas pixel (never above 1).
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayFit {
    fn default() -> Self {
        Self {
            scale: 1.0,
            width: 0,
            height: 0,
        }
    }
}

impl DisplayFit {
    /// Aspect-preserving fit of `canvas` into `available` screen pixels, without upscaling.
    pub fn fit(canvas: Canvas, available: (f64, f64)) -> Self {
        let sx = available.0 / f64::from(canvas.width);
        let sy = available.1 / f64::from(canvas.height);
        let s = sx.min(sy);
        let scale = if s.is_finite() && s > 0.0 {
            s.min(1.0)
        } else {
            1.0
        };
        Self {
            scale,
            width: (f64::from(canvas.width) * scale).round() as u32,
            height: (f64::from(canvas.height) * scale).round() as u32,
        }
    }
}
