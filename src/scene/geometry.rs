//! Conversions from stored, resolution-independent parameters to pixel-space transforms.
//!
//! Every coordinate is resolved against the template's intrinsic canvas, never against a
//! display-scaled presentation.

use crate::foundation::core::{Affine, Canvas, Point, Position, Vec2};
use crate::scene::model::PhotoTransform;

/// Inclusive bounds applied to photo zoom.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 10.0,
        }
    }
}

impl ScaleRange {
    /// Clamp `scale` into the range; non-finite or non-positive input falls back to `1.0`
    /// (itself clamped).
    pub fn clamp(self, scale: f64) -> f64 {
        let s = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        s.clamp(self.min, self.max)
    }
}

/// Fraction of a canvas dimension to absolute pixels.
pub fn resolve_position(fraction: f64, dim: u32) -> f64 {
    fraction * f64::from(dim)
}

pub fn resolve_point(p: Position, canvas: Canvas) -> Point {
    Point::new(
        resolve_position(p.x, canvas.width),
        resolve_position(p.y, canvas.height),
    )
}

/// Draw origin and uniform scale for the photo layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhotoPlacement {
    pub origin: Point,
    pub scale: f64,
}

impl PhotoPlacement {
    /// Translate-then-scale transform mapping photo pixels into canvas pixels.
    pub fn affine(self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::scale(self.scale)
    }
}

/// Place a `size` photo so that its scaled center lands on the resolved position.
pub fn resolve_photo_placement(
    size: (u32, u32),
    transform: &PhotoTransform,
    canvas: Canvas,
) -> PhotoPlacement {
    let center = resolve_point(transform.position, canvas);
    let scale = transform.scale;
    PhotoPlacement {
        origin: Point::new(
            center.x - f64::from(size.0) * scale / 2.0,
            center.y - f64::from(size.1) * scale / 2.0,
        ),
        scale,
    }
}

/// Add a canvas-pixel drag delta to a stored fractional position. No clamping.
pub fn apply_drag_delta(pos: Position, delta_px: Vec2, canvas: Canvas) -> Position {
    Position::new(
        pos.x + delta_px.x / f64::from(canvas.width),
        pos.y + delta_px.y / f64::from(canvas.height),
    )
}

/// Convert a pointer delta measured on screen to canvas pixels.
pub fn screen_to_canvas_delta(delta_screen: Vec2, display_scale: f64) -> Vec2 {
    if display_scale.is_finite() && display_scale > 0.0 {
        delta_screen / display_scale
    } else {
        delta_screen
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/geometry.rs"]
mod tests;
