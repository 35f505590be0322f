use crate::assets::crop::CropRect;
use crate::assets::raster::RasterImage;
use crate::assets::text::FontSlant;
use crate::foundation::core::{Canvas, Position, Rgba8};
use crate::foundation::error::CardResult;

/// Base font size of the original name overlay.
pub const DEFAULT_FONT_SIZE_PX: f32 = 60.0;
pub const DEFAULT_FONT_FAMILY: &str = "Montserrat";

/// Immutable background raster; its intrinsic size is the output resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub id: String,
    image: RasterImage,
    canvas: Canvas,
}

impl Template {
    pub fn new(id: impl Into<String>, image: RasterImage) -> CardResult<Self> {
        let canvas = Canvas::new(image.width, image.height)?;
        Ok(Self {
            id: id.into(),
            image,
            canvas,
        })
    }

    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }
}

/// Mutable placement of the user photo.
///
/// `position` is where the (scaled) photo center lands, as canvas fractions.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhotoTransform {
    pub position: Position,
    pub scale: f64,
    #[serde(default)]
    pub crop: Option<CropRect>,
}

impl Default for PhotoTransform {
    fn default() -> Self {
        Self {
            position: Position::CENTER,
            scale: 1.0,
            crop: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserPhoto {
    pub image: RasterImage,
    pub transform: PhotoTransform,
}

impl UserPhoto {
    /// New photo with the centering default transform.
    pub fn new(image: RasterImage) -> Self {
        Self {
            image,
            transform: PhotoTransform::default(),
        }
    }
}

/// Vertical anchoring of overlay text relative to its position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBaseline {
    /// The top of the line box sits at the position.
    #[default]
    Top,
    /// The first line's alphabetic baseline sits at the position.
    Alphabetic,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default = "default_font_size")]
    pub size_px: f32,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub slant: FontSlant,
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE_PX
}

fn default_weight() -> f32 {
    400.0
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_owned(),
            size_px: DEFAULT_FONT_SIZE_PX,
            weight: default_weight(),
            slant: FontSlant::Normal,
        }
    }
}

/// One user-editable text field painted above the template.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOverlay {
    pub id: String,
    pub content: String,
    pub placeholder: String,
    pub position: Position,
    pub font: FontSpec,
    /// Multiplier applied to `font.size_px`.
    pub scale: f32,
    pub color: Rgba8,
    pub baseline: TextBaseline,
}

impl TextOverlay {
    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            placeholder: String::new(),
            position,
            font: FontSpec::default(),
            scale: 1.0,
            color: Rgba8::WHITE,
            baseline: TextBaseline::Top,
        }
    }

    /// Text that will actually be drawn: the content, or the placeholder when empty.
    pub fn display_text(&self) -> &str {
        if self.content.is_empty() {
            &self.placeholder
        } else {
            &self.content
        }
    }

    pub fn size_px(&self) -> f32 {
        self.font.size_px * self.scale
    }
}

/// Circular window (canvas space) through which the photo is shown above the template.
///
/// `radius` is a fraction of the canvas' shorter edge.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipCircle {
    pub center: Position,
    pub radius: f64,
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
