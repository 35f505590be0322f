use std::io::Cursor;

use image::ImageEncoder as _;

use crate::encode::sink::ExportSink;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::{mul_div255_u8, unpremultiply_rgba8_in_place};
use crate::render::surface::Surface;

/// Env var overriding the configured JPEG quality (1..=100).
pub const QUALITY_ENV: &str = "CARDSMITH_EXPORT_QUALITY";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportOpts {
    pub format: ExportFormat,
    /// JPEG quality, 1..=100. Ignored for PNG.
    pub quality: u8,
    /// Suggested file name handed to the sink.
    pub file_name: String,
    /// JPEG has no alpha; transparent pixels are flattened over this colour.
    pub background: Rgba8,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality: 90,
            file_name: "birthday-card.jpg".to_owned(),
            background: Rgba8::BLACK,
        }
    }
}

impl ExportOpts {
    pub fn validate(&self) -> CardResult<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(CardError::validation("export quality must be in 1..=100"));
        }
        if self.file_name.trim().is_empty() {
            return Err(CardError::validation("export file_name must be non-empty"));
        }
        Ok(())
    }

    /// Apply [`QUALITY_ENV`] when it holds a valid quality; invalid values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(q) = std::env::var(QUALITY_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u8>().ok())
            .filter(|q| (1..=100).contains(q))
        {
            self.quality = q;
        }
        self
    }
}

/// Encoded output plus what the host needs to persist it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

/// Serializes the full-resolution surface.
#[derive(Clone, Debug)]
pub struct Exporter {
    opts: ExportOpts,
}

impl Exporter {
    pub fn new(opts: ExportOpts) -> CardResult<Self> {
        opts.validate()?;
        Ok(Self { opts })
    }

    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    /// Encode `surface` at its native resolution.
    #[tracing::instrument(skip_all, fields(format = ?self.opts.format, width = surface.width(), height = surface.height()))]
    pub fn encode(&self, surface: &Surface) -> CardResult<EncodedImage> {
        let (width, height) = (surface.width(), surface.height());
        let mut out = Cursor::new(Vec::new());

        match self.opts.format {
            ExportFormat::Jpeg => {
                let rgb = flatten_premul_to_rgb(surface.data(), self.opts.background);
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, self.opts.quality)
                    .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
                    .map_err(|e| CardError::export(format!("jpeg encode: {e}")))?;
            }
            ExportFormat::Png => {
                let mut rgba = surface.data().to_vec();
                unpremultiply_rgba8_in_place(&mut rgba);
                image::codecs::png::PngEncoder::new(&mut out)
                    .write_image(&rgba, width, height, image::ExtendedColorType::Rgba8)
                    .map_err(|e| CardError::export(format!("png encode: {e}")))?;
            }
        }

        Ok(EncodedImage {
            bytes: out.into_inner(),
            format: self.opts.format,
            width,
            height,
            file_name: self.opts.file_name.clone(),
        })
    }

    /// Encode and hand the result to `sink`.
    pub fn export(&self, surface: &Surface, sink: &mut dyn ExportSink) -> CardResult<EncodedImage> {
        let encoded = self.encode(surface)?;
        sink.persist(&encoded)?;
        Ok(encoded)
    }
}

/// Premultiplied RGBA over an opaque background, dropping alpha.
fn flatten_premul_to_rgb(premul: &[u8], bg: Rgba8) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(premul.len() / 4 * 3);
    for px in premul.chunks_exact(4) {
        let inv = 255 - u16::from(px[3]);
        for (c, b) in px[0..3].iter().zip([bg.r, bg.g, bg.b]) {
            rgb.push(c.saturating_add(mul_div255_u8(u16::from(b), inv)));
        }
    }
    rgb
}

#[cfg(test)]
#[path = "../../tests/unit/encode/export.rs"]
mod tests;
