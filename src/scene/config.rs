//! JSON card configuration: template catalog, fonts, overlay defaults, photo and export settings.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::catalog::{TemplateCatalog, TemplateEntry};
use crate::assets::color::ColorDef;
use crate::assets::text::FontBook;
use crate::encode::export::{ExportFormat, ExportOpts};
use crate::foundation::core::{Position, Rgba8};
use crate::foundation::error::{CardError, CardResult};
use crate::scene::geometry::ScaleRange;
use crate::scene::model::{ClipCircle, FontSpec, TextBaseline, TextOverlay};
use crate::session::editor::{Editor, EditorConfig};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CardConfig {
    pub templates: Vec<TemplateEntry>,
    #[serde(default)]
    pub fonts: Vec<FontSource>,
    #[serde(default)]
    pub overlays: Vec<OverlayConfig>,
    #[serde(default)]
    pub photo: PhotoConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub editor: EditorFlags,
    /// Directory relative asset paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontSource {
    pub family: String,
    pub source: PathBuf,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayConfig {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default = "default_position")]
    pub position: Position,
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_text_color")]
    pub color: ColorDef,
    #[serde(default)]
    pub baseline: TextBaseline,
}

fn default_position() -> Position {
    Position::CENTER
}

fn default_scale() -> f32 {
    1.0
}

fn default_text_color() -> ColorDef {
    ColorDef::from(Rgba8::WHITE)
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    pub scale_range: ScaleRange,
    pub clip: Option<ClipCircle>,
    pub crop_output_px: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub quality: u8,
    pub file_name: String,
    pub background: ColorDef,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let opts = ExportOpts::default();
        Self {
            format: opts.format,
            quality: opts.quality,
            file_name: opts.file_name,
            background: ColorDef::from(opts.background),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorFlags {
    pub require_photo: bool,
    pub require_confirm: bool,
    pub coalesce: bool,
}

impl Default for EditorFlags {
    fn default() -> Self {
        let d = EditorConfig::default();
        Self {
            require_photo: d.require_photo,
            require_confirm: d.require_confirm,
            coalesce: d.coalesce,
        }
    }
}

impl CardConfig {
    /// Parse and validate a config file; relative asset paths resolve against its directory.
    pub fn from_path(path: &Path) -> CardResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read card config '{}'", path.display()))?;
        let mut cfg = Self::from_json(&text)?;
        cfg.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(cfg)
    }

    /// Parse and validate a config; relative paths resolve against the working directory.
    pub fn from_reader(mut reader: impl Read) -> CardResult<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("read card config")?;
        Self::from_json(&text)
    }

    fn from_json(text: &str) -> CardResult<Self> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|e| CardError::serde(format!("card config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn validate(&self) -> CardResult<()> {
        if self.templates.is_empty() {
            return Err(CardError::validation("config must list at least one template"));
        }
        TemplateCatalog::new(self.templates.clone())?;
        for t in &self.templates {
            normalize_rel_path(&t.source)?;
        }

        for f in &self.fonts {
            if f.family.trim().is_empty() {
                return Err(CardError::validation("font family must be non-empty"));
            }
            normalize_rel_path(&f.source)?;
        }

        for (i, o) in self.overlays.iter().enumerate() {
            if o.id.trim().is_empty() {
                return Err(CardError::validation("overlay id must be non-empty"));
            }
            if self.overlays[..i].iter().any(|prev| prev.id == o.id) {
                return Err(CardError::validation(format!(
                    "duplicate overlay id '{}'",
                    o.id
                )));
            }
            if !(o.font.size_px.is_finite() && o.font.size_px > 0.0) {
                return Err(CardError::validation(format!(
                    "overlay '{}' font size must be > 0",
                    o.id
                )));
            }
            if !(o.scale.is_finite() && o.scale > 0.0) {
                return Err(CardError::validation(format!(
                    "overlay '{}' scale must be > 0",
                    o.id
                )));
            }
        }

        let r = self.photo.scale_range;
        if !(r.min.is_finite() && r.max.is_finite() && r.min > 0.0 && r.min <= r.max) {
            return Err(CardError::validation(
                "photo scale_range must satisfy 0 < min <= max",
            ));
        }
        if let Some(c) = self.photo.clip
            && !(c.radius.is_finite() && c.radius > 0.0)
        {
            return Err(CardError::validation("clip radius must be > 0"));
        }
        if self.photo.crop_output_px == Some(0) {
            return Err(CardError::validation("crop_output_px must be > 0"));
        }

        self.raw_export_opts().validate()
    }

    fn resolve(&self, rel: &Path) -> CardResult<PathBuf> {
        Ok(self.base_dir.join(normalize_rel_path(rel)?))
    }

    /// Catalog with sources resolved against the config directory.
    pub fn catalog(&self) -> CardResult<TemplateCatalog> {
        let entries = self
            .templates
            .iter()
            .map(|t| {
                Ok(TemplateEntry {
                    source: self.resolve(&t.source)?,
                    ..t.clone()
                })
            })
            .collect::<CardResult<Vec<_>>>()?;
        TemplateCatalog::new(entries)
    }

    /// Read every configured font file into a [`FontBook`].
    pub fn font_book(&self) -> CardResult<FontBook> {
        let mut book = FontBook::new();
        for f in &self.fonts {
            let path = self.resolve(&f.source)?;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read font '{}'", path.display()))?;
            tracing::debug!(family = %f.family, path = %path.display(), "font registered");
            book.register(f.family.clone(), bytes);
        }
        Ok(book)
    }

    pub fn overlays(&self) -> Vec<TextOverlay> {
        self.overlays
            .iter()
            .map(|o| TextOverlay {
                id: o.id.clone(),
                content: o.content.clone(),
                placeholder: o.placeholder.clone(),
                position: o.position,
                font: o.font.clone(),
                scale: o.scale,
                color: o.color.to_rgba8(),
                baseline: o.baseline,
            })
            .collect()
    }

    fn raw_export_opts(&self) -> ExportOpts {
        ExportOpts {
            format: self.export.format,
            quality: self.export.quality,
            file_name: self.export.file_name.clone(),
            background: self.export.background.to_rgba8(),
        }
    }

    /// Export options with environment overrides applied.
    pub fn export_opts(&self) -> ExportOpts {
        self.raw_export_opts().with_env_overrides()
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            scale_range: self.photo.scale_range,
            clip: self.photo.clip,
            crop_output_px: self.photo.crop_output_px,
            require_photo: self.editor.require_photo,
            require_confirm: self.editor.require_confirm,
            coalesce: self.editor.coalesce,
        }
    }

    /// Editor wired with this config's catalog, fonts and overlays. Nothing is loaded yet.
    pub fn build_editor(&self) -> CardResult<Editor> {
        Ok(
            Editor::new(self.editor_config(), self.catalog()?, self.font_book()?)
                .with_overlays(self.overlays()),
        )
    }
}

/// Validate a config-relative asset path: relative, `/`-separated, no `..`.
pub fn normalize_rel_path(path: &Path) -> CardResult<PathBuf> {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.trim().is_empty() {
        return Err(CardError::validation("asset path must be non-empty"));
    }
    if s.starts_with('/') || Path::new(&s).is_absolute() || s.contains(':') {
        return Err(CardError::validation(format!(
            "asset path '{s}' must be relative"
        )));
    }
    let mut out = PathBuf::new();
    for part in s.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                return Err(CardError::validation(format!(
                    "asset path '{s}' must not contain '..'"
                )));
            }
            p => out.push(p),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(CardError::validation(format!("asset path '{s}' names no file")));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;
