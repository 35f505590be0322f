use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::export::EncodedImage;
use crate::foundation::error::{CardError, CardResult};

/// Host-side persistence of an exported card (save dialog, download, file write, ...).
pub trait ExportSink {
    fn persist(&mut self, image: &EncodedImage) -> CardResult<()>;
}

/// Writes exports into a directory under their suggested file names.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    overwrite: bool,
    last_written: Option<PathBuf>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: true,
            last_written: None,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl ExportSink for FileSink {
    fn persist(&mut self, image: &EncodedImage) -> CardResult<()> {
        let name = Path::new(&image.file_name)
            .file_name()
            .ok_or_else(|| CardError::export("suggested file name has no final component"))?;
        let path = self.dir.join(name);
        if !self.overwrite && path.exists() {
            return Err(CardError::export(format!(
                "refusing to overwrite '{}'",
                path.display()
            )));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        std::fs::write(&path, &image.bytes)
            .with_context(|| format!("write export '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = image.bytes.len(), "export written");
        self.last_written = Some(path);
        Ok(())
    }
}

/// Keeps exports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    images: Vec<EncodedImage>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[EncodedImage] {
        &self.images
    }
}

impl ExportSink for MemorySink {
    fn persist(&mut self, image: &EncodedImage) -> CardResult<()> {
        self.images.push(image.clone());
        Ok(())
    }
}
