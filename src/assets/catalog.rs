use std::path::PathBuf;

use crate::assets::decode::ImageSource;
use crate::foundation::error::{CardError, CardResult};

/// One selectable background template.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TemplateEntry {
    pub id: String,
    pub label: String,
    pub source: PathBuf,
}

impl TemplateEntry {
    pub fn image_source(&self) -> ImageSource {
        ImageSource::Path(self.source.clone())
    }
}

/// Fixed, ordered catalog of templates the user can pick from.
#[derive(Clone, Debug, Default)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
}

impl TemplateCatalog {
    pub fn new(entries: Vec<TemplateEntry>) -> CardResult<Self> {
        for (i, e) in entries.iter().enumerate() {
            if e.id.trim().is_empty() {
                return Err(CardError::validation("template id must be non-empty"));
            }
            if entries[..i].iter().any(|prev| prev.id == e.id) {
                return Err(CardError::validation(format!(
                    "duplicate template id '{}'",
                    e.id
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&TemplateEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
