use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{CardError, CardResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Slant of a text overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
}

/// Registered font files keyed by the family name used in overlay font specs.
///
/// Lookups for an unknown family fall back to the first registered family so a typo in a
/// config degrades to "wrong typeface" instead of "no text".
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    faces: BTreeMap<String, Arc<Vec<u8>>>,
    first: Option<String>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, family: impl Into<String>, bytes: Vec<u8>) {
        let family = family.into();
        if self.first.is_none() {
            self.first = Some(family.clone());
        }
        self.faces.insert(family, Arc::new(bytes));
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Resolve a family to `(registered family, font bytes)`.
    pub fn resolve(&self, family: &str) -> Option<(&str, &Arc<Vec<u8>>)> {
        if let Some((k, v)) = self.faces.get_key_value(family) {
            return Some((k.as_str(), v));
        }
        let first = self.first.as_deref()?;
        self.faces.get_key_value(first).map(|(k, v)| (k.as_str(), v))
    }
}

/// Styling inputs for a single line of overlay text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size_px: f32,
    pub weight: f32,
    pub slant: FontSlant,
    pub brush: TextBrushRgba8,
}

/// Stateful helper for building Parley text layouts from registered font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    // Font-book family -> family name reported by the font itself.
    registered: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
        }
    }

    fn family_name_for(&mut self, family: &str, font_bytes: &[u8]) -> CardResult<String> {
        if let Some(name) = self.registered.get(family) {
            return Ok(name.clone());
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CardError::validation("no font families registered from font bytes"))?;

        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::validation("registered font family has no name"))?
            .to_string();
        self.registered.insert(family.to_owned(), name.clone());
        Ok(name)
    }

    /// Shape and lay out a single unwrapped line of text.
    pub fn layout_plain(
        &mut self,
        text: &str,
        family: &str,
        font_bytes: &[u8],
        style: TextStyle,
    ) -> CardResult<parley::Layout<TextBrushRgba8>> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(CardError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let family_name = self.family_name_for(family, font_bytes)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(style.weight),
        ));
        if style.slant == FontSlant::Italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::Brush(style.brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Distance from the layout top to the first line's alphabetic baseline.
pub fn first_baseline(layout: &parley::Layout<TextBrushRgba8>) -> f32 {
    layout
        .lines()
        .next()
        .map(|line| line.metrics().baseline)
        .unwrap_or(0.0)
}
