//! Cardsmith composes personalized greeting cards.
//!
//! A card is a fixed template raster, one user photo placed under (or clipped above) it, and any
//! number of text overlays on top. The public API is editor-oriented:
//!
//! - Describe templates, fonts and overlays in a [`CardConfig`]
//! - Build an [`Editor`] and feed it loads and [`ParamEvent`]s
//! - Read the composed [`Surface`] or export it through an [`ExportSink`]
//!
//! All positions are fractions of the template's intrinsic size, so the output resolution is
//! always the template resolution regardless of how the preview is displayed.
#![forbid(unsafe_code)]

/// Images, colours, fonts, template catalog and crop strategy.
pub mod assets;
/// JPEG/PNG encoding and export sinks.
pub mod encode;
/// Canvas and colour primitives, the crate error type and pixel math.
pub mod foundation;
/// CPU compositing onto a full-resolution surface.
pub mod render;
/// Card data model, geometry, layer building and configuration.
pub mod scene;
/// Interactive editing session.
pub mod session;

pub use crate::foundation::core::{Affine, Canvas, Point, Position, Rect, Rgba8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{CardError, CardResult};

pub use crate::assets::catalog::{TemplateCatalog, TemplateEntry};
pub use crate::assets::crop::{CropProvider, CropRect, RegionCrop};
pub use crate::assets::decode::{FsImageLoader, ImageLoader, ImageSource, decode_image};
pub use crate::assets::raster::{RasterId, RasterImage};
pub use crate::assets::text::FontBook;
pub use crate::encode::export::{EncodedImage, ExportFormat, ExportOpts, Exporter};
pub use crate::encode::sink::{ExportSink, FileSink, MemorySink};
pub use crate::render::compositor::Compositor;
pub use crate::render::surface::Surface;
pub use crate::scene::config::CardConfig;
pub use crate::scene::geometry::{PhotoPlacement, ScaleRange, resolve_photo_placement};
pub use crate::scene::layers::{Layer, LayerInputs, LayerKind, LayerStack, build_layers};
pub use crate::scene::model::{
    ClipCircle, FontSpec, PhotoTransform, Template, TextBaseline, TextOverlay, UserPhoto,
};
pub use crate::session::editor::{
    Editor, EditorConfig, EditorState, ExportOutcome, LoadOutcome, LoadTicket,
};
pub use crate::session::input::{DragTarget, EditKind, EditPhase, InputSource, ParamEvent};
pub use crate::session::viewport::DisplayFit;
