//! The interactive editing session: owns the layer model, reacts to loads and parameter events,
//! recomposes the surface and gates export.

use std::collections::HashMap;

use crate::assets::catalog::TemplateCatalog;
use crate::assets::crop::{CropProvider, RegionCrop};
use crate::assets::decode::{ImageLoader, ImageSource};
use crate::assets::raster::RasterImage;
use crate::assets::text::FontBook;
use crate::encode::export::{EncodedImage, Exporter};
use crate::encode::sink::ExportSink;
use crate::foundation::core::{Canvas, Point, Vec2};
use crate::foundation::error::{CardError, CardResult};
use crate::render::compositor::Compositor;
use crate::render::surface::Surface;
use crate::scene::geometry::{ScaleRange, apply_drag_delta, screen_to_canvas_delta};
use crate::scene::layers::{LayerInputs, LayerStack, build_layers};
use crate::scene::model::{ClipCircle, Template, TextOverlay, UserPhoto};
use crate::session::input::{DragTarget, EditPhase, InputSource, ParamEvent};
use crate::session::viewport::DisplayFit;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub scale_range: ScaleRange,
    pub clip: Option<ClipCircle>,
    pub crop_output_px: Option<u32>,
    /// Export stays disabled until a photo is loaded.
    pub require_photo: bool,
    /// Export stays disabled until [`Editor::confirm`] succeeds.
    pub require_confirm: bool,
    /// Defer recomposition to [`Editor::on_frame`] instead of composing on every event.
    pub coalesce: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            scale_range: ScaleRange::default(),
            clip: None,
            crop_output_px: None,
            require_photo: true,
            require_confirm: false,
            coalesce: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadKind {
    Template { id: String },
    Photo,
}

/// Handle for one in-flight decode. Only the most recent ticket per kind is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub kind: LoadKind,
    pub source: ImageSource,
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer selection superseded this load; its result was discarded.
    Stale,
    Failed,
}

#[derive(Debug)]
pub enum ExportOutcome {
    /// Preconditions not met; nothing was encoded.
    Disabled,
    Persisted(EncodedImage),
    Failed(CardError),
}

/// Everything the layer builder reads.
#[derive(Clone, Debug, Default)]
pub struct EditorState {
    pub template: Option<Template>,
    pub photo: Option<UserPhoto>,
    pub overlays: Vec<TextOverlay>,
    pub display: DisplayFit,
    pub confirmed: bool,
    pending_template: Option<u64>,
    pending_photo: Option<u64>,
}

impl EditorState {
    pub fn canvas(&self) -> Option<Canvas> {
        self.template.as_ref().map(Template::canvas)
    }

    pub fn overlay(&self, id: &str) -> Option<&TextOverlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    fn overlay_mut(&mut self, id: &str) -> Option<&mut TextOverlay> {
        self.overlays.iter_mut().find(|o| o.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.pending_template.is_some() || self.pending_photo.is_some()
    }
}

pub struct Editor {
    config: EditorConfig,
    catalog: TemplateCatalog,
    state: EditorState,
    compositor: Compositor,
    crop: Box<dyn CropProvider>,
    surface: Option<Surface>,
    next_generation: u64,
    drags: HashMap<DragTarget, Point>,
    phases: HashMap<InputSource, EditPhase>,
    dirty: bool,
    compose_count: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("config", &self.config)
            .field("templates", &self.catalog.len())
            .field("state", &self.state)
            .field("dirty", &self.dirty)
            .field("compose_count", &self.compose_count)
            .finish_non_exhaustive()
    }
}

impl Editor {
    pub fn new(config: EditorConfig, catalog: TemplateCatalog, fonts: FontBook) -> Self {
        Self {
            config,
            catalog,
            state: EditorState::default(),
            compositor: Compositor::new(fonts),
            crop: Box::new(RegionCrop),
            surface: None,
            next_generation: 0,
            drags: HashMap::new(),
            phases: HashMap::new(),
            dirty: false,
            compose_count: 0,
        }
    }

    pub fn with_overlays(mut self, overlays: Vec<TextOverlay>) -> Self {
        self.state.overlays = overlays;
        self
    }

    pub fn with_crop_provider(mut self, crop: Box<dyn CropProvider>) -> Self {
        self.crop = crop;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Latest composed surface, if any composition has happened yet.
    pub fn current_surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Number of compositions performed so far.
    pub fn compose_count(&self) -> u64 {
        self.compose_count
    }

    pub fn phase(&self, source: &InputSource) -> EditPhase {
        self.phases.get(source).copied().unwrap_or_default()
    }

    pub fn is_dragging(&self, target: &DragTarget) -> bool {
        self.drags.contains_key(target)
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Start switching templates. The previous template leaves the model, and the surface is
    /// dropped, until the decode lands.
    pub fn select_template(&mut self, id: &str) -> CardResult<LoadTicket> {
        let entry = self
            .catalog
            .get(id)
            .ok_or_else(|| CardError::validation(format!("unknown template id '{id}'")))?;
        let source = entry.image_source();
        let generation = self.bump_generation();
        self.state.pending_template = Some(generation);
        self.state.template = None;
        self.state.confirmed = false;
        // Nothing to show until the new template lands.
        self.surface = None;
        self.dirty = false;
        tracing::debug!(id, generation, "template load started");
        Ok(LoadTicket {
            kind: LoadKind::Template { id: id.to_owned() },
            source,
            generation,
        })
    }

    pub fn finish_template_load(
        &mut self,
        ticket: LoadTicket,
        result: CardResult<RasterImage>,
    ) -> LoadOutcome {
        let LoadKind::Template { id } = ticket.kind else {
            tracing::warn!("photo ticket passed to finish_template_load");
            return LoadOutcome::Stale;
        };
        if self.state.pending_template != Some(ticket.generation) {
            tracing::debug!(%id, generation = ticket.generation, "stale template load discarded");
            return LoadOutcome::Stale;
        }
        self.state.pending_template = None;

        match result.and_then(|img| Template::new(id.clone(), img)) {
            Ok(template) => {
                let canvas = template.canvas();
                tracing::info!(%id, width = canvas.width, height = canvas.height, "template loaded");
                self.state.template = Some(template);
                self.request_recompose();
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "template load failed");
                LoadOutcome::Failed
            }
        }
    }

    /// Start replacing the user photo. The old photo leaves the model and the surface immediately.
    pub fn select_photo(&mut self, source: ImageSource) -> LoadTicket {
        let generation = self.bump_generation();
        self.state.pending_photo = Some(generation);
        self.state.photo = None;
        self.state.confirmed = false;
        self.drags.remove(&DragTarget::Photo);
        tracing::debug!(source = %source.label(), generation, "photo load started");
        self.request_recompose();
        LoadTicket {
            kind: LoadKind::Photo,
            source,
            generation,
        }
    }

    /// Apply a decoded photo with the centering default transform.
    pub fn finish_photo_load(
        &mut self,
        ticket: LoadTicket,
        result: CardResult<RasterImage>,
    ) -> LoadOutcome {
        if ticket.kind != LoadKind::Photo {
            tracing::warn!("template ticket passed to finish_photo_load");
            return LoadOutcome::Stale;
        }
        if self.state.pending_photo != Some(ticket.generation) {
            tracing::debug!(
                source = %ticket.source.label(),
                generation = ticket.generation,
                "stale photo load discarded"
            );
            return LoadOutcome::Stale;
        }
        self.state.pending_photo = None;

        match result {
            Ok(img) => {
                tracing::info!(
                    source = %ticket.source.label(),
                    width = img.width,
                    height = img.height,
                    "photo loaded"
                );
                self.state.photo = Some(UserPhoto::new(img));
                self.request_recompose();
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(source = %ticket.source.label(), error = %e, "photo load failed");
                self.request_recompose();
                LoadOutcome::Failed
            }
        }
    }

    /// Select and synchronously decode a template.
    pub fn load_template_with(
        &mut self,
        loader: &dyn ImageLoader,
        id: &str,
    ) -> CardResult<LoadOutcome> {
        let ticket = self.select_template(id)?;
        let result = loader.load(&ticket.source);
        Ok(self.finish_template_load(ticket, result))
    }

    /// Select and synchronously decode a photo.
    pub fn load_photo_with(&mut self, loader: &dyn ImageLoader, source: ImageSource) -> LoadOutcome {
        let ticket = self.select_photo(source);
        let result = loader.load(&ticket.source);
        self.finish_photo_load(ticket, result)
    }

    /// Apply one UI event. Returns whether the layer model changed.
    pub fn on_parameter_changed(&mut self, event: ParamEvent) -> bool {
        let changed = self.apply_event(event);
        if changed {
            self.state.confirmed = false;
            self.request_recompose();
        }
        changed
    }

    fn apply_event(&mut self, event: ParamEvent) -> bool {
        match event {
            ParamEvent::PhotoX(v) => self.with_photo(|p, _| p.transform.position.x = v),
            ParamEvent::PhotoY(v) => self.with_photo(|p, _| p.transform.position.y = v),
            ParamEvent::PhotoScale(v) => {
                self.with_photo(|p, range| p.transform.scale = range.clamp(v))
            }
            ParamEvent::PhotoCrop(region) => self.with_photo(|p, _| p.transform.crop = region),
            ParamEvent::OverlayText { id, text } => self.with_overlay(&id, |o| o.content = text),
            ParamEvent::OverlayX { id, value } => {
                self.with_overlay(&id, |o| o.position.x = value)
            }
            ParamEvent::OverlayY { id, value } => {
                self.with_overlay(&id, |o| o.position.y = value)
            }
            ParamEvent::OverlayScale { id, value } => self.with_overlay(&id, |o| {
                o.scale = if value.is_finite() && value > 0.0 {
                    value
                } else {
                    1.0
                }
            }),
            ParamEvent::OverlayColor { id, color } => self.with_overlay(&id, |o| o.color = color),
            ParamEvent::EditStarted(source) => {
                let kind = source.edit_kind();
                self.phases.insert(source, EditPhase::Editing(kind));
                false
            }
            ParamEvent::EditEnded(source) => {
                self.phases.remove(&source);
                false
            }
            ParamEvent::PointerDown { target, at } => {
                if !self.target_exists(&target) {
                    return false;
                }
                let source = InputSource::Pointer(target.clone());
                self.phases
                    .insert(source.clone(), EditPhase::Editing(source.edit_kind()));
                self.drags.insert(target, at);
                false
            }
            ParamEvent::PointerMove { target, at } => self.drag_to(target, at),
            ParamEvent::PointerUp { target } | ParamEvent::CaptureLost { target } => {
                self.drags.remove(&target);
                self.phases.remove(&InputSource::Pointer(target));
                false
            }
        }
    }

    fn with_photo(&mut self, f: impl FnOnce(&mut UserPhoto, ScaleRange)) -> bool {
        let range = self.config.scale_range;
        match self.state.photo.as_mut() {
            Some(p) => {
                let before = p.transform;
                f(p, range);
                p.transform != before
            }
            None => {
                tracing::debug!("photo parameter ignored; no photo loaded");
                false
            }
        }
    }

    fn with_overlay(&mut self, id: &str, f: impl FnOnce(&mut TextOverlay)) -> bool {
        match self.state.overlay_mut(id) {
            Some(o) => {
                let before = o.clone();
                f(o);
                *o != before
            }
            None => {
                tracing::warn!(id, "unknown overlay id");
                false
            }
        }
    }

    fn target_exists(&self, target: &DragTarget) -> bool {
        match target {
            DragTarget::Photo => self.state.photo.is_some(),
            DragTarget::Overlay(id) => self.state.overlay(id).is_some(),
        }
    }

    fn drag_to(&mut self, target: DragTarget, at: Point) -> bool {
        let Some(last) = self.drags.get_mut(&target) else {
            return false;
        };
        let delta_screen: Vec2 = at - *last;
        *last = at;
        let Some(canvas) = self.state.canvas() else {
            return false;
        };
        let delta = screen_to_canvas_delta(delta_screen, self.state.display.scale);
        match &target {
            DragTarget::Photo => self.with_photo(|p, _| {
                p.transform.position = apply_drag_delta(p.transform.position, delta, canvas)
            }),
            DragTarget::Overlay(id) => self.with_overlay(id, |o| {
                o.position = apply_drag_delta(o.position, delta, canvas)
            }),
        }
    }

    fn request_recompose(&mut self) {
        if self.config.coalesce {
            self.dirty = true;
        } else {
            self.recompose();
        }
    }

    /// Flush a coalesced recomposition. Returns whether one ran.
    pub fn on_frame(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.recompose();
        true
    }

    /// The layer list the next composition would draw.
    pub fn layer_stack(&self) -> Option<LayerStack> {
        build_layers(&LayerInputs {
            template: self.state.template.as_ref(),
            photo: self.state.photo.as_ref(),
            overlays: &self.state.overlays,
            clip: self.config.clip,
            crop: self.crop.as_ref(),
            crop_output_px: self.config.crop_output_px,
        })
    }

    /// Recompose the surface from the current model. A no-op while no template is loaded.
    ///
    /// Failures are logged and leave the previous surface contents in place.
    pub fn recompose(&mut self) {
        self.dirty = false;
        let Some(stack) = self.layer_stack() else {
            tracing::debug!("compose skipped; no template");
            return;
        };
        let surface = match self.surface.take() {
            Some(mut s) => match s.resize_clear(stack.canvas) {
                Ok(()) => s,
                Err(e) => {
                    tracing::error!(error = %e, "surface resize failed");
                    return;
                }
            },
            None => match Surface::new(stack.canvas) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "surface allocation failed");
                    return;
                }
            },
        };
        let surface = self.surface.insert(surface);
        match self.compositor.compose(surface, &stack) {
            Ok(()) => self.compose_count += 1,
            Err(e) => tracing::error!(error = %e, "composition failed"),
        }
    }

    /// Fit the preview into `available` screen pixels. Never touches the surface.
    pub fn resize_viewport(&mut self, available: (f64, f64)) -> DisplayFit {
        if let Some(canvas) = self.state.canvas() {
            self.state.display = DisplayFit::fit(canvas, available);
        }
        self.state.display
    }

    fn content_ready(&self) -> bool {
        self.state.template.is_some()
            && (self.state.photo.is_some() || !self.config.require_photo)
            && !self.state.is_loading()
    }

    /// Record the user's final confirmation. Returns `false` when content is not ready.
    pub fn confirm(&mut self) -> bool {
        if self.dirty {
            self.recompose();
        }
        self.state.confirmed = self.content_ready() && self.surface.is_some();
        self.state.confirmed
    }

    pub fn can_export(&self) -> bool {
        self.content_ready()
            && self.surface.is_some()
            && (self.state.confirmed || !self.config.require_confirm)
    }

    /// Encode the current surface and hand it to `sink`.
    ///
    /// Sink failures are reported in the outcome; the editor stays usable either way.
    pub fn export(&mut self, exporter: &Exporter, sink: &mut dyn ExportSink) -> ExportOutcome {
        if self.dirty {
            self.recompose();
        }
        if !self.can_export() {
            tracing::debug!("export requested while disabled");
            return ExportOutcome::Disabled;
        }
        let Some(surface) = self.surface.as_ref() else {
            return ExportOutcome::Disabled;
        };
        let encoded = match exporter.encode(surface) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(error = %e, "export encoding failed");
                return ExportOutcome::Failed(e);
            }
        };
        match sink.persist(&encoded) {
            Ok(()) => ExportOutcome::Persisted(encoded),
            Err(e) => {
                tracing::warn!(error = %e, "export sink failed");
                ExportOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
