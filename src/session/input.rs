use crate::assets::crop::CropRect;
use crate::foundation::core::{Point, Rgba8};

/// Element that can be dragged on the preview.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragTarget {
    Photo,
    Overlay(String),
}

/// Individual UI control feeding the editor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputSource {
    PhotoX,
    PhotoY,
    PhotoScale,
    CropBox,
    OverlayText(String),
    OverlayX(String),
    OverlayY(String),
    OverlayScale(String),
    OverlayColor(String),
    Pointer(DragTarget),
}

impl InputSource {
    pub fn edit_kind(&self) -> EditKind {
        match self {
            Self::Pointer(_) => EditKind::Dragging,
            Self::OverlayText(_) => EditKind::Typing,
            _ => EditKind::Sliding,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Dragging,
    Typing,
    Sliding,
}

/// `Idle → Editing(kind) → Idle`, tracked per input source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditPhase {
    #[default]
    Idle,
    Editing(EditKind),
}

/// A committed parameter change or an edit-session boundary.
///
/// Pointer coordinates are in screen (display) pixels; the editor converts them with the current
/// display fit.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamEvent {
    PhotoX(f64),
    PhotoY(f64),
    PhotoScale(f64),
    PhotoCrop(Option<CropRect>),
    OverlayText { id: String, text: String },
    OverlayX { id: String, value: f64 },
    OverlayY { id: String, value: f64 },
    OverlayScale { id: String, value: f32 },
    OverlayColor { id: String, color: Rgba8 },
    EditStarted(InputSource),
    EditEnded(InputSource),
    PointerDown { target: DragTarget, at: Point },
    PointerMove { target: DragTarget, at: Point },
    PointerUp { target: DragTarget },
    CaptureLost { target: DragTarget },
}
