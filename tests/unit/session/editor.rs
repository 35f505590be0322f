use super::*;
use crate::assets::catalog::TemplateEntry;
use crate::encode::export::ExportOpts;
use crate::encode::sink::MemorySink;
use crate::foundation::core::{Position, Rgba8};
use crate::scene::geometry::resolve_photo_placement;

struct SolidLoader;

impl ImageLoader for SolidLoader {
    fn load(&self, source: &ImageSource) -> CardResult<RasterImage> {
        match source.label().as_str() {
            "card.png" => RasterImage::solid(800, 600, Rgba8::opaque(200, 0, 0)),
            "small.png" => RasterImage::solid(40, 30, Rgba8::opaque(0, 200, 0)),
            "a.png" | "b.png" => RasterImage::solid(200, 200, Rgba8::opaque(0, 0, 200)),
            "wide.png" => RasterImage::solid(400, 100, Rgba8::opaque(0, 0, 200)),
            other => Err(CardError::decode(format!("cannot decode '{other}'"))),
        }
    }
}

fn catalog() -> TemplateCatalog {
    TemplateCatalog::new(vec![
        TemplateEntry {
            id: "classic".into(),
            label: "Classic".into(),
            source: "card.png".into(),
        },
        TemplateEntry {
            id: "mini".into(),
            label: "Mini".into(),
            source: "small.png".into(),
        },
        TemplateEntry {
            id: "broken".into(),
            label: "Broken".into(),
            source: "missing.png".into(),
        },
    ])
    .unwrap()
}

fn editor(config: EditorConfig) -> Editor {
    let mut name = TextOverlay::new("name", Position::new(0.5, 0.1));
    name.placeholder = "Your name".into();
    Editor::new(config, catalog(), FontBook::new()).with_overlays(vec![name])
}

fn loaded(config: EditorConfig) -> Editor {
    let mut ed = editor(config);
    assert_eq!(
        ed.load_template_with(&SolidLoader, "classic").unwrap(),
        LoadOutcome::Applied
    );
    assert_eq!(
        ed.load_photo_with(&SolidLoader, ImageSource::path("a.png")),
        LoadOutcome::Applied
    );
    ed
}

fn photo_origin(ed: &Editor) -> (f64, f64) {
    let state = ed.state();
    let photo = state.photo.as_ref().unwrap();
    let canvas = state.canvas().unwrap();
    let p = resolve_photo_placement(photo.image.dimensions(), &photo.transform, canvas);
    (p.origin.x, p.origin.y)
}

#[test]
fn photo_scale_recenters_on_the_same_point() {
    let mut ed = loaded(EditorConfig::default());
    assert_eq!(photo_origin(&ed), (300.0, 200.0));

    assert!(ed.on_parameter_changed(ParamEvent::PhotoScale(2.0)));
    assert_eq!(photo_origin(&ed), (200.0, 100.0));

    let surface = ed.current_surface().unwrap();
    assert_eq!((surface.width(), surface.height()), (800, 600));
}

#[test]
fn scale_is_clamped_to_the_configured_range() {
    let mut ed = loaded(EditorConfig::default());
    ed.on_parameter_changed(ParamEvent::PhotoScale(1000.0));
    assert_eq!(ed.state().photo.as_ref().unwrap().transform.scale, 10.0);
    ed.on_parameter_changed(ParamEvent::PhotoScale(-3.0));
    assert_eq!(ed.state().photo.as_ref().unwrap().transform.scale, 1.0);
}

#[test]
fn stale_photo_decode_is_discarded() {
    let mut ed = editor(EditorConfig::default());
    ed.load_template_with(&SolidLoader, "classic").unwrap();

    let a = ed.select_photo(ImageSource::path("a.png"));
    let b = ed.select_photo(ImageSource::path("wide.png"));

    let b_img = SolidLoader.load(&b.source);
    assert_eq!(ed.finish_photo_load(b, b_img), LoadOutcome::Applied);
    let a_img = SolidLoader.load(&a.source);
    assert_eq!(ed.finish_photo_load(a, a_img), LoadOutcome::Stale);

    assert_eq!(
        ed.state().photo.as_ref().unwrap().image.dimensions(),
        (400, 100)
    );
}

#[test]
fn stale_template_decode_is_discarded_even_while_newer_is_pending() {
    let mut ed = editor(EditorConfig::default());
    let first = ed.select_template("classic").unwrap();
    let _second = ed.select_template("mini").unwrap();

    let img = SolidLoader.load(&first.source);
    assert_eq!(ed.finish_template_load(first, img), LoadOutcome::Stale);
    assert!(ed.state().template.is_none());
    assert!(ed.state().is_loading());
}

#[test]
fn template_switch_resizes_the_surface() {
    let mut ed = loaded(EditorConfig::default());
    assert_eq!(ed.current_surface().unwrap().canvas(), Canvas::new(800, 600).unwrap());

    ed.load_template_with(&SolidLoader, "mini").unwrap();
    let s = ed.current_surface().unwrap();
    assert_eq!((s.width(), s.height()), (40, 30));
}

#[test]
fn failed_template_decode_leaves_template_absent() {
    let mut ed = editor(EditorConfig::default());
    assert_eq!(
        ed.load_template_with(&SolidLoader, "broken").unwrap(),
        LoadOutcome::Failed
    );
    assert!(ed.state().template.is_none());
    assert!(ed.current_surface().is_none());
    assert!(ed.load_template_with(&SolidLoader, "nope").is_err());
}

#[test]
fn failed_photo_decode_keeps_the_editor_usable() {
    let mut ed = loaded(EditorConfig::default());
    assert_eq!(
        ed.load_photo_with(&SolidLoader, ImageSource::path("corrupt.jpg")),
        LoadOutcome::Failed
    );
    assert!(ed.state().photo.is_none());
    assert!(!ed.can_export());
    assert!(!ed.on_parameter_changed(ParamEvent::PhotoX(0.2)));
}

#[test]
fn new_photo_resets_the_transform() {
    let mut ed = loaded(EditorConfig::default());
    ed.on_parameter_changed(ParamEvent::PhotoX(0.1));
    ed.on_parameter_changed(ParamEvent::PhotoScale(3.0));
    ed.load_photo_with(&SolidLoader, ImageSource::path("b.png"));
    assert_eq!(
        ed.state().photo.as_ref().unwrap().transform,
        crate::scene::model::PhotoTransform::default()
    );
}

#[test]
fn drag_offsets_accumulate_regardless_of_batching() {
    let mut fine = loaded(EditorConfig::default());
    let mut coarse = loaded(EditorConfig::default());
    for ed in [&mut fine, &mut coarse] {
        ed.on_parameter_changed(ParamEvent::PointerDown {
            target: DragTarget::Photo,
            at: Point::new(10.0, 10.0),
        });
    }
    for step in 1..=8 {
        fine.on_parameter_changed(ParamEvent::PointerMove {
            target: DragTarget::Photo,
            at: Point::new(10.0 + 5.0 * f64::from(step), 10.0 + 2.5 * f64::from(step)),
        });
    }
    coarse.on_parameter_changed(ParamEvent::PointerMove {
        target: DragTarget::Photo,
        at: Point::new(50.0, 30.0),
    });

    let (fx, fy) = photo_origin(&fine);
    let (cx, cy) = photo_origin(&coarse);
    assert!((fx - 340.0).abs() < 1e-9 && (fy - 220.0).abs() < 1e-9);
    assert!((fx - cx).abs() < 1e-9 && (fy - cy).abs() < 1e-9);
}

#[test]
fn drag_respects_display_scale() {
    let mut ed = loaded(EditorConfig::default());
    assert_eq!(ed.resize_viewport((400.0, 300.0)).scale, 0.5);

    let target = DragTarget::Overlay("name".into());
    ed.on_parameter_changed(ParamEvent::PointerDown {
        target: target.clone(),
        at: Point::new(0.0, 0.0),
    });
    assert!(ed.is_dragging(&target));
    assert_eq!(
        ed.phase(&InputSource::Pointer(target.clone())),
        EditPhase::Editing(crate::session::input::EditKind::Dragging)
    );
    ed.on_parameter_changed(ParamEvent::PointerMove {
        target: target.clone(),
        at: Point::new(40.0, 30.0),
    });
    ed.on_parameter_changed(ParamEvent::CaptureLost {
        target: target.clone(),
    });
    assert!(!ed.is_dragging(&target));
    assert_eq!(ed.phase(&InputSource::Pointer(target)), EditPhase::Idle);

    let pos = ed.state().overlay("name").unwrap().position;
    assert!((pos.x - 0.6).abs() < 1e-9);
    assert!((pos.y - 0.2).abs() < 1e-9);

    // Moves after capture loss are ignored.
    assert!(!ed.on_parameter_changed(ParamEvent::PointerMove {
        target: DragTarget::Overlay("name".into()),
        at: Point::new(100.0, 100.0),
    }));
}

#[test]
fn viewport_resize_never_touches_pixels() {
    let mut ed = loaded(EditorConfig::default());
    let before = ed.current_surface().unwrap().digest();
    let count = ed.compose_count();
    ed.resize_viewport((123.0, 77.0));
    assert_eq!(ed.current_surface().unwrap().digest(), before);
    assert_eq!(ed.compose_count(), count);
}

#[test]
fn coalescing_defers_until_frame() {
    let mut ed = loaded(EditorConfig {
        coalesce: true,
        ..EditorConfig::default()
    });
    ed.on_frame();
    let count = ed.compose_count();
    for i in 0..5 {
        ed.on_parameter_changed(ParamEvent::PhotoX(0.1 * f64::from(i)));
    }
    assert_eq!(ed.compose_count(), count);
    assert!(ed.on_frame());
    assert_eq!(ed.compose_count(), count + 1);
    assert!(!ed.on_frame());
}

#[test]
fn edit_phases_follow_start_and_end() {
    let mut ed = loaded(EditorConfig::default());
    let src = InputSource::OverlayText("name".into());
    ed.on_parameter_changed(ParamEvent::EditStarted(src.clone()));
    assert_eq!(
        ed.phase(&src),
        EditPhase::Editing(crate::session::input::EditKind::Typing)
    );
    ed.on_parameter_changed(ParamEvent::OverlayText {
        id: "name".into(),
        text: "Ada".into(),
    });
    ed.on_parameter_changed(ParamEvent::EditEnded(src.clone()));
    assert_eq!(ed.phase(&src), EditPhase::Idle);
    assert_eq!(ed.state().overlay("name").unwrap().display_text(), "Ada");
}

#[test]
fn unknown_overlay_is_ignored() {
    let mut ed = loaded(EditorConfig::default());
    assert!(!ed.on_parameter_changed(ParamEvent::OverlayText {
        id: "ghost".into(),
        text: "boo".into(),
    }));
}

#[test]
fn export_requires_template_and_photo() {
    let exporter = Exporter::new(ExportOpts::default()).unwrap();
    let mut sink = MemorySink::new();

    let mut ed = editor(EditorConfig::default());
    assert!(matches!(ed.export(&exporter, &mut sink), ExportOutcome::Disabled));
    ed.load_template_with(&SolidLoader, "classic").unwrap();
    assert!(!ed.can_export());
    ed.load_photo_with(&SolidLoader, ImageSource::path("a.png"));
    assert!(ed.can_export());

    match ed.export(&exporter, &mut sink) {
        ExportOutcome::Persisted(img) => {
            assert_eq!((img.width, img.height), (800, 600));
            assert_eq!(img.file_name, "birthday-card.jpg");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(sink.images().len(), 1);
}

#[test]
fn photo_optional_when_configured() {
    let mut ed = editor(EditorConfig {
        require_photo: false,
        ..EditorConfig::default()
    });
    ed.load_template_with(&SolidLoader, "classic").unwrap();
    assert!(ed.can_export());
}

#[test]
fn confirmation_gate_resets_on_edit() {
    let mut ed = loaded(EditorConfig {
        require_confirm: true,
        ..EditorConfig::default()
    });
    assert!(!ed.can_export());
    assert!(ed.confirm());
    assert!(ed.can_export());
    ed.on_parameter_changed(ParamEvent::PhotoY(0.3));
    assert!(!ed.can_export());
}

struct FailingSink;

impl ExportSink for FailingSink {
    fn persist(&mut self, _image: &EncodedImage) -> CardResult<()> {
        Err(CardError::export("user cancelled"))
    }
}

#[test]
fn sink_failure_is_reported_and_editor_survives() {
    let exporter = Exporter::new(ExportOpts::default()).unwrap();
    let mut ed = loaded(EditorConfig::default());
    assert!(matches!(
        ed.export(&exporter, &mut FailingSink),
        ExportOutcome::Failed(CardError::Export(_))
    ));
    assert!(ed.on_parameter_changed(ParamEvent::PhotoX(0.25)));
    let mut sink = MemorySink::new();
    assert!(matches!(
        ed.export(&exporter, &mut sink),
        ExportOutcome::Persisted(_)
    ));
}
