use super::*;
use crate::assets::crop::{CropRect, RegionCrop};
use crate::foundation::core::Position;
use crate::foundation::error::{CardError, CardResult};

fn template(w: u32, h: u32) -> Template {
    Template::new("t", RasterImage::solid(w, h, Rgba8::opaque(200, 0, 0)).unwrap()).unwrap()
}

fn photo(w: u32, h: u32) -> UserPhoto {
    UserPhoto::new(RasterImage::solid(w, h, Rgba8::opaque(0, 0, 200)).unwrap())
}

fn overlays() -> Vec<TextOverlay> {
    let mut name = TextOverlay::new("name", Position::new(0.1, 0.2));
    name.placeholder = "Your name".to_owned();
    let mut msg = TextOverlay::new("message", Position::new(0.5, 0.9));
    msg.content = "Happy birthday".to_owned();
    vec![name, msg]
}

fn inputs<'a>(
    t: Option<&'a Template>,
    p: Option<&'a UserPhoto>,
    o: &'a [TextOverlay],
) -> LayerInputs<'a> {
    LayerInputs {
        template: t,
        photo: p,
        overlays: o,
        clip: None,
        crop: &RegionCrop,
        crop_output_px: None,
    }
}

#[test]
fn no_template_means_no_layers() {
    let p = photo(2, 2);
    assert!(build_layers(&inputs(None, Some(&p), &[])).is_none());
}

#[test]
fn order_is_photo_template_then_overlays_in_declaration_order() {
    let t = template(800, 600);
    let p = photo(200, 200);
    let o = overlays();
    let stack = build_layers(&inputs(Some(&t), Some(&p), &o)).unwrap();

    assert_eq!(
        stack.kinds(),
        vec![
            LayerKind::Photo,
            LayerKind::Template,
            LayerKind::Text,
            LayerKind::Text
        ]
    );
    let ids: Vec<_> = stack.text_layers().map(|t| t.overlay_id.as_str()).collect();
    assert_eq!(ids, vec!["name", "message"]);
    assert_eq!(
        stack.canvas,
        Canvas {
            width: 800,
            height: 600
        }
    );
}

#[test]
fn template_is_painted_exactly_once() {
    let t = template(4, 4);
    let p = photo(2, 2);
    let stack = build_layers(&inputs(Some(&t), Some(&p), &[])).unwrap();
    let n = stack
        .kinds()
        .into_iter()
        .filter(|k| *k == LayerKind::Template)
        .count();
    assert_eq!(n, 1);
}

#[test]
fn missing_photo_skips_only_the_photo_layer() {
    let t = template(4, 4);
    let o = overlays();
    let stack = build_layers(&inputs(Some(&t), None, &o)).unwrap();
    assert_eq!(
        stack.kinds(),
        vec![LayerKind::Template, LayerKind::Text, LayerKind::Text]
    );
}

#[test]
fn empty_text_renders_placeholder_at_the_same_position() {
    let t = template(1000, 500);
    let mut o = overlays();
    let empty = build_layers(&inputs(Some(&t), None, &o)).unwrap();
    let name_empty = empty.text_layers().next().unwrap().clone();
    assert_eq!(name_empty.text, "Your name");

    o[0].content = "Grace".to_owned();
    let filled = build_layers(&inputs(Some(&t), None, &o)).unwrap();
    let name_filled = filled.text_layers().next().unwrap();
    assert_eq!(name_filled.text, "Grace");
    assert_eq!(name_filled.origin, name_empty.origin);
    assert_eq!(name_filled.origin, Point::new(100.0, 100.0));
}

#[test]
fn clip_moves_photo_above_template_and_resolves_circle() {
    let t = template(800, 600);
    let p = photo(100, 100);
    let mut i = inputs(Some(&t), Some(&p), &[]);
    i.clip = Some(ClipCircle {
        center: Position::new(0.25, 0.5),
        radius: 0.25,
    });
    let stack = build_layers(&i).unwrap();
    assert_eq!(stack.kinds(), vec![LayerKind::Template, LayerKind::Photo]);
    let clip = stack.photo_layer().unwrap().clip.unwrap();
    assert_eq!(clip.center, Point::new(200.0, 300.0));
    assert_eq!(clip.radius, 150.0);
}

#[test]
fn crop_region_drives_placement_size() {
    let t = template(800, 600);
    let mut p = photo(400, 400);
    p.transform.crop = Some(CropRect::new(0, 0, 100, 50));
    let stack = build_layers(&inputs(Some(&t), Some(&p), &[])).unwrap();
    let layer = stack.photo_layer().unwrap();
    assert_eq!(layer.image.dimensions(), (100, 50));
    assert_eq!(layer.placement.origin, Point::new(350.0, 275.0));
}

#[test]
fn crop_output_size_is_requested_from_provider() {
    struct FixedCrop;
    impl CropProvider for FixedCrop {
        fn cropped_region(
            &self,
            _photo: &RasterImage,
            _region: CropRect,
            requested: (u32, u32),
        ) -> CardResult<RasterImage> {
            RasterImage::solid(requested.0, requested.1, Rgba8::opaque(0, 255, 0))
        }
    }

    let t = template(100, 100);
    let mut p = photo(10, 10);
    p.transform.crop = Some(CropRect::new(0, 0, 5, 5));
    let mut i = inputs(Some(&t), Some(&p), &[]);
    i.crop = &FixedCrop;
    i.crop_output_px = Some(40);
    let stack = build_layers(&i).unwrap();
    assert_eq!(stack.photo_layer().unwrap().image.dimensions(), (40, 40));
}

#[test]
fn failing_crop_provider_drops_photo_layer() {
    struct Broken;
    impl CropProvider for Broken {
        fn cropped_region(
            &self,
            _photo: &RasterImage,
            _region: CropRect,
            _requested: (u32, u32),
        ) -> CardResult<RasterImage> {
            Err(CardError::render("widget gone"))
        }
    }

    let t = template(10, 10);
    let mut p = photo(10, 10);
    p.transform.crop = Some(CropRect::new(0, 0, 5, 5));
    let mut i = inputs(Some(&t), Some(&p), &[]);
    i.crop = &Broken;
    let stack = build_layers(&i).unwrap();
    assert_eq!(stack.kinds(), vec![LayerKind::Template]);
}
