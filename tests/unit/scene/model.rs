use super::*;

#[test]
fn template_canvas_mirrors_intrinsic_size() {
    let img = RasterImage::solid(8, 6, Rgba8::BLACK).unwrap();
    let t = Template::new("bday", img).unwrap();
    assert_eq!(
        t.canvas(),
        Canvas {
            width: 8,
            height: 6
        }
    );
    assert_eq!(t.image().dimensions(), (8, 6));
}

#[test]
fn new_photo_gets_centering_default() {
    let p = UserPhoto::new(RasterImage::solid(2, 2, Rgba8::WHITE).unwrap());
    assert_eq!(p.transform.position, Position::CENTER);
    assert_eq!(p.transform.scale, 1.0);
    assert!(p.transform.crop.is_none());
}

#[test]
fn empty_content_displays_placeholder() {
    let mut o = TextOverlay::new("name", Position::new(0.1, 0.2));
    o.placeholder = "Your name".to_owned();
    assert_eq!(o.display_text(), "Your name");

    o.content = "Ada".to_owned();
    assert_eq!(o.display_text(), "Ada");
}

#[test]
fn size_is_base_times_scale() {
    let mut o = TextOverlay::new("name", Position::CENTER);
    o.scale = 1.5;
    assert_eq!(o.size_px(), 90.0);
}

#[test]
fn font_spec_fills_defaults_from_json() {
    let f: FontSpec = serde_json::from_str(r#"{"family":"Serif"}"#).unwrap();
    assert_eq!(f.size_px, DEFAULT_FONT_SIZE_PX);
    assert_eq!(f.weight, 400.0);
    assert_eq!(f.slant, FontSlant::Normal);

    let b: TextBaseline = serde_json::from_str(r#""alphabetic""#).unwrap();
    assert_eq!(b, TextBaseline::Alphabetic);
}
