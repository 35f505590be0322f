use super::*;
use crate::foundation::core::Canvas;

fn surface_with(w: u32, h: u32, premul_px: [u8; 4]) -> Surface {
    let mut s = Surface::new(Canvas::new(w, h).unwrap()).unwrap();
    for px in s.pixmap_mut().data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&premul_px);
    }
    s
}

#[test]
fn jpeg_keeps_full_surface_resolution() {
    let s = surface_with(80, 60, [30, 60, 90, 255]);
    let out = Exporter::new(ExportOpts::default())
        .unwrap()
        .encode(&s)
        .unwrap();
    assert_eq!((out.width, out.height), (80, 60));
    assert_eq!(out.format, ExportFormat::Jpeg);
    assert_eq!(out.file_name, "birthday-card.jpg");

    let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (80, 60));
}

#[test]
fn png_round_trips_straight_alpha() {
    let s = surface_with(3, 2, [64, 0, 128, 128]);
    let opts = ExportOpts {
        format: ExportFormat::Png,
        file_name: "card.png".to_owned(),
        ..ExportOpts::default()
    };
    let out = Exporter::new(opts).unwrap().encode(&s).unwrap();
    let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert_eq!(decoded.get_pixel(2, 1).0, [128, 0, 255, 128]);
}

#[test]
fn flatten_uses_background_for_transparency() {
    let premul = [0, 0, 0, 0, 10, 20, 30, 255, 50, 0, 0, 128];
    let rgb = flatten_premul_to_rgb(&premul, Rgba8::opaque(255, 255, 255));
    assert_eq!(&rgb[0..3], &[255, 255, 255]);
    assert_eq!(&rgb[3..6], &[10, 20, 30]);
    assert_eq!(&rgb[6..9], &[50 + 127, 127, 127]);
}

#[test]
fn opts_validation() {
    assert!(ExportOpts::default().validate().is_ok());
    let bad = ExportOpts {
        quality: 0,
        ..ExportOpts::default()
    };
    assert!(Exporter::new(bad).is_err());
    let blank = ExportOpts {
        file_name: "  ".to_owned(),
        ..ExportOpts::default()
    };
    assert!(blank.validate().is_err());
    assert_eq!(ExportFormat::Png.extension(), "png");
}
