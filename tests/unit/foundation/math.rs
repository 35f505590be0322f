use super::*;

#[test]
fn fnv_is_stable_and_order_sensitive() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"ab");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"ba");
    assert_ne!(a.finish(), b.finish());

    let empty = Fnv1a64::new_default().finish();
    assert_eq!(empty, Fnv1a64::OFFSET_BASIS);
}

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(100, 128), 50);
    assert_eq!(mul_div255_u8(0, 200), 0);
}

#[test]
fn premultiply_then_unpremultiply_keeps_opaque_and_clears_transparent() {
    let mut px = vec![10u8, 20, 30, 255, 200, 100, 50, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[10, 20, 30, 255]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);

    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[10, 20, 30, 255]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
}

#[test]
fn unpremultiply_half_alpha() {
    let mut px = vec![64u8, 0, 128, 128];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![128, 0, 255, 128]);
}
