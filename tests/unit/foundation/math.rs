use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 128), 128);
    assert_eq!(mul_div255_u16(0, 200), 0);
}

#[test]
fn blend_channel_endpoints() {
    assert_eq!(blend_channel(10, 200, 0), 10);
    assert_eq!(blend_channel(10, 200, 255), 200);
    assert_eq!(blend_channel(0, 255, 153), 153);
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(0.6), 153);
    assert_eq!(unit_to_u8(2.0), 255);
}

#[test]
fn fnv_is_order_sensitive() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"ab");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"ba");
    assert_ne!(a.finish(), b.finish());

    let mut c = Fnv1a64::new_default();
    c.write_u32(7);
    assert_ne!(c.finish(), Fnv1a64::OFFSET_BASIS);
}
