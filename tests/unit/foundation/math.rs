use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(0.5), 128);
    assert_eq!(unit_to_u8(7.0), 255);
}

#[test]
fn clamp_channel_rounds_like_clamped_arrays() {
    assert_eq!(clamp_channel(-12.0), 0);
    assert_eq!(clamp_channel(127.5), 128);
    assert_eq!(clamp_channel(300.0), 255);
}
