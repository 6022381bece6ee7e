use super::*;

#[test]
fn snap_rounds_and_clips_to_bounds() {
    let r = PixelRect::snap(Rect::new(-3.2, 10.4, 50.6, 200.0), 40, 100);
    assert_eq!(
        r,
        PixelRect {
            x: 0,
            y: 10,
            width: 40,
            height: 90
        }
    );
}

#[test]
fn inverted_rect_snaps_to_empty() {
    let r = PixelRect::snap(Rect::new(20.0, 20.0, 10.0, 10.0), 100, 100);
    assert!(r.is_empty());
}

#[test]
fn canvas_validation_requires_even_non_zero() {
    assert!(Canvas { width: 0, height: 10 }.validate().is_err());
    assert!(Canvas { width: 11, height: 10 }.validate().is_err());
    assert!(Canvas { width: 1080, height: 1920 }.validate().is_ok());
}
