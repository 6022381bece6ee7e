use super::*;

fn white(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, WHITE)
}

#[test]
fn fill_rect_clips_to_target() {
    let mut img = white(10, 10);
    fill_rect(&mut img, Rect::new(-5.0, -5.0, 3.0, 3.0), BLACK);
    assert_eq!(*img.get_pixel(0, 0), BLACK);
    assert_eq!(*img.get_pixel(2, 2), BLACK);
    assert_eq!(*img.get_pixel(3, 3), WHITE);
}

#[test]
fn stroke_rect_leaves_interior() {
    let mut img = white(20, 20);
    stroke_rect(&mut img, Rect::new(4.0, 4.0, 16.0, 16.0), 2.0, BLACK);
    assert_eq!(*img.get_pixel(4, 10), BLACK);
    assert_eq!(*img.get_pixel(10, 15), BLACK);
    assert_eq!(*img.get_pixel(10, 10), WHITE);
}

#[test]
fn fill_shape_tests_pixel_centres() {
    let mut img = white(20, 20);
    fill_shape(&mut img, &Circle::new((10.0, 10.0), 3.0), BLACK);
    assert_eq!(*img.get_pixel(10, 10), BLACK);
    assert_eq!(*img.get_pixel(2, 2), WHITE);
    assert_eq!(*img.get_pixel(16, 10), WHITE);
}

#[test]
fn background_paints_canvas_black_and_strip_white() {
    let mut img = RgbaImage::from_pixel(40, 40, Rgba([9, 9, 9, 255]));
    NoDecorations.draw_background(&mut img, Rect::new(10.0, 10.0, 30.0, 30.0), 1.0);
    assert_eq!(*img.get_pixel(0, 0), BLACK);
    assert_eq!(*img.get_pixel(20, 20), WHITE);
}

#[test]
fn retro_slot_keeps_region_centre_untouched() {
    let mut img = white(400, 300);
    let region = Rect::new(20.0, 20.0, 380.0, 280.0);
    RetroDecorator.draw_slot(&mut img, region, 0, 3, 0.5);
    assert_eq!(*img.get_pixel(200, 150), WHITE);
    // Outer border straddles the region edge.
    assert_eq!(*img.get_pixel(20, 150), BLACK);
}

#[test]
fn retro_strip_draws_outer_border() {
    let mut img = white(200, 400);
    let strip = Rect::new(0.0, 0.0, 200.0, 400.0);
    RetroDecorator.draw_strip(&mut img, strip, Some("party"), 0.25);
    // 12 * 0.25 px border centred 1.5 px in from the edge.
    assert_eq!(*img.get_pixel(1, 200), BLACK);
    assert_eq!(*img.get_pixel(100, 200), WHITE);
}
