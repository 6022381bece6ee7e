use image::{Rgba, RgbaImage};
use kurbo::{BezPath, Circle, Point, Rect, Shape};

use crate::foundation::core::{BLACK, PixelRect, WHITE};

/// Static ornamentation drawn around the composited slots.
///
/// All geometry is given in output pixels; `scale` is the factor between the reference strip
/// (800 px wide) and the output, so implementations can size strokes and ornaments without
/// knowing the output resolution. Implementations draw only; nothing is read back.
pub trait Decorator: Send + Sync {
    /// Paint the canvas and strip backgrounds. Runs first on every frame.
    fn draw_background(&self, target: &mut RgbaImage, strip: Rect, scale: f64) {
        let _ = scale;
        let full = Rect::new(0.0, 0.0, f64::from(target.width()), f64::from(target.height()));
        fill_rect(target, full, BLACK);
        fill_rect(target, strip, WHITE);
    }

    /// Decorate one slot region. Runs after the slot's frame has been composited and filtered,
    /// and also for slots that have no clip.
    fn draw_slot(
        &self,
        target: &mut RgbaImage,
        region: Rect,
        slot_index: usize,
        slot_count: usize,
        scale: f64,
    );

    /// Strip-level ornaments (header, footer with optional caption, outer border). Runs last.
    fn draw_strip(&self, target: &mut RgbaImage, strip: Rect, caption: Option<&str>, scale: f64);
}

/// Draws backgrounds only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDecorations;

impl Decorator for NoDecorations {
    fn draw_slot(&self, _: &mut RgbaImage, _: Rect, _: usize, _: usize, _: f64) {}

    fn draw_strip(&self, _: &mut RgbaImage, _: Rect, _: Option<&str>, _: f64) {}
}

/// Black-and-white photobooth ornaments: double slot borders, corner wedges, numbered badges,
/// header and footer rules, and a double outer border.
///
/// Text (badge digits, caption) is not rendered; badges show their number as tally marks.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetroDecorator;

impl Decorator for RetroDecorator {
    fn draw_slot(
        &self,
        target: &mut RgbaImage,
        region: Rect,
        slot_index: usize,
        _slot_count: usize,
        s: f64,
    ) {
        stroke_rect(target, region, 8.0 * s, BLACK);
        stroke_rect(target, shrink(region, 12.0 * s), 3.0 * s, BLACK);

        let (x0, y0, x1, y1) = (region.x0, region.y0, region.x1, region.y1);
        let (size, off) = (20.0 * s, 8.0 * s);
        let corners = [
            [(x0 - off, y0 - off), (x0 + size, y0 - off), (x0 - off, y0 + size)],
            [(x1 + off, y0 - off), (x1 - size, y0 - off), (x1 + off, y0 + size)],
            [(x0 - off, y1 + off), (x0 + size, y1 + off), (x0 - off, y1 - size)],
            [(x1 + off, y1 + off), (x1 - size, y1 + off), (x1 + off, y1 - size)],
        ];
        for tri in corners {
            fill_shape(target, &triangle(tri), BLACK);
        }

        // Badge, top right.
        let badge = Rect::new(x1 - 50.0 * s, y0 + 10.0 * s, x1 - 10.0 * s, y0 + 40.0 * s);
        fill_rect(target, badge, WHITE);
        stroke_rect(target, badge, 3.0 * s, BLACK);
        let marks = (slot_index + 1).min(5);
        let pitch = 6.0 * s;
        let start = badge.center().x - pitch * (marks as f64 - 1.0) / 2.0;
        for i in 0..marks {
            let cx = start + pitch * i as f64;
            fill_rect(
                target,
                Rect::new(cx - 1.5 * s, badge.y0 + 8.0 * s, cx + 1.5 * s, badge.y1 - 8.0 * s),
                BLACK,
            );
        }

        // Dot row above the slot.
        for i in 0..8 {
            let c = Point::new(x0 + (20.0 + 90.0 * f64::from(i)) * s, y0 - 15.0 * s);
            if c.x < x1 {
                fill_shape(target, &Circle::new(c, 4.0 * s), BLACK);
            }
        }

        // Tick marks on both sides.
        for i in 0..5 {
            let y = y0 + (50.0 + 100.0 * f64::from(i)) * s;
            if y > y1 {
                break;
            }
            let half = 1.0 * s;
            fill_rect(target, Rect::new(x0 - 12.0 * s, y - half, x0 - 5.0 * s, y + half), BLACK);
            fill_rect(target, Rect::new(x1 + 5.0 * s, y - half, x1 + 12.0 * s, y + half), BLACK);
        }
    }

    fn draw_strip(&self, target: &mut RgbaImage, strip: Rect, caption: Option<&str>, s: f64) {
        let cx = strip.center().x;

        // Header rule.
        let header_y = strip.y0 + 25.0 * s + 50.0 * s;
        fill_rect(
            target,
            Rect::new(cx - 100.0 * s, header_y - 1.5 * s, cx + 100.0 * s, header_y + 1.5 * s),
            BLACK,
        );

        // Footer rule sits a little higher when a caption is present.
        let footer_y = strip.y1 - 20.0 * s;
        let has_caption = caption.is_some_and(|c| !c.trim().is_empty());
        let rule_y = footer_y - (if has_caption { 28.0 } else { 25.0 }) * s;
        fill_rect(
            target,
            Rect::new(cx - 100.0 * s, rule_y - 1.5 * s, cx + 100.0 * s, rule_y + 1.5 * s),
            BLACK,
        );

        // Corner studs.
        let d = 20.0 * s;
        for c in [
            Point::new(strip.x0 + d, strip.y0 + d),
            Point::new(strip.x1 - d, strip.y0 + d),
            Point::new(strip.x0 + d, strip.y1 - d),
            Point::new(strip.x1 - d, strip.y1 - d),
        ] {
            fill_shape(target, &Circle::new(c, 12.0 * s), BLACK);
        }

        // Side dots.
        for i in 0..10 {
            let y = strip.y0 + (60.0 + 50.0 * f64::from(i)) * s;
            if y >= strip.y1 - 60.0 * s {
                break;
            }
            fill_shape(target, &Circle::new((strip.x0 + 15.0 * s, y), 3.0 * s), BLACK);
            fill_shape(target, &Circle::new((strip.x1 - 15.0 * s, y), 3.0 * s), BLACK);
        }

        stroke_rect(target, shrink(strip, 6.0 * s), 12.0 * s, BLACK);
        stroke_rect(target, shrink(strip, 18.0 * s), 4.0 * s, BLACK);
    }
}

/// Fill `rect`, snapped to whole pixels and clipped to the target.
pub fn fill_rect(target: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let px = PixelRect::snap(rect, target.width(), target.height());
    for y in px.y..px.y + px.height {
        for x in px.x..px.x + px.width {
            target.put_pixel(x, y, color);
        }
    }
}

/// Stroke the outline of `rect` with a line of `width` centred on its edges.
pub fn stroke_rect(target: &mut RgbaImage, rect: Rect, width: f64, color: Rgba<u8>) {
    let h = width / 2.0;
    let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
    fill_rect(target, Rect::new(x0 - h, y0 - h, x1 + h, y0 + h), color);
    fill_rect(target, Rect::new(x0 - h, y1 - h, x1 + h, y1 + h), color);
    fill_rect(target, Rect::new(x0 - h, y0 + h, x0 + h, y1 - h), color);
    fill_rect(target, Rect::new(x1 - h, y0 + h, x1 + h, y1 - h), color);
}

/// Fill every pixel whose centre lies inside `shape`.
pub fn fill_shape(target: &mut RgbaImage, shape: &impl Shape, color: Rgba<u8>) {
    let bbox = PixelRect::snap(shape.bounding_box().expand(), target.width(), target.height());
    for y in bbox.y..bbox.y + bbox.height {
        for x in bbox.x..bbox.x + bbox.width {
            if shape.contains(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5)) {
                target.put_pixel(x, y, color);
            }
        }
    }
}

fn shrink(rect: Rect, d: f64) -> Rect {
    Rect::new(rect.x0 + d, rect.y0 + d, rect.x1 - d, rect.y1 - d)
}

fn triangle(pts: [(f64, f64); 3]) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(pts[0]);
    path.line_to(pts[1]);
    path.line_to(pts[2]);
    path.close_path();
    path
}

#[cfg(test)]
#[path = "../../tests/unit/effects/decorations.rs"]
mod tests;
