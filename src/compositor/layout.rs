use kurbo::Rect;

use crate::foundation::core::Canvas;

/// Reference strip geometry, in reference pixels.
pub const STRIP_WIDTH: f64 = 800.0;
pub const PHOTO_HEIGHT: f64 = 600.0;
pub const BORDER: f64 = 30.0;
pub const INNER_BORDER: f64 = 20.0;
pub const HEADER_PADDING: f64 = 80.0;
pub const FOOTER_PADDING: f64 = 100.0;
/// Vertical margin kept free around the strip in the output canvas.
pub const CANVAS_MARGIN: f64 = 100.0;

/// Placement of the photo strip and its slots inside the output canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct StripLayout {
    /// Reference-to-output scale factor.
    pub scale: f64,
    /// Strip bounds in output pixels, centred in the canvas.
    pub strip: Rect,
    /// Slot regions in output pixels, indexed by slot.
    pub slots: Vec<Rect>,
}

impl StripLayout {
    /// Height of the reference strip for `slot_count` photos.
    pub fn reference_height(slot_count: usize) -> f64 {
        let n = slot_count as f64;
        PHOTO_HEIGHT * n
            + BORDER * 2.0
            + INNER_BORDER * (n - 1.0).max(0.0)
            + HEADER_PADDING
            + FOOTER_PADDING
    }

    pub fn new(slot_count: usize, canvas: Canvas) -> Self {
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        let total = Self::reference_height(slot_count);
        let scale = ((h - CANVAS_MARGIN) / total).min(w / STRIP_WIDTH).max(0.0);

        let strip_w = STRIP_WIDTH * scale;
        let strip_h = total * scale;
        let strip_x = (w - strip_w) / 2.0;
        let strip_y = (h - strip_h) / 2.0;
        let strip = Rect::new(strip_x, strip_y, strip_x + strip_w, strip_y + strip_h);

        let slot_x = strip_x + BORDER * scale;
        let slot_w = strip_w - 2.0 * BORDER * scale;
        let photo_h = PHOTO_HEIGHT * scale;
        let first_y = strip_y + (BORDER + HEADER_PADDING) * scale;
        let pitch = (PHOTO_HEIGHT + INNER_BORDER) * scale;
        let slots = (0..slot_count)
            .map(|i| {
                let y = first_y + i as f64 * pitch;
                Rect::new(slot_x, y, slot_x + slot_w, y + photo_h)
            })
            .collect();

        Self {
            scale,
            strip,
            slots,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Centre crop of a `src_w` x `src_h` frame to `target_aspect` (width over height).
pub fn cover_crop(src_w: u32, src_h: u32, target_aspect: f64) -> Rect {
    let (w, h) = (f64::from(src_w), f64::from(src_h));
    if src_w == 0 || src_h == 0 || !target_aspect.is_finite() || target_aspect <= 0.0 {
        return Rect::new(0.0, 0.0, w, h);
    }
    if w / h > target_aspect {
        let cw = h * target_aspect;
        let x = (w - cw) / 2.0;
        Rect::new(x, 0.0, x + cw, h)
    } else {
        let ch = w / target_aspect;
        let y = (h - ch) / 2.0;
        Rect::new(0.0, y, w, y + ch)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/layout.rs"]
mod tests;
