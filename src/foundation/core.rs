use crate::foundation::error::{LivestripError, LivestripResult};

pub use image::{Rgba, RgbaImage};
pub use kurbo::Rect;

/// Opaque black, used for the output canvas background.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Opaque white, used for the strip background and empty slot buffers.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Integer pixel rectangle inside a frame buffer.
///
/// Region geometry is computed in floating point ([`Rect`]) and snapped to pixels only when a
/// buffer is allocated or blitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Snap `rect` to whole pixels, clipped to a `bound_w` x `bound_h` buffer.
    pub fn snap(rect: Rect, bound_w: u32, bound_h: u32) -> Self {
        let x0 = rect.x0.round().clamp(0.0, f64::from(bound_w)) as u32;
        let y0 = rect.y0.round().clamp(0.0, f64::from(bound_h)) as u32;
        let x1 = rect.x1.round().clamp(0.0, f64::from(bound_w)) as u32;
        let y1 = rect.y1.round().clamp(0.0, f64::from(bound_h)) as u32;
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Centre pixel, useful for sampling a region.
    pub fn center(self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Validate dimensions for raw-frame encoding.
    pub fn validate(self) -> LivestripResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LivestripError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output needs even dimensions.
            return Err(LivestripError::validation(
                "canvas width/height must be even",
            ));
        }
        Ok(())
    }

    /// Allocate a frame buffer of this size filled with `fill`.
    pub fn allocate(self, fill: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(self.width, self.height, fill)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
