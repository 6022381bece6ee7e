use std::str::FromStr;

use crate::foundation::error::LivestripError;
use crate::foundation::math::clamp_channel;

/// Selectable per-slot filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Identity. `normal` is accepted as an alias.
    #[default]
    #[serde(alias = "normal")]
    None,
    Halftone,
    Dithered,
    Pixelated,
    Sepia,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        FilterKind::None,
        FilterKind::Halftone,
        FilterKind::Dithered,
        FilterKind::Pixelated,
        FilterKind::Sepia,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Halftone => "halftone",
            FilterKind::Dithered => "dithered",
            FilterKind::Pixelated => "pixelated",
            FilterKind::Sepia => "sepia",
        }
    }
}

impl FromStr for FilterKind {
    type Err = LivestripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "normal" => Ok(FilterKind::None),
            "halftone" => Ok(FilterKind::Halftone),
            "dithered" => Ok(FilterKind::Dithered),
            "pixelated" => Ok(FilterKind::Pixelated),
            "sepia" => Ok(FilterKind::Sepia),
            other => Err(LivestripError::validation(format!(
                "unknown filter '{other}' (expected one of none, halftone, dithered, pixelated, sepia)"
            ))),
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure per-pixel transform over an RGBA8 buffer.
///
/// Output has the same dimensions as the input. Alpha is left alone.
pub trait Filter: Send + Sync {
    fn apply(&self, pixels: &mut [u8], width: u32, height: u32, kind: FilterKind);
}

/// Built-in monochrome retro filters.
///
/// Every kind except [`FilterKind::None`] starts from luma gray.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetroFilter;

const HALFTONE_SPACING: usize = 6;
const HALFTONE_DOT: i64 = 2;
const HALFTONE_DARK_BELOW: f32 = 200.0;
const HALFTONE_BLEND: f32 = 0.7;
const DITHER_THRESHOLD: u8 = 128;
const PIXEL_BLOCK: usize = 6;

impl Filter for RetroFilter {
    fn apply(&self, pixels: &mut [u8], width: u32, height: u32, kind: FilterKind) {
        let (w, h) = (width as usize, height as usize);
        if kind == FilterKind::None || pixels.len() < w * h * 4 {
            return;
        }
        grayscale(pixels);
        match kind {
            FilterKind::None => {}
            FilterKind::Halftone => halftone(pixels, w, h),
            FilterKind::Dithered => dither(pixels, w, h),
            FilterKind::Pixelated => pixelate(pixels, w, h),
            FilterKind::Sepia => sepia(pixels),
        }
    }
}

fn grayscale(pixels: &mut [u8]) {
    for p in pixels.chunks_exact_mut(4) {
        let gray = clamp_channel(
            f32::from(p[0]) * 0.299 + f32::from(p[1]) * 0.587 + f32::from(p[2]) * 0.114,
        );
        p[0] = gray;
        p[1] = gray;
        p[2] = gray;
    }
}

fn halftone(pixels: &mut [u8], w: usize, h: usize) {
    let half = (HALFTONE_SPACING / 2) as i64;
    for y in (0..h).step_by(HALFTONE_SPACING) {
        for x in (0..w).step_by(HALFTONE_SPACING) {
            let mut total = 0u32;
            let mut count = 0u32;
            for sy in y..(y + HALFTONE_SPACING).min(h) {
                for sx in x..(x + HALFTONE_SPACING).min(w) {
                    total += u32::from(pixels[(sy * w + sx) * 4]);
                    count += 1;
                }
            }
            let avg = total as f32 / count as f32;
            if avg >= HALFTONE_DARK_BELOW {
                continue;
            }
            let radius = (avg / 255.0 * (HALFTONE_DOT as f32 * 0.6)).floor();

            for dy in -HALFTONE_DOT..=HALFTONE_DOT {
                for dx in -HALFTONE_DOT..=HALFTONE_DOT {
                    let px = x as i64 + half + dx;
                    let py = y as i64 + half + dy;
                    if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                        continue;
                    }
                    if (((dx * dx + dy * dy) as f32).sqrt()) > radius {
                        continue;
                    }
                    let idx = (py as usize * w + px as usize) * 4;
                    for c in &mut pixels[idx..idx + 3] {
                        *c = clamp_channel(f32::from(*c) * HALFTONE_BLEND);
                    }
                }
            }
        }
    }
}

/// Floyd-Steinberg to black and white. Error is diffused through the red channel, which holds
/// the gray value, and every write saturates like a clamped byte array.
fn dither(pixels: &mut [u8], w: usize, h: usize) {
    let diffuse = |pixels: &mut [u8], idx: usize, amount: f32| {
        pixels[idx] = clamp_channel(f32::from(pixels[idx]) + amount);
    };
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            let old = pixels[i];
            let new = if old < DITHER_THRESHOLD { 0 } else { 255 };
            pixels[i] = new;
            pixels[i + 1] = new;
            pixels[i + 2] = new;

            let err = f32::from(old) - f32::from(new);
            if x + 1 < w {
                diffuse(pixels, i + 4, err * 7.0 / 16.0);
            }
            if y + 1 < h {
                let below = ((y + 1) * w + x) * 4;
                if x > 0 {
                    diffuse(pixels, below - 4, err * 3.0 / 16.0);
                }
                diffuse(pixels, below, err * 5.0 / 16.0);
                if x + 1 < w {
                    diffuse(pixels, below + 4, err / 16.0);
                }
            }
        }
    }
}

fn pixelate(pixels: &mut [u8], w: usize, h: usize) {
    for y in (0..h).step_by(PIXEL_BLOCK) {
        for x in (0..w).step_by(PIXEL_BLOCK) {
            let value = pixels[(y * w + x) * 4];
            for by in y..(y + PIXEL_BLOCK).min(h) {
                for bx in x..(x + PIXEL_BLOCK).min(w) {
                    let idx = (by * w + bx) * 4;
                    pixels[idx..idx + 3].fill(value);
                }
            }
        }
    }
}

fn sepia(pixels: &mut [u8]) {
    for p in pixels.chunks_exact_mut(4) {
        let (r, g, b) = (f32::from(p[0]), f32::from(p[1]), f32::from(p[2]));
        p[0] = clamp_channel(r * 0.393 + g * 0.769 + b * 0.189);
        p[1] = clamp_channel(r * 0.349 + g * 0.686 + b * 0.168);
        p[2] = clamp_channel(r * 0.272 + g * 0.534 + b * 0.131);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filters.rs"]
mod tests;
