//! Pixel-level effects applied by the compositor: blending, filters and decorations.

/// Premultiplied source-over blending.
pub mod composite;
/// Decoration interface and the built-in decorators.
pub mod decorations;
/// Filter interface and the built-in retro filters.
pub mod filters;
