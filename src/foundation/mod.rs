//! Shared primitives: pixel geometry, blend arithmetic, the error taxonomy and the debounce timer.

/// Pixel geometry and frame buffer helpers.
pub mod core;
/// Quiet-window timer over `tokio::sync::watch`.
pub mod debounce;
/// Crate error taxonomy.
pub mod error;
pub(crate) mod math;
