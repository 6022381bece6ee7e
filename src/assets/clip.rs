use std::sync::Arc;

use crate::assets::media_type::MediaType;
use crate::foundation::error::{LivestripError, LivestripResult};

/// Minimum number of recorder chunks an extracted clip must contain.
pub const MIN_CLIP_CHUNKS: usize = 2;
/// Exclusive lower bound on clip payload size in bytes.
pub const MIN_CLIP_BYTES: usize = 50_000;
/// Number of leading bytes inspected by [`check_container_plausibility`].
pub const LEADING_PROBE_BYTES: usize = 100;

/// Validated recorded video segment for one shot.
///
/// Immutable once built. The payload is shared, so clones are cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clip {
    data: Arc<[u8]>,
    media_type: MediaType,
}

impl Clip {
    /// Assemble a clip from recorder chunks, enforcing the acceptance rule: at least
    /// [`MIN_CLIP_CHUNKS`] chunks and more than [`MIN_CLIP_BYTES`] bytes.
    pub fn from_chunks(chunks: Vec<Vec<u8>>, media_type: MediaType) -> LivestripResult<Self> {
        if chunks.len() < MIN_CLIP_CHUNKS {
            return Err(LivestripError::ClipTooFragmented {
                chunks: chunks.len(),
                min: MIN_CLIP_CHUNKS,
            });
        }
        let size: usize = chunks.iter().map(Vec::len).sum();
        if size <= MIN_CLIP_BYTES {
            return Err(LivestripError::ClipTooSmall {
                size,
                min: MIN_CLIP_BYTES,
            });
        }
        Ok(Self {
            data: chunks.concat().into(),
            media_type,
        })
    }

    /// Wrap an externally sourced payload, e.g. a clip file given on the command line.
    ///
    /// No checks run here. The compositor screens every clip it receives.
    pub fn from_payload(data: impl Into<Arc<[u8]>>, media_type: MediaType) -> Self {
        Self {
            data: data.into(),
            media_type,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Coarse container sanity check run before any decode is attempted.
///
/// Rejects empty payloads, payloads of at most [`MIN_CLIP_BYTES`], and payloads whose first
/// [`LEADING_PROBE_BYTES`] bytes are all zero.
pub fn check_container_plausibility(data: &[u8]) -> LivestripResult<()> {
    if data.is_empty() {
        return Err(LivestripError::clip_invalid("empty payload"));
    }
    if data.len() <= MIN_CLIP_BYTES {
        return Err(LivestripError::ClipTooSmall {
            size: data.len(),
            min: MIN_CLIP_BYTES,
        });
    }
    let head = &data[..data.len().min(LEADING_PROBE_BYTES)];
    if head.iter().all(|&b| b == 0) {
        return Err(LivestripError::clip_invalid("leading bytes are all zero"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/clip.rs"]
mod tests;
