use std::time::Duration;

/// Convenience result type used across livestrip.
pub type LivestripResult<T> = Result<T, LivestripError>;

/// Top-level error taxonomy used by the recording and compositing APIs.
///
/// Per-clip variants (`ClipTooSmall`, `ClipTooFragmented`, `ClipInvalid`, `MetadataTimeout`,
/// `Decode`) are recovered locally by the compositor and only surface in logs. Callers of
/// [`crate::Compositor::run`] observe `NoUsableMaterial`, `EncoderFailure` and `Validation`.
#[derive(thiserror::Error, Debug)]
pub enum LivestripError {
    /// None of the preferred media types is supported by the recorder or encoder.
    #[error("unsupported codec: none of [{}] is supported", .tried.join(", "))]
    UnsupportedCodec {
        /// Media types tried, in preference order.
        tried: Vec<String>,
    },

    /// The capture stream has no video track in the `live` readiness state.
    #[error("capture track is not live")]
    TrackNotLive,

    /// Clip payload is at or below the minimum accepted byte size.
    #[error("clip too small: {size} bytes (minimum is more than {min} bytes)")]
    ClipTooSmall {
        /// Observed payload size.
        size: usize,
        /// Exclusive lower bound.
        min: usize,
    },

    /// Clip was assembled from too few recorder chunks.
    #[error("clip too fragmented: {chunks} chunk(s) (minimum is {min})")]
    ClipTooFragmented {
        /// Observed chunk count.
        chunks: usize,
        /// Inclusive lower bound.
        min: usize,
    },

    /// Clip payload failed the container plausibility check.
    #[error("clip invalid: {0}")]
    ClipInvalid(String),

    /// Metadata decode for a slot did not finish within the per-clip budget.
    #[error("metadata decode for slot {slot} timed out after {timeout:?}")]
    MetadataTimeout {
        /// Slot whose clip timed out.
        slot: usize,
        /// Budget that elapsed.
        timeout: Duration,
    },

    /// Zero clips survived validation and loading.
    #[error("no usable material: every clip is missing or invalid")]
    NoUsableMaterial,

    /// The output encoder reported a failure.
    #[error("encoder failure: {0}")]
    EncoderFailure(String),

    /// Decoder could not read a clip.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid configuration or job input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LivestripError {
    /// Build a [`LivestripError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LivestripError::EncoderFailure`] value.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::EncoderFailure(msg.into())
    }

    /// Build a [`LivestripError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`LivestripError::ClipInvalid`] value.
    pub fn clip_invalid(msg: impl Into<String>) -> Self {
        Self::ClipInvalid(msg.into())
    }

    /// Build a [`LivestripError::UnsupportedCodec`] from a preference list.
    pub fn unsupported_codec<S: AsRef<str>>(tried: &[S]) -> Self {
        Self::UnsupportedCodec {
            tried: tried.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Return `true` for faults the compositor recovers from by dropping a single clip.
    pub fn is_per_clip(&self) -> bool {
        matches!(
            self,
            Self::ClipTooSmall { .. }
                | Self::ClipTooFragmented { .. }
                | Self::ClipInvalid(_)
                | Self::MetadataTimeout { .. }
                | Self::Decode(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
