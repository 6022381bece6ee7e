use crate::capture::RecorderId;

/// Ordered recorder output for one recorder instance.
///
/// The buffer is tagged with the instance that fills it. Appends from any other instance are
/// refused, so chunks can never cross from one shot into another.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    owner: Option<RecorderId>,
    chunks: Vec<Vec<u8>>,
    bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the buffer to a new recorder instance. Returns what was discarded as
    /// `(chunks, bytes)`.
    pub fn reset_for(&mut self, owner: RecorderId) -> (usize, usize) {
        let discarded = (self.chunks.len(), self.bytes);
        self.owner = Some(owner);
        self.chunks.clear();
        self.bytes = 0;
        discarded
    }

    pub fn owner(&self) -> Option<RecorderId> {
        self.owner
    }

    /// Append a chunk from `from`. Returns `false`, leaving the buffer untouched, when `from`
    /// does not own the buffer.
    pub fn push(&mut self, from: RecorderId, chunk: Vec<u8>) -> bool {
        if self.owner != Some(from) {
            return false;
        }
        self.bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    /// Drain every chunk in order. Ownership is kept so late chunks still attribute correctly.
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        self.bytes = 0;
        std::mem::take(&mut self.chunks)
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/chunks.rs"]
mod tests;
