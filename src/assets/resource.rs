use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::assets::clip::Clip;
use crate::foundation::error::LivestripResult;

/// Owned playback resource: a scratch file holding one clip's payload so a decoder can read it.
///
/// [`PlaybackResource::release`] removes the file. Dropping an unreleased resource removes it
/// too, so the file is gone exactly once on every path.
#[derive(Debug)]
pub struct PlaybackResource {
    file: Option<NamedTempFile>,
    slot: usize,
}

impl PlaybackResource {
    /// Write `clip` into a new scratch file under `dir`.
    pub fn create(dir: &Path, slot: usize, clip: &Clip) -> LivestripResult<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create scratch dir '{}'", dir.display()))?;
        let mut file = tempfile::Builder::new()
            .prefix(&format!("livestrip-slot{slot}-"))
            .suffix(&format!(".{}", clip.media_type().extension()))
            .tempfile_in(dir)
            .with_context(|| format!("create playback file in '{}'", dir.display()))?;
        file.write_all(clip.data())
            .context("write clip payload to playback file")?;
        file.flush().context("flush playback file")?;
        tracing::debug!(slot, path = %file.path().display(), bytes = clip.size(), "playback resource created");
        Ok(Self {
            file: Some(file),
            slot,
        })
    }

    /// Path of the backing file. `None` once released.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(NamedTempFile::path)
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Remove the backing file.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => tracing::debug!(slot = self.slot, path = %path.display(), "playback resource released"),
            Err(e) => tracing::warn!(slot = self.slot, path = %path.display(), "failed to remove playback file: {e}"),
        }
    }
}

impl Drop for PlaybackResource {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resource.rs"]
mod tests;
