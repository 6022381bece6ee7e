use std::fmt;

/// MIME-style media type such as `video/webm;codecs=vp9`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Container part, e.g. `video/webm` for `video/webm;codecs=vp9`.
    pub fn container(&self) -> &str {
        self.0.split(';').next().unwrap_or("").trim()
    }

    /// Codec named in the `codecs=` parameter, if any.
    pub fn codec(&self) -> Option<&str> {
        self.0
            .split(';')
            .skip(1)
            .filter_map(|p| p.trim().strip_prefix("codecs="))
            .map(|c| c.trim_matches('"').trim())
            .find(|c| !c.is_empty())
    }

    /// File extension for the container.
    pub fn extension(&self) -> &'static str {
        match self.container() {
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            "video/x-matroska" => "mkv",
            _ => "bin",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Pick the first entry of `prefs` accepted by `supported`.
pub fn pick_supported<'a>(
    prefs: &'a [MediaType],
    mut supported: impl FnMut(&MediaType) -> bool,
) -> Option<&'a MediaType> {
    prefs.iter().find(|m| supported(m))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media_type.rs"]
mod tests;
