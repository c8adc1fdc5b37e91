use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content classification of an inbound file event.
///
/// Only the first four kinds are accepted for upload. Everything else the
/// transport can deliver (stickers, voice notes, animations, ...) is kept as
/// `Other` so the rejection message can name it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Document,
    Video,
    Audio,
    Image,
    #[serde(untagged)]
    Other(String),
}

impl ContentKind {
    /// Kinds accepted by the upload validator.
    pub const SUPPORTED: &'static [ContentKind] = &[
        Self::Document,
        Self::Video,
        Self::Audio,
        Self::Image,
    ];

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "image" | "photo" => Self::Image,
            other => Self::Other(other.to_string()),
        })
    }
}
