use common::{ContentKind, human_size};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upload of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("unsupported content type `{0}`")]
    UnsupportedType(ContentKind),
}

impl ValidationError {
    /// Reply shown to the uploader.
    pub fn user_message(&self) -> String {
        match self {
            Self::TooLarge { size, max } => format!(
                "⚠️ This file is {}, larger than the {} limit. Please send a smaller file.",
                human_size(*size),
                human_size(*max)
            ),
            Self::UnsupportedType(kind) => format!(
                "⚠️ Files of type \"{kind}\" are not supported. Send a document, video, audio file or photo."
            ),
        }
    }
}

/// Check an upload against the accepted kinds and the size limit.
///
/// `size_bytes == max_bytes` is accepted.
pub fn validate(kind: &ContentKind, size_bytes: u64, max_bytes: u64) -> Result<(), ValidationError> {
    if !kind.is_supported() {
        return Err(ValidationError::UnsupportedType(kind.clone()));
    }
    if size_bytes > max_bytes {
        return Err(ValidationError::TooLarge {
            size: size_bytes,
            max: max_bytes,
        });
    }
    Ok(())
}
