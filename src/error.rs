/// Error taxonomy for the gallery
///
/// Unrecognized URLs and malformed share parameters are not errors: the
/// classifier and the share decoder fall back to defaults instead. Everything
/// listed here is non-fatal and ends up as a status line in the UI.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    /// Persistence was requested but no catalog was ever opened
    #[error("gallery catalog is not configured; saving and loading are unavailable")]
    BackendUnconfigured,

    #[error("catalog request failed: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("no gallery found for {0}")]
    RecordNotFound(String),

    /// Every generated slug collided with an existing one
    #[error("could not allocate a unique slug after {0} attempts")]
    SlugExhausted(usize),

    /// Update-in-place was requested for a gallery that was never saved
    #[error("this gallery has not been saved yet; use \"save as new\"")]
    MissingRecord,

    #[error("could not serialize gallery data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to fetch {0}")]
    AssetFetch(String),

    #[error("failed to decode {0}")]
    AssetDecode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_readable() {
        let err = GalleryError::BackendUnconfigured;
        assert!(err.to_string().contains("not configured"));

        let err = GalleryError::RecordNotFound("slug abcd1234".into());
        assert_eq!(err.to_string(), "no gallery found for slug abcd1234");
    }

    #[test]
    fn test_serde_errors_convert() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: GalleryError = parse.unwrap_err().into();
        assert!(matches!(err, GalleryError::Serialization(_)));
    }
}
