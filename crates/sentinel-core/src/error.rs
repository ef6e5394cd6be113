use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the SentinelChat crates.
#[derive(Error, Debug)]
pub enum SentinelError {
    /// A transcript file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// No API key was configured for the classification service.
    #[error("API key is missing. Set GEMINI_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// The classification service failed or returned an unusable reply.
    #[error("Classification failed: {0}")]
    Classification(String),

    /// A transport-level failure talking to the classification service.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Batches must hold at least one message.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// No transcript files were found under the given directory.
    #[error("No transcript files found in {0}")]
    NoTranscripts(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the sentinel crates.
pub type Result<T> = std::result::Result<T, SentinelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = SentinelError::FileRead {
            path: PathBuf::from("/exports/chat.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/exports/chat.txt"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_api_key() {
        let msg = SentinelError::MissingApiKey.to_string();
        assert!(msg.starts_with("API key is missing"));
    }

    #[test]
    fn test_error_display_classification() {
        let err = SentinelError::Classification("503 Service Unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "Classification failed: 503 Service Unavailable"
        );
    }

    #[test]
    fn test_error_display_invalid_batch_size() {
        let err = SentinelError::InvalidBatchSize(0);
        assert_eq!(err.to_string(), "Invalid batch size: 0");
    }

    #[test]
    fn test_error_display_no_transcripts() {
        let err = SentinelError::NoTranscripts(PathBuf::from("/empty/dir"));
        assert_eq!(err.to_string(), "No transcript files found in /empty/dir");
    }

    #[test]
    fn test_error_display_config() {
        let err = SentinelError::Config("unknown theme".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown theme");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SentinelError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: SentinelError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
