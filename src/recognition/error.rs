use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning an image into a LaTeX transcription
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The source image could not be read
    #[error("Failed to read image {path:?}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building the client or sending the request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with something that is not JSON
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}
