//! Application state types
//!
//! Everything the main window displays is derived from [`AppState`], which
//! lives on the GTK main thread behind an `Rc<RefCell<_>>`.

use log::{debug, error, info};
use std::path::PathBuf;

use crate::app::AppConfig;
use crate::recognition::{Recognition, RecognitionClient};
use crate::tex::{self, TexError};

/// The advisory shown under the preview
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    #[default]
    Clear,
    InvalidSyntax,
    LowConfidence,
    Copied,
    Recognizing,
    RecognitionFailed,
    CaptureFailed,
}

impl Status {
    pub fn text(&self) -> &'static str {
        match self {
            Status::Clear => "",
            Status::InvalidSyntax => "Invalid TeX syntax",
            Status::LowConfidence => {
                "Confidence below 0.8, manual proofreading recommended"
            }
            Status::Copied => "TeX copied to clipboard",
            Status::Recognizing => "Recognizing…",
            Status::RecognitionFailed => "Recognition failed",
            Status::CaptureFailed => "Screen capture failed",
        }
    }
}

/// A preview ready to be shown in the display frame
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub path: PathBuf,
    pub display_width: i32,
    pub display_height: i32,
}

/// What the entry change handler should do with the preview
#[derive(Debug, Clone, PartialEq)]
pub enum TexOutcome {
    /// Empty text, nothing to preview
    Cleared,
    /// Parse failure; the previous preview stays untouched
    Invalid,
    Rendered(PreviewImage),
    /// Layout or I/O failure; the stale preview should go
    Failed,
}

/// Main application state
pub struct AppState {
    pub config: AppConfig,
    /// Client for the recognition service, if it could be built
    pub client: Option<RecognitionClient>,
    /// The single active recognition result
    pub recognition: Option<Recognition>,
    pub status: Status,
    /// Bumped every time a new preview is written
    pub preview_generation: u64,
    /// Whether a recognition request is in flight
    pub is_recognizing: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let client = match RecognitionClient::new(&config) {
            Ok(client) => Some(client),
            Err(e) => {
                error!("Failed to build recognition client: {}", e);
                None
            }
        };
        Self::with_client(config, client)
    }

    pub fn with_client(config: AppConfig, client: Option<RecognitionClient>) -> Self {
        Self {
            config,
            client,
            recognition: None,
            status: Status::Clear,
            preview_generation: 0,
            is_recognizing: false,
        }
    }

    /// Validate edited text and regenerate the preview when it parses
    pub fn apply_tex(&mut self, text: &str) -> TexOutcome {
        if let Err(e) = tex::validate(text) {
            debug!("Rejected TeX {:?}: {}", text, e);
            self.status = Status::InvalidSyntax;
            return TexOutcome::Invalid;
        }

        self.status = Status::Clear;
        if text.is_empty() {
            return TexOutcome::Cleared;
        }

        match tex::render_preview(text, &self.config.preview_path()) {
            Ok(preview) => {
                self.preview_generation += 1;
                match self.config.frame.fit(preview.width, preview.height) {
                    Some((display_width, display_height)) => TexOutcome::Rendered(PreviewImage {
                        path: preview.path,
                        display_width,
                        display_height,
                    }),
                    None => TexOutcome::Failed,
                }
            }
            Err(TexError::Syntax(msg)) => {
                debug!("Rejected TeX {:?}: {}", text, msg);
                self.status = Status::InvalidSyntax;
                TexOutcome::Invalid
            }
            Err(e) => {
                error!("Failed to render preview: {}", e);
                TexOutcome::Failed
            }
        }
    }

    /// Make `recognition` the active result and return the text for the entry
    pub fn accept_recognition(&mut self, recognition: Recognition) -> String {
        let latex = recognition.normalized_latex();
        info!(
            "Showing recognition of {:?} (confidence {:.2})",
            recognition.source, recognition.confidence
        );
        self.recognition = Some(recognition);
        latex
    }

    /// Flag the active result when its confidence is under the threshold
    pub fn apply_confidence_advisory(&mut self) {
        if let Some(ref recognition) = self.recognition {
            if recognition.is_below(self.config.confidence_threshold) {
                self.status = Status::LowConfidence;
            }
        }
    }

    /// The recognition shown at startup, without calling the service
    pub fn sample_recognition(&self) -> Recognition {
        Recognition {
            source: self.config.sample_image.clone(),
            latex: self.config.sample_latex.clone(),
            confidence: 1.0,
        }
    }

    /// Reserve the single recognition slot, returning the client to use
    pub fn begin_recognition(&mut self) -> Option<RecognitionClient> {
        if self.is_recognizing {
            return None;
        }
        let client = self.client.clone()?;
        self.is_recognizing = true;
        self.status = Status::Recognizing;
        Some(client)
    }

    pub fn finish_recognition(&mut self) {
        self.is_recognizing = false;
        if self.status == Status::Recognizing {
            self.status = Status::Clear;
        }
    }
}
