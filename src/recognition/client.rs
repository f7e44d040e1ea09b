use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;

use super::response::{parse_response, Recognition, RecognitionRequest};
use super::RecognitionError;
use crate::app::AppConfig;

/// Blocking client for the LaTeX recognition endpoint.
///
/// Cheap to clone; run `recognize` off the UI thread.
#[derive(Clone)]
pub struct RecognitionClient {
    http: Client,
    endpoint: String,
    app_id: String,
    app_key: String,
}

impl RecognitionClient {
    pub fn new(config: &AppConfig) -> Result<Self, RecognitionError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            app_id: config.app_id.clone(),
            app_key: config.app_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the image at `path` for recognition.
    ///
    /// `Ok(None)` means the service answered without a `latex` field.
    pub fn recognize(&self, path: &Path) -> Result<Option<Recognition>, RecognitionError> {
        let bytes = std::fs::read(path).map_err(|source| RecognitionError::ReadImage {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes from {:?}", bytes.len(), path);

        let request = RecognitionRequest::for_image(&bytes);
        let response = self
            .http
            .post(&self.endpoint)
            .header("app_id", &self.app_id)
            .header("app_key", &self.app_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!("Recognition service answered {}: {}", status, body);

        let reply = parse_response(&body)?;
        if let Some(ref msg) = reply.error {
            warn!("Recognition service reported an error ({}): {}", status, msg);
        }

        match reply.into_recognition(path.to_path_buf()) {
            Some(recognition) => {
                info!(
                    "Recognized {:?} with confidence {:.2}",
                    path, recognition.confidence
                );
                Ok(Some(recognition))
            }
            None => {
                warn!("Recognition reply for {:?} has no latex field", path);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_endpoint() {
        let config = AppConfig {
            endpoint: "http://127.0.0.1:9/latex".to_string(),
            ..AppConfig::default()
        };
        let client = RecognitionClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/latex");
    }

    #[test]
    fn test_missing_image_is_reported_before_any_request() {
        let client = RecognitionClient::new(&AppConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.jpg");

        match client.recognize(&missing) {
            Err(RecognitionError::ReadImage { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected ReadImage error, got {:?}", other.map(|_| ())),
        }
    }
}
