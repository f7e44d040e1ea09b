//! Recognition service payloads
//!
//! The request wraps the image as a base64 data URL; the reply is a flat JSON
//! object with optional `latex`, `latex_confidence` and `error` fields.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use std::path::PathBuf;

use super::RecognitionError;

const DATA_URL_PREFIX: &str = "data:image/jpg;base64,";

#[derive(Debug, Serialize)]
pub struct RecognitionRequest {
    pub url: String,
}

impl RecognitionRequest {
    pub fn for_image(bytes: &[u8]) -> Self {
        Self {
            url: data_url(bytes),
        }
    }
}

/// Encode raw image bytes as the data URL the service expects
pub fn data_url(bytes: &[u8]) -> String {
    format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(bytes))
}

/// Fields picked out of a service reply
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReply {
    pub latex: Option<String>,
    pub confidence: f64,
    pub error: Option<String>,
}

impl ServiceReply {
    pub fn into_recognition(self, source: PathBuf) -> Option<Recognition> {
        let latex = self.latex?;
        Some(Recognition {
            source,
            latex,
            confidence: self.confidence,
        })
    }
}

/// Parse a reply body. Missing or non-numeric confidence counts as certain.
pub fn parse_response(body: &str) -> Result<ServiceReply, RecognitionError> {
    let json: serde_json::Value = serde_json::from_str(body)?;

    let latex = json["latex"].as_str().map(str::to_string);
    let confidence = json["latex_confidence"].as_f64().unwrap_or(1.0);
    let error = match &json["error"] {
        serde_json::Value::Null => None,
        serde_json::Value::String(msg) => Some(msg.clone()),
        other => Some(other.to_string()),
    };

    Ok(ServiceReply {
        latex,
        confidence,
        error,
    })
}

/// Undo the escaping the service applies and drop all spaces
pub fn normalize_latex(raw: &str) -> String {
    raw.replace(r"\\", r"\").replace(' ', "")
}

/// The single active recognition result
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub source: PathBuf,
    pub latex: String,
    pub confidence: f64,
}

impl Recognition {
    pub fn is_below(&self, threshold: f64) -> bool {
        self.confidence < threshold
    }

    pub fn normalized_latex(&self) -> String {
        normalize_latex(&self.latex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::LOW_CONFIDENCE_THRESHOLD;

    fn recognition(confidence: f64) -> Recognition {
        Recognition {
            source: PathBuf::from("capture.jpg"),
            latex: "x".to_string(),
            confidence,
        }
    }

    #[test]
    fn test_data_url_prefix() {
        assert_eq!(data_url(b"abc"), "data:image/jpg;base64,YWJj");
        assert_eq!(data_url(&[]), "data:image/jpg;base64,");
    }

    #[test]
    fn test_request_serializes_url_field() {
        let request = RecognitionRequest::for_image(b"abc");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"url":"data:image/jpg;base64,YWJj"}"#);
    }

    #[test]
    fn test_parse_full_reply() {
        let reply =
            parse_response(r#"{"latex": "x ^ { 2 }", "latex_confidence": 0.93}"#).unwrap();
        assert_eq!(reply.latex.as_deref(), Some("x ^ { 2 }"));
        assert_eq!(reply.confidence, 0.93);
        assert_eq!(reply.error, None);
    }

    #[test]
    fn test_parse_missing_confidence_defaults_to_one() {
        let reply = parse_response(r#"{"latex": "y"}"#).unwrap();
        assert_eq!(reply.confidence, 1.0);
    }

    #[test]
    fn test_parse_non_numeric_confidence_defaults_to_one() {
        let reply = parse_response(r#"{"latex": "y", "latex_confidence": "high"}"#).unwrap();
        assert_eq!(reply.confidence, 1.0);
    }

    #[test]
    fn test_parse_missing_latex_yields_no_recognition() {
        let reply = parse_response(r#"{"error": "Invalid credentials"}"#).unwrap();
        assert_eq!(reply.error.as_deref(), Some("Invalid credentials"));
        assert_eq!(reply.into_recognition(PathBuf::from("a.jpg")), None);
    }

    #[test]
    fn test_parse_structured_error_is_kept_as_text() {
        let reply = parse_response(r#"{"error": {"id": "image_no_content"}}"#).unwrap();
        assert_eq!(reply.error.as_deref(), Some(r#"{"id":"image_no_content"}"#));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let result = parse_response("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(RecognitionError::MalformedResponse(_))));
    }

    #[test]
    fn test_into_recognition_keeps_source() {
        let reply = parse_response(r#"{"latex": "a+b", "latex_confidence": 0.5}"#).unwrap();
        let rec = reply.into_recognition(PathBuf::from("canvas.jpg")).unwrap();
        assert_eq!(rec.source, PathBuf::from("canvas.jpg"));
        assert_eq!(rec.latex, "a+b");
        assert_eq!(rec.confidence, 0.5);
    }

    #[test]
    fn test_low_confidence_boundary() {
        assert!(recognition(0.79).is_below(LOW_CONFIDENCE_THRESHOLD));
        assert!(!recognition(0.80).is_below(LOW_CONFIDENCE_THRESHOLD));
        assert!(!recognition(1.0).is_below(LOW_CONFIDENCE_THRESHOLD));
    }

    #[test]
    fn test_normalize_latex() {
        assert_eq!(normalize_latex(r"\\frac { x } { 2 }"), r"\frac{x}{2}");
        assert_eq!(normalize_latex(r"\lim _ { x }"), r"\lim_{x}");
        assert_eq!(normalize_latex(""), "");
    }
}
