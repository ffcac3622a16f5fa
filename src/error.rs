//! Client Errors
//!
//! Every failure reaching presentation code has the same shape: a message,
//! an optional HTTP status and an optional server-supplied detail.

use serde::Deserialize;
use thiserror::Error;

/// Where a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received
    Network,
    /// Non-2xx response
    Server,
    /// Rejected before any request was made
    Validation,
    /// 2xx response whose body did not match the expected type
    Decode,
    /// Fetch abandoned without a replacement
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub detail: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: message.into(),
            status: None,
            detail: None,
        }
    }

    /// Server failure; `detail` becomes the message when present
    pub fn server(status: u16, detail: Option<String>) -> Self {
        let message = match &detail {
            Some(detail) => detail.clone(),
            None => format!("Request failed with status {}", status),
        };
        Self {
            kind: ErrorKind::Server,
            message,
            status: Some(status),
            detail,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            status: None,
            detail: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Decode,
            message: message.into(),
            status: None,
            detail: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            message: "Request cancelled".to_string(),
            status: None,
            detail: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// Build a server error from a raw response body
    pub fn from_body(status: u16, body: &str) -> Self {
        Self::server(status, parse_detail(body))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return ApiError::decode(e.to_string());
        }
        match e.status() {
            Some(status) => ApiError::server(status.as_u16(), None),
            None => ApiError::network(e.to_string()),
        }
    }
}

/// FastAPI error body: `detail` is a string, or a list of validation entries
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Detail>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Entries(Vec<DetailEntry>),
}

#[derive(Deserialize)]
struct DetailEntry {
    msg: String,
}

fn parse_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Detail::Text(text) if !text.is_empty() => Some(text),
        Detail::Text(_) => None,
        Detail::Entries(entries) if !entries.is_empty() => Some(
            entries
                .into_iter()
                .map(|e| e.msg)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Detail::Entries(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_becomes_message() {
        let err = ApiError::from_body(404, r#"{"detail":"Tarea no encontrada"}"#);
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.detail.as_deref(), Some("Tarea no encontrada"));
        assert_eq!(err.to_string(), "Tarea no encontrada");
    }

    #[test]
    fn test_validation_entries_are_joined() {
        let body = r#"{"detail":[{"loc":["body","nombre"],"msg":"field required","type":"missing"},{"msg":"too long"}]}"#;
        let err = ApiError::from_body(422, body);
        assert_eq!(err.detail.as_deref(), Some("field required; too long"));
    }

    #[test]
    fn test_generic_message_without_detail() {
        let err = ApiError::from_body(500, "Internal Server Error");
        assert_eq!(err.detail, None);
        assert_eq!(err.message, "Request failed with status 500");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = ApiError::network("connection refused");
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.status, None);
    }
}
