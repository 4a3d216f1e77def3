//! Error type shared by the registry client and the marketplace service.

use reqwest::StatusCode;

/// Every way a registry call can fail.
///
/// Transport, status and payload failures all end up here so callers only
/// have one channel to check. A 2xx response whose body carries an `error`
/// field is reported as [`RegistryError::Payload`], never as success.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid registry URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Request to the registry failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("The server responded with status {}: {}", .status.as_u16(), .status.canonical_reason().unwrap_or("Unknown status"))]
    Status { status: StatusCode, body: String },
    #[error("{0}")]
    Payload(String),
    #[error("Failed to parse registry response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Request was superseded by a newer one")]
    Superseded,
}

impl RegistryError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RegistryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, RegistryError::Superseded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_includes_code_and_reason() {
        let err = RegistryError::Status {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "The server responded with status 404: Not Found"
        );
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_payload_message_is_passed_through() {
        let err = RegistryError::Payload("bad archive".to_string());
        assert_eq!(err.to_string(), "bad archive");
        assert_eq!(err.status(), None);
        assert!(!err.is_superseded());
    }
}
