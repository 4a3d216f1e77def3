//! Types exchanged with the registry HTTP API.
//!
//! Both the CLI registry client and the marketplace service use these.

pub mod models;

pub use models::*;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RegistryError;

/// Parse a registry response body.
///
/// The registry reports some failures as a 2xx JSON body with a non-empty
/// `error` field; those become [`RegistryError::Payload`].
pub fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<T, RegistryError> {
    let value: Value = serde_json::from_str(body)?;
    check_payload_error(&value)?;
    Ok(serde_json::from_value(value)?)
}

/// Fail if a JSON document carries a non-empty `error` field.
pub fn check_payload_error(value: &Value) -> Result<(), RegistryError> {
    match value.get("error").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => Err(RegistryError::Payload(message.to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_success() {
        let ext: Extension =
            parse_payload(r#"{"publisher":"acme","name":"ext","version":"1.0.0"}"#).unwrap();
        assert_eq!(ext.id(), "acme.ext");
        assert_eq!(ext.version, "1.0.0");
    }

    #[test]
    fn test_parse_payload_error_field() {
        let err = parse_payload::<Extension>(r#"{"error":"bad archive"}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Payload(ref m) if m == "bad archive"));
    }

    #[test]
    fn test_empty_error_field_is_not_a_failure() {
        let ext: Extension =
            parse_payload(r#"{"error":"","publisher":"acme","name":"ext","version":"1"}"#)
                .unwrap();
        assert_eq!(ext.error.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_payload_wrong_shape() {
        let err = parse_payload::<SearchResult>(r#"{"offset":0}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
        let err = parse_payload::<SearchResult>("not json").unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }
}
