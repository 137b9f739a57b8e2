use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Server errors of the form `NotFoundError('Collection foo does not exist')`.
static TAGGED_ERROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\((.*)\)$").unwrap());

/// Every failure a client call can surface.
///
/// `Connection` and `Request` come from the transport: the former when the
/// network call itself did not complete, the latter when the server answered
/// non-2xx with a body no classification stage recognized. The domain
/// variants are produced either locally by validation (`InvalidArgument`,
/// `Dimensionality`, `UniqueConstraint`, `NotFound`) or by classifying a
/// server error body. `ProviderConnection`/`ProviderRequest` are scoped to
/// the embedding-provider sub-call so callers can tell the vector database
/// failing apart from the embedding vendor failing.
#[derive(Error, Debug)]
pub enum ChromaError {
    #[error("Could not connect to the server: {0}")]
    Connection(String),
    #[error("{0}")]
    Request(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    Value(String),
    #[error("{0}")]
    UniqueConstraint(String),
    #[error("{0}")]
    Dimensionality(String),
    #[error("{0}")]
    InvalidCollection(String),
    #[error("{0}")]
    Type(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Could not connect to the embedding provider: {0}")]
    ProviderConnection(String),
    #[error("Embedding provider request failed: {0}")]
    ProviderRequest(String),
}

impl ChromaError {
    /// Re-inspects a transport failure: request-kind errors get their body
    /// classified into a domain variant, everything else passes through
    /// unchanged. Connection failures are never given a domain subtype.
    pub(crate) fn classify(self) -> ChromaError {
        match self {
            ChromaError::Request(body) => classify_error_body(&body),
            other => other,
        }
    }
}

/// Maps a raw non-2xx response body to a domain error.
///
/// Stages are attempted in order, stopping at the first applicable one:
/// 1. `error` field matching `identifier(message)`
/// 2. `detail` field, tag inferred from message substrings
/// 3. `error` + `message` fields, `error` taken as the tag directly
/// 4. `error` field alone, tag inferred from its text
///
/// An unparseable or unrecognized body stays a generic `Request` error
/// carrying the original text.
pub(crate) fn classify_error_body(body: &str) -> ChromaError {
    let Ok(error) = serde_json::from_str::<Value>(body) else {
        return ChromaError::Request(body.to_string());
    };

    if let Some(tagged) = error.get("error").and_then(Value::as_str) {
        if let Some(caps) = TAGGED_ERROR.captures(tagged) {
            return from_tag(&caps[1], strip_quotes(&caps[2]).to_string());
        }
    }

    if let Some(detail) = error.get("detail").and_then(Value::as_str) {
        return from_tag(infer_tag(detail), detail.to_string());
    }

    if let (Some(tag), Some(message)) = (
        error.get("error").and_then(Value::as_str),
        error.get("message").and_then(Value::as_str),
    ) {
        return from_tag(tag, message.to_string());
    }

    if let Some(message) = error.get("error").and_then(Value::as_str) {
        return from_tag(infer_tag(message), message.to_string());
    }

    ChromaError::Request(body.to_string())
}

fn from_tag(tag: &str, message: String) -> ChromaError {
    match tag {
        "NotFoundError" => ChromaError::NotFound(message),
        "AuthorizationError" => ChromaError::Authorization(message),
        "ValueError" => ChromaError::Value(message),
        "UniqueConstraintError" => ChromaError::UniqueConstraint(message),
        "DimensionalityError" => ChromaError::Dimensionality(message),
        "InvalidCollection" => ChromaError::InvalidCollection(message),
        "TypeError" => ChromaError::Type(message),
        _ => ChromaError::Request(message),
    }
}

fn infer_tag(message: &str) -> &'static str {
    if message.contains("NotFoundError") {
        return "NotFoundError";
    }
    if message.contains("AuthorizationError") || message.contains("Forbidden") {
        return "AuthorizationError";
    }
    if message.contains("UniqueConstraintError") {
        return "UniqueConstraintError";
    }
    if message.contains("ValueError") {
        return "ValueError";
    }
    if message.contains("dimensionality") {
        return "DimensionalityError";
    }
    "UnknownError"
}

/// Strips one layer of surrounding quotes, if any.
fn strip_quotes(message: &str) -> &str {
    for quote in ['\'', '"'] {
        if message.len() >= 2 && message.starts_with(quote) && message.ends_with(quote) {
            return &message[1..message.len() - 1];
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unparseable_body_stays_a_request_error() {
        let err = classify_error_body("<html>502 Bad Gateway</html>");
        assert!(matches!(err, ChromaError::Request(m) if m.contains("502")));
    }

    #[test]
    fn tagged_error_field_is_classified_by_identifier() {
        let err = classify_error_body(
            r#"{"error": "NotFoundError('Collection demo does not exist.')"}"#,
        );
        match err {
            ChromaError::NotFound(message) => {
                assert_eq!(message, "Collection demo does not exist.");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn tagged_error_strips_double_quotes_too() {
        let err = classify_error_body(r#"{"error": "ValueError(\"bad value\")"}"#);
        match err {
            ChromaError::Value(message) => assert_eq!(message, "bad value"),
            other => panic!("expected Value, got {other:?}"),
        }
    }

    #[test]
    fn detail_field_infers_tag_from_substring() {
        let err = classify_error_body(r#"{"detail": "ValueError: expected dimension of 3"}"#);
        assert!(matches!(err, ChromaError::Value(_)));

        let err = classify_error_body(r#"{"detail": "query dimensionality mismatch"}"#);
        assert!(matches!(err, ChromaError::Dimensionality(_)));

        let err = classify_error_body(r#"{"detail": "Forbidden"}"#);
        assert!(matches!(err, ChromaError::Authorization(_)));
    }

    #[test]
    fn detail_with_no_known_token_stays_generic() {
        let err = classify_error_body(r#"{"detail": "something odd happened"}"#);
        match err {
            ChromaError::Request(message) => assert_eq!(message, "something odd happened"),
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn error_and_message_fields_use_error_as_tag() {
        let err = classify_error_body(
            r#"{"error": "UniqueConstraintError", "message": "duplicate id ID1"}"#,
        );
        match err {
            ChromaError::UniqueConstraint(message) => assert_eq!(message, "duplicate id ID1"),
            other => panic!("expected UniqueConstraint, got {other:?}"),
        }
    }

    #[test]
    fn bare_error_field_infers_tag() {
        let err = classify_error_body(r#"{"error": "NotFoundError: no such tenant"}"#);
        assert!(matches!(err, ChromaError::NotFound(_)));
    }

    #[test]
    fn unknown_tag_falls_back_to_request() {
        let err = classify_error_body(r#"{"error": "WeirdError('boom')"}"#);
        match err {
            ChromaError::Request(message) => assert_eq!(message, "boom"),
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn connection_errors_are_never_reclassified() {
        let err = ChromaError::Connection("refused".into()).classify();
        assert!(matches!(err, ChromaError::Connection(m) if m == "refused"));
    }

    #[test]
    fn invalid_collection_tag_maps_to_its_own_kind() {
        let err = classify_error_body(r#"{"error": "InvalidCollection(demo)"}"#);
        assert!(matches!(err, ChromaError::InvalidCollection(m) if m == "demo"));
    }
}
