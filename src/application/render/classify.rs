//! Maps raw renderer failures onto [`FailureClass`] so retry decisions never
//! look at message text.

use super::types::{FailureClass, TransportError};

const TRANSIENT_BODY_MARKERS: &[&str] = &["epipe", "broken pipe"];

pub fn classify_transport(error: &TransportError) -> FailureClass {
    match error {
        TransportError::Connect(_) | TransportError::Timeout | TransportError::Interrupted(_) => {
            FailureClass::Transient
        }
        TransportError::Request(_) => FailureClass::Permanent,
    }
}

/// Classify the body of a non-success response.
pub fn classify_error_body(body: &str) -> FailureClass {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return FailureClass::Unknown;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if TRANSIENT_BODY_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        FailureClass::Transient
    } else {
        FailureClass::Permanent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_level_failures_are_transient() {
        assert_eq!(
            classify_transport(&TransportError::Connect("refused".into())),
            FailureClass::Transient
        );
        assert_eq!(classify_transport(&TransportError::Timeout), FailureClass::Transient);
        assert_eq!(
            classify_transport(&TransportError::Interrupted("reset".into())),
            FailureClass::Transient
        );
        assert_eq!(
            classify_transport(&TransportError::Request("bad url".into())),
            FailureClass::Permanent
        );
    }

    #[test]
    fn broken_pipe_bodies_are_transient() {
        assert_eq!(
            classify_error_body(r#"{"error":"write EPIPE"}"#),
            FailureClass::Transient
        );
        assert_eq!(
            classify_error_body("Error: Broken pipe (os error 32)"),
            FailureClass::Transient
        );
    }

    #[test]
    fn other_bodies_are_permanent_and_empty_is_unknown() {
        assert_eq!(
            classify_error_body(r#"{"error":"Liquid syntax error"}"#),
            FailureClass::Permanent
        );
        assert_eq!(classify_error_body("  \n"), FailureClass::Unknown);
        assert!(!FailureClass::Unknown.is_retryable());
        assert!(!FailureClass::Permanent.is_retryable());
        assert!(FailureClass::Transient.is_retryable());
    }
}
