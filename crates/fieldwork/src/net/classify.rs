//! Mapping from remote status codes to delivery decisions.

use serde::Serialize;

/// How a delivery attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Success,
    /// Expected to resolve on its own. Retried, and queued items are kept.
    Transient,
    /// The remote rejected the content. Never retried.
    Permanent,
    /// The remote rejected the request size. Never retried; the caller
    /// should suggest dropping evidence.
    TooLarge,
}

impl FailureClass {
    /// Returns true if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureClass::Transient)
    }

    /// Returns true if the payload must be dropped rather than retried.
    pub fn is_permanent(&self) -> bool {
        matches!(self, FailureClass::Permanent | FailureClass::TooLarge)
    }
}

/// Classifies a status code. `0` means the remote was never reached.
pub fn classify_status(status: u16) -> FailureClass {
    match status {
        0 => FailureClass::Transient,
        200..=299 => FailureClass::Success,
        408 | 425 | 429 => FailureClass::Transient,
        413 => FailureClass::TooLarge,
        400..=499 => FailureClass::Permanent,
        500..=599 => FailureClass::Transient,
        _ => FailureClass::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_every_status() {
        for status in 0..=u16::MAX {
            let expected = match status {
                0 => FailureClass::Transient,
                200..=299 => FailureClass::Success,
                408 | 425 | 429 => FailureClass::Transient,
                413 => FailureClass::TooLarge,
                400..=499 => FailureClass::Permanent,
                _ => FailureClass::Transient,
            };
            assert_eq!(classify_status(status), expected, "status {}", status);
        }
    }

    #[test]
    fn test_well_known_statuses() {
        assert_eq!(classify_status(200), FailureClass::Success);
        assert_eq!(classify_status(201), FailureClass::Success);
        assert_eq!(classify_status(400), FailureClass::Permanent);
        assert_eq!(classify_status(422), FailureClass::Permanent);
        assert_eq!(classify_status(413), FailureClass::TooLarge);
        assert_eq!(classify_status(429), FailureClass::Transient);
        assert_eq!(classify_status(500), FailureClass::Transient);
        assert_eq!(classify_status(503), FailureClass::Transient);
        assert_eq!(classify_status(301), FailureClass::Transient);
        assert_eq!(classify_status(0), FailureClass::Transient);
    }

    #[test]
    fn test_retry_and_discard_are_disjoint() {
        for class in [
            FailureClass::Success,
            FailureClass::Transient,
            FailureClass::Permanent,
            FailureClass::TooLarge,
        ] {
            assert!(!(class.is_retryable() && class.is_permanent()));
        }
        assert!(!FailureClass::Success.is_retryable());
        assert!(!FailureClass::Success.is_permanent());
    }
}
