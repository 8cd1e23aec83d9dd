//! Error taxonomy shared by every PAWS operation

use thiserror::Error;

use crate::codes;
use crate::validate::FieldError;

/// Coarse classification used when deciding how a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Field-attributable problems with the request
    Validation,
    /// A business rule refused the request
    Rejection,
    /// The addressed record does not exist
    NotFound,
    /// Store, propagation, clutter or transport fault
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    SpectrumUnavailable(String),

    #[error("Device not authorized: {0}")]
    Unauthorized(String),

    #[error("Unsupported ruleset: {0}")]
    Unsupported(String),

    #[error("Sequence contention for region {0}")]
    Contention(String),

    #[error("Registry store error: {0}")]
    Store(String),

    #[error("Propagation service error: {0}")]
    Propagation(String),

    #[error("Clutter lookup error: {0}")]
    Clutter(String),

    #[error("Device authority error: {0}")]
    Authority(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(vec![FieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Rejected(_)
            | Error::SpectrumUnavailable(_)
            | Error::Unauthorized(_)
            | Error::Unsupported(_) => ErrorKind::Rejection,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Contention(_)
            | Error::Store(_)
            | Error::Propagation(_)
            | Error::Clutter(_)
            | Error::Authority(_)
            | Error::Notification(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Internal(_) => ErrorKind::Infrastructure,
        }
    }

    /// Protocol status code for this error.
    ///
    /// Anything without a dedicated PAWS code collapses to the generic sentinel.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::SpectrumUnavailable(_) => codes::SPECTRUM_UNAVAILABLE,
            Error::Unauthorized(_) => codes::UNAUTHORIZED,
            Error::Validation(_) => codes::INVALID_VALUE,
            Error::Unsupported(_) => codes::UNSUPPORTED,
            _ => codes::GENERIC_FAILURE,
        }
    }

    /// Message that is safe to return to a protocol caller
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Infrastructure => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Field errors carried by a validation failure, otherwise the message
    pub fn messages(&self) -> Vec<String> {
        match self {
            Error::Validation(errors) => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.public_message()],
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::SpectrumUnavailable("x".into()).status_code(), -202);
        assert_eq!(Error::Unauthorized("x".into()).status_code(), -301);
        assert_eq!(Error::Store("down".into()).status_code(), -32000);
        assert_eq!(Error::Rejected("no".into()).status_code(), -32000);
        assert_eq!(Error::invalid("channel", "out of range").status_code(), -203);
    }

    #[test]
    fn test_infrastructure_detail_not_public() {
        let err = Error::Store("table Incumbents timed out after 30s".into());
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(err.public_message(), "Internal error");
    }

    #[test]
    fn test_validation_messages_are_aggregated() {
        let err = Error::Validation(vec![
            FieldError::new("contact.name", "is required"),
            FieldError::new("channel", "must be between 21 and 60"),
        ]);
        assert_eq!(err.messages().len(), 2);
        assert!(err.to_string().contains("contact.name is required; channel"));
    }
}
