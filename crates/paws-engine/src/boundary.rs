//! Mapping of operation results onto PAWS status codes
//!
//! Every protocol operation reports a single integer status: a success code
//! chosen by the operation, or the code of the error that stopped it.
//! Failures are logged here, once, with their full cause; callers only ever
//! see [`Error::public_message`].

use paws_core::{codes, Error, ErrorKind, Result};
use serde::Serialize;
use tracing::{error, warn};

/// Status code plus an optional human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PawsOutcome {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PawsOutcome {
    pub fn ok(code: i32) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn failed(err: &Error) -> Self {
        Self {
            code: err.status_code(),
            message: Some(err.public_message()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code >= codes::OK
    }
}

pub fn log_failure(operation: &str, err: &Error) {
    match err.kind() {
        ErrorKind::Infrastructure => error!(operation, error = %err, "Operation failed"),
        _ => warn!(operation, code = err.status_code(), error = %err, "Operation refused"),
    }
}

/// Collapse a result into its outcome, logging any failure
pub fn outcome<T>(operation: &str, result: &Result<T>, success: impl FnOnce(&T) -> i32) -> PawsOutcome {
    match result {
        Ok(value) => PawsOutcome::ok(success(value)),
        Err(err) => {
            log_failure(operation, err);
            PawsOutcome::failed(err)
        }
    }
}

/// Status code only
pub fn status_code<T>(operation: &str, result: &Result<T>, success: impl FnOnce(&T) -> i32) -> i32 {
    outcome(operation, result, success).code
}
