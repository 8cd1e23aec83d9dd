//! Protocol status codes
//!
//! Callers of the PAWS surface only ever see these integers; the error detail
//! stays in the server log.

/// Device validity check passed.
pub const VALIDATED: i32 = 1;

/// Request completed with no domain-specific value to report.
pub const OK: i32 = 0;

/// Catch-all for infrastructure faults and unexpected failures.
pub const GENERIC_FAILURE: i32 = -32000;

/// A notified spectrum profile is not in the currently available schedule.
pub const SPECTRUM_UNAVAILABLE: i32 = -202;

/// Request carried a field with an invalid value.
pub const INVALID_VALUE: i32 = -203;

/// The device requested a rule set this database does not operate.
pub const UNSUPPORTED: i32 = -102;

/// Device failed authorization or is on the exclusion list.
pub const UNAUTHORIZED: i32 = -301;
