//! Per-request region context

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Immutable view of the operator settings an operation needs.
///
/// Built once per request so that every step of a workflow agrees on the
/// organisation code, the region partition and the current instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionContext {
    pub org_code: String,
    pub region_key: String,
    pub now: DateTime<Utc>,
}

impl RegionContext {
    pub fn new(org_code: impl Into<String>, region_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            org_code: org_code.into(),
            region_key: region_key.into(),
            now,
        }
    }

    /// Calendar date used for sequence rollover and registration ids
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// End of the validity window for a live availability result
    pub fn validity_end(&self) -> DateTime<Utc> {
        self.now + Duration::days(1)
    }

    /// Same context observed at a different instant
    pub fn at(&self, now: DateTime<Utc>) -> Self {
        Self { now, ..self.clone() }
    }
}
