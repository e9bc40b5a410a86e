//! Checks that turn raw option values into typed ones.
//!
//! All of these run before any subprocess starts, and each error names the
//! offending value.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::time::Duration;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        Error::config(format!(
            "invalid {} date '{}' (expected YYYY-MM-DD): {}",
            field, value, e
        ))
    })
}

pub fn parse_optional_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_date(v, field)).transpose()
}

/// `since` must not be later than `until`; open ends always pass.
pub fn check_window(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Result<()> {
    match (since, until) {
        (Some(since), Some(until)) if since > until => Err(Error::config(format!(
            "since date {} is after until date {}",
            since.format(DATE_FORMAT),
            until.format(DATE_FORMAT)
        ))),
        _ => Ok(()),
    }
}

/// Compile the exclusion pattern; an empty pattern means no exclusion.
pub fn compile_exclude(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern.filter(|p| !p.is_empty()) {
        Some(pattern) => Regex::new(pattern)
            .map(Some)
            .map_err(|e| Error::config(format!("invalid exclude pattern '{}': {}", pattern, e))),
        None => Ok(None),
    }
}

pub fn timeout(secs: Option<u64>) -> Result<Option<Duration>> {
    match secs {
        Some(0) => Err(Error::config("timeout must be at least 1 second")),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}
