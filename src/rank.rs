//! Deterministic ordering and result caps shared by every report.
//!
//! All sorts are stable: entries that compare equal keep their input order,
//! so identical input always renders identically.

use std::cmp::Ordering;

/// Keep the first `limit` entries. `limit <= 0` means no limit.
pub fn truncate<T>(mut items: Vec<T>, limit: i64) -> Vec<T> {
    if let Ok(limit) = usize::try_from(limit) {
        if limit > 0 {
            items.truncate(limit);
        }
    }
    items
}

/// Stable sort, highest key first, then apply `limit`.
pub fn rank_descending<T, F>(mut items: Vec<T>, key: F, limit: i64) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| compare_f64(key(b), key(a)));
    truncate(items, limit)
}

/// Stable sort, lowest key first, then apply `limit`.
pub fn rank_ascending<T, F>(mut items: Vec<T>, key: F, limit: i64) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| compare_f64(key(a), key(b)));
    truncate(items, limit)
}

// NaN never occurs in computed metrics; treat it as equal to keep the sort total
fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
