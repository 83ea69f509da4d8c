//! File freshness checks based on modification time

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Age of a file at `now`, from its last-modified time
///
/// Returns `None` if the file is missing or its modification time cannot be
/// read. A modification time later than `now` counts as age zero.
pub fn file_age_at(path: &Path, now: SystemTime) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(now.duration_since(modified).unwrap_or(Duration::ZERO))
}

/// Whether `path` is missing or was last modified more than `max_age` before `now`
pub fn is_stale_at(path: &Path, max_age: Duration, now: SystemTime) -> bool {
    match file_age_at(path, now) {
        Some(age) => age > max_age,
        None => true,
    }
}

/// Whether `path` is missing or older than `max_age`, by the wall clock
///
/// Relies on file-system modification times, so clock skew or a manual
/// `touch` changes the answer.
pub fn is_stale(path: &Path, max_age: Duration) -> bool {
    is_stale_at(path, max_age, SystemTime::now())
}
