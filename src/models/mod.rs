pub mod file;
pub mod folder;
pub mod identity;

pub use file::*;
pub use folder::*;
pub use identity::*;

use chrono::{DateTime, Utc};

/// Newest first. The sort is stable, so rows sharing a timestamp keep the
/// order the store returned them in (insertion order).
pub fn sort_newest_first<T>(rows: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}
