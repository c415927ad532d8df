//! Process lifecycle chores
//!
//! Some upstream client stacks leave a transient credential-cache directory
//! (session cookies, capture files) behind in the working directory. The
//! gateway removes it on shutdown so stale credentials never outlive the
//! process.

use std::path::Path;

/// Remove the transient credential-cache directory, if it exists
///
/// Missing directories are fine; removal errors are logged, not fatal -
/// shutdown proceeds either way.
pub fn remove_credential_cache(dir: impl AsRef<Path>) {
    let dir = dir.as_ref();
    if !dir.exists() {
        return;
    }
    match std::fs::remove_dir_all(dir) {
        Ok(()) => tracing::info!(path = %dir.display(), "removed credential cache"),
        Err(e) => tracing::warn!(
            path = %dir.display(),
            error = %e,
            "failed to remove credential cache"
        ),
    }
}
