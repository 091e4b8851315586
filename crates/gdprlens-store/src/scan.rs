//! Recursive discovery of case files.

use std::path::Path;

use gdprlens_core::CaseFile;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::StoreError;

/// Suffix that marks a file as a case text.
pub const CASE_EXTENSION: &str = ".txt";

/// Discover every case file under `dir`, ordered by filename sort key.
///
/// Directories are walked in file-name order, so files sharing a sort key keep
/// a stable relative order across runs. Entries that cannot be read during
/// the walk are logged and skipped. Scanning is read-only; calling it again
/// over an unchanged tree yields the same sequence.
pub fn scan(dir: &Path) -> Result<Vec<CaseFile>, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::InvalidInput(dir.to_path_buf()));
    }

    let mut cases = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        // Links are not followed into directories, but a link to a file counts.
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(CASE_EXTENSION) {
            cases.push(CaseFile::new(entry.into_path()));
        }
    }

    // Stable: equal keys stay in walk order.
    cases.sort_by_key(|c| c.sort_key);
    info!(count = cases.len(), dir = %dir.display(), "discovered case files");
    Ok(cases)
}
