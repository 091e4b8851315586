//! Error-marker audit over annotation record files.
//!
//! After a batch run, failed annotations are only visible inside their
//! record files. The audit lists the records containing a marker string
//! (typically `Max retries exceeded`) so those cases can be re-queued.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::StoreError;

pub const DEFAULT_MARKER: &str = "Max retries exceeded";
pub const DEFAULT_REPORT_FILE: &str = "error_files_list.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Number of `.json` files examined.
    pub scanned: usize,
    /// File names containing the marker, in scan order.
    pub matches: Vec<String>,
    pub report_path: PathBuf,
}

/// Scan the `.json` files directly inside `dir` for `marker` and write the
/// matching file names, one per line, to `report_path`.
///
/// The search is a literal substring match over the raw file text. Files are
/// examined in file-name order; unreadable ones are logged and skipped. The
/// report is overwritten on every run, and written even when nothing matches.
pub fn audit(dir: &Path, marker: &str, report_path: &Path) -> Result<AuditReport, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::InvalidInput(dir.to_path_buf()));
    }

    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| StoreError::io(dir, e))?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.file_name().to_string_lossy().into_owned()),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|name| name.ends_with(".json"))
        .collect();
    names.sort();
    info!(count = names.len(), dir = %dir.display(), "scanning annotation records");

    let mut matches = Vec::new();
    for name in &names {
        let path = dir.join(name);
        match fs::read_to_string(&path) {
            Ok(content) if content.contains(marker) => {
                info!(file = %name, "marker found");
                matches.push(name.clone());
            }
            Ok(_) => {}
            Err(e) => warn!(file = %name, error = %e, "could not read record"),
        }
    }

    let report: String = matches.iter().map(|m| format!("{m}\n")).collect();
    fs::write(report_path, report).map_err(|e| StoreError::io(report_path, e))?;
    info!(
        matches = matches.len(),
        scanned = names.len(),
        report = %report_path.display(),
        "audit complete"
    );

    Ok(AuditReport {
        scanned: names.len(),
        matches,
        report_path: report_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn lists_exactly_the_matching_records() {
        let dir = tempfile::tempdir().unwrap();
        let ok = r#"{"metadata": {}, "annotations": {"country": "Spain"}}"#;
        let failed = r#"{"metadata": {}, "annotations": {"error": "Max retries exceeded", "raw_output": ""}}"#;
        write(dir.path(), "1.json", ok);
        write(dir.path(), "2.json", failed);
        write(dir.path(), "3.json", ok);
        write(dir.path(), "4.json", failed);
        write(dir.path(), "5.txt", "Max retries exceeded");

        let out = tempfile::tempdir().unwrap();
        let report_path = out.path().join("errors.txt");
        let report = audit(dir.path(), DEFAULT_MARKER, &report_path).unwrap();

        assert_eq!(report.scanned, 4);
        assert_eq!(report.matches, vec!["2.json", "4.json"]);
        assert_eq!(fs::read_to_string(&report_path).unwrap(), "2.json\n4.json\n");
    }

    #[test]
    fn no_matches_writes_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1.json", "{}");
        let report_path = dir.path().join(DEFAULT_REPORT_FILE);
        fs::write(&report_path, "old contents").unwrap();

        let report = audit(dir.path(), DEFAULT_MARKER, &report_path).unwrap();
        assert!(report.matches.is_empty());
        assert_eq!(fs::read_to_string(&report_path).unwrap(), "");
    }

    #[test]
    fn does_not_descend_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested"), "9.json", DEFAULT_MARKER);

        let report_path = dir.path().join("report.txt");
        let report = audit(dir.path(), DEFAULT_MARKER, &report_path).unwrap();
        assert_eq!(report.scanned, 0);
    }

    #[test]
    fn custom_marker() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"error": "API request failed with status code 429"}"#);
        write(dir.path(), "b.json", r#"{"error": "Max retries exceeded"}"#);

        let report_path = dir.path().join("report.txt");
        let report = audit(dir.path(), "status code 429", &report_path).unwrap();
        assert_eq!(report.matches, vec!["a.json"]);
    }

    #[test]
    fn missing_directory_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = audit(
            &dir.path().join("absent"),
            DEFAULT_MARKER,
            &dir.path().join("r.txt"),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }
}
