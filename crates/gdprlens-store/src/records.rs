//! Annotation record files.

use std::io::Write;
use std::path::{Path, PathBuf};

use gdprlens_core::{AnnotationRecord, CaseFile};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::StoreError;

/// Write `record` to the case's output path, replacing any existing file.
///
/// The JSON goes to a temporary file in the same directory first and is then
/// renamed over the target, so readers never observe a half-written record.
pub fn write_record(case: &CaseFile, record: &AnnotationRecord) -> Result<PathBuf, StoreError> {
    let output = case.output_path();
    let json = record.to_json_pretty()?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(json.as_bytes())
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    tmp.flush().map_err(|e| StoreError::io(&tmp_path, e))?;
    tmp.persist(&output).map_err(|e| StoreError::Persist {
        path: output.clone(),
        source: e.error,
    })?;

    debug!(path = %output.display(), bytes = json.len(), "wrote annotation record");
    Ok(output)
}
