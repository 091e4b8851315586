//! Case files and the annotation records written next to them.

use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::sort_key::filename_sort_key;

/// A plain-text case document discovered on disk.
///
/// Only the path and ordering key are held; the text is read on demand so a
/// read failure stays local to the file being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFile {
    pub path: PathBuf,
    pub sort_key: u64,
}

impl CaseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sort_key = filename_sort_key(&file_name_lossy(&path));
        Self { path, sort_key }
    }

    /// Base name of the file, used as `source_file` in record metadata.
    pub fn file_name(&self) -> String {
        file_name_lossy(&self.path)
    }

    /// Read the whole file as UTF-8.
    pub fn read_text(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    /// Deterministic output path: same directory and stem, `.json` extension.
    pub fn output_path(&self) -> PathBuf {
        self.path.with_extension("json")
    }
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Why an annotation could not be produced.
///
/// Not part of the on-disk shape; it lets callers tell the failure classes
/// apart without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Every attempt timed out or failed at the connection level.
    ExhaustedRetries,
    /// Non-200 status or an envelope without usable content.
    RemoteRejection,
    /// Generated text held no strictly valid JSON object.
    Parse,
}

/// Outcome of annotating one case text.
///
/// Serializes either as the parsed field map or as
/// `{"error": ..., "raw_output": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationResult {
    Fields(Map<String, Value>),
    Failed {
        kind: FailureKind,
        error: String,
        raw_output: String,
    },
}

impl AnnotationResult {
    pub fn failed(kind: FailureKind, error: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            error: error.into(),
            raw_output: raw_output.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Fields(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Fields(_) => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fields(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

impl Serialize for AnnotationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Fields(fields) => fields.serialize(serializer),
            Self::Failed {
                error, raw_output, ..
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("raw_output", raw_output)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordMetadata {
    pub source_file: String,
    /// Length of the case text in characters.
    pub text_length: usize,
}

/// The JSON document persisted for each case file.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationRecord {
    pub metadata: RecordMetadata,
    pub annotations: AnnotationResult,
}

impl AnnotationRecord {
    pub fn new(case: &CaseFile, text: &str, annotations: AnnotationResult) -> Self {
        Self {
            metadata: RecordMetadata {
                source_file: case.file_name(),
                text_length: text.chars().count(),
            },
            annotations,
        }
    }

    /// Indented, non-ASCII-escaped JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
