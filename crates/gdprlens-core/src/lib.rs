pub mod annotation;
pub mod fields;
pub mod sort_key;

pub use annotation::{AnnotationRecord, AnnotationResult, CaseFile, FailureKind, RecordMetadata};
pub use fields::{FieldKind, FieldSpec, ANNOTATION_FIELDS};
pub use sort_key::filename_sort_key;
