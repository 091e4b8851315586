//! Field catalogue for GDPR case annotations.
//!
//! Every annotation the model returns is expected to carry these keys. The
//! catalogue drives the completeness check on parsed annotations and is the
//! reference the extraction prompt is tested against.

use serde_json::{Map, Value};

/// How a field's value is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `1` when present in the case text, `0` when absent.
    Binary,
    /// Verbatim value from the text (amounts, clause references, country).
    FreeText,
    /// One value from a fixed list of choices.
    Categorical,
    /// Number or qualitative estimate (affected volume, year).
    Quantity,
}

impl FieldKind {
    /// Whether `value` has the shape this kind expects.
    ///
    /// Binary flags take `0` or `1`, as a number or a digit string. The other
    /// kinds take any string or number; `null` is never accepted.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Binary => match value {
                Value::Number(n) => n.as_u64().is_some_and(|n| n <= 1),
                Value::String(s) => matches!(s.trim(), "0" | "1"),
                _ => false,
            },
            Self::FreeText | Self::Categorical | Self::Quantity => {
                matches!(value, Value::String(_) | Value::Number(_))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn binary(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Binary,
    }
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

pub const ANNOTATION_FIELDS: &[FieldSpec] = &[
    // Personal-data categories.
    binary("data_category_Basic_personal_data"),
    binary("data_category_Special_category_data"),
    binary("data_category_Criminal_data"),
    binary("data_category_Financial_location_data"),
    binary("data_category_Children_data"),
    // Legal bases for processing.
    binary("data_processing_basis_Legitimate_interest"),
    binary("data_processing_basis_contract_performance"),
    binary("data_processing_basis_Consent"),
    binary("data_processing_basis_Legal_obligation"),
    binary("data_processing_basis_Protection_of_vital_interests"),
    binary("data_processing_basis_Performance_of_public_task"),
    field("fine_amount", FieldKind::FreeText),
    field("country", FieldKind::FreeText),
    field("company_industry", FieldKind::Categorical),
    field("gdpr_clause", FieldKind::FreeText),
    field("gdpr_conflict", FieldKind::Categorical),
    // Violation types.
    binary("violation_nature_Breach_of_Data_processing_principle"),
    binary("violation_nature_Violation_of_data_subject_rights"),
    binary("violation_nature_Breach_of_data_security"),
    binary("violation_nature_Violation_of_Data_processing_obligation"),
    // Exemptions.
    binary("free_speech_exception"),
    binary("country_security_exception"),
    binary("Criminal_investigation_exception"),
    binary("violation_result"),
    field("Affected_data_volume", FieldKind::Quantity),
    field("Date", FieldKind::Quantity),
];

/// Catalogue fields absent from a parsed annotation, in catalogue order.
pub fn missing_fields(annotation: &Map<String, Value>) -> Vec<&'static str> {
    ANNOTATION_FIELDS
        .iter()
        .filter(|f| !annotation.contains_key(f.name))
        .map(|f| f.name)
        .collect()
}

/// Catalogue fields present in an annotation whose value does not fit the
/// field's kind, in catalogue order.
pub fn mistyped_fields(annotation: &Map<String, Value>) -> Vec<&'static str> {
    ANNOTATION_FIELDS
        .iter()
        .filter(|f| annotation.get(f.name).is_some_and(|v| !f.kind.accepts(v)))
        .map(|f| f.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalogue_names_are_unique() {
        let mut names: Vec<&str> = ANNOTATION_FIELDS.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ANNOTATION_FIELDS.len());
    }

    #[test]
    fn binary_fields_dominate() {
        let binary = ANNOTATION_FIELDS
            .iter()
            .filter(|f| f.kind == FieldKind::Binary)
            .count();
        assert_eq!(binary, 19);
        assert_eq!(ANNOTATION_FIELDS.len(), 26);
    }

    #[test]
    fn missing_fields_reports_in_catalogue_order() {
        let mut map = Map::new();
        for f in ANNOTATION_FIELDS {
            map.insert(f.name.to_string(), json!(0));
        }
        assert!(missing_fields(&map).is_empty());

        map.remove("Date");
        map.remove("fine_amount");
        assert_eq!(missing_fields(&map), vec!["fine_amount", "Date"]);
    }

    #[test]
    fn binary_kind_accepts_only_flags() {
        assert!(FieldKind::Binary.accepts(&json!(0)));
        assert!(FieldKind::Binary.accepts(&json!(1)));
        assert!(FieldKind::Binary.accepts(&json!("1")));
        assert!(!FieldKind::Binary.accepts(&json!(2)));
        assert!(!FieldKind::Binary.accepts(&json!("yes")));
        assert!(!FieldKind::Binary.accepts(&json!(null)));
        assert!(FieldKind::Quantity.accepts(&json!("about 500 records")));
        assert!(FieldKind::FreeText.accepts(&json!(20000)));
        assert!(!FieldKind::Categorical.accepts(&json!(null)));
    }

    #[test]
    fn mistyped_fields_ignores_absent_and_unknown_keys() {
        let annotation = json!({
            "data_category_Criminal_data": 1,
            "data_category_Children_data": "yes",
            "country": null,
            "fine_amount": "EUR 5,000",
            "extra": [1, 2]
        });
        let map = annotation.as_object().unwrap();
        assert_eq!(
            mistyped_fields(map),
            vec!["data_category_Children_data", "country"]
        );
    }
}
