//! Feature schema shared by inference and retraining
//!
//! The canonical feature order lives here and nowhere else. Both the training
//! matrix and the inference vector are built through [`FeatureVector::to_array`],
//! so the two can never disagree about column positions.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of input features expected by the model
pub const NUM_FEATURES: usize = 6;

/// Name of the ground-truth column in training data
pub const LABEL_COLUMN: &str = "placed";

/// A single model input, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Cgpa,
    DsaRating,
    ProjectsCount,
    Internship,
    Attendance,
    AptitudeScore,
}

impl Feature {
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::Cgpa,
        Feature::DsaRating,
        Feature::ProjectsCount,
        Feature::Internship,
        Feature::Attendance,
        Feature::AptitudeScore,
    ];

    /// Wire name of the feature (JSON key and CSV header)
    pub fn name(self) -> &'static str {
        match self {
            Feature::Cgpa => "cgpa",
            Feature::DsaRating => "dsaRating",
            Feature::ProjectsCount => "projectsCount",
            Feature::Internship => "internship",
            Feature::Attendance => "attendance",
            Feature::AptitudeScore => "aptitudeScore",
        }
    }

    /// Coerce a raw value into the numeric encoding the estimator sees
    pub fn coerce(self, value: &Value) -> Result<f64, String> {
        match self {
            Feature::Cgpa | Feature::Attendance | Feature::AptitudeScore => as_number(value),
            Feature::DsaRating => {
                let rating = as_integer(value)?;
                // i64::MAX as f64 rounds up to 2^63, which is already out of range
                if rating < i64::MIN as f64 || rating >= i64::MAX as f64 {
                    return Err(format!("integer {} is out of range", rating));
                }
                Ok(rating)
            }
            Feature::ProjectsCount => {
                let count = as_integer(value)?;
                if count < 0.0 {
                    return Err("expected a non-negative integer".to_string());
                }
                if count > u32::MAX as f64 {
                    return Err(format!("count {} is out of range", count));
                }
                Ok(count)
            }
            Feature::Internship => as_flag(value).map(|flag| if flag { 1.0 } else { 0.0 }),
        }
    }
}

/// Canonical feature names, in model input order
pub fn feature_names() -> Vec<String> {
    Feature::ALL.iter().map(|f| f.name().to_string()).collect()
}

/// Validated model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub cgpa: f64,
    pub dsa_rating: i64,
    pub projects_count: u32,
    pub internship: bool,
    pub attendance: f64,
    pub aptitude_score: f64,
}

impl FeatureVector {
    /// Build from values already coerced and laid out in canonical order
    fn from_canonical(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            cgpa: values[0],
            dsa_rating: values[1] as i64,
            projects_count: values[2] as u32,
            internship: values[3] >= 0.5,
            attendance: values[4],
            aptitude_score: values[5],
        }
    }

    /// Estimator encoding in canonical order
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.cgpa,
            self.dsa_rating as f64,
            self.projects_count as f64,
            if self.internship { 1.0 } else { 0.0 },
            self.attendance,
            self.aptitude_score,
        ]
    }
}

/// A training example
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub features: FeatureVector,
    pub placed: bool,
}

/// Validate a single record and lay it out in canonical order.
///
/// Every missing key is reported together; type checks only run once the
/// record is structurally complete.
pub fn validate_and_order(record: &Map<String, Value>) -> Result<FeatureVector, SchemaError> {
    let missing: Vec<String> = Feature::ALL
        .iter()
        .filter(|f| !record.contains_key(f.name()))
        .map(|f| f.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingFields { missing });
    }

    let mut values = [0.0; NUM_FEATURES];
    for (slot, feature) in values.iter_mut().zip(Feature::ALL) {
        *slot = feature
            .coerce(&record[feature.name()])
            .map_err(|reason| SchemaError::InvalidType {
                field: feature.name().to_string(),
                reason,
            })?;
    }

    Ok(FeatureVector::from_canonical(values))
}

/// Positions of the required columns within a tabular source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub features: [usize; NUM_FEATURES],
    pub label: usize,
}

/// Bulk-mode check: every feature column plus the label must be present.
///
/// Extra columns are ignored. The error names exactly the missing columns,
/// features in canonical order followed by the label.
pub fn validate_columns<'a, I>(headers: I) -> Result<ColumnIndex, SchemaError>
where
    I: IntoIterator<Item = &'a str>,
{
    let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();
    let position = |name: &str| headers.iter().position(|h| *h == name);

    let mut features = [0usize; NUM_FEATURES];
    let mut missing = Vec::new();
    for (slot, feature) in features.iter_mut().zip(Feature::ALL) {
        match position(feature.name()) {
            Some(idx) => *slot = idx,
            None => missing.push(feature.name().to_string()),
        }
    }
    let label = position(LABEL_COLUMN);
    if label.is_none() {
        missing.push(LABEL_COLUMN.to_string());
    }

    match label {
        Some(label) if missing.is_empty() => Ok(ColumnIndex { features, label }),
        _ => Err(SchemaError::MissingColumns { missing }),
    }
}

/// Coerce one row of a columnar source into a labeled example
pub fn coerce_row(
    cells: &[Value],
    index: &ColumnIndex,
    row: usize,
) -> Result<LabeledRow, SchemaError> {
    let cell = |idx: usize| cells.get(idx).unwrap_or(&Value::Null);
    let invalid = |field: &str, reason: String| SchemaError::InvalidCell {
        row,
        field: field.to_string(),
        reason,
    };

    let mut values = [0.0; NUM_FEATURES];
    for ((slot, feature), idx) in values.iter_mut().zip(Feature::ALL).zip(index.features) {
        *slot = feature
            .coerce(cell(idx))
            .map_err(|reason| invalid(feature.name(), reason))?;
    }
    let placed = as_flag(cell(index.label)).map_err(|reason| invalid(LABEL_COLUMN, reason))?;

    Ok(LabeledRow {
        features: FeatureVector::from_canonical(values),
        placed,
    })
}

fn as_number(value: &Value) -> Result<f64, String> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(format!("expected a number, got {}", describe(value))),
    }
}

fn as_integer(value: &Value) -> Result<f64, String> {
    let number = as_number(value).map_err(|_| format!("expected an integer, got {}", describe(value)))?;
    if number.fract() != 0.0 {
        return Err(format!("expected an integer, got {}", number));
    }
    Ok(number)
}

fn as_flag(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 0.0 => Ok(false),
            Some(v) if v == 1.0 => Ok(true),
            _ => Err(format!("expected a boolean or 0/1, got {}", n)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "1.0" | "yes" | "on" => Ok(true),
            "false" | "0" | "0.0" | "no" | "off" => Ok(false),
            _ => Err(format!("expected a boolean or 0/1, got {}", describe(value))),
        },
        _ => Err(format!("expected a boolean or 0/1, got {}", describe(value))),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) if s.trim().is_empty() => "an empty value".to_string(),
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn strong_profile() -> Map<String, Value> {
        record(json!({
            "cgpa": 8.0,
            "dsaRating": 4,
            "projectsCount": 3,
            "internship": true,
            "attendance": 90,
            "aptitudeScore": 80
        }))
    }

    #[test]
    fn test_canonical_order_independent_of_key_order() {
        let shuffled = record(json!({
            "aptitudeScore": 80,
            "internship": true,
            "cgpa": 8.0,
            "attendance": 90,
            "projectsCount": 3,
            "dsaRating": 4
        }));

        let a = validate_and_order(&strong_profile()).unwrap();
        let b = validate_and_order(&shuffled).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_array(), [8.0, 4.0, 3.0, 1.0, 90.0, 80.0]);
    }

    #[test]
    fn test_feature_names_match_canonical_order() {
        assert_eq!(
            feature_names(),
            vec!["cgpa", "dsaRating", "projectsCount", "internship", "attendance", "aptitudeScore"]
        );
    }

    #[test]
    fn test_all_missing_fields_reported() {
        let partial = record(json!({ "cgpa": 7.0, "internship": false }));
        let err = validate_and_order(&partial).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingFields {
                missing: vec![
                    "dsaRating".to_string(),
                    "projectsCount".to_string(),
                    "attendance".to_string(),
                    "aptitudeScore".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_internship_accepts_numeric_flag() {
        let mut rec = strong_profile();
        rec.insert("internship".to_string(), json!(0));
        assert!(!validate_and_order(&rec).unwrap().internship);

        rec.insert("internship".to_string(), json!(1));
        assert!(validate_and_order(&rec).unwrap().internship);

        rec.insert("internship".to_string(), json!(2));
        assert!(matches!(
            validate_and_order(&rec),
            Err(SchemaError::InvalidType { ref field, .. }) if field == "internship"
        ));
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let mut rec = strong_profile();
        rec.insert("cgpa".to_string(), json!("7.25"));
        rec.insert("dsaRating".to_string(), json!("2"));
        let vector = validate_and_order(&rec).unwrap();
        assert_eq!(vector.cgpa, 7.25);
        assert_eq!(vector.dsa_rating, 2);
    }

    #[test]
    fn test_non_coercible_values_rejected() {
        let mut rec = strong_profile();
        rec.insert("attendance".to_string(), json!("ninety"));
        let err = validate_and_order(&rec).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidType { ref field, .. } if field == "attendance"));

        let mut rec = strong_profile();
        rec.insert("cgpa".to_string(), Value::Null);
        assert!(validate_and_order(&rec).is_err());
    }

    #[test]
    fn test_integer_fields_reject_fractions_and_negatives() {
        let mut rec = strong_profile();
        rec.insert("dsaRating".to_string(), json!(3.5));
        assert!(matches!(
            validate_and_order(&rec),
            Err(SchemaError::InvalidType { ref field, .. }) if field == "dsaRating"
        ));

        let mut rec = strong_profile();
        rec.insert("projectsCount".to_string(), json!(-1));
        assert!(matches!(
            validate_and_order(&rec),
            Err(SchemaError::InvalidType { ref field, .. }) if field == "projectsCount"
        ));

        let mut rec = strong_profile();
        rec.insert("dsaRating".to_string(), json!(4.0));
        assert_eq!(validate_and_order(&rec).unwrap().dsa_rating, 4);
    }

    #[test]
    fn test_extreme_values_pass_through() {
        let mut rec = strong_profile();
        rec.insert("attendance".to_string(), json!(250.0));
        assert_eq!(validate_and_order(&rec).unwrap().attendance, 250.0);
    }

    #[test]
    fn test_integers_beyond_field_range_rejected() {
        let mut rec = strong_profile();
        rec.insert("dsaRating".to_string(), json!(1e20));
        assert!(matches!(
            validate_and_order(&rec),
            Err(SchemaError::InvalidType { ref field, .. }) if field == "dsaRating"
        ));

        let mut rec = strong_profile();
        rec.insert("projectsCount".to_string(), json!(5_000_000_000u64));
        assert!(matches!(
            validate_and_order(&rec),
            Err(SchemaError::InvalidType { ref field, .. }) if field == "projectsCount"
        ));

        // The largest representable count is kept exactly
        let mut rec = strong_profile();
        rec.insert("projectsCount".to_string(), json!(u32::MAX));
        let vector = validate_and_order(&rec).unwrap();
        assert_eq!(vector.projects_count, u32::MAX);
        assert_eq!(vector.to_array()[2], 4_294_967_295.0);
    }

    #[test]
    fn test_validate_columns_reports_exact_missing_set() {
        let err = validate_columns(["cgpa", "dsaRating", "internship", "aptitudeScore"]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns {
                missing: vec![
                    "projectsCount".to_string(),
                    "attendance".to_string(),
                    "placed".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_validate_columns_ignores_extras_and_order() {
        let index = validate_columns([
            "placed",
            "studentId",
            "aptitudeScore",
            "attendance",
            "internship",
            "projectsCount",
            "dsaRating",
            "cgpa",
        ])
        .unwrap();
        assert_eq!(index.features, [7, 6, 5, 4, 3, 2]);
        assert_eq!(index.label, 0);
    }

    #[test]
    fn test_coerce_row_projects_into_canonical_order() {
        let index = validate_columns([
            "placed",
            "aptitudeScore",
            "attendance",
            "internship",
            "projectsCount",
            "dsaRating",
            "cgpa",
        ])
        .unwrap();
        let cells: Vec<Value> = ["True", "80", "90", "False", "3", "4", "8.0"]
            .iter()
            .map(|c| Value::String(c.to_string()))
            .collect();

        let row = coerce_row(&cells, &index, 1).unwrap();
        assert!(row.placed);
        assert_eq!(row.features.to_array(), [8.0, 4.0, 3.0, 0.0, 90.0, 80.0]);
    }

    #[test]
    fn test_coerce_row_reports_row_and_column() {
        let index = validate_columns(feature_names().iter().map(String::as_str).chain(["placed"])).unwrap();
        let cells: Vec<Value> = ["8.0", "4", "", "1", "90", "80", "1"]
            .iter()
            .map(|c| Value::String(c.to_string()))
            .collect();

        let err = coerce_row(&cells, &index, 7).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidCell { row: 7, ref field, .. } if field == "projectsCount"
        ));
    }

    #[test]
    fn test_coerce_row_rejects_out_of_range_cell() {
        let index = validate_columns(feature_names().iter().map(String::as_str).chain(["placed"])).unwrap();
        let cells: Vec<Value> = ["8.0", "4", "5000000000", "1", "90", "80", "1"]
            .iter()
            .map(|c| Value::String(c.to_string()))
            .collect();

        let err = coerce_row(&cells, &index, 3).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidCell { row: 3, ref field, .. } if field == "projectsCount"
        ));
    }
}
