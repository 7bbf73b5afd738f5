use std::sync::Arc;

use super::artifacts::{ArtifactError, ArtifactStore, Preprocessor, TransformError};
use super::family::RecordFamily;
use super::record::{normalize_key, CanonicalRecord, FieldValue};

/// Ordered column selection handed to a preprocessor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureFrame {
    columns: Vec<(String, FieldValue)>,
}

impl FeatureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.columns.push((column.into(), value.into()));
        self
    }

    /// Case-insensitive column lookup.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        let wanted = normalize_key(column);
        self.columns
            .iter()
            .find(|(name, _)| normalize_key(name) == wanted)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One transformed, all-numeric feature row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn row(&self) -> &[f64] {
        &self.values
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }
}

impl From<Vec<f64>> for FeatureMatrix {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Selects a family's model columns from a canonical record and runs the family
/// preprocessor over them.
#[derive(Clone)]
pub struct FeaturePreparer {
    order: Vec<String>,
    preprocessor: Arc<dyn Preprocessor>,
}

impl FeaturePreparer {
    pub fn new(order: Vec<String>, preprocessor: Arc<dyn Preprocessor>) -> Self {
        Self {
            order,
            preprocessor,
        }
    }

    /// Loads the family preprocessor. The stored column order wins when the family keeps
    /// one; otherwise the preprocessor's own input columns define the selection.
    pub fn load<S>(store: &S, family: RecordFamily) -> Result<Self, ArtifactError>
    where
        S: ArtifactStore + ?Sized,
    {
        let preprocessor = store.preprocessor(family)?;
        let order = match store.feature_order(family)? {
            Some(order) => order,
            None => preprocessor.input_columns(),
        };
        Ok(Self::new(order, preprocessor))
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Absent columns become `Missing`, never a rule default.
    pub fn select(&self, record: &CanonicalRecord) -> FeatureFrame {
        FeatureFrame {
            columns: self
                .order
                .iter()
                .map(|column| {
                    let value = record
                        .get(&normalize_key(column))
                        .cloned()
                        .unwrap_or(FieldValue::Missing);
                    (column.clone(), value)
                })
                .collect(),
        }
    }

    pub fn prepare(&self, record: &CanonicalRecord) -> Result<FeatureMatrix, TransformError> {
        self.preprocessor.transform(&self.select(record))
    }

    pub fn output_feature_names(&self) -> Option<Vec<String>> {
        self.preprocessor.output_feature_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::record::RawRecord;
    use crate::eligibility::rules::RuleEngine;

    struct Passthrough;

    impl Preprocessor for Passthrough {
        fn input_columns(&self) -> Vec<String> {
            vec!["St_HH_Percent".to_string(), "households".to_string()]
        }

        fn transform(&self, frame: &FeatureFrame) -> Result<FeatureMatrix, TransformError> {
            frame
                .columns
                .iter()
                .map(|(column, value)| match value {
                    FieldValue::Missing => Ok(f64::NAN),
                    FieldValue::Number(number) => Ok(*number),
                    other => Err(TransformError::NonNumeric {
                        column: column.clone(),
                        value: other.text_form().into_owned(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FeatureMatrix::new)
        }
    }

    fn canonical(raw: RawRecord) -> CanonicalRecord {
        RuleEngine::new(RecordFamily::Cr).canonicalize(&raw)
    }

    #[test]
    fn selection_matches_columns_case_insensitively() {
        let preparer = FeaturePreparer::new(Passthrough.input_columns(), Arc::new(Passthrough));
        let frame = preparer.select(&canonical(RawRecord::new().with("ST_HH_PERCENT", 80.0)));

        assert_eq!(frame.get("st_hh_percent"), Some(&FieldValue::Number(80.0)));
        assert_eq!(frame.get("households"), Some(&FieldValue::Missing));
        assert_eq!(
            frame.columns().collect::<Vec<_>>(),
            vec!["St_HH_Percent", "households"]
        );
    }

    #[test]
    fn prepare_surfaces_transform_failures() {
        let preparer = FeaturePreparer::new(Passthrough.input_columns(), Arc::new(Passthrough));
        let error = preparer
            .prepare(&canonical(RawRecord::new().with("households", "many")))
            .expect_err("text cannot be passed through");
        assert_eq!(
            error,
            TransformError::NonNumeric {
                column: "households".to_string(),
                value: "many".to_string(),
            }
        );
    }

    #[test]
    fn prepared_row_keeps_selection_order() {
        let preparer = FeaturePreparer::new(
            vec!["households".to_string(), "st_hh_percent".to_string()],
            Arc::new(Passthrough),
        );
        let matrix = preparer
            .prepare(&canonical(
                RawRecord::new()
                    .with("households", 12.0)
                    .with("st_hh_percent", 55.0),
            ))
            .expect("numeric row");
        assert_eq!(matrix.row(), &[12.0, 55.0]);
        assert_eq!(matrix.width(), 2);
    }
}
