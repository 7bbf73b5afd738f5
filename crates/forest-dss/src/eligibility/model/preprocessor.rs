use serde::{Deserialize, Serialize};

use crate::eligibility::artifacts::{Preprocessor, TransformError};
use crate::eligibility::features::{FeatureFrame, FeatureMatrix};
use crate::eligibility::record::FieldValue;

/// Column-wise preprocessing artifact: numeric columns are imputed and standardized,
/// categorical columns are one-hot encoded with unknown categories ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPreprocessor {
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSpec {
    Numeric {
        name: String,
        /// Replacement for missing cells, applied before scaling.
        #[serde(default)]
        fill: f64,
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    Categorical {
        name: String,
        categories: Vec<String>,
    },
}

fn unit_scale() -> f64 {
    1.0
}

impl ColumnSpec {
    pub fn numeric(name: impl Into<String>) -> Self {
        ColumnSpec::Numeric {
            name: name.into(),
            fill: 0.0,
            mean: 0.0,
            scale: 1.0,
        }
    }

    pub fn categorical<I, C>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        ColumnSpec::Categorical {
            name: name.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ColumnSpec::Numeric { name, .. } | ColumnSpec::Categorical { name, .. } => name,
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnSpec::Numeric { .. } => 1,
            ColumnSpec::Categorical { categories, .. } => categories.len(),
        }
    }

    fn encode(&self, value: &FieldValue, out: &mut Vec<f64>) -> Result<(), TransformError> {
        match self {
            ColumnSpec::Numeric {
                name,
                fill,
                mean,
                scale,
            } => {
                let raw = match value {
                    FieldValue::Missing => *fill,
                    other => other.numeric(name).map_err(|_| TransformError::NonNumeric {
                        column: name.clone(),
                        value: other.text_form().into_owned(),
                    })?,
                };
                let raw = if raw.is_nan() { *fill } else { raw };
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                out.push((raw - mean) / scale);
            }
            ColumnSpec::Categorical { categories, .. } => {
                let observed = value.text_form().trim().to_lowercase();
                out.extend(categories.iter().map(|category| {
                    if !observed.is_empty() && category.trim().to_lowercase() == observed {
                        1.0
                    } else {
                        0.0
                    }
                }));
            }
        }
        Ok(())
    }
}

impl ColumnPreprocessor {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn output_width(&self) -> usize {
        self.columns.iter().map(ColumnSpec::width).sum()
    }
}

impl Preprocessor for ColumnPreprocessor {
    fn input_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|spec| spec.name().to_string())
            .collect()
    }

    fn transform(&self, frame: &FeatureFrame) -> Result<FeatureMatrix, TransformError> {
        let mut values = Vec::with_capacity(self.output_width());
        for spec in &self.columns {
            let value = frame
                .get(spec.name())
                .ok_or_else(|| TransformError::MissingColumn {
                    column: spec.name().to_string(),
                })?;
            spec.encode(value, &mut values)?;
        }
        Ok(FeatureMatrix::new(values))
    }

    fn output_feature_names(&self) -> Option<Vec<String>> {
        let mut names = Vec::with_capacity(self.output_width());
        for spec in &self.columns {
            match spec {
                ColumnSpec::Numeric { name, .. } => names.push(format!("num__{name}")),
                ColumnSpec::Categorical { name, categories } => names.extend(
                    categories
                        .iter()
                        .map(|category| format!("cat__{name}_{category}")),
                ),
            }
        }
        Some(names)
    }
}
