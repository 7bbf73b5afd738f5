use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One cell of an input record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Missing,
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Interprets a raw CSV cell: blanks and `NaN` are missing, numerals become numbers.
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(number) if number.is_nan() => Self::Missing,
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Text used by membership and emptiness rules. Missing values read as the empty string
    /// and integral numbers render without a fractional part, so `1` matches `"1"`.
    pub fn text_form(&self) -> Cow<'_, str> {
        match self {
            Self::Missing => Cow::Borrowed(""),
            Self::Flag(true) => Cow::Borrowed("true"),
            Self::Flag(false) => Cow::Borrowed("false"),
            Self::Number(number) => Cow::Owned(render_number(*number)),
            Self::Text(text) => Cow::Borrowed(text.as_str()),
        }
    }

    /// Numeric reading used by threshold rules. Missing values are NaN so every comparison
    /// against them is false.
    pub fn numeric(&self, field: &str) -> Result<f64, DataQualityError> {
        match self {
            Self::Missing => Ok(f64::NAN),
            Self::Flag(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
            Self::Number(number) => Ok(*number),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| DataQualityError::NonNumeric {
                    field: field.to_string(),
                    value: text.clone(),
                }),
        }
    }

    fn canonical(self) -> Self {
        match self {
            Self::Text(text) => Self::Text(text.trim().to_lowercase()),
            other => other,
        }
    }
}

fn render_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// A single entity exactly as received, before any normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, FieldValue>")]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, FieldValue>> for RawRecord {
    fn from(value: BTreeMap<String, FieldValue>) -> Self {
        Self {
            fields: value.into_iter().collect(),
        }
    }
}

impl From<CanonicalRecord> for RawRecord {
    fn from(value: CanonicalRecord) -> Self {
        Self {
            fields: value.fields.into_iter().collect(),
        }
    }
}

/// Normalized copy of a raw record: lowercase trimmed keys, family defaults filled in,
/// lowercase trimmed text values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl CanonicalRecord {
    pub(crate) fn build<'a>(
        raw: impl Iterator<Item = (&'a str, &'a FieldValue)>,
        defaults: impl Iterator<Item = (&'static str, FieldValue)>,
    ) -> Self {
        let mut fields = BTreeMap::new();
        for (key, value) in raw {
            fields.insert(normalize_key(key), value.clone());
        }
        for (key, value) in defaults {
            fields.entry(key.to_string()).or_insert(value);
        }

        Self {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key, value.canonical()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn text(&self, field: &str) -> Cow<'_, str> {
        self.fields
            .get(field)
            .map(FieldValue::text_form)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn equals(&self, field: &str, expected: &str) -> bool {
        self.text(field) == expected
    }

    pub fn is_one_of(&self, field: &str, vocabulary: &[&str]) -> bool {
        let value = self.text(field);
        vocabulary.iter().any(|candidate| *candidate == value)
    }

    pub fn is_filled(&self, field: &str) -> bool {
        !self.text(field).is_empty()
    }

    pub fn number(&self, field: &str) -> Result<f64, DataQualityError> {
        match self.fields.get(field) {
            Some(value) => value.numeric(field),
            None => Ok(f64::NAN),
        }
    }
}

pub(crate) fn normalize_key(key: &str) -> String {
    key.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .to_lowercase()
}

/// A field a rule or transform needs cannot be read as the required type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataQualityError {
    #[error("field `{field}` must be numeric, found `{value}`")]
    NonNumeric { field: String, value: String },
}

impl DataQualityError {
    pub fn field(&self) -> &str {
        match self {
            DataQualityError::NonNumeric { field, .. } => field,
        }
    }
}
