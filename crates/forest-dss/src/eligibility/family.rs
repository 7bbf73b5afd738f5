use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::families;
use super::record::{CanonicalRecord, DataQualityError, FieldValue};
use super::rules::LabelSet;

/// The three forest-rights record families, each with its own schema and scheme catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFamily {
    /// Individual forest-rights claims.
    Ifr,
    /// Community forest-rights claims.
    Cr,
    /// Community forest-resource records.
    Cfr,
}

impl RecordFamily {
    pub const ALL: [RecordFamily; 3] = [RecordFamily::Ifr, RecordFamily::Cr, RecordFamily::Cfr];

    pub const fn label(self) -> &'static str {
        match self {
            RecordFamily::Ifr => "ifr",
            RecordFamily::Cr => "cr",
            RecordFamily::Cfr => "cfr",
        }
    }

    pub fn profile(self) -> &'static FamilyProfile {
        match self {
            RecordFamily::Ifr => &families::ifr::PROFILE,
            RecordFamily::Cr => &families::cr::PROFILE,
            RecordFamily::Cfr => &families::cfr::PROFILE,
        }
    }

    pub fn catalog(self) -> &'static [&'static str] {
        self.profile().catalog
    }
}

impl fmt::Display for RecordFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecordFamily {
    type Err = UnknownFamily;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ifr" => Ok(RecordFamily::Ifr),
            "cr" => Ok(RecordFamily::Cr),
            "cfr" => Ok(RecordFamily::Cfr),
            _ => Err(UnknownFamily {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record family `{value}` (expected ifr, cr or cfr)")]
pub struct UnknownFamily {
    pub value: String,
}

/// Value inserted for a required field the raw record does not carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Number(f64),
    Text(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> FieldValue {
        match self {
            FieldDefault::Number(number) => FieldValue::Number(number),
            FieldDefault::Text(text) => FieldValue::Text(text.to_string()),
        }
    }
}

/// Human-readable explanation attached to a scheme decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemeMetadata {
    pub reason: &'static str,
    pub benefit: &'static str,
    pub impact: &'static str,
}

/// File names of a family's artifacts relative to the artifact root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub directory: &'static str,
    pub preprocessor: &'static str,
    /// Stored column order fed to the preprocessor; when absent the preprocessor's own
    /// input columns are used.
    pub feature_order: Option<&'static str>,
    /// Stored names of the transformed columns, preferred for attribution output.
    pub feature_names: Option<&'static str>,
    pub model_prefix: &'static str,
}

impl ArtifactLayout {
    pub fn model_artifact(&self, scheme: &str) -> String {
        format!("{}{}", self.model_prefix, scheme)
    }
}

pub type LabelRules = fn(&CanonicalRecord) -> Result<LabelSet, DataQualityError>;

/// Everything that differs between the three families. The pipeline itself is shared.
pub struct FamilyProfile {
    pub family: RecordFamily,
    pub defaults: &'static [(&'static str, FieldDefault)],
    pub catalog: &'static [&'static str],
    pub derive_labels: LabelRules,
    pub metadata: &'static [(&'static str, SchemeMetadata)],
    pub fallback: SchemeMetadata,
    pub layout: ArtifactLayout,
    /// Community forest-resource models are reported without feature attributions.
    pub attribution: bool,
}

impl FamilyProfile {
    pub fn metadata_for(&self, scheme: &str) -> SchemeMetadata {
        self.metadata
            .iter()
            .find(|(candidate, _)| *candidate == scheme)
            .map(|(_, metadata)| *metadata)
            .unwrap_or(self.fallback)
    }

    pub fn catalog_entry(&self, scheme: &str) -> Option<&'static str> {
        self.catalog
            .iter()
            .copied()
            .find(|candidate| *candidate == scheme)
    }
}
