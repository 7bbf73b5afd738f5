use serde::Serialize;

use super::attribution::FeatureContribution;
use super::evaluator::SchemeScore;
use super::family::FamilyProfile;

/// Final per-scheme answer returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeResult {
    pub scheme: &'static str,
    pub probability: f64,
    pub eligible: bool,
    /// `YES` / `NO` rendering of `eligible` for the dashboard.
    pub decision: &'static str,
    pub reason: &'static str,
    pub benefit: &'static str,
    pub impact: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_features: Option<Vec<FeatureContribution>>,
}

impl SchemeResult {
    pub fn decision_label(eligible: bool) -> &'static str {
        if eligible {
            "YES"
        } else {
            "NO"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("scheme `{scheme}` is not in the {family} catalog")]
    UnknownScheme { family: String, scheme: String },
}

/// Attaches the scheme's explanation text to a score.
pub fn compose(
    profile: &FamilyProfile,
    score: &SchemeScore,
    top_features: Option<Vec<FeatureContribution>>,
) -> Result<SchemeResult, ComposeError> {
    let scheme = profile
        .catalog_entry(score.scheme)
        .ok_or_else(|| ComposeError::UnknownScheme {
            family: profile.family.to_string(),
            scheme: score.scheme.to_string(),
        })?;
    let metadata = profile.metadata_for(scheme);

    Ok(SchemeResult {
        scheme,
        probability: score.probability,
        eligible: score.eligible,
        decision: SchemeResult::decision_label(score.eligible),
        reason: metadata.reason,
        benefit: metadata.benefit,
        impact: metadata.impact,
        top_features,
    })
}
