use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::artifacts::{ArtifactError, ArtifactStore, Classifier, ModelLookup, ScoringError};
use super::family::RecordFamily;
use super::features::FeatureMatrix;

/// Fixed decision threshold shared by every scheme.
pub const ELIGIBILITY_THRESHOLD: f64 = 0.5;

pub fn is_eligible(probability: f64) -> bool {
    probability >= ELIGIBILITY_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchemeScore {
    pub scheme: &'static str,
    pub probability: f64,
    pub eligible: bool,
}

impl SchemeScore {
    pub fn new(scheme: &'static str, probability: f64) -> Self {
        Self {
            scheme,
            probability,
            eligible: is_eligible(probability),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ModelMissing,
    ModelUnreadable,
    ScoringFailed,
    AttributionFailed,
}

/// Per-scheme problem that did not abort the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeDiagnostic {
    pub scheme: &'static str,
    pub kind: DiagnosticKind,
    pub detail: String,
}

impl SchemeDiagnostic {
    pub fn new(scheme: &'static str, kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            scheme,
            kind,
            detail: detail.into(),
        }
    }
}

pub enum SchemeOutcome {
    Scored {
        score: SchemeScore,
        model: Arc<dyn Classifier>,
    },
    /// The model loaded but could not score the row; the scheme is reported as ineligible.
    Degraded {
        score: SchemeScore,
        diagnostic: SchemeDiagnostic,
    },
    Skipped(SchemeDiagnostic),
}

impl SchemeOutcome {
    pub fn score(&self) -> Option<SchemeScore> {
        match self {
            SchemeOutcome::Scored { score, .. } | SchemeOutcome::Degraded { score, .. } => {
                Some(*score)
            }
            SchemeOutcome::Skipped(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&SchemeDiagnostic> {
        match self {
            SchemeOutcome::Scored { .. } => None,
            SchemeOutcome::Degraded { diagnostic, .. } | SchemeOutcome::Skipped(diagnostic) => {
                Some(diagnostic)
            }
        }
    }
}

/// Scores one prepared row against each scheme model of a family.
pub struct SchemeEvaluator<'a, S: ?Sized> {
    store: &'a S,
    family: RecordFamily,
}

impl<'a, S> SchemeEvaluator<'a, S>
where
    S: ArtifactStore + ?Sized,
{
    pub fn new(store: &'a S, family: RecordFamily) -> Self {
        Self { store, family }
    }

    pub fn evaluate(&self, features: &FeatureMatrix, scheme: &'static str) -> SchemeOutcome {
        let family = self.family;
        let model = match self.store.classifier(family, scheme) {
            Ok(ModelLookup::Found(model)) => model,
            Ok(ModelLookup::NotFound) | Err(ArtifactError::NotFound { .. }) => {
                warn!(%family, scheme, "no trained model for scheme, skipping");
                return SchemeOutcome::Skipped(SchemeDiagnostic::new(
                    scheme,
                    DiagnosticKind::ModelMissing,
                    "no trained model",
                ));
            }
            Err(err) => {
                error!(%family, scheme, error = %err, "scheme model unreadable, skipping");
                return SchemeOutcome::Skipped(SchemeDiagnostic::new(
                    scheme,
                    DiagnosticKind::ModelUnreadable,
                    err.to_string(),
                ));
            }
        };

        match checked_probability(model.as_ref(), features) {
            Ok(probability) => {
                debug!(%family, scheme, probability, "scheme scored");
                SchemeOutcome::Scored {
                    score: SchemeScore::new(scheme, probability),
                    model,
                }
            }
            Err(err) => {
                warn!(%family, scheme, error = %err, "scoring failed, treating scheme as ineligible");
                SchemeOutcome::Degraded {
                    score: SchemeScore::new(scheme, 0.0),
                    diagnostic: SchemeDiagnostic::new(
                        scheme,
                        DiagnosticKind::ScoringFailed,
                        err.to_string(),
                    ),
                }
            }
        }
    }
}

fn checked_probability(
    model: &dyn Classifier,
    features: &FeatureMatrix,
) -> Result<f64, ScoringError> {
    let probability = model.predict_probability(features)?;
    if probability.is_finite() && (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(ScoringError::InvalidProbability { value: probability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::artifacts::InMemoryArtifactStore;

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn predict_probability(&self, _: &FeatureMatrix) -> Result<f64, ScoringError> {
            Ok(self.0)
        }
    }

    fn evaluate(store: &InMemoryArtifactStore, scheme: &'static str) -> SchemeOutcome {
        SchemeEvaluator::new(store, RecordFamily::Cr)
            .evaluate(&FeatureMatrix::new(vec![1.0]), scheme)
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(is_eligible(0.5));
        assert!(!is_eligible(0.499_999));
    }

    #[test]
    fn found_model_is_scored() {
        let store = InMemoryArtifactStore::new().with_classifier(
            RecordFamily::Cr,
            "JJM",
            Arc::new(Fixed(0.5)),
        );
        let outcome = evaluate(&store, "JJM");
        assert_eq!(outcome.score(), Some(SchemeScore::new("JJM", 0.5)));
        assert!(outcome.diagnostic().is_none());
        assert!(outcome.score().is_some_and(|score| score.eligible));
    }

    #[test]
    fn absent_model_is_skipped() {
        let outcome = evaluate(&InMemoryArtifactStore::new(), "DAJGUA");
        assert!(outcome.score().is_none());
        assert_eq!(
            outcome.diagnostic().map(|diagnostic| diagnostic.kind),
            Some(DiagnosticKind::ModelMissing)
        );
    }

    #[test]
    fn corrupt_model_is_skipped_with_diagnostic() {
        let store = InMemoryArtifactStore::new().with_corrupt_classifier(
            RecordFamily::Cr,
            "NRLM_VO",
            "truncated file",
        );
        let outcome = evaluate(&store, "NRLM_VO");
        assert!(outcome.score().is_none());
        let diagnostic = outcome.diagnostic().expect("diagnostic recorded");
        assert_eq!(diagnostic.kind, DiagnosticKind::ModelUnreadable);
        assert!(diagnostic.detail.contains("truncated file"));
    }

    #[test]
    fn out_of_range_probability_degrades_to_zero() {
        let store = InMemoryArtifactStore::new().with_classifier(
            RecordFamily::Cr,
            "PMJANMAN",
            Arc::new(Fixed(1.7)),
        );
        let outcome = evaluate(&store, "PMJANMAN");
        assert_eq!(outcome.score(), Some(SchemeScore::new("PMJANMAN", 0.0)));
        assert_eq!(
            outcome.diagnostic().map(|diagnostic| diagnostic.kind),
            Some(DiagnosticKind::ScoringFailed)
        );
    }
}
