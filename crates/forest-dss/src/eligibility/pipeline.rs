use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, warn};

use super::artifacts::{ArtifactError, ArtifactStore, Classifier, TransformError};
use super::attribution::{
    rank_contributions, resolve_feature_names, AttributionError, ContributionExplainer,
    FeatureContribution, DEFAULT_TOP_K,
};
use super::evaluator::{DiagnosticKind, SchemeDiagnostic, SchemeEvaluator, SchemeOutcome};
use super::explanation::{compose, ComposeError, SchemeResult};
use super::family::RecordFamily;
use super::features::{FeatureMatrix, FeaturePreparer};
use super::model::TreeShapExplainer;
use super::record::{DataQualityError, RawRecord};
use super::rules::RuleEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Features reported per scheme for families with attribution.
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Everything produced for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityReport {
    pub family: RecordFamily,
    /// Catalog order; schemes without a loadable model are absent.
    pub results: Vec<SchemeResult>,
    pub diagnostics: Vec<SchemeDiagnostic>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    DataQuality(#[from] DataQualityError),
    #[error("{family} artifacts unavailable: {source}")]
    Artifact {
        family: RecordFamily,
        source: ArtifactError,
    },
    #[error("{family} feature transform failed: {source}")]
    Transform {
        family: RecordFamily,
        source: TransformError,
    },
    #[error(transparent)]
    Compose(#[from] ComposeError),
}

/// Shared inference pipeline for every record family. Stateless apart from the artifact
/// store, so one instance serves concurrent callers.
pub struct EligibilityPipeline<S> {
    store: S,
    explainer: Arc<dyn ContributionExplainer>,
    config: PipelineConfig,
}

impl<S: ArtifactStore> EligibilityPipeline<S> {
    pub fn new(store: S, config: PipelineConfig) -> Self {
        Self {
            store,
            explainer: Arc::new(TreeShapExplainer),
            config,
        }
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn ContributionExplainer>) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Scores one record against every scheme in its family catalog.
    ///
    /// Data-quality, preprocessing and transform failures abort the record. Missing or
    /// unreadable scheme models and per-scheme scoring or attribution failures are
    /// reported as diagnostics instead.
    pub fn evaluate(
        &self,
        family: RecordFamily,
        raw: &RawRecord,
    ) -> Result<EligibilityReport, PipelineError> {
        let span = info_span!("eligibility", %family);
        let _entered = span.enter();
        let profile = family.profile();

        // Rule labels are training targets; inference relies on the models alone.
        let record = RuleEngine::new(family).apply(raw)?.record;

        let preparer = FeaturePreparer::load(&self.store, family)
            .map_err(|source| PipelineError::Artifact { family, source })?;
        let features = preparer
            .prepare(&record)
            .map_err(|source| PipelineError::Transform { family, source })?;

        let feature_names = if profile.attribution {
            self.feature_names(family, &preparer, features.width())
        } else {
            Vec::new()
        };

        let evaluator = SchemeEvaluator::new(&self.store, family);
        let mut results = Vec::with_capacity(profile.catalog.len());
        let mut diagnostics = Vec::new();

        for &scheme in profile.catalog {
            let (score, model) = match evaluator.evaluate(&features, scheme) {
                SchemeOutcome::Scored { score, model } => (score, Some(model)),
                SchemeOutcome::Degraded { score, diagnostic } => {
                    diagnostics.push(diagnostic);
                    (score, None)
                }
                SchemeOutcome::Skipped(diagnostic) => {
                    diagnostics.push(diagnostic);
                    continue;
                }
            };

            let top_features = match model {
                Some(model) if profile.attribution => {
                    match self.attribute(model.as_ref(), &features, &feature_names) {
                        Ok(ranked) => Some(ranked),
                        Err(err) => {
                            warn!(%family, scheme, error = %err, "attribution failed");
                            diagnostics.push(SchemeDiagnostic::new(
                                scheme,
                                DiagnosticKind::AttributionFailed,
                                err.to_string(),
                            ));
                            None
                        }
                    }
                }
                _ => None,
            };

            results.push(compose(profile, &score, top_features)?);
        }

        if results.is_empty() {
            warn!(%family, "no scheme models were loaded for this record");
        }
        info!(
            %family,
            scored = results.len(),
            diagnostics = diagnostics.len(),
            "record evaluated"
        );

        Ok(EligibilityReport {
            family,
            results,
            diagnostics,
        })
    }

    fn feature_names(
        &self,
        family: RecordFamily,
        preparer: &FeaturePreparer,
        width: usize,
    ) -> Vec<String> {
        let stored = self.store.feature_names(family).unwrap_or_else(|err| {
            warn!(%family, error = %err, "stored feature names unreadable, falling back");
            None
        });
        resolve_feature_names([stored, preparer.output_feature_names()], width)
    }

    fn attribute(
        &self,
        model: &dyn Classifier,
        features: &FeatureMatrix,
        feature_names: &[String],
    ) -> Result<Vec<FeatureContribution>, AttributionError> {
        let contributions = self.explainer.contributions(model, features)?;
        if contributions.len() != features.width() {
            return Err(AttributionError::WidthMismatch {
                expected: features.width(),
                actual: contributions.len(),
            });
        }
        Ok(rank_contributions(
            &contributions,
            feature_names,
            self.config.top_k,
        ))
    }
}
