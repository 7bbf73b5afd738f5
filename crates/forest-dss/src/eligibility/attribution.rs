use serde::Serialize;

use super::artifacts::Classifier;
use super::features::FeatureMatrix;

/// Number of features reported per scheme unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Produces one signed contribution per transformed feature for a single prediction.
pub trait ContributionExplainer: Send + Sync {
    fn contributions(
        &self,
        model: &dyn Classifier,
        features: &FeatureMatrix,
    ) -> Result<Vec<f64>, AttributionError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributionError {
    #[error("model does not expose a structure the explainer understands")]
    UnsupportedModel,
    #[error("model splits on feature {feature} but the row has {width} values")]
    FeatureOutOfRange { feature: usize, width: usize },
    #[error("explainer returned {actual} contributions for {expected} features")]
    WidthMismatch { expected: usize, actual: usize },
    #[error("explainer failed: {0}")]
    Engine(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub contribution: f64,
}

/// Top `k` features by absolute contribution. Ties keep feature order and NaN counts as
/// zero influence.
pub fn rank_contributions(
    contributions: &[f64],
    feature_names: &[String],
    k: usize,
) -> Vec<FeatureContribution> {
    let magnitude = |value: f64| if value.is_nan() { 0.0 } else { value.abs() };

    let mut order: Vec<usize> = (0..contributions.len()).collect();
    order.sort_by(|a, b| {
        magnitude(contributions[*b]).total_cmp(&magnitude(contributions[*a]))
    });

    order
        .into_iter()
        .take(k)
        .map(|index| FeatureContribution {
            feature: feature_names
                .get(index)
                .cloned()
                .unwrap_or_else(|| positional_name(index)),
            contribution: contributions[index],
        })
        .collect()
}

fn positional_name(index: usize) -> String {
    format!("f_{index}")
}

/// Feature names for a transformed row of `width` values. Candidate sources are tried in
/// order and any whose length disagrees with the row is skipped; positional names are the
/// last resort.
pub fn resolve_feature_names<I>(sources: I, width: usize) -> Vec<String>
where
    I: IntoIterator<Item = Option<Vec<String>>>,
{
    sources
        .into_iter()
        .flatten()
        .find(|names| names.len() == width)
        .unwrap_or_else(|| (0..width).map(positional_name).collect())
}
