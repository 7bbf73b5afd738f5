use std::sync::Arc;

use crate::eligibility::artifacts::{Classifier, InMemoryArtifactStore, ScoringError};
use crate::eligibility::family::RecordFamily;
use crate::eligibility::features::FeatureMatrix;
use crate::eligibility::model::{ColumnPreprocessor, ColumnSpec, Tree, TreeEnsemble, TreeNode};
use crate::eligibility::pipeline::{EligibilityPipeline, PipelineConfig};
use crate::eligibility::record::RawRecord;

/// Classifier that always returns the same probability.
pub(super) struct Fixed(pub(super) f64);

impl Classifier for Fixed {
    fn predict_probability(&self, _: &FeatureMatrix) -> Result<f64, ScoringError> {
        Ok(self.0)
    }
}

/// Classifier whose scoring always fails.
pub(super) struct Failing;

impl Classifier for Failing {
    fn predict_probability(&self, _: &FeatureMatrix) -> Result<f64, ScoringError> {
        Err(ScoringError::Model("booster rejected input".to_string()))
    }
}

/// Output columns: st share, water distance, households, VO no, VO yes.
pub(super) fn cr_preprocessor() -> ColumnPreprocessor {
    ColumnPreprocessor::new(vec![
        ColumnSpec::Numeric {
            name: "st_hh_percent".to_string(),
            fill: 50.0,
            mean: 50.0,
            scale: 25.0,
        },
        ColumnSpec::numeric("distance_to_water_km"),
        ColumnSpec::numeric("households"),
        ColumnSpec::categorical("shg_vo_presence", ["no", "yes"]),
    ])
}

pub(super) const CR_OUTPUT_NAMES: [&str; 5] = [
    "num__st_hh_percent",
    "num__distance_to_water_km",
    "num__households",
    "cat__shg_vo_presence_no",
    "cat__shg_vo_presence_yes",
];

fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> Tree {
    Tree::new(vec![
        TreeNode::Split {
            feature,
            threshold,
            left: 1,
            right: 2,
            missing_left: true,
            cover: 100.0,
        },
        TreeNode::Leaf {
            value: low,
            cover: 50.0,
        },
        TreeNode::Leaf {
            value: high,
            cover: 50.0,
        },
    ])
}

/// Leans on the standardized ST share and on VO presence.
pub(super) fn st_share_model() -> TreeEnsemble {
    TreeEnsemble::new(
        0.0,
        vec![stump(0, 0.0, -2.0, 2.0), stump(4, 0.5, -0.5, 0.5)],
    )
}

pub(super) fn cr_store() -> InMemoryArtifactStore {
    InMemoryArtifactStore::new()
        .with_preprocessor(RecordFamily::Cr, Arc::new(cr_preprocessor()))
        .with_classifier(RecordFamily::Cr, "JJM", Arc::new(st_share_model()))
        .with_classifier(RecordFamily::Cr, "PMJANMAN", Arc::new(st_share_model()))
        .with_classifier(RecordFamily::Cr, "NRLM_VO", Arc::new(st_share_model()))
}

pub(super) fn pipeline(store: InMemoryArtifactStore) -> EligibilityPipeline<InMemoryArtifactStore> {
    EligibilityPipeline::new(store, PipelineConfig::default())
}

pub(super) fn tribal_village() -> RawRecord {
    RawRecord::new()
        .with("Village", "Padhrotu")
        .with("ST_HH_Percent", 90.0)
        .with("SHG_VO_Presence", "Yes")
        .with("households", 140.0)
}

pub(super) fn cfr_store() -> InMemoryArtifactStore {
    InMemoryArtifactStore::new()
        .with_preprocessor(
            RecordFamily::Cfr,
            Arc::new(ColumnPreprocessor::new(vec![
                ColumnSpec::categorical("water_supply_coverage", ["none", "partial", "full"]),
                ColumnSpec::categorical("frc_formed", ["no", "yes"]),
            ])),
        )
        .with_feature_order(RecordFamily::Cfr, ["Water_Supply_Coverage", "FRC_Formed"])
        .with_classifier(
            RecordFamily::Cfr,
            "jjm",
            Arc::new(TreeEnsemble::new(0.0, vec![stump(1, 0.5, -1.0, 1.5)])),
        )
        .with_classifier(RecordFamily::Cfr, "nrlm_community", Arc::new(Fixed(0.5)))
}
