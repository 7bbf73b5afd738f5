//! Eligibility pipeline for forest-rights welfare schemes.
//!
//! Two paths share the per-family rule engine. Training-data generation keeps the
//! rule-derived labels; inference drops them and scores the record with the trained
//! artifacts only.

pub mod artifacts;
pub(crate) mod attribution;
pub(crate) mod evaluator;
pub(crate) mod explanation;
pub mod families;
pub mod family;
pub(crate) mod features;
pub mod ingest;
pub mod model;
pub(crate) mod pipeline;
pub mod record;
pub mod rules;

#[cfg(test)]
mod tests;

pub use artifacts::{
    ArtifactError, ArtifactStore, Classifier, FsArtifactStore, InMemoryArtifactStore,
    ModelLookup, Preprocessor, ScoringError, TransformError,
};
pub use attribution::{
    rank_contributions, resolve_feature_names, AttributionError, ContributionExplainer,
    FeatureContribution, DEFAULT_TOP_K,
};
pub use evaluator::{
    is_eligible, DiagnosticKind, SchemeDiagnostic, SchemeEvaluator, SchemeOutcome, SchemeScore,
    ELIGIBILITY_THRESHOLD,
};
pub use explanation::{compose, ComposeError, SchemeResult};
pub use family::{FamilyProfile, RecordFamily, SchemeMetadata, UnknownFamily};
pub use features::{FeatureFrame, FeatureMatrix, FeaturePreparer};
pub use ingest::{read_record_at, read_records, write_labelled, IngestError};
pub use model::{ColumnPreprocessor, ColumnSpec, TreeEnsemble, TreeShapExplainer};
pub use pipeline::{EligibilityPipeline, EligibilityReport, PipelineConfig, PipelineError};
pub use record::{CanonicalRecord, DataQualityError, FieldValue, RawRecord};
pub use rules::{LabelSet, RuleEngine, RuleOutcome, SchemeLabel};
