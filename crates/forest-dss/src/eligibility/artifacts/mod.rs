//! Seams to the trained artifacts: preprocessors, per-scheme classifiers and the stores
//! that hand them out.

mod fs;
mod memory;

pub use fs::FsArtifactStore;
pub use memory::InMemoryArtifactStore;

use std::sync::Arc;

use super::family::RecordFamily;
use super::features::{FeatureFrame, FeatureMatrix};
use super::model::TreeEnsemble;

/// Family-wide transform from selected columns to the numeric row every scheme model
/// consumes.
pub trait Preprocessor: Send + Sync {
    /// Columns the transform reads, in the order it expects them.
    fn input_columns(&self) -> Vec<String>;

    fn transform(&self, frame: &FeatureFrame) -> Result<FeatureMatrix, TransformError>;

    /// Names of the produced columns, when the transform can describe them.
    fn output_feature_names(&self) -> Option<Vec<String>> {
        None
    }
}

/// Binary classifier for one scheme.
pub trait Classifier: Send + Sync {
    fn predict_probability(&self, features: &FeatureMatrix) -> Result<f64, ScoringError>;

    /// Tree structure for attribution engines that need it.
    fn as_tree_ensemble(&self) -> Option<&TreeEnsemble> {
        None
    }
}

/// Lookup result for a scheme model. Absence is an expected outcome, not an error:
/// schemes whose training labels had a single class were never trained.
pub enum ModelLookup {
    Found(Arc<dyn Classifier>),
    NotFound,
}

/// Read-only source of trained artifacts. Implementations must hand out immutable
/// artifacts so one store can serve concurrent evaluations.
pub trait ArtifactStore: Send + Sync {
    fn preprocessor(&self, family: RecordFamily) -> Result<Arc<dyn Preprocessor>, ArtifactError>;

    /// Stored column order for the preprocessor input, if the family keeps one.
    fn feature_order(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError>;

    /// Stored names of the transformed columns, if the family keeps them.
    fn feature_names(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError>;

    fn classifier(&self, family: RecordFamily, scheme: &str) -> Result<ModelLookup, ArtifactError>;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    fn preprocessor(&self, family: RecordFamily) -> Result<Arc<dyn Preprocessor>, ArtifactError> {
        (**self).preprocessor(family)
    }

    fn feature_order(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError> {
        (**self).feature_order(family)
    }

    fn feature_names(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError> {
        (**self).feature_names(family)
    }

    fn classifier(&self, family: RecordFamily, scheme: &str) -> Result<ModelLookup, ArtifactError> {
        (**self).classifier(family, scheme)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact `{artifact}` not found")]
    NotFound { artifact: String },
    #[error("artifact `{artifact}` is unreadable: {reason}")]
    Corrupt { artifact: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("column `{column}` is not present in the feature frame")]
    MissingColumn { column: String },
    #[error("column `{column}` expected a number, found `{value}`")]
    NonNumeric { column: String, value: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("model reads feature {feature} but the row has {width} values")]
    FeatureOutOfRange { feature: usize, width: usize },
    #[error("model produced {value}, which is not a probability")]
    InvalidProbability { value: f64 },
    #[error("model failed: {0}")]
    Model(String),
}
