use std::collections::HashMap;
use std::sync::Arc;

use super::{ArtifactError, ArtifactStore, Classifier, ModelLookup, Preprocessor};
use crate::eligibility::family::RecordFamily;

#[derive(Clone)]
enum StoredClassifier {
    Ready(Arc<dyn Classifier>),
    Corrupt(String),
}

/// Artifact store assembled in code, used by tests and embedders that train elsewhere.
#[derive(Default, Clone)]
pub struct InMemoryArtifactStore {
    preprocessors: HashMap<RecordFamily, Arc<dyn Preprocessor>>,
    feature_orders: HashMap<RecordFamily, Vec<String>>,
    feature_names: HashMap<RecordFamily, Vec<String>>,
    classifiers: HashMap<(RecordFamily, String), StoredClassifier>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocessor(
        mut self,
        family: RecordFamily,
        preprocessor: Arc<dyn Preprocessor>,
    ) -> Self {
        self.preprocessors.insert(family, preprocessor);
        self
    }

    pub fn with_feature_order<I, C>(mut self, family: RecordFamily, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.feature_orders
            .insert(family, columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_feature_names<I, C>(mut self, family: RecordFamily, names: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.feature_names
            .insert(family, names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_classifier(
        mut self,
        family: RecordFamily,
        scheme: &str,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        self.classifiers.insert(
            (family, scheme.to_string()),
            StoredClassifier::Ready(classifier),
        );
        self
    }

    /// Registers a model that exists but cannot be read.
    pub fn with_corrupt_classifier(
        mut self,
        family: RecordFamily,
        scheme: &str,
        reason: impl Into<String>,
    ) -> Self {
        self.classifiers.insert(
            (family, scheme.to_string()),
            StoredClassifier::Corrupt(reason.into()),
        );
        self
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn preprocessor(&self, family: RecordFamily) -> Result<Arc<dyn Preprocessor>, ArtifactError> {
        self.preprocessors
            .get(&family)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound {
                artifact: family.profile().layout.preprocessor.to_string(),
            })
    }

    fn feature_order(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError> {
        Ok(self.feature_orders.get(&family).cloned())
    }

    fn feature_names(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError> {
        Ok(self.feature_names.get(&family).cloned())
    }

    fn classifier(&self, family: RecordFamily, scheme: &str) -> Result<ModelLookup, ArtifactError> {
        match self.classifiers.get(&(family, scheme.to_string())) {
            Some(StoredClassifier::Ready(model)) => Ok(ModelLookup::Found(Arc::clone(model))),
            Some(StoredClassifier::Corrupt(reason)) => Err(ArtifactError::Corrupt {
                artifact: family.profile().layout.model_artifact(scheme),
                reason: reason.clone(),
            }),
            None => Ok(ModelLookup::NotFound),
        }
    }
}
