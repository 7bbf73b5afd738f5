use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ArtifactError, ArtifactStore, Classifier, ModelLookup, Preprocessor};
use crate::eligibility::family::RecordFamily;
use crate::eligibility::model::{ColumnPreprocessor, TreeEnsemble};

#[derive(Default)]
struct ArtifactCache {
    preprocessors: RwLock<HashMap<RecordFamily, Arc<ColumnPreprocessor>>>,
    classifiers: RwLock<HashMap<(RecordFamily, String), Arc<TreeEnsemble>>>,
    /// Feature order and feature name lists, including the fact that one is absent.
    feature_lists: RwLock<HashMap<(RecordFamily, &'static str), Option<Vec<String>>>>,
}

/// JSON artifacts laid out as `<root>/<family directory>/<artifact>.json`.
///
/// Loaded artifacts are immutable; with caching enabled each file is parsed at most once
/// per process and shared between concurrent evaluations.
pub struct FsArtifactStore {
    root: PathBuf,
    cache: Option<ArtifactCache>,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cache(root, true)
    }

    pub fn with_cache(root: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            root: root.into(),
            cache: enabled.then(ArtifactCache::default),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, family: RecordFamily, artifact: &str) -> PathBuf {
        self.root
            .join(family.profile().layout.directory)
            .join(format!("{artifact}.json"))
    }

    /// `Ok(None)` when the file does not exist; every other failure is a corrupt artifact.
    fn read_json<T: DeserializeOwned>(
        &self,
        family: RecordFamily,
        artifact: &str,
    ) -> Result<Option<T>, ArtifactError> {
        let path = self.artifact_path(family, artifact);
        let corrupt = |reason: String| ArtifactError::Corrupt {
            artifact: path.display().to_string(),
            reason,
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(corrupt(err.to_string())),
        };
        debug!(path = %path.display(), "loaded artifact");
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| corrupt(err.to_string()))
    }

    fn load_preprocessor(
        &self,
        family: RecordFamily,
    ) -> Result<Arc<ColumnPreprocessor>, ArtifactError> {
        let artifact = family.profile().layout.preprocessor;
        self.read_json::<ColumnPreprocessor>(family, artifact)?
            .map(Arc::new)
            .ok_or_else(|| ArtifactError::NotFound {
                artifact: self.artifact_path(family, artifact).display().to_string(),
            })
    }

    fn load_classifier(
        &self,
        family: RecordFamily,
        scheme: &str,
    ) -> Result<Option<Arc<TreeEnsemble>>, ArtifactError> {
        let artifact = family.profile().layout.model_artifact(scheme);
        let Some(ensemble) = self.read_json::<TreeEnsemble>(family, &artifact)? else {
            return Ok(None);
        };
        ensemble
            .validate()
            .map_err(|err| ArtifactError::Corrupt {
                artifact: self.artifact_path(family, &artifact).display().to_string(),
                reason: err.to_string(),
            })?;
        Ok(Some(Arc::new(ensemble)))
    }

    fn feature_list(
        &self,
        family: RecordFamily,
        artifact: &'static str,
    ) -> Result<Option<Vec<String>>, ArtifactError> {
        let Some(cache) = &self.cache else {
            return self.read_json(family, artifact);
        };

        let key = (family, artifact);
        if let Some(hit) = cache
            .feature_lists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(hit.clone());
        }

        let loaded: Option<Vec<String>> = self.read_json(family, artifact)?;
        cache
            .feature_lists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, loaded.clone());
        Ok(loaded)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn preprocessor(&self, family: RecordFamily) -> Result<Arc<dyn Preprocessor>, ArtifactError> {
        let Some(cache) = &self.cache else {
            return Ok(self.load_preprocessor(family)? as Arc<dyn Preprocessor>);
        };

        if let Some(hit) = cache
            .preprocessors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&family)
        {
            return Ok(Arc::clone(hit) as Arc<dyn Preprocessor>);
        }

        let loaded = self.load_preprocessor(family)?;
        cache
            .preprocessors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(family, Arc::clone(&loaded));
        Ok(loaded as Arc<dyn Preprocessor>)
    }

    fn feature_order(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError> {
        let Some(artifact) = family.profile().layout.feature_order else {
            return Ok(None);
        };
        self.feature_list(family, artifact)?
            .map(Some)
            .ok_or_else(|| ArtifactError::NotFound {
                artifact: self.artifact_path(family, artifact).display().to_string(),
            })
    }

    fn feature_names(&self, family: RecordFamily) -> Result<Option<Vec<String>>, ArtifactError> {
        match family.profile().layout.feature_names {
            Some(artifact) => self.feature_list(family, artifact),
            None => Ok(None),
        }
    }

    fn classifier(&self, family: RecordFamily, scheme: &str) -> Result<ModelLookup, ArtifactError> {
        let found = |model: Arc<TreeEnsemble>| ModelLookup::Found(model as Arc<dyn Classifier>);

        let Some(cache) = &self.cache else {
            return Ok(self
                .load_classifier(family, scheme)?
                .map_or(ModelLookup::NotFound, found));
        };

        let key = (family, scheme.to_string());
        if let Some(hit) = cache
            .classifiers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(found(Arc::clone(hit)));
        }

        match self.load_classifier(family, scheme)? {
            Some(model) => {
                cache
                    .classifiers
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, Arc::clone(&model));
                Ok(found(model))
            }
            None => Ok(ModelLookup::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::features::FeatureMatrix;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, contents: &str) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("has parent")).expect("create parent");
        fs::write(path, contents).expect("write artifact");
    }

    const STUMP: &str = r#"{"trees": [{"nodes": [
        {"kind": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 2, "cover": 2.0},
        {"kind": "leaf", "value": -2.0, "cover": 1.0},
        {"kind": "leaf", "value": 2.0, "cover": 1.0}
    ]}]}"#;

    #[test]
    fn missing_model_file_is_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let store = FsArtifactStore::new(dir.path());
        assert!(matches!(
            store.classifier(RecordFamily::Cr, "JJM"),
            Ok(ModelLookup::NotFound)
        ));
    }

    #[test]
    fn loads_models_by_family_naming_convention() {
        let dir = TempDir::new().expect("temp dir");
        write(&dir, "cr_models/cr_model_JJM.json", STUMP);
        let store = FsArtifactStore::new(dir.path());

        let Ok(ModelLookup::Found(model)) = store.classifier(RecordFamily::Cr, "JJM") else {
            panic!("model should load");
        };
        let probability = model
            .predict_probability(&FeatureMatrix::new(vec![1.0]))
            .expect("scores");
        assert!(probability > 0.8);
        assert!(model.as_tree_ensemble().is_some());
    }

    #[test]
    fn unparseable_or_invalid_models_are_corrupt() {
        let dir = TempDir::new().expect("temp dir");
        write(&dir, "ifr_models/ifr_model_PMAY_G.json", "{not json");
        write(
            &dir,
            "ifr_models/ifr_model_NSAP.json",
            r#"{"trees": [{"nodes": []}]}"#,
        );
        let store = FsArtifactStore::with_cache(dir.path(), false);

        assert!(matches!(
            store.classifier(RecordFamily::Ifr, "PMAY_G"),
            Err(ArtifactError::Corrupt { .. })
        ));
        assert!(matches!(
            store.classifier(RecordFamily::Ifr, "NSAP"),
            Err(ArtifactError::Corrupt { .. })
        ));
    }

    #[test]
    fn cached_models_survive_file_removal() {
        let dir = TempDir::new().expect("temp dir");
        write(&dir, "cfr_models/xgb_jjm.json", STUMP);
        let store = FsArtifactStore::new(dir.path());
        assert!(matches!(
            store.classifier(RecordFamily::Cfr, "jjm"),
            Ok(ModelLookup::Found(_))
        ));

        fs::remove_file(dir.path().join("cfr_models/xgb_jjm.json")).expect("remove");
        assert!(matches!(
            store.classifier(RecordFamily::Cfr, "jjm"),
            Ok(ModelLookup::Found(_))
        ));
    }

    #[test]
    fn feature_lists_follow_family_layout() {
        let dir = TempDir::new().expect("temp dir");
        write(
            &dir,
            "cfr_models/cfr_features.json",
            r#"["frc_formed", "forest_condition"]"#,
        );
        let store = FsArtifactStore::new(dir.path());

        assert_eq!(
            store.feature_order(RecordFamily::Cfr).expect("reads"),
            Some(vec!["frc_formed".to_string(), "forest_condition".to_string()])
        );
        assert_eq!(store.feature_order(RecordFamily::Cr).expect("no order"), None);
        assert_eq!(store.feature_names(RecordFamily::Cr).expect("optional"), None);

        let empty = FsArtifactStore::new(dir.path().join("elsewhere"));
        assert!(matches!(
            empty.feature_order(RecordFamily::Cfr),
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[test]
    fn cached_feature_lists_are_read_once() {
        let dir = TempDir::new().expect("temp dir");
        write(&dir, "cfr_models/cfr_features.json", r#"["frc_formed"]"#);
        write(
            &dir,
            "cr_models/cr_feature_names.json",
            r#"["num__st_hh_percent"]"#,
        );
        let store = FsArtifactStore::new(dir.path());
        let order = store.feature_order(RecordFamily::Cfr).expect("reads");
        let names = store.feature_names(RecordFamily::Cr).expect("reads");

        fs::remove_file(dir.path().join("cfr_models/cfr_features.json")).expect("remove");
        fs::remove_file(dir.path().join("cr_models/cr_feature_names.json")).expect("remove");
        assert_eq!(store.feature_order(RecordFamily::Cfr).expect("cached"), order);
        assert_eq!(store.feature_names(RecordFamily::Cr).expect("cached"), names);

        let uncached = FsArtifactStore::with_cache(dir.path(), false);
        assert!(matches!(
            uncached.feature_order(RecordFamily::Cfr),
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[test]
    fn missing_preprocessor_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let store = FsArtifactStore::new(dir.path());
        assert!(matches!(
            store.preprocessor(RecordFamily::Ifr),
            Err(ArtifactError::NotFound { .. })
        ));

        write(
            &dir,
            "ifr_models/ifr_preprocessor.json",
            r#"{"columns": [{"kind": "numeric", "name": "annual_income"}]}"#,
        );
        let preprocessor = store.preprocessor(RecordFamily::Ifr).expect("loads");
        assert_eq!(preprocessor.input_columns(), vec!["annual_income".to_string()]);
    }
}
