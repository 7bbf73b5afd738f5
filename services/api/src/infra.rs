use forest_dss::config::ModelConfig;
use forest_dss::eligibility::{EligibilityPipeline, FsArtifactStore, PipelineConfig, RecordFamily};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SharedPipeline = Arc<EligibilityPipeline<FsArtifactStore>>;

pub(crate) fn build_pipeline(config: &ModelConfig) -> SharedPipeline {
    let store = FsArtifactStore::with_cache(&config.root, config.cache_artifacts);
    Arc::new(EligibilityPipeline::new(
        store,
        PipelineConfig {
            top_k: config.top_k,
        },
    ))
}

pub(crate) fn parse_family(raw: &str) -> Result<RecordFamily, String> {
    raw.parse::<RecordFamily>().map_err(|err| err.to_string())
}
