use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use forest_dss::eligibility::{
    ArtifactStore, EligibilityPipeline, EligibilityReport, FeatureContribution, RawRecord,
    RecordFamily, RuleEngine, RuleOutcome, SchemeResult,
};
use forest_dss::error::AppError;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct EligibilityResponse {
    pub(crate) evaluated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub(crate) report: EligibilityReport,
}

#[derive(Debug, Serialize)]
pub(crate) struct LabelResponse {
    pub(crate) family: RecordFamily,
    pub(crate) labelled_at: DateTime<Utc>,
    #[serde(flatten)]
    pub(crate) outcome: RuleOutcome,
}

/// Result shape the dashboard reads from the `/predict_*` paths. Scheme ids are upper case
/// for every family there, so the CFR ids (`jjm`) go out as `JJM`.
#[derive(Debug, Serialize)]
pub(crate) struct DashboardResult {
    pub(crate) scheme: String,
    pub(crate) probability: f64,
    pub(crate) eligible: bool,
    pub(crate) decision: &'static str,
    pub(crate) reason: &'static str,
    pub(crate) benefit: &'static str,
    pub(crate) impact: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_features: Option<Vec<FeatureContribution>>,
}

impl From<SchemeResult> for DashboardResult {
    fn from(result: SchemeResult) -> Self {
        Self {
            scheme: result.scheme.to_ascii_uppercase(),
            probability: result.probability,
            eligible: result.eligible,
            decision: result.decision,
            reason: result.reason,
            benefit: result.benefit,
            impact: result.impact,
            top_features: result.top_features,
        }
    }
}

/// Scoring and labelling routes, including the legacy `/predict_*` paths the dashboard posts to.
pub(crate) fn eligibility_router<S>(pipeline: Arc<EligibilityPipeline<S>>) -> Router
where
    S: ArtifactStore + 'static,
{
    Router::new()
        .route("/api/v1/eligibility/:family", post(evaluate_endpoint::<S>))
        .route("/api/v1/labels/:family", post(labels_endpoint))
        .route("/predict_cfr", post(predict_cfr::<S>))
        .route("/predict_cr", post(predict_cr::<S>))
        .route("/predict_ifr", post(predict_ifr::<S>))
        .with_state(pipeline)
}

pub(crate) fn with_eligibility_routes<S>(pipeline: Arc<EligibilityPipeline<S>>) -> Router
where
    S: ArtifactStore + 'static,
{
    eligibility_router(pipeline)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn evaluate_endpoint<S: ArtifactStore + 'static>(
    State(pipeline): State<Arc<EligibilityPipeline<S>>>,
    Path(family): Path<String>,
    Json(record): Json<RawRecord>,
) -> Result<Json<EligibilityResponse>, AppError> {
    let family = family.parse::<RecordFamily>()?;
    let report = evaluate_blocking(pipeline, family, record).await?;
    Ok(Json(EligibilityResponse {
        evaluated_at: Utc::now(),
        report,
    }))
}

/// Scoring and tree walks are CPU bound, so they run off the async workers.
async fn evaluate_blocking<S: ArtifactStore + 'static>(
    pipeline: Arc<EligibilityPipeline<S>>,
    family: RecordFamily,
    record: RawRecord,
) -> Result<EligibilityReport, AppError> {
    let report = tokio::task::spawn_blocking(move || pipeline.evaluate(family, &record))
        .await
        .map_err(|err| AppError::Worker(err.to_string()))??;
    Ok(report)
}

pub(crate) async fn labels_endpoint(
    Path(family): Path<String>,
    Json(record): Json<RawRecord>,
) -> Result<Json<LabelResponse>, AppError> {
    let family = family.parse::<RecordFamily>()?;
    let outcome = RuleEngine::new(family).apply(&record)?;
    Ok(Json(LabelResponse {
        family,
        labelled_at: Utc::now(),
        outcome,
    }))
}

async fn predict<S: ArtifactStore + 'static>(
    pipeline: Arc<EligibilityPipeline<S>>,
    family: RecordFamily,
    record: RawRecord,
) -> Result<Json<Vec<DashboardResult>>, AppError> {
    let report = evaluate_blocking(pipeline, family, record).await?;
    Ok(Json(
        report.results.into_iter().map(DashboardResult::from).collect(),
    ))
}

async fn predict_cfr<S: ArtifactStore + 'static>(
    State(pipeline): State<Arc<EligibilityPipeline<S>>>,
    Json(record): Json<RawRecord>,
) -> Result<Json<Vec<DashboardResult>>, AppError> {
    predict(pipeline, RecordFamily::Cfr, record).await
}

async fn predict_cr<S: ArtifactStore + 'static>(
    State(pipeline): State<Arc<EligibilityPipeline<S>>>,
    Json(record): Json<RawRecord>,
) -> Result<Json<Vec<DashboardResult>>, AppError> {
    predict(pipeline, RecordFamily::Cr, record).await
}

async fn predict_ifr<S: ArtifactStore + 'static>(
    State(pipeline): State<Arc<EligibilityPipeline<S>>>,
    Json(record): Json<RawRecord>,
) -> Result<Json<Vec<DashboardResult>>, AppError> {
    predict(pipeline, RecordFamily::Ifr, record).await
}
