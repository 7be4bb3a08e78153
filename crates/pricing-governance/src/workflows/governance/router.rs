use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ConfigVersionId, DecisionId};
use super::repository::GovernanceRepository;
use super::request::{
    ApprovalRequest, CompareQuery, DecisionQuery, SimulationRunRequest, SubjectQuery,
};
use super::service::{GovernanceError, GovernanceService};
use crate::workflows::simulation::{SimulationScenario, UsageEvent};

const INVALID_JSON: &str = "Invalid JSON body. Send application/json.";

/// Stateless preview: inline snapshots and value units, with optional inline
/// events replacing the loaded feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub scenario: SimulationScenario,
    #[serde(default)]
    pub events: Option<Vec<UsageEvent>>,
}

/// Router builder exposing the simulation, approval and runtime endpoints.
pub fn governance_router<R>(service: Arc<GovernanceService<R>>) -> Router
where
    R: GovernanceRepository + 'static,
{
    Router::new()
        .route("/api/v1/simulations", post(simulate_handler::<R>))
        .route("/api/v1/simulations/preview", post(preview_handler::<R>))
        .route("/api/v1/approve", post(approve_handler::<R>))
        .route("/api/v1/configs", get(configs_handler::<R>))
        .route("/api/v1/configs/:config_version_id", get(config_handler::<R>))
        .route(
            "/api/v1/configs/:config_version_id/baseline-options",
            get(baseline_options_handler::<R>),
        )
        .route("/api/v1/runtime/config", get(runtime_config_handler::<R>))
        .route("/api/v1/decision-records", get(decisions_handler::<R>))
        .route(
            "/api/v1/decision-records/compare",
            get(compare_handler::<R>),
        )
        .route(
            "/api/v1/decision-records/:decision_id",
            get(decision_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn simulate_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    payload: Result<Json<SimulationRunRequest>, JsonRejection>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    let Ok(Json(request)) = payload else {
        return invalid_json();
    };

    match service.simulate(request) {
        Ok(run) => (StatusCode::OK, Json(run.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    let Ok(Json(request)) = payload else {
        return invalid_json();
    };

    let events = request
        .events
        .as_deref()
        .unwrap_or_else(|| service.feed().events());
    match request.scenario.run(events) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn approve_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    payload: Result<Json<ApprovalRequest>, JsonRejection>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    let Ok(Json(request)) = payload else {
        return invalid_json();
    };

    match service.approve(&request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn configs_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    match service.configs() {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn config_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    Path(config_version_id): Path<String>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    match service.config(&ConfigVersionId(config_version_id)) {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn baseline_options_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    Path(config_version_id): Path<String>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    match service.baseline_options(&ConfigVersionId(config_version_id)) {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn runtime_config_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    Query(query): Query<SubjectQuery>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    let subject = match query.resolve() {
        Ok(subject) => subject,
        Err(err) => return error_response(err.into()),
    };

    match service.active_config(&subject) {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(GovernanceError::NoActiveConfig(subject)) => {
            let payload = json!({
                "error": "No active config found for the given subject_resolution",
                "subject_resolution": subject,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decisions_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    Query(query): Query<DecisionQuery>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    match service.decisions(&query) {
        Ok(items) => {
            let total = items.len();
            (StatusCode::OK, Json(json!({ "items": items, "total": total }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decision_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    Path(decision_id): Path<String>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    match service.decision(&DecisionId(decision_id)) {
        Ok(bundle) => (StatusCode::OK, Json(bundle)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn compare_handler<R>(
    State(service): State<Arc<GovernanceService<R>>>,
    Query(query): Query<CompareQuery>,
) -> Response
where
    R: GovernanceRepository + 'static,
{
    let Some((a, b)) = query.ids() else {
        let payload = json!({
            "error": "Missing required query params: decision_id_a, decision_id_b",
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    match service.compare_decisions(&a, &b) {
        Ok(comparison) => (StatusCode::OK, Json(comparison)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &GovernanceError) -> StatusCode {
    match err {
        GovernanceError::Request(_)
        | GovernanceError::MissingApprovalFields
        | GovernanceError::Subject(_)
        | GovernanceError::RunConfigMismatch
        | GovernanceError::Gate(_) => StatusCode::BAD_REQUEST,
        GovernanceError::CandidateNotFound(_)
        | GovernanceError::ConfigNotFound(_)
        | GovernanceError::SimulationRunNotFound(_)
        | GovernanceError::NoActiveConfig(_)
        | GovernanceError::DecisionNotFound(_)
        | GovernanceError::ComparisonNotFound => StatusCode::NOT_FOUND,
        GovernanceError::CycleNotFound(_) | GovernanceError::Repository(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: GovernanceError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (status_for(&err), Json(payload)).into_response()
}

fn invalid_json() -> Response {
    let payload = json!({ "error": INVALID_JSON });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}
