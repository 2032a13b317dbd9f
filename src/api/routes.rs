use crate::api::api_error::APIError;
use crate::api::model::{ChallengePayload, ChallengeResponse};
use crate::api::server::AppState;
use crate::error::Error;
use crate::solver::{ChallengeAction, Solver};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/apis/:group/:version/:solver", post(solve))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn solve(
    State(state): State<AppState>,
    Path((group, _version, solver)): Path<(String, String, String)>,
    WithRejection(Json(payload), _): WithRejection<Json<ChallengePayload>, APIError>,
) -> Result<Json<ChallengePayload>, APIError> {
    if group != state.config.group_name || solver != state.solver.name() {
        tracing::debug!("rejected challenge for unknown solver {group}/{solver}");
        return Err(Error::UnknownSolver { group, solver }.into());
    }

    let request = payload.request.ok_or(Error::MissingChallengeRequest)?;
    let result = match request.action {
        ChallengeAction::Present => state.solver.present(&request).await,
        ChallengeAction::CleanUp => state.solver.clean_up(&request).await,
    };
    let response = match result {
        Ok(()) => ChallengeResponse::success(request.uid),
        Err(err) => {
            tracing::warn!(
                "{:?} failed for \"{}\": {err}",
                request.action,
                request.resolved_fqdn
            );
            ChallengeResponse::failure(request.uid, err.to_string())
        }
    };

    Ok(Json(ChallengePayload {
        api_version: payload.api_version,
        kind: payload.kind,
        request: None,
        response: Some(response),
    }))
}
