//! `/api/users`: reporter account management for the superadmin.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Serialize;
use ujala_shared::Capability;
use ujala_store::{Account, StoreError};
use uuid::Uuid;

use super::{parse_id, ApiResponse, AppState, Envelope};
use crate::error::ServerError;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/reporters", get(list_reporters))
        .route("/reporters/{id}/approve", put(approve_reporter))
        .route("/reporters/{id}", delete(delete_reporter))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovedReporter {
    id: Uuid,
    is_approved: bool,
    reporter_id: Option<String>,
}

fn reporter_err(e: StoreError) -> ServerError {
    match e {
        StoreError::NotFound => ServerError::NotFound("Reporter not found".into()),
        other => other.into(),
    }
}

async fn list_reporters(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<Account>>>, ServerError> {
    state.authorize(&headers, Capability::ManageReporters)?;
    let reporters = state.db()?.list_reporters()?;
    Ok(ApiResponse::data(reporters))
}

async fn approve_reporter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ApprovedReporter>>, ServerError> {
    state.authorize(&headers, Capability::ManageReporters)?;
    let id = parse_id(&id)?;
    let account = state.db()?.approve_reporter(id).map_err(reporter_err)?;

    Ok(ApiResponse::data(ApprovedReporter {
        id: account.id,
        is_approved: account.is_approved,
        reporter_id: account.reporter_id,
    })
    .with_message("Reporter approved"))
}

async fn delete_reporter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state.authorize(&headers, Capability::ManageReporters)?;
    let id = parse_id(&id)?;
    state.db()?.delete_reporter(id).map_err(reporter_err)?;
    Ok(ApiResponse::message("Reporter deleted"))
}
