//! `/api/auth`: registration, login and token introspection.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use ujala_shared::Role;
use ujala_store::{NewAccount, StoreError};
use uuid::Uuid;

use super::{ApiResponse, AppState, Envelope};
use crate::auth::{hash_password, verify_password, Claims};
use crate::error::ServerError;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_admin))
        .route("/register-reporter", post(register_reporter))
        .route("/login", post(login))
        .route("/superadmin-login", post(superadmin_login))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredAccount {
    id: Uuid,
    role: Role,
    reporter_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, ServerError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServerError::Internal(format!("hashing task failed: {e}")))?
}

async fn create(state: &AppState, req: RegisterRequest, role: Role) -> Result<RegisteredAccount, ServerError> {
    let (Some(name), Some(email), Some(password)) =
        (filled(req.name), filled(req.email), filled(req.password))
    else {
        return Err(ServerError::Validation("Missing fields".into()));
    };

    let password_hash = hash_blocking(password).await?;

    let db = state.db()?;
    let account = db
        .create_account(NewAccount {
            name,
            email,
            password_hash,
            role,
            // Admins are trusted on creation; reporters wait for a superadmin.
            is_approved: role != Role::Reporter,
            avatar: None,
        })
        .map_err(|e| match e {
            StoreError::Duplicate { field } if field == "email" => {
                ServerError::Conflict("User already exists".into())
            }
            other => other.into(),
        })?;

    Ok(RegisteredAccount {
        id: account.id,
        role: account.role,
        reporter_id: account.reporter_id,
    })
}

async fn register_admin(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RegisteredAccount>>, ServerError> {
    let created = create(&state, body(payload)?, Role::Admin).await?;
    Ok(ApiResponse::data(created).with_message("Admin registered"))
}

async fn register_reporter(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RegisteredAccount>>, ServerError> {
    let created = create(&state, body(payload)?, Role::Reporter).await?;
    Ok(ApiResponse::data(created)
        .with_message("Registered as reporter. Await superadmin approval."))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServerError> {
    let req = body(payload)?;
    let invalid = || ServerError::Unauthorized("Invalid credentials".into());
    let (Some(email), Some(password)) = (filled(req.email), req.password) else {
        return Err(invalid());
    };

    let account = {
        let db = state.db()?;
        match db.get_account_by_email(&email) {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Err(invalid()),
            Err(e) => return Err(e.into()),
        }
    };

    let hash = account.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ServerError::Internal(format!("verification task failed: {e}")))?;
    if !ok {
        return Err(invalid());
    }

    if account.role == Role::Reporter && !account.is_approved {
        return Err(ServerError::Forbidden(
            "Reporter account pending approval".into(),
        ));
    }

    let token = state.auth.issue_for_account(&account)?;
    tracing::info!(id = %account.id, role = %account.role, "login");

    Ok(Json(LoginResponse {
        success: true,
        token,
        role: Some(account.role),
        name: Some(account.name),
        id: Some(account.id),
    }))
}

async fn superadmin_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServerError> {
    let req = body(payload)?;
    let token = state.auth.superadmin_login(
        req.email.as_deref().unwrap_or_default(),
        req.password.as_deref().unwrap_or_default(),
    )?;
    tracing::info!("superadmin login");

    Ok(Json(LoginResponse {
        success: true,
        token,
        role: None,
        name: None,
        id: None,
    }))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Claims>>, ServerError> {
    let claims = state.auth.authenticate(&headers)?;
    Ok(ApiResponse::data(claims))
}
