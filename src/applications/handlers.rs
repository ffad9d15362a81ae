use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateApplicationRequest, UpdateStatusRequest};
use super::repo_types::{Application, ApplicationStats};
use super::services;
use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{ApiJson, AppError},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications).post(create_application))
        .route(
            "/applications/:id",
            get(get_application).delete(delete_application),
        )
        .route("/applications/:id/status", patch(update_status))
        .route("/stats", get(stats))
}

#[instrument(skip(state))]
pub async fn list_applications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(services::list(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_application(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Application>, AppError> {
    let id = services::parse_id(&id)?;
    Ok(Json(services::get(&state, user_id, id).await?))
}

/// POST /applications
#[instrument(skip(state, payload))]
pub async fn create_application(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let app = services::create(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

#[instrument(skip(state, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Application>, AppError> {
    let id = services::parse_id(&id)?;
    let app = services::update_status(&state, user_id, id, payload.status.as_deref()).await?;
    Ok(Json(app))
}

#[instrument(skip(state))]
pub async fn delete_application(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = services::parse_id(&id)?;
    services::delete(&state, user_id, id).await?;
    Ok(Json(MessageResponse::new("Заявка удалена")))
}

#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApplicationStats>, AppError> {
    Ok(Json(services::stats(&state, user_id).await?))
}
