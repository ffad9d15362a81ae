use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{AdminApplication, ReplyRequest, ReplyResponse};
use super::services;
use crate::{
    auth::extractors::AdminUser,
    error::{ApiJson, AppError},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/applications", get(list_applications))
        .route("/admin/reply", post(reply))
}

#[instrument(skip(state, _admin))]
pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminApplication>>, AppError> {
    Ok(Json(services::list_all(&state).await?))
}

#[instrument(skip(state, admin, payload))]
pub async fn reply(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<ReplyRequest>,
) -> Result<Json<ReplyResponse>, AppError> {
    let application = services::reply(
        &state,
        admin.id,
        payload.application_id.as_deref(),
        payload.message,
        payload.status,
    )
    .await?;
    Ok(Json(ReplyResponse {
        message: "Ответ отправлен".into(),
        application,
    }))
}
