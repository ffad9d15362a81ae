use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{
            AuthResponse, MessageResponse, PublicUser, SendCodeRequest, UpdateProfileRequest,
            VerifyCodeRequest,
        },
        extractors::AuthUser,
        jwt::SessionKeys,
        repo_types::User,
        services::{self, Contact},
    },
    error::{ApiJson, AppError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/otp/send", post(send_code))
        .route("/auth/otp/verify", post(verify_code))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me).put(update_me))
}

#[instrument(skip(state, payload))]
pub async fn send_code(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SendCodeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(contact), Some(name)) = (payload.contact, payload.name) else {
        return Err(AppError::validation("Контакт и имя обязательны"));
    };
    let contact = Contact::parse(&contact, payload.kind.as_deref())?;
    services::request_code(&state, &contact, &name).await?;
    Ok(Json(MessageResponse::new("Код отправлен")))
}

#[instrument(skip(state, payload))]
pub async fn verify_code(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyCodeRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (Some(contact), Some(code)) = (payload.contact, payload.code) else {
        return Err(AppError::validation("Контакт и код обязательны"));
    };
    let contact = Contact::parse(&contact, None)?;
    let login = services::verify_code(&state, &contact, &code).await?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys.issue(login.user.id, contact.as_str()).map_err(|e| {
        error!(error = %e, "session token signing failed");
        AppError::Internal(e.into())
    })?;

    Ok(Json(AuthResponse {
        user: login.user.into(),
        token,
        is_new_user: login.is_new_user,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| {
            error!(%user_id, "token refers to a missing user");
            AppError::unauthorized("Пользователь не найден")
        })?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::update_profile(
        &state,
        user_id,
        payload.full_name,
        payload.phone,
        payload.iin,
    )
    .await?;
    Ok(Json(user.into()))
}
