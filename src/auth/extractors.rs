use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{SessionKeys, TokenError};
use super::repo_types::User;
use crate::{error::AppError, state::AppState};

/// Extracts and validates the bearer token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Требуется авторизация"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::unauthorized("Неверный формат заголовка Authorization"))?;

        let keys = SessionKeys::from_ref(state);
        match keys.verify(token.trim()) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(TokenError::Expired) => Err(AppError::TokenExpired),
            Err(e) => {
                warn!(error = %e, "rejected session token");
                Err(AppError::unauthorized("Недействительный токен"))
            }
        }
    }
}

/// Authenticated user whose contact is on the admin allow-list.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Пользователь не найден"))?;

        if !crate::admin::is_admin(&state.config, &user) {
            warn!(%user_id, "admin route refused");
            return Err(AppError::forbidden("Доступ запрещён"));
        }
        Ok(AdminUser(user))
    }
}
