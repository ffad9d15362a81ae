use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::{auth::otp::OtpError, notify::NotifyError};

/// Error taxonomy surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Код истек")]
    CodeExpired,
    #[error("Неверный код")]
    CodeMismatch,
    #[error("{0}")]
    Unauthorized(String),
    #[error("Сессия истекла, войдите снова")]
    TokenExpired,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    /// The passcode could not be handed to the delivery channel.
    #[error("Не удалось отправить код, попробуйте позже")]
    DeliveryFailed(#[source] NotifyError),
    /// The admin reply was stored but the owner could not be notified.
    #[error("Статус обновлён, но уведомление не отправлено")]
    NotificationFailed(#[source] NotifyError),
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::CodeExpired => "code_expired",
            AppError::CodeMismatch => "code_mismatch",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::TokenExpired => "token_expired",
            AppError::Forbidden(_) => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::DeliveryFailed(_) => "delivery_failed",
            AppError::NotificationFailed(_) => "notification_failed",
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::CodeExpired | AppError::CodeMismatch => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::TokenExpired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DeliveryFailed(_) | AppError::NotificationFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Контакт уже используется другим пользователем".into())
            }
            _ => AppError::Database(e),
        }
    }
}

impl From<OtpError> for AppError {
    fn from(e: OtpError) -> Self {
        match e {
            OtpError::NotFound => AppError::not_found("Код не найден или истек"),
            OtpError::Expired => AppError::CodeExpired,
            OtpError::Mismatch => AppError::CodeMismatch,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Database(e) => {
                error!(error = %e, "database failure");
                "Ошибка сервера".to_string()
            }
            AppError::Internal(e) => {
                error!(error = ?e, "internal failure");
                "Ошибка сервера".to_string()
            }
            AppError::DeliveryFailed(e) | AppError::NotificationFailed(e) => {
                error!(error = %e, code = self.error_code(), "notification dispatch failed");
                self.to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorBody {
            error: message,
            error_code: self.error_code(),
        });
        (status, body).into_response()
    }
}

/// JSON body extractor whose rejections use the [`AppError`] body shape.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400_with_code() {
        let response = AppError::validation("bad status").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "validation_error");
        assert_eq!(body["error"], "bad status");
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let response = AppError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "internal_error");
        assert!(!body["error"].as_str().unwrap().contains("disk"));
    }

    #[tokio::test]
    async fn notification_failure_is_distinct_from_not_found() {
        let failed = AppError::NotificationFailed(NotifyError::Rejected(500));
        let missing = AppError::not_found("missing");
        assert_eq!(failed.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_ne!(failed.error_code(), missing.error_code());
    }

    #[test]
    fn otp_errors_map_to_taxonomy() {
        assert_eq!(AppError::from(OtpError::NotFound).error_code(), "not_found");
        assert_eq!(AppError::from(OtpError::Expired).error_code(), "code_expired");
        assert_eq!(AppError::from(OtpError::Mismatch).error_code(), "code_mismatch");
    }

    #[test]
    fn row_not_found_is_internal_not_conflict() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
