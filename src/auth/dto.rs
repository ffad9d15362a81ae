use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Plan, User};

/// Request body for `POST /auth/otp/send`.
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub contact: Option<String>,
    /// "email" or "phone"; only a hint.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
}

/// Request body for `POST /auth/otp/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub contact: Option<String>,
    pub code: Option<String>,
}

/// Request body for `PUT /auth/me`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub iin: Option<String>,
}

/// Plain confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response returned after a successful passcode verification.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
    pub is_new_user: bool,
}

/// Profile as shown to its owner.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub iin: Option<String>,
    pub plan: Plan,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            phone: u.phone,
            iin: u.iin,
            plan: u.plan,
            created_at: u.created_at,
        }
    }
}
