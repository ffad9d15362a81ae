use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::applications::repo_types::Application;

/// Body of `POST /admin/reply`.
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    #[serde(rename = "applicationId")]
    pub application_id: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
}

/// Application with its owner's identity, as listed on the admin dashboard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminApplication {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub application: Application,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub message: String,
    pub application: Application,
}
