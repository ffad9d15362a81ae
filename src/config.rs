use anyhow::Context;
use serde::Deserialize;

use crate::applications::repo_types::ApplicationStatus;
use crate::auth::services::Contact;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    pub ttl_seconds: i64,
    pub max_attempts: u32,
    /// Development override: every issued code equals this value.
    pub fixed_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    Log,
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub mode: NotifyMode,
    pub webhook_url: Option<String>,
    pub from: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub notify: NotifyConfig,
    /// Contacts (email or phone) granted access to the admin routes.
    pub admin_contacts: Vec<String>,
    /// Statuses an owner may set on their own applications.
    pub owner_status_targets: Vec<ApplicationStatus>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://keneshab.db?mode=rwc".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "keneshab".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "keneshab-users".into()),
            ttl_minutes: parse_env("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 7),
        };

        let fixed_code = std::env::var("OTP_FIXED_CODE").ok().filter(|v| !v.is_empty());
        if let Some(code) = &fixed_code {
            anyhow::ensure!(
                code.len() == 4 && code.chars().all(|c| c.is_ascii_digit()),
                "OTP_FIXED_CODE must be exactly 4 digits"
            );
        }
        let otp = OtpConfig {
            ttl_seconds: parse_env("OTP_TTL_SECONDS").unwrap_or(5 * 60),
            max_attempts: parse_env("OTP_MAX_ATTEMPTS").unwrap_or(5),
            fixed_code,
        };

        let mode = match std::env::var("NOTIFY_MODE").as_deref() {
            Ok("webhook") => NotifyMode::Webhook,
            Ok("log") | Err(_) => NotifyMode::Log,
            Ok(other) => anyhow::bail!("unknown NOTIFY_MODE {other:?}"),
        };
        let notify = NotifyConfig {
            mode,
            webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            from: std::env::var("NOTIFY_FROM")
                .unwrap_or_else(|_| "KenesHab <noreply@keneshab.kz>".into()),
            timeout_seconds: parse_env("NOTIFY_TIMEOUT_SECONDS").unwrap_or(10),
        };
        if notify.mode == NotifyMode::Webhook && notify.webhook_url.is_none() {
            anyhow::bail!("NOTIFY_WEBHOOK_URL is required when NOTIFY_MODE=webhook");
        }

        let admin_contacts = parse_admin_contacts(
            &std::env::var("ADMIN_CONTACTS").unwrap_or_else(|_| "admin@keneshab.kz".into()),
        )?;

        let owner_status_targets = match std::env::var("OWNER_STATUS_TARGETS") {
            Ok(raw) => split_list(&raw)
                .iter()
                .map(|s| {
                    s.parse::<ApplicationStatus>()
                        .map_err(|_| anyhow::anyhow!("unknown status {s:?} in OWNER_STATUS_TARGETS"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            Err(_) => ApplicationStatus::ALL.to_vec(),
        };

        Ok(Self {
            database_url,
            jwt,
            otp,
            notify,
            admin_contacts,
            owner_status_targets,
        })
    }

    /// Admin allow-list check against either contact column of a user.
    pub fn is_admin_contact(&self, email: Option<&str>, phone: Option<&str>) -> bool {
        self.admin_contacts.iter().any(|admin| {
            email.is_some_and(|e| e.eq_ignore_ascii_case(admin))
                || phone.is_some_and(|p| p == admin)
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Normalizes allow-list entries the way sign-in contacts are normalized,
/// so `+7 701 000 00 00` matches a stored `+77010000000`.
fn parse_admin_contacts(raw: &str) -> anyhow::Result<Vec<String>> {
    split_list(raw)
        .iter()
        .map(|entry| {
            Contact::parse(entry, None)
                .map(|c| c.as_str().to_string())
                .map_err(|e| anyhow::anyhow!("invalid ADMIN_CONTACTS entry {entry:?}: {e}"))
        })
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
