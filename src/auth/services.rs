use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::otp::{generate_code, OtpStore, PendingCode};
use crate::auth::repo_types::User;
use crate::clock::Clock;
use crate::error::AppError;
use crate::state::AppState;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();
    static ref IIN_RE: Regex = Regex::new(r"^[0-9]{12}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// A normalized sign-in address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Phone(String),
}

impl Contact {
    /// Normalizes `raw`. Anything containing `@` is an email; `hint` only
    /// tightens validation.
    pub fn parse(raw: &str, hint: Option<&str>) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::validation("Контакт и имя обязательны"));
        }
        let contact = if raw.contains('@') {
            Contact::Email(raw.to_lowercase())
        } else {
            let phone: String = raw
                .chars()
                .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
                .collect();
            Contact::Phone(phone)
        };

        match (&contact, hint) {
            (Contact::Email(_), Some("phone")) | (Contact::Phone(_), Some("email")) => {
                Err(AppError::validation("Тип контакта не совпадает с его значением"))
            }
            (Contact::Email(e), _) if !is_valid_email(e) => {
                Err(AppError::validation("Некорректный email"))
            }
            (Contact::Phone(p), _) if !is_valid_phone(p) => {
                Err(AppError::validation("Некорректный номер телефона"))
            }
            _ => Ok(contact),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Contact::Email(s) | Contact::Phone(s) => s,
        }
    }
}

fn otp_message(name: &str, code: &str, ttl: Duration) -> (String, String) {
    let subject = "Ваш код подтверждения KenesHab".to_string();
    let body = format!(
        "Здравствуйте, {name}!\n\nВаш код для входа: {code}\n\nКод действителен {} минут.\n\nЕсли вы не запрашивали код, проигнорируйте это сообщение.",
        ttl.whole_minutes()
    );
    (subject, body)
}

/// Issues a fresh passcode for `contact` and hands it to the notifier.
///
/// Fail-closed: when dispatch fails the code is withdrawn and the caller
/// gets `DeliveryFailed`.
pub async fn request_code(
    state: &AppState,
    contact: &Contact,
    display_name: &str,
) -> Result<(), AppError> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::validation("Контакт и имя обязательны"));
    }

    let ttl = Duration::seconds(state.config.otp.ttl_seconds);
    let code = state
        .config
        .otp
        .fixed_code
        .clone()
        .unwrap_or_else(generate_code);
    let pending = PendingCode {
        code: code.clone(),
        display_name: display_name.to_string(),
        expires_at: state.clock.now() + ttl,
        failed_attempts: 0,
    };
    state.otp.put(contact.as_str(), pending).await;

    let (subject, body) = otp_message(display_name, &code, ttl);
    if let Err(e) = state.notifier.send(contact.as_str(), &subject, &body).await {
        // A newer request may have replaced the code meanwhile; leave that one in place.
        let withdrawn = state.otp.remove_if(contact.as_str(), &code).await;
        error!(error = %e, contact = %contact.as_str(), withdrawn, "otp dispatch failed");
        return Err(AppError::DeliveryFailed(e));
    }

    info!(contact = %contact.as_str(), "otp issued");
    Ok(())
}

/// Outcome of a successful passcode verification.
#[derive(Debug)]
pub struct VerifiedLogin {
    pub user: User,
    pub is_new_user: bool,
}

/// Redeems the code and resolves (or lazily creates) the user.
pub async fn verify_code(
    state: &AppState,
    contact: &Contact,
    code: &str,
) -> Result<VerifiedLogin, AppError> {
    let pending = match state
        .otp
        .redeem(contact.as_str(), code.trim(), state.clock.now())
        .await
    {
        Ok(p) => p,
        Err(e) => {
            warn!(contact = %contact.as_str(), reason = %e, "otp verification failed");
            return Err(e.into());
        }
    };

    if let Some(user) = User::find_by_contact(&state.db, contact.as_str()).await? {
        info!(user_id = %user.id, "user signed in");
        return Ok(VerifiedLogin {
            user,
            is_new_user: false,
        });
    }

    let (email, phone) = match contact {
        Contact::Email(e) => (Some(e.as_str()), None),
        Contact::Phone(p) => (None, Some(p.as_str())),
    };
    let user = User::create(
        &state.db,
        email,
        phone,
        &pending.display_name,
        state.clock.now(),
    )
    .await?;
    info!(user_id = %user.id, "user registered");
    Ok(VerifiedLogin {
        user,
        is_new_user: true,
    })
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates and applies a profile edit.
pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    full_name: Option<String>,
    phone: Option<String>,
    iin: Option<String>,
) -> Result<User, AppError> {
    let full_name = blank_to_none(full_name)
        .ok_or_else(|| AppError::validation("Имя обязательно"))?;

    let phone = match blank_to_none(phone) {
        Some(raw) => match Contact::parse(&raw, Some("phone"))? {
            Contact::Phone(p) => Some(p),
            Contact::Email(_) => return Err(AppError::validation("Некорректный номер телефона")),
        },
        None => None,
    };

    let iin = blank_to_none(iin);
    if let Some(iin) = &iin {
        if !IIN_RE.is_match(iin) {
            return Err(AppError::validation("ИИН должен состоять из 12 цифр"));
        }
    }

    let current = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Пользователь не найден"))?;
    if current.email.is_none() && phone.is_none() {
        return Err(AppError::validation(
            "Нельзя удалить телефон: это единственный контакт",
        ));
    }

    let user = User::update_profile(
        &state.db,
        user_id,
        &full_name,
        phone.as_deref(),
        iin.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::unauthorized("Пользователь не найден"))?;
    info!(%user_id, "profile updated");
    Ok(user)
}
