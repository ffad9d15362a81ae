use tracing::{info, warn};
use uuid::Uuid;

use super::dto::CreateApplicationRequest;
use super::letter::{self, LetterInput};
use super::policy::{Actor, TransitionPolicy};
use super::repo::NewApplication;
use super::repo_types::{Application, ApplicationStats, ApplicationStatus};
use crate::auth::services::blank_to_none;
use crate::error::AppError;
use crate::state::AppState;

const NOT_FOUND: &str = "Заявка не найдена";

/// Path ids that do not parse are treated like ids that do not exist.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::not_found(NOT_FOUND))
}

pub fn parse_status(raw: Option<&str>) -> Result<ApplicationStatus, AppError> {
    raw.and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::validation("Неверный статус"))
}

fn non_negative(value: Option<f64>, field: &str) -> Result<Option<f64>, AppError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::validation(format!(
            "Поле {field} не может быть отрицательным"
        ))),
        other => Ok(other),
    }
}

impl TryFrom<CreateApplicationRequest> for NewApplication {
    type Error = AppError;

    fn try_from(req: CreateApplicationRequest) -> Result<Self, Self::Error> {
        let required = || AppError::validation("Заполните обязательные поля");

        let creditor_type = blank_to_none(req.creditor_type)
            .ok_or_else(required)?
            .parse()
            .map_err(|_| AppError::validation("Неизвестный тип кредитора"))?;
        let creditor_name = blank_to_none(req.creditor_name).ok_or_else(required)?;
        let request_type = blank_to_none(req.request_type)
            .ok_or_else(required)?
            .parse()
            .map_err(|_| AppError::validation("Неизвестный тип обращения"))?;

        let dependents = req.dependents.unwrap_or(0);
        if dependents < 0 {
            return Err(AppError::validation(
                "Количество иждивенцев не может быть отрицательным",
            ));
        }

        Ok(NewApplication {
            creditor_type,
            creditor_name,
            request_type,
            contract_number: blank_to_none(req.contract_number),
            debt_amount: non_negative(req.debt_amount, "debt_amount")?,
            monthly_income: non_negative(req.monthly_income, "monthly_income")?,
            dependents,
            description: blank_to_none(req.description),
        })
    }
}

/// Validates the form, renders the letter with today's date and stores the
/// application as `pending`.
pub async fn create(
    state: &AppState,
    user_id: Uuid,
    req: CreateApplicationRequest,
) -> Result<Application, AppError> {
    let new = NewApplication::try_from(req)?;
    let now = state.clock.now();

    let text = letter::render(
        &LetterInput {
            creditor_name: &new.creditor_name,
            request_type: new.request_type,
            contract_number: new.contract_number.as_deref(),
            debt_amount: new.debt_amount,
            monthly_income: new.monthly_income,
            dependents: new.dependents,
            description: new.description.as_deref(),
        },
        now.date(),
    );

    let app = Application::insert(&state.db, user_id, &new, &text, now).await?;
    info!(%user_id, application_id = %app.id, "application created");
    Ok(app)
}

pub async fn list(state: &AppState, user_id: Uuid) -> Result<Vec<Application>, AppError> {
    Ok(Application::list_by_user(&state.db, user_id).await?)
}

pub async fn get(state: &AppState, user_id: Uuid, id: Uuid) -> Result<Application, AppError> {
    Application::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

/// Owner self-service status change, subject to the transition policy.
pub async fn update_status(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    status: Option<&str>,
) -> Result<Application, AppError> {
    let to = parse_status(status)?;
    let current = get(state, user_id, id).await?;

    let policy = TransitionPolicy::from_config(&state.config);
    if !policy.allows(Actor::Owner, current.status, to) {
        warn!(%user_id, application_id = %id, from = %current.status, %to, "status change refused");
        return Err(AppError::forbidden("Этот статус нельзя установить"));
    }

    let app = Application::set_status_for_user(&state.db, user_id, id, to, state.clock.now())
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(%user_id, application_id = %id, status = %to, "application status updated");
    Ok(app)
}

pub async fn delete(state: &AppState, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    if !Application::delete_for_user(&state.db, user_id, id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(%user_id, application_id = %id, "application deleted");
    Ok(())
}

pub async fn stats(state: &AppState, user_id: Uuid) -> Result<ApplicationStats, AppError> {
    Ok(ApplicationStats::for_user(&state.db, user_id).await?)
}
