use tracing::{error, info};
use uuid::Uuid;

use super::dto::AdminApplication;
use crate::applications::policy::{Actor, TransitionPolicy};
use crate::applications::repo_types::{Application, ApplicationStatus};
use crate::applications::services::{parse_id, parse_status};
use crate::auth::repo_types::User;
use crate::auth::services::blank_to_none;
use crate::clock::Clock;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_all(state: &AppState) -> Result<Vec<AdminApplication>, AppError> {
    Ok(AdminApplication::list_all(&state.db).await?)
}

fn reply_message(app: &Application, message: &str) -> (String, String) {
    let subject = format!("Ответ по заявке в {}", app.creditor_name);
    let body = format!(
        "Здравствуйте!\n\nПо вашей заявке ({}, {}) получен ответ:\n\n{message}\n\nТекущий статус: {}.\n\nKenesHab",
        app.creditor_name,
        app.request_type.label(),
        app.status.label(),
    );
    (subject, body)
}

/// Admin reply: optionally moves the application to `status`, then notifies
/// the owner. The status change is committed before dispatch and survives a
/// failed notification.
pub async fn reply(
    state: &AppState,
    admin_id: Uuid,
    application_id: Option<&str>,
    message: Option<String>,
    status: Option<String>,
) -> Result<Application, AppError> {
    let message = blank_to_none(message)
        .ok_or_else(|| AppError::validation("Сообщение обязательно"))?;
    let status: Option<ApplicationStatus> = match blank_to_none(status) {
        Some(raw) => Some(parse_status(Some(raw.as_str()))?),
        None => None,
    };
    let id = parse_id(application_id.unwrap_or_default())?;

    let mut app = Application::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Заявка не найдена"))?;

    if let Some(to) = status {
        let policy = TransitionPolicy::from_config(&state.config);
        if !policy.allows(Actor::Admin, app.status, to) {
            return Err(AppError::forbidden("Этот статус нельзя установить"));
        }
        app = Application::set_status(&state.db, id, to, state.clock.now())
            .await?
            .ok_or_else(|| AppError::not_found("Заявка не найдена"))?;
        info!(%admin_id, application_id = %id, status = %to, "status set by admin");
    }

    let owner = User::find_by_id(&state.db, app.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("application {id} has no owner"))?;
    let to = owner
        .contact()
        .ok_or_else(|| anyhow::anyhow!("user {} has no contact", owner.id))?;

    let (subject, body) = reply_message(&app, &message);
    if let Err(e) = state.notifier.send(to, &subject, &body).await {
        error!(error = %e, application_id = %id, "admin reply notification failed");
        return Err(AppError::NotificationFailed(e));
    }

    info!(%admin_id, application_id = %id, "admin reply sent");
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::dto::CreateApplicationRequest;
    use crate::applications::services as apps;
    use time::Duration;

    async fn seeded(fake: &crate::state::testing::Fake) -> (User, Application) {
        let owner = User::create(
            &fake.state.db,
            Some("a@x.com"),
            None,
            "Ivan",
            fake.clock.now(),
        )
        .await
        .unwrap();
        let req = CreateApplicationRequest {
            creditor_type: Some("bank".into()),
            creditor_name: Some("Kaspi Bank".into()),
            request_type: Some("Отсрочка платежа".into()),
            ..Default::default()
        };
        let app = apps::create(&fake.state, owner.id, req).await.unwrap();
        (owner, app)
    }

    #[tokio::test]
    async fn reply_updates_status_and_notifies_owner() {
        let fake = crate::state::AppState::fake().await;
        let (owner, app) = seeded(&fake).await;
        fake.clock.advance(Duration::minutes(10));

        let id = app.id.to_string();
        let updated = reply(
            &fake.state,
            Uuid::new_v4(),
            Some(&id),
            Some("Нужна справка о доходах".into()),
            Some("action".into()),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Action);
        assert_eq!(updated.updated_at - app.updated_at, Duration::minutes(10));

        let sent = fake.notifier.last().unwrap();
        assert_eq!(sent.to, "a@x.com");
        assert!(sent.body.contains("Нужна справка о доходах"));
        assert!(sent.body.contains("Требует действий"));

        let row = apps::get(&fake.state, owner.id, app.id).await.unwrap();
        assert_eq!(row.status, ApplicationStatus::Action);
    }

    #[tokio::test]
    async fn reply_without_status_keeps_it() {
        let fake = crate::state::AppState::fake().await;
        let (_, app) = seeded(&fake).await;
        let id = app.id.to_string();

        let same = reply(&fake.state, Uuid::new_v4(), Some(&id), Some("Принято".into()), Some("".into()))
            .await
            .unwrap();
        assert_eq!(same.status, ApplicationStatus::Pending);
        assert_eq!(same.updated_at, app.updated_at);
        assert!(fake.notifier.last().unwrap().body.contains("На рассмотрении"));
    }

    #[tokio::test]
    async fn reply_validation_and_missing_rows() {
        let fake = crate::state::AppState::fake().await;
        let (_, app) = seeded(&fake).await;
        let id = app.id.to_string();
        let admin = Uuid::new_v4();

        let err = reply(&fake.state, admin, Some(&id), Some("  ".into()), None).await.unwrap_err();
        assert_eq!(err.error_code(), "validation_error");

        let err = reply(&fake.state, admin, Some(&id), Some("ok".into()), Some("archived".into()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "validation_error");

        let missing = Uuid::new_v4().to_string();
        let err = reply(&fake.state, admin, Some(&missing), Some("ok".into()), None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "not_found");

        let err = reply(&fake.state, admin, None, Some("ok".into()), None).await.unwrap_err();
        assert_eq!(err.error_code(), "not_found");
        assert!(fake.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_notification_keeps_committed_status() {
        let fake = crate::state::AppState::fake().await;
        let (owner, app) = seeded(&fake).await;
        fake.notifier.set_failing(true);
        let id = app.id.to_string();

        let err = reply(
            &fake.state,
            Uuid::new_v4(),
            Some(&id),
            Some("Одобрено банком".into()),
            Some("approved".into()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "notification_failed");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);

        let row = apps::get(&fake.state, owner.id, app.id).await.unwrap();
        assert_eq!(row.status, ApplicationStatus::Approved);
    }

    #[tokio::test]
    async fn admins_bypass_owner_targets() {
        let mut config = crate::state::testing::test_config();
        config.owner_status_targets = vec![ApplicationStatus::Pending];
        let fake = crate::state::AppState::fake_with(config).await;
        let (_, app) = seeded(&fake).await;
        let id = app.id.to_string();

        let updated = reply(&fake.state, Uuid::new_v4(), Some(&id), Some("ok".into()), Some("rejected".into()))
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Rejected);
    }
}
