use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{
    Application, ApplicationStats, ApplicationStatus, CreditorType, RequestType,
};

/// Validated fields of a new application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub creditor_type: CreditorType,
    pub creditor_name: String,
    pub request_type: RequestType,
    pub contract_number: Option<String>,
    pub debt_amount: Option<f64>,
    pub monthly_income: Option<f64>,
    pub dependents: i64,
    pub description: Option<String>,
}

const COLUMNS: &str = "id, user_id, creditor_type, creditor_name, request_type, contract_number, \
     debt_amount, monthly_income, dependents, description, generated_text, status, \
     created_at, updated_at";

impl Application {
    pub async fn insert(
        db: &SqlitePool,
        user_id: Uuid,
        new: &NewApplication,
        generated_text: &str,
        now: OffsetDateTime,
    ) -> Result<Application, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (
                id, user_id, creditor_type, creditor_name, request_type, contract_number,
                debt_amount, monthly_income, dependents, description, generated_text,
                status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.creditor_type)
        .bind(&new.creditor_name)
        .bind(new.request_type)
        .bind(&new.contract_number)
        .bind(new.debt_amount)
        .bind(new.monthly_income)
        .bind(new.dependents)
        .bind(&new.description)
        .bind(generated_text)
        .bind(ApplicationStatus::Pending)
        .bind(now)
        .fetch_one(db)
        .await
    }

    /// Newest first; equal timestamps fall back to insertion order, latest first.
    pub async fn list_by_user(
        db: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM applications
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn get_for_user(
        db: &SqlitePool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM applications
            WHERE id = ?1 AND user_id = ?2
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> Result<Option<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {COLUMNS} FROM applications WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Sets the status of any application. `None` when the id is unknown.
    pub async fn set_status(
        db: &SqlitePool,
        id: Uuid,
        status: ApplicationStatus,
        now: OffsetDateTime,
    ) -> Result<Option<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(status)
        .bind(now)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Same as [`Application::set_status`] but scoped to the owner.
    pub async fn set_status_for_user(
        db: &SqlitePool,
        user_id: Uuid,
        id: Uuid,
        status: ApplicationStatus,
        now: OffsetDateTime,
    ) -> Result<Option<Application>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND user_id = ?4
            RETURNING {COLUMNS}
            "#
        ))
        .bind(status)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Returns whether a row was removed.
    pub async fn delete_for_user(
        db: &SqlitePool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM applications WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

impl ApplicationStats {
    pub async fn for_user(db: &SqlitePool, user_id: Uuid) -> Result<ApplicationStats, sqlx::Error> {
        sqlx::query_as::<_, ApplicationStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'approved' THEN 1 ELSE 0 END), 0) AS approved,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN status = 'action' THEN 1 ELSE 0 END), 0) AS action,
                COALESCE(SUM(CASE WHEN status = 'rejected' THEN 1 ELSE 0 END), 0) AS rejected
            FROM applications
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(db)
        .await
    }
}
