use sqlx::SqlitePool;

use super::dto::AdminApplication;

impl AdminApplication {
    /// Every application joined with its owner, newest first.
    pub async fn list_all(db: &SqlitePool) -> Result<Vec<AdminApplication>, sqlx::Error> {
        sqlx::query_as::<_, AdminApplication>(
            r#"
            SELECT
                a.id, a.user_id, a.creditor_type, a.creditor_name, a.request_type,
                a.contract_number, a.debt_amount, a.monthly_income, a.dependents,
                a.description, a.generated_text, a.status, a.created_at, a.updated_at,
                u.full_name AS user_name, u.email AS user_email, u.phone AS user_phone
            FROM applications a
            JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC, a.rowid DESC
            "#,
        )
        .fetch_all(db)
        .await
    }
}
