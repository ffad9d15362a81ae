use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Plan, User, OTP_PASSWORD_SENTINEL};

impl User {
    pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, phone, iin, plan, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Find a user whose email or phone equals `contact`.
    pub async fn find_by_contact(
        db: &SqlitePool,
        contact: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, phone, iin, plan, created_at
            FROM users
            WHERE email = ?1 OR phone = ?1
            LIMIT 1
            "#,
        )
        .bind(contact)
        .fetch_optional(db)
        .await
    }

    /// Create a passwordless user on the free plan.
    pub async fn create(
        db: &SqlitePool,
        email: Option<&str>,
        phone: Option<&str>,
        full_name: &str,
        now: OffsetDateTime,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, phone, full_name, password_hash, plan, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, email, password_hash, full_name, phone, iin, plan, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(phone)
        .bind(full_name)
        .bind(OTP_PASSWORD_SENTINEL)
        .bind(Plan::Free)
        .bind(now)
        .fetch_one(db)
        .await
    }

    /// Overwrite the editable profile fields; `None` when the user is gone.
    pub async fn update_profile(
        db: &SqlitePool,
        id: Uuid,
        full_name: &str,
        phone: Option<&str>,
        iin: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = ?, phone = ?, iin = ?
            WHERE id = ?
            RETURNING id, email, password_hash, full_name, phone, iin, plan, created_at
            "#,
        )
        .bind(full_name)
        .bind(phone)
        .bind(iin)
        .bind(id)
        .fetch_optional(db)
        .await
    }
}
