use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::otp::{MemoryOtpStore, OtpStore};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::notify::{self, Notifier};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
    pub otp: Arc<dyn OtpStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = crate::db::connect(&config.database_url).await?;
        crate::db::migrate(&db).await?;

        let notifier = notify::from_config(&config.notify)?;
        let otp = Arc::new(MemoryOtpStore::new(config.otp.max_attempts)) as Arc<dyn OtpStore>;

        Ok(Self::from_parts(
            db,
            config,
            notifier,
            otp,
            Arc::new(SystemClock),
        ))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        notifier: Arc<dyn Notifier>,
        otp: Arc<dyn OtpStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            config,
            notifier,
            otp,
            clock,
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use super::AppState;
    use crate::applications::repo_types::ApplicationStatus;
    use crate::auth::otp::{MemoryOtpStore, OtpStore};
    use crate::clock::testing::ManualClock;
    use crate::config::{AppConfig, JwtConfig, NotifyConfig, NotifyMode, OtpConfig};
    use crate::notify::testing::RecordingNotifier;

    pub const ADMIN_EMAIL: &str = "admin@keneshab.kz";

    /// State over an in-memory database with handles to the test doubles.
    pub struct Fake {
        pub state: AppState,
        pub notifier: Arc<RecordingNotifier>,
        pub clock: Arc<ManualClock>,
    }

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 60,
            },
            otp: OtpConfig {
                ttl_seconds: 300,
                max_attempts: 3,
                fixed_code: None,
            },
            notify: NotifyConfig {
                mode: NotifyMode::Log,
                webhook_url: None,
                from: "test".into(),
                timeout_seconds: 1,
            },
            admin_contacts: vec![ADMIN_EMAIL.into()],
            owner_status_targets: ApplicationStatus::ALL.to_vec(),
        }
    }

    impl AppState {
        pub async fn fake() -> Fake {
            Self::fake_with(test_config()).await
        }

        pub async fn fake_with(config: AppConfig) -> Fake {
            let db = crate::db::memory().await.expect("in-memory database");
            let notifier = Arc::new(RecordingNotifier::default());
            let clock = Arc::new(ManualClock::default());
            let otp = Arc::new(MemoryOtpStore::new(config.otp.max_attempts)) as Arc<dyn OtpStore>;
            let state = AppState::from_parts(
                db,
                Arc::new(config),
                notifier.clone(),
                otp,
                clock.clone(),
            );
            Fake {
                state,
                notifier,
                clock,
            }
        }
    }
}
