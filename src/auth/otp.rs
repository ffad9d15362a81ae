use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::Rng;
use time::OffsetDateTime;

/// Number of digits in a passcode.
pub const CODE_WIDTH: usize = 4;

/// A code waiting to be redeemed for one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    pub code: String,
    /// Name supplied with the request; becomes `full_name` of a new user.
    pub display_name: String,
    pub expires_at: OffsetDateTime,
    pub failed_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("no pending code for this contact")]
    NotFound,
    #[error("code expired")]
    Expired,
    #[error("code does not match")]
    Mismatch,
}

/// Keyed storage for pending passcodes with lazy expiry.
///
/// `redeem` is the only way a code leaves the store successfully, and it
/// must check and remove in one step so a code verifies at most once.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store `pending` for `contact`, replacing any earlier code.
    async fn put(&self, contact: &str, pending: PendingCode);

    async fn redeem(
        &self,
        contact: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<PendingCode, OtpError>;

    /// Remove the entry for `contact` only while it still holds `code`.
    /// Returns whether something was removed.
    async fn remove_if(&self, contact: &str, code: &str) -> bool;

    async fn peek(&self, contact: &str) -> Option<PendingCode>;
}

/// Process-local store; only valid for single-instance deployments.
pub struct MemoryOtpStore {
    max_attempts: u32,
    codes: Mutex<HashMap<String, PendingCode>>,
}

impl MemoryOtpStore {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            codes: Mutex::new(HashMap::new()),
        }
    }
}

enum Verdict {
    Accept,
    Expired,
    Mismatch { exhausted: bool },
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn put(&self, contact: &str, pending: PendingCode) {
        let mut codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        codes.insert(contact.to_string(), pending);
    }

    async fn redeem(
        &self,
        contact: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<PendingCode, OtpError> {
        let mut codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        let verdict = match codes.get_mut(contact) {
            None => return Err(OtpError::NotFound),
            Some(entry) if now > entry.expires_at => Verdict::Expired,
            Some(entry) if entry.code != code => {
                entry.failed_attempts += 1;
                Verdict::Mismatch {
                    exhausted: entry.failed_attempts >= self.max_attempts,
                }
            }
            Some(_) => Verdict::Accept,
        };

        match verdict {
            Verdict::Accept => codes.remove(contact).ok_or(OtpError::NotFound),
            Verdict::Expired => {
                codes.remove(contact);
                Err(OtpError::Expired)
            }
            Verdict::Mismatch { exhausted } => {
                if exhausted {
                    codes.remove(contact);
                }
                Err(OtpError::Mismatch)
            }
        }
    }

    async fn remove_if(&self, contact: &str, code: &str) -> bool {
        let mut codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        match codes.get(contact) {
            Some(entry) if entry.code == code => {
                codes.remove(contact);
                true
            }
            _ => false,
        }
    }

    async fn peek(&self, contact: &str) -> Option<PendingCode> {
        let codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        codes.get(contact).cloned()
    }
}

/// Random zero-padded numeric code.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..10u32.pow(CODE_WIDTH as u32));
    format!("{n:0width$}", width = CODE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use time::{macros::datetime, Duration};

    const NOW: OffsetDateTime = datetime!(2025-03-14 09:30:00 UTC);

    fn pending(code: &str) -> PendingCode {
        PendingCode {
            code: code.into(),
            display_name: "Ivan".into(),
            expires_at: NOW + Duration::minutes(5),
            failed_attempts: 0,
        }
    }

    #[test]
    fn generated_codes_are_four_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_WIDTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn redeem_succeeds_exactly_once() {
        let store = MemoryOtpStore::new(5);
        store.put("a@x.com", pending("1234")).await;

        let got = store.redeem("a@x.com", "1234", NOW).await.unwrap();
        assert_eq!(got.display_name, "Ivan");
        assert_eq!(
            store.redeem("a@x.com", "1234", NOW).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn expired_code_is_removed_even_when_it_matches() {
        let store = MemoryOtpStore::new(5);
        store.put("a@x.com", pending("1234")).await;

        let later = NOW + Duration::minutes(5) + Duration::seconds(1);
        assert_eq!(
            store.redeem("a@x.com", "1234", later).await,
            Err(OtpError::Expired)
        );
        assert!(store.peek("a@x.com").await.is_none());
        assert_eq!(
            store.redeem("a@x.com", "1234", NOW).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn code_is_still_valid_at_the_expiry_instant() {
        let store = MemoryOtpStore::new(5);
        store.put("a@x.com", pending("1234")).await;
        assert!(store
            .redeem("a@x.com", "1234", NOW + Duration::minutes(5))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn mismatch_keeps_code_pending_until_attempts_run_out() {
        let store = MemoryOtpStore::new(3);
        store.put("a@x.com", pending("1234")).await;

        for attempt in 1..=2 {
            assert_eq!(
                store.redeem("a@x.com", "0000", NOW).await,
                Err(OtpError::Mismatch)
            );
            assert_eq!(
                store.peek("a@x.com").await.unwrap().failed_attempts,
                attempt
            );
        }
        assert_eq!(
            store.redeem("a@x.com", "0000", NOW).await,
            Err(OtpError::Mismatch)
        );
        assert!(store.peek("a@x.com").await.is_none());
        assert_eq!(
            store.redeem("a@x.com", "1234", NOW).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn new_code_replaces_previous_one() {
        let store = MemoryOtpStore::new(5);
        store.put("a@x.com", pending("1111")).await;
        store.put("a@x.com", pending("2222")).await;

        assert_eq!(
            store.redeem("a@x.com", "1111", NOW).await,
            Err(OtpError::Mismatch)
        );
        assert!(store.redeem("a@x.com", "2222", NOW).await.is_ok());
    }

    #[tokio::test]
    async fn remove_if_leaves_a_newer_code_alone() {
        let store = MemoryOtpStore::new(5);
        store.put("a@x.com", pending("1111")).await;
        store.put("a@x.com", pending("2222")).await;

        assert!(!store.remove_if("a@x.com", "1111").await);
        assert_eq!(store.peek("a@x.com").await.unwrap().code, "2222");
        assert!(store.remove_if("a@x.com", "2222").await);
        assert!(store.peek("a@x.com").await.is_none());
        assert!(!store.remove_if("b@x.com", "2222").await);
    }

    #[tokio::test]
    async fn contacts_are_independent() {
        let store = MemoryOtpStore::new(5);
        store.put("a@x.com", pending("1111")).await;
        store.put("b@x.com", pending("2222")).await;
        assert!(store.redeem("b@x.com", "2222", NOW).await.is_ok());
        assert!(store.peek("a@x.com").await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redeems_let_one_winner_through() {
        let store = Arc::new(MemoryOtpStore::new(5));
        store.put("a@x.com", pending("1234")).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.redeem("a@x.com", "1234", NOW).await.is_ok()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
