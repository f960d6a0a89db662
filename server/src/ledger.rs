//! Credit ledger: debit-before-work, refund-on-failure accounting.
//!
//! Both operations are single store transactions. The pairing
//! guarantee is only as strong as the orchestrator running to
//! completion: a crash between a debit and its refund attempt loses
//! the credit, with no reconciliation sweep. Accepted, documented
//! risk inherited from the source system.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use speech_core::VoiceKey;

use crate::error::ApiError;
use crate::store::{DocumentStore, UserRecord};

pub struct CreditLedger {
    store: Arc<DocumentStore>,
    starter_credits: i64,
}

impl CreditLedger {
    pub fn new(store: Arc<DocumentStore>, starter_credits: i64) -> Self {
        Self {
            store,
            starter_credits,
        }
    }

    /// Atomically take one credit from the user.
    ///
    /// A user seen for the first time is seeded with the starter
    /// balance already net of this debit. A balance below 1 fails
    /// with FailedPrecondition and performs no mutation.
    pub async fn debit_one(&self, uid: &str, email: Option<&str>) -> Result<(), ApiError> {
        let uid = uid.to_string();
        let email = email.map(str::to_string);
        let starter = self.starter_credits;
        self.store
            .transaction(move |c| {
                if let Some(user) = c.users.get_mut(&uid) {
                    if user.credits < 1 {
                        return Err(ApiError::FailedPrecondition(
                            "Not enough credits.".to_string(),
                        ));
                    }
                    user.credits -= 1;
                    Ok(())
                } else {
                    info!(uid = %uid, "seeding new account with starter credits");
                    c.users.insert(
                        uid.clone(),
                        UserRecord {
                            uid: uid.clone(),
                            email,
                            credits: starter - 1,
                            default_voice_key: VoiceKey::default().as_str().to_string(),
                            created_at: Utc::now(),
                        },
                    );
                    Ok(())
                }
            })
            .await
    }

    /// Atomic increment by one. A missing user record is a no-op: the
    /// ledger never creates an account solely to refund it.
    pub async fn refund_one(&self, uid: &str) -> Result<(), ApiError> {
        let uid = uid.to_string();
        self.store
            .transaction(move |c| {
                if let Some(user) = c.users.get_mut(&uid) {
                    user.credits += 1;
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_store() -> (CreditLedger, Arc<DocumentStore>) {
        let store = Arc::new(DocumentStore::new());
        (CreditLedger::new(store.clone(), 3), store)
    }

    #[tokio::test]
    async fn first_debit_seeds_account_net_of_debit() {
        let (ledger, store) = ledger_with_store();
        ledger.debit_one("u1", Some("u1@example.com")).await.unwrap();
        assert_eq!(store.credit_balance("u1").await, Some(2));
    }

    #[tokio::test]
    async fn debit_below_one_fails_without_mutation() {
        let (ledger, store) = ledger_with_store();
        // Seeded net of the first debit: 2, then 1, then 0.
        ledger.debit_one("u1", None).await.unwrap();
        ledger.debit_one("u1", None).await.unwrap();
        ledger.debit_one("u1", None).await.unwrap();
        assert_eq!(store.credit_balance("u1").await, Some(0));

        let err = ledger.debit_one("u1", None).await.unwrap_err();
        assert!(matches!(err, ApiError::FailedPrecondition(_)));
        assert_eq!(store.credit_balance("u1").await, Some(0));
    }

    #[tokio::test]
    async fn refund_restores_balance() {
        let (ledger, store) = ledger_with_store();
        ledger.debit_one("u1", None).await.unwrap();
        ledger.refund_one("u1").await.unwrap();
        assert_eq!(store.credit_balance("u1").await, Some(3));
    }

    #[tokio::test]
    async fn refund_never_creates_an_account() {
        let (ledger, store) = ledger_with_store();
        ledger.refund_one("ghost").await.unwrap();
        assert_eq!(store.get_user("ghost").await.map(|u| u.credits), None);
    }

    #[tokio::test]
    async fn concurrent_debits_never_overdraw() {
        let (ledger, store) = ledger_with_store();
        let ledger = Arc::new(ledger);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.debit_one("u1", None).await.is_ok()
            }));
        }
        let mut successes = 0;
        for h in handles {
            if h.await.unwrap() {
                successes += 1;
            }
        }
        // Starter balance of 3; nothing may go negative.
        assert_eq!(successes, 3);
        assert_eq!(store.credit_balance("u1").await, Some(0));
    }
}
