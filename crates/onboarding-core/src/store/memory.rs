//! In-memory store implementation.

use super::{ActivatedUser, PendingRegistration, StoreError, UserStore};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory [`UserStore`], keyed by email.
///
/// Uniqueness is enforced inside a single write-lock critical section
/// via the map entry, so concurrent inserts for the same email resolve
/// to exactly one success and one conflict. Useful for tests and for
/// running without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    pending: HashMap<String, PendingRegistration>,
    activated: HashMap<String, ActivatedUser>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_pending(&self, record: PendingRegistration) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        match state.pending.entry(record.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(record.email)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn find_pending_by_email(
        &self,
        email: &str,
    ) -> Result<PendingRegistration, StoreError> {
        let state = self.inner.read().await;
        state
            .pending
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(email.to_string()))
    }

    async fn mark_pending_verified(&self, email: &str) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let record = state
            .pending
            .get_mut(email)
            .ok_or_else(|| StoreError::NotFound(email.to_string()))?;
        record.verified = true;
        Ok(())
    }

    async fn find_activated_by_email(&self, email: &str) -> Result<ActivatedUser, StoreError> {
        let state = self.inner.read().await;
        state
            .activated
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(email.to_string()))
    }

    async fn insert_activated(&self, user: ActivatedUser) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        match state.activated.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(user.email)),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Profile;
    use chrono::{Duration, Utc};

    fn pending(email: &str) -> PendingRegistration {
        PendingRegistration::new(
            email.to_string(),
            "pbkdf2-sha256$10$00$00".to_string(),
            "aa".repeat(20),
            Profile {
                name: "Jane Doe".to_string(),
                date_of_birth: None,
                phone: None,
            },
            Utc::now(),
            Duration::minutes(60),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find_pending() {
        let store = MemoryStore::new();
        store.insert_pending(pending("a@example.com")).await.unwrap();

        let found = store.find_pending_by_email("a@example.com").await.unwrap();
        assert_eq!(found.email, "a@example.com");
        assert!(!found.verified);
    }

    #[tokio::test]
    async fn test_duplicate_pending_conflicts() {
        let store = MemoryStore::new();
        store.insert_pending(pending("a@example.com")).await.unwrap();

        let err = store
            .insert_pending(pending("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_pending_not_found() {
        let store = MemoryStore::new();
        let err = store
            .find_pending_by_email("missing@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_pending_verified() {
        let store = MemoryStore::new();
        store.insert_pending(pending("a@example.com")).await.unwrap();

        store.mark_pending_verified("a@example.com").await.unwrap();

        let found = store.find_pending_by_email("a@example.com").await.unwrap();
        assert!(found.verified);
    }

    #[tokio::test]
    async fn test_insert_activated_conflicts_on_duplicate() {
        let store = MemoryStore::new();
        let user = ActivatedUser::from_pending(&pending("a@example.com"), Utc::now());

        store.insert_activated(user.clone()).await.unwrap();
        let err = store.insert_activated(user).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_pending_inserts_one_winner() {
        let store = std::sync::Arc::new(MemoryStore::new());

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.insert_pending(pending("a@example.com")).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.insert_pending(pending("a@example.com")).await })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(a.is_ok() != b.is_ok());
    }
}
