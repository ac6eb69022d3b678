//! Sealed on-disk credential store.
//!
//! Pending registrations and activated accounts hold password hashes
//! and live challenge secrets, so the snapshot is encrypted at rest
//! with AES-256-GCM under a key supplied through configuration.
//! File format: `[12 bytes nonce][ciphertext with auth tag]`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use onboarding_core::{ActivatedUser, PendingRegistration, StoreError, UserStore};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Nonce size for AES-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

/// Snapshot schema version.
const DATA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SealError {
    #[error("seal key must be 64 hex characters")]
    BadKey,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("failed to unseal store (wrong key or corrupted file)")]
    Unseal,
}

impl From<aes_gcm::Error> for SealError {
    fn from(_: aes_gcm::Error) -> Self {
        SealError::Unseal
    }
}

/// Everything the store holds, serialized as one sealed snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    pending: HashMap<String, PendingRegistration>,
    activated: HashMap<String, ActivatedUser>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: DATA_VERSION,
            pending: HashMap::new(),
            activated: HashMap::new(),
        }
    }
}

/// File-backed [`UserStore`] with the whole state sealed in one file.
///
/// Mutations persist a new snapshot before the in-memory state is
/// committed, all inside one write-lock critical section: a failed
/// write leaves both the file and memory unchanged, and the temp-file
/// plus rename keeps the on-disk snapshot from ever being torn.
pub struct SealedStore {
    state: RwLock<Snapshot>,
    cipher: Aes256Gcm,
    path: PathBuf,
}

impl std::fmt::Debug for SealedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SealedStore {
    /// Open the store, loading an existing snapshot if the file is
    /// present and starting empty otherwise.
    pub async fn open(path: PathBuf, key_hex: &str) -> Result<Self, SealError> {
        let key = hex::decode(key_hex).map_err(|_| SealError::BadKey)?;
        if key.len() != 32 {
            return Err(SealError::BadKey);
        }
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        let state = match fs::read(&path).await {
            Ok(data) => {
                let snapshot = unseal(&cipher, &data)?;
                info!(
                    pending = snapshot.pending.len(),
                    activated = snapshot.activated.len(),
                    "loaded sealed store from {:?}",
                    path
                );
                snapshot
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("sealed store file not found at {:?}, starting empty", path);
                Snapshot::default()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            state: RwLock::new(state),
            cipher,
            path,
        })
    }

    /// Seal and write a snapshot, atomically replacing the old file.
    async fn persist(&self, snapshot: &Snapshot) -> Result<(), SealError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = serde_json::to_vec(snapshot)?;
        let ciphertext = self.cipher.encrypt(nonce, plaintext.as_ref())?;

        let mut data = nonce_bytes.to_vec();
        data.extend(ciphertext);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("persisted sealed store ({} bytes) to {:?}", data.len(), self.path);
        Ok(())
    }
}

fn unseal(cipher: &Aes256Gcm, data: &[u8]) -> Result<Snapshot, SealError> {
    if data.len() < NONCE_SIZE {
        return Err(SealError::Unseal);
    }
    let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
    let plaintext = cipher
        .decrypt(nonce, &data[NONCE_SIZE..])
        .map_err(|_| SealError::Unseal)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

#[async_trait]
impl UserStore for SealedStore {
    async fn insert_pending(&self, record: PendingRegistration) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.pending.contains_key(&record.email) {
            return Err(StoreError::Conflict(record.email));
        }

        let mut next = state.clone();
        next.pending.insert(record.email.clone(), record);
        self.persist(&next)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        *state = next;
        Ok(())
    }

    async fn find_pending_by_email(
        &self,
        email: &str,
    ) -> Result<PendingRegistration, StoreError> {
        let state = self.state.read().await;
        state
            .pending
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(email.to_string()))
    }

    async fn mark_pending_verified(&self, email: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.pending.contains_key(email) {
            return Err(StoreError::NotFound(email.to_string()));
        }

        let mut next = state.clone();
        if let Some(record) = next.pending.get_mut(email) {
            record.verified = true;
        }
        self.persist(&next)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        *state = next;
        Ok(())
    }

    async fn find_activated_by_email(&self, email: &str) -> Result<ActivatedUser, StoreError> {
        let state = self.state.read().await;
        state
            .activated
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(email.to_string()))
    }

    async fn insert_activated(&self, user: ActivatedUser) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.activated.contains_key(&user.email) {
            return Err(StoreError::Conflict(user.email));
        }

        let mut next = state.clone();
        next.activated.insert(user.email.clone(), user);
        self.persist(&next)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use onboarding_core::Profile;

    const KEY: &str = "1111111111111111111111111111111111111111111111111111111111111111";

    fn pending(email: &str) -> PendingRegistration {
        PendingRegistration::new(
            email.to_string(),
            "pbkdf2-sha256$10$00$00".to_string(),
            "aa".repeat(20),
            Profile {
                name: "Jane Doe".to_string(),
                date_of_birth: None,
                phone: Some("08123456789".to_string()),
            },
            Utc::now(),
            Duration::minutes(60),
        )
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.enc");

        let store = SealedStore::open(path.clone(), KEY).await.unwrap();
        store.insert_pending(pending("a@example.com")).await.unwrap();
        store.mark_pending_verified("a@example.com").await.unwrap();
        drop(store);

        let reopened = SealedStore::open(path, KEY).await.unwrap();
        let record = reopened.find_pending_by_email("a@example.com").await.unwrap();
        assert!(record.verified);
        assert_eq!(record.profile.phone.as_deref(), Some("08123456789"));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = SealedStore::open(dir.path().join("store.enc"), KEY)
            .await
            .unwrap();

        store.insert_pending(pending("a@example.com")).await.unwrap();
        let err = store
            .insert_pending(pending("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_wrong_key_fails_to_unseal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.enc");

        let store = SealedStore::open(path.clone(), KEY).await.unwrap();
        store.insert_pending(pending("a@example.com")).await.unwrap();
        drop(store);

        let other_key = "2222222222222222222222222222222222222222222222222222222222222222";
        let err = SealedStore::open(path, other_key).await.unwrap_err();
        assert!(matches!(err, SealError::Unseal));
    }

    #[tokio::test]
    async fn test_tampered_file_fails_to_unseal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.enc");

        let store = SealedStore::open(path.clone(), KEY).await.unwrap();
        store.insert_pending(pending("a@example.com")).await.unwrap();
        drop(store);

        let mut data = std::fs::read(&path).unwrap();
        if let Some(byte) = data.last_mut() {
            *byte ^= 0xff;
        }
        std::fs::write(&path, &data).unwrap();

        let err = SealedStore::open(path, KEY).await.unwrap_err();
        assert!(matches!(err, SealError::Unseal));
    }

    #[tokio::test]
    async fn test_bad_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = SealedStore::open(dir.path().join("store.enc"), "not-hex")
            .await
            .unwrap_err();
        assert!(matches!(err, SealError::BadKey));

        let err = SealedStore::open(dir.path().join("store.enc"), "abcd")
            .await
            .unwrap_err();
        assert!(matches!(err, SealError::BadKey));
    }
}
