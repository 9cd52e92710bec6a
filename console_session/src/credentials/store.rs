use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::errors::CredentialError;
use super::types::{Credential, UserProfile};

pub(crate) const KEY_ACCESS_TOKEN: &str = "access_token";
pub(crate) const KEY_USER_PROFILE: &str = "user_profile";
pub(crate) const KEY_REMEMBER_ME: &str = "remember_me";

/// Keyed string persistence backing the credential store.
///
/// The console shell supplies the browser-storage equivalent; tests and the
/// default construction use the in-memory implementation.
#[async_trait]
pub trait CredentialStorage: Send + Sync + 'static {
    async fn put(&mut self, key: &str, value: String) -> Result<(), CredentialError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;

    async fn remove(&mut self, key: &str) -> Result<(), CredentialError>;
}

pub struct InMemoryCredentialStorage {
    entry: HashMap<String, String>,
}

impl InMemoryCredentialStorage {
    pub fn new() -> Self {
        tracing::debug!("Creating new in-memory credential storage");
        Self {
            entry: HashMap::new(),
        }
    }
}

impl Default for InMemoryCredentialStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStorage for InMemoryCredentialStorage {
    async fn put(&mut self, key: &str, value: String) -> Result<(), CredentialError> {
        self.entry.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.entry.get(key).cloned())
    }

    async fn remove(&mut self, key: &str) -> Result<(), CredentialError> {
        self.entry.remove(key);
        Ok(())
    }
}

/// Exclusive owner of the persisted credential pair.
///
/// Written by exactly three call sites (login success, refresh success,
/// enrollment completion) and cleared by exactly one (logout/forced expiry).
pub struct CredentialStore {
    storage: Mutex<Box<dyn CredentialStorage>>,
}

impl CredentialStore {
    pub fn new(storage: Box<dyn CredentialStorage>) -> Self {
        Self {
            storage: Mutex::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryCredentialStorage::new()))
    }

    /// Write the token and profile together.
    pub async fn persist(&self, credential: &Credential) -> Result<(), CredentialError> {
        let profile_json = serde_json::to_string(&credential.profile)
            .map_err(|e| CredentialError::Serde(e.to_string()))?;

        let mut storage = self.storage.lock().await;
        storage
            .put(KEY_ACCESS_TOKEN, credential.token.clone())
            .await?;
        storage.put(KEY_USER_PROFILE, profile_json).await?;
        tracing::debug!(user_id = %credential.profile.id, "Persisted credential");
        Ok(())
    }

    /// Rewrite only the token of an existing credential. Used by the refresh
    /// path; the profile half of the pair must already be present.
    pub async fn replace_token(&self, token: String) -> Result<(), CredentialError> {
        let mut storage = self.storage.lock().await;
        if storage.get(KEY_USER_PROFILE).await?.is_none() {
            return Err(CredentialError::Missing);
        }
        storage.put(KEY_ACCESS_TOKEN, token).await?;
        tracing::debug!("Replaced access token");
        Ok(())
    }

    /// Record the operator's "remember me" preference. Independent of the
    /// credential pair.
    pub async fn set_remember(&self, remember: bool) -> Result<(), CredentialError> {
        let mut storage = self.storage.lock().await;
        storage.put(KEY_REMEMBER_ME, remember.to_string()).await
    }

    pub async fn remember(&self) -> bool {
        let storage = self.storage.lock().await;
        matches!(storage.get(KEY_REMEMBER_ME).await, Ok(Some(v)) if v == "true")
    }

    /// The stored credential, or `None` unless both entries are present and
    /// the profile deserializes.
    pub async fn load(&self) -> Option<Credential> {
        let storage = self.storage.lock().await;
        let token = storage.get(KEY_ACCESS_TOKEN).await.ok()??;
        let profile_json = storage.get(KEY_USER_PROFILE).await.ok()??;
        let profile: UserProfile = serde_json::from_str(&profile_json).ok()?;
        Some(Credential { token, profile })
    }

    pub async fn token(&self) -> Option<String> {
        let storage = self.storage.lock().await;
        storage.get(KEY_ACCESS_TOKEN).await.ok()?
    }

    /// Remove the credential pair. The remember flag records a UI preference
    /// and survives the clear.
    pub async fn clear(&self) -> Result<(), CredentialError> {
        let mut storage = self.storage.lock().await;
        storage.remove(KEY_ACCESS_TOKEN).await?;
        storage.remove(KEY_USER_PROFILE).await?;
        tracing::debug!("Cleared stored credential");
        Ok(())
    }
}
