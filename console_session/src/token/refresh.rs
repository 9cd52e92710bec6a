use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::AuthApi;
use crate::credentials::CredentialStore;

/// Issues cookie-authenticated token renewals, at most one in flight
/// system-wide.
pub struct RefreshCoordinator {
    api: Arc<dyn AuthApi>,
    store: Arc<CredentialStore>,
    in_flight: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<CredentialStore>) -> Self {
        Self {
            api,
            store,
            in_flight: Mutex::new(()),
        }
    }

    /// Attempt one token renewal.
    ///
    /// Returns `false` without a network call when a renewal is already in
    /// flight; the losing caller resyncs on its next tick instead. On success
    /// the new token is written to the credential store. On any failure the
    /// previous credential is left untouched; what to do with the time that
    /// remains is the expiry monitor's call.
    pub async fn refresh(&self) -> bool {
        // The guard releases on every exit path, including panics mid-call.
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("Token refresh already in flight, skipping");
            return false;
        };

        let token = match self.api.refresh().await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                tracing::warn!("Refresh response carried no token");
                return false;
            }
            Err(err) => {
                tracing::warn!("Token refresh failed: {}", err);
                return false;
            }
        };

        match self.store.replace_token(token).await {
            Ok(()) => {
                tracing::info!("Session token refreshed");
                true
            }
            Err(err) => {
                tracing::warn!("Refreshed token could not be stored: {}", err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockAuthApi, mint_token, sample_credential};
    use std::sync::atomic::Ordering;
    use tokio::sync::Notify;

    async fn store_with_credential() -> Arc<CredentialStore> {
        let store = Arc::new(CredentialStore::in_memory());
        store
            .persist(&sample_credential(60))
            .await
            .expect("persist should succeed");
        store
    }

    #[tokio::test]
    async fn test_refresh_success_rewrites_token() {
        let store = store_with_credential().await;
        let new_token = mint_token(3600);
        let api = Arc::new(MockAuthApi::new().with_refresh_token(new_token.clone()));
        let coordinator = RefreshCoordinator::new(api.clone(), store.clone());

        assert!(coordinator.refresh().await);
        assert_eq!(store.token().await, Some(new_token));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_credential_untouched() {
        let store = store_with_credential().await;
        let before = store.token().await;
        let api = Arc::new(MockAuthApi::new().with_refresh_error());
        let coordinator = RefreshCoordinator::new(api, store.clone());

        assert!(!coordinator.refresh().await);
        assert_eq!(store.token().await, before);
    }

    #[tokio::test]
    async fn test_refresh_without_token_in_response_is_a_failure() {
        let store = store_with_credential().await;
        let before = store.token().await;
        // Default mock: refresh resolves with no token in the body
        let api = Arc::new(MockAuthApi::new());
        let coordinator = RefreshCoordinator::new(api, store.clone());

        assert!(!coordinator.refresh().await);
        assert_eq!(store.token().await, before);
    }

    #[tokio::test]
    async fn test_refresh_without_stored_credential_fails() {
        let store = Arc::new(CredentialStore::in_memory());
        let api = Arc::new(MockAuthApi::new().with_refresh_token(mint_token(3600)));
        let coordinator = RefreshCoordinator::new(api, store.clone());

        // The renewal call succeeds, but there is no credential to rewrite
        assert!(!coordinator.refresh().await);
        assert!(store.token().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_issue_exactly_one_call() {
        let store = store_with_credential().await;
        let gate = Arc::new(Notify::new());
        let api = Arc::new(
            MockAuthApi::new()
                .with_refresh_token(mint_token(3600))
                .with_refresh_gate(gate.clone()),
        );
        let coordinator = Arc::new(RefreshCoordinator::new(api.clone(), store));

        // First caller enters and parks inside the network call
        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh().await })
        };
        api.refresh_entered.notified().await;

        // Second caller observes the in-flight guard and gives up immediately
        assert!(!coordinator.refresh().await);
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);

        // Releasing the gate lets the winner finish normally
        gate.notify_one();
        assert!(first.await.expect("task should not panic"));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    }
}
