use std::sync::Arc;
use uuid::Uuid;

use crate::auth::JwtVerifier;
use crate::cipher::CredentialCipher;
use crate::database::ConnectionStore;
use crate::registry::ConnectionRegistry;
use crate::testers::TesterSet;

/// Shared handles passed to every handler through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConnectionStore>,
    pub cipher: Arc<CredentialCipher>,
    pub testers: Arc<TesterSet>,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        cipher: CredentialCipher,
        testers: TesterSet,
        jwt: JwtVerifier,
    ) -> Self {
        Self {
            store,
            cipher: Arc::new(cipher),
            testers: Arc::new(testers),
            jwt: Arc::new(jwt),
        }
    }

    /// Fresh, unloaded registry for one user's request
    pub fn registry_for(&self, user_id: Uuid) -> ConnectionRegistry {
        ConnectionRegistry::new(user_id, self.store.clone(), self.cipher.clone(), self.testers.clone())
    }
}
