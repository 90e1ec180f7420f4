//! Shared application state passed to request handlers.

use std::sync::Arc;

use ota_core::{ArtifactStore, UpdateCatalog};

use crate::auth::CredentialVerifier;

/// Handler state. The catalog and verifier are shared; the store is a
/// cheap handle onto the builds directory.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<UpdateCatalog>,
    pub store: ArtifactStore,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    pub fn new(
        catalog: Arc<UpdateCatalog>,
        store: ArtifactStore,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            catalog,
            store,
            verifier,
        }
    }
}
