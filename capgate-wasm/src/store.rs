//! `localStorage`-backed credential store.

use capgate_core::biometric::CredentialId;
use capgate_core::{CredentialStore, StoreError, CREDENTIAL_STORE_KEY};
use wasm_bindgen::JsValue;
use web_sys::{Storage, Window};

use crate::platform::platform_error;

/// Persists the credential id as unpadded base64url under
/// [`CREDENTIAL_STORE_KEY`].
pub struct LocalStorageCredentialStore {
    window: Window,
}

impl LocalStorageCredentialStore {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn storage(&self) -> Result<Storage, StoreError> {
        self.window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(describe(e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage is disabled".into()))
    }
}

fn describe(err: JsValue) -> String {
    platform_error(err).to_string()
}

impl CredentialStore for LocalStorageCredentialStore {
    fn get(&self) -> Result<Option<CredentialId>, StoreError> {
        let encoded = self
            .storage()?
            .get_item(CREDENTIAL_STORE_KEY)
            .map_err(|e| StoreError::Unavailable(describe(e)))?;

        match encoded {
            Some(encoded) => CredentialId::from_base64url(&encoded)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, id: &CredentialId) -> Result<(), StoreError> {
        self.storage()?
            .set_item(CREDENTIAL_STORE_KEY, &id.to_base64url())
            .map_err(|e| StoreError::Write(describe(e)))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(CREDENTIAL_STORE_KEY)
            .map_err(|e| StoreError::Write(describe(e)))
    }
}
