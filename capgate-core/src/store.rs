//! Persistence of the single registered credential id.

use std::cell::RefCell;

use crate::biometric::CredentialId;
use crate::error::StoreError;

/// Key the credential id is persisted under.
pub const CREDENTIAL_STORE_KEY: &str = "capgate.credential_id";

/// Single-value credential store.
///
/// Holds at most one id; absence means nothing has been registered yet.
pub trait CredentialStore {
    fn get(&self) -> Result<Option<CredentialId>, StoreError>;

    /// Replace the stored id.
    fn set(&self, id: &CredentialId) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory store. Lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: RefCell<Option<CredentialId>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `id`.
    pub fn with_credential(id: CredentialId) -> Self {
        Self {
            value: RefCell::new(Some(id)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<CredentialId>, StoreError> {
        Ok(self.value.borrow().clone())
    }

    fn set(&self, id: &CredentialId) -> Result<(), StoreError> {
        *self.value.borrow_mut() = Some(id.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.value.borrow_mut().take();
        Ok(())
    }
}
