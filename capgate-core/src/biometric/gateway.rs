//! Biometric gateway: register and authenticate one platform credential.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::{
    AuthenticatorPolicy, CreationOptions, CredentialId, CredentialPlatform, RelyingParty,
    RequestOptions, UserEntity, CHALLENGE_LEN, COSE_ES256, COSE_RS256, USER_ID_LEN,
};
use crate::error::{BiometricError, BiometricErrorKind, BiometricResult, StoreError};
use crate::platform::PlatformCall;
use crate::store::CredentialStore;

/// Outcome of a successful register or authenticate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityResult {
    pub success: bool,
    pub is_new_registration: bool,
}

/// Which ceremony a pending call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricMode {
    Register,
    Authenticate,
}

impl fmt::Display for BiometricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register => f.write_str("register"),
            Self::Authenticate => f.write_str("authenticate"),
        }
    }
}

/// A register or authenticate request that has already been issued.
#[must_use = "the platform result is only classified and stored by `finish`"]
pub struct PendingBiometric {
    mode: BiometricMode,
    call: PlatformCall<CredentialId>,
    store: Rc<dyn CredentialStore>,
}

impl PendingBiometric {
    pub fn mode(&self) -> BiometricMode {
        self.mode
    }

    /// Wait for the platform, classify failures, persist new registrations.
    pub async fn finish(self) -> BiometricResult<CapabilityResult> {
        let mode = self.mode;
        let id = self.call.await.map_err(|e| {
            let err = BiometricError::from(e);
            warn!(%mode, kind = %err.kind, message = %err.message, "Biometric request failed");
            err
        })?;

        match mode {
            BiometricMode::Register => {
                if id.is_empty() {
                    return Err(BiometricError::new(
                        BiometricErrorKind::Unknown,
                        "Authenticator returned an empty credential id",
                    ));
                }
                self.store.set(&id)?;
                info!(credential_id = %id, "Biometric credential registered");
                Ok(CapabilityResult {
                    success: true,
                    is_new_registration: true,
                })
            }
            BiometricMode::Authenticate => {
                info!(credential_id = %id, "Biometric authentication succeeded");
                Ok(CapabilityResult {
                    success: true,
                    is_new_registration: false,
                })
            }
        }
    }
}

impl fmt::Debug for PendingBiometric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingBiometric")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Wraps the platform credential API and the credential store.
pub struct BiometricGateway {
    platform: Rc<dyn CredentialPlatform>,
    store: Rc<dyn CredentialStore>,
    rp: RelyingParty,
    user_name: String,
    user_display_name: String,
    policy: AuthenticatorPolicy,
    timeout: Duration,
}

impl BiometricGateway {
    pub fn new(
        platform: Rc<dyn CredentialPlatform>,
        store: Rc<dyn CredentialStore>,
        rp: RelyingParty,
        timeout: Duration,
    ) -> Self {
        Self {
            platform,
            store,
            rp,
            user_name: "demo-user".to_string(),
            user_display_name: "Demo User".to_string(),
            policy: AuthenticatorPolicy::default(),
            timeout,
        }
    }

    /// Name and display name used for new registrations.
    pub fn with_user(mut self, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self.user_display_name = display_name.into();
        self
    }

    /// Authenticator requirements for both ceremonies.
    pub fn with_policy(mut self, policy: AuthenticatorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn relying_party(&self) -> &RelyingParty {
        &self.rp
    }

    /// Probe for the platform credential API.
    pub fn check_support(&self) -> bool {
        self.platform.is_available()
    }

    /// Whether a usable credential id is stored.
    ///
    /// A corrupt value counts as "no": [`begin`](Self::begin) discards it and
    /// registers. An unreadable store also counts as "no".
    pub fn has_credential(&self) -> bool {
        matches!(self.store.get(), Ok(Some(_)))
    }

    /// Issue authenticate if a credential is stored, register otherwise.
    ///
    /// The platform request is made before this returns.
    pub fn begin(&self) -> BiometricResult<PendingBiometric> {
        self.ensure_supported()?;
        match self.stored_credential()? {
            Some(id) => self.issue_authenticate(id),
            None => self.issue_register(),
        }
    }

    /// Issue a registration request.
    pub fn begin_register(&self) -> BiometricResult<PendingBiometric> {
        self.ensure_supported()?;
        self.issue_register()
    }

    /// Issue an authentication request for the stored credential.
    pub fn begin_authenticate(&self) -> BiometricResult<PendingBiometric> {
        self.ensure_supported()?;
        let id = self.stored_credential()?.ok_or_else(|| {
            BiometricError::new(
                BiometricErrorKind::InvalidState,
                "No registered credential. Register first.",
            )
        })?;
        self.issue_authenticate(id)
    }

    /// Create a new platform credential and persist its id.
    pub async fn register(&self) -> BiometricResult<CapabilityResult> {
        self.begin_register()?.finish().await
    }

    /// Authenticate with the stored credential.
    pub async fn authenticate(&self) -> BiometricResult<CapabilityResult> {
        self.begin_authenticate()?.finish().await
    }

    /// Drop the stored credential id.
    pub fn forget(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        info!("Stored credential cleared");
        Ok(())
    }

    /// Read the stored id, discarding a value that no longer decodes.
    fn stored_credential(&self) -> Result<Option<CredentialId>, StoreError> {
        match self.store.get() {
            Err(StoreError::Corrupt(reason)) => {
                warn!(%reason, "Discarding corrupt stored credential");
                self.store.clear()?;
                Ok(None)
            }
            other => other,
        }
    }

    fn ensure_supported(&self) -> BiometricResult<()> {
        if self.check_support() {
            Ok(())
        } else {
            warn!("Platform credential API not available");
            Err(BiometricError::of_kind(BiometricErrorKind::NotSupported))
        }
    }

    #[instrument(level = "debug", skip(self), fields(rp_id = %self.rp.id))]
    fn issue_register(&self) -> BiometricResult<PendingBiometric> {
        let options = CreationOptions {
            challenge: random_bytes::<CHALLENGE_LEN>()?.to_vec(),
            rp: self.rp.clone(),
            user: UserEntity {
                id: random_bytes::<USER_ID_LEN>()?.to_vec(),
                name: self.user_name.clone(),
                display_name: self.user_display_name.clone(),
            },
            algorithms: vec![COSE_ES256, COSE_RS256],
            attachment: self.policy.attachment,
            resident_key: self.policy.resident_key,
            user_verification: self.policy.user_verification,
            timeout: self.timeout,
        };

        let call = self.platform.create(options);
        debug!(timeout_ms = self.timeout.as_millis() as u64, "Credential creation issued");

        Ok(PendingBiometric {
            mode: BiometricMode::Register,
            call,
            store: Rc::clone(&self.store),
        })
    }

    #[instrument(level = "debug", skip(self, id), fields(rp_id = %self.rp.id, credential_id = %id))]
    fn issue_authenticate(&self, id: CredentialId) -> BiometricResult<PendingBiometric> {
        let options = RequestOptions {
            challenge: random_bytes::<CHALLENGE_LEN>()?.to_vec(),
            rp_id: self.rp.id.clone(),
            allow_credentials: vec![id],
            user_verification: self.policy.user_verification,
            timeout: self.timeout,
        };

        let call = self.platform.get(options);
        debug!(timeout_ms = self.timeout.as_millis() as u64, "Credential assertion issued");

        Ok(PendingBiometric {
            mode: BiometricMode::Authenticate,
            call,
            store: Rc::clone(&self.store),
        })
    }
}

impl fmt::Debug for BiometricGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiometricGateway")
            .field("rp", &self.rp)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Fill `N` bytes from the OS (or browser) CSPRNG.
fn random_bytes<const N: usize>() -> BiometricResult<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::fill(&mut buf).map_err(|e| {
        BiometricError::new(
            BiometricErrorKind::Unknown,
            format!("Random generator unavailable: {e}"),
        )
    })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::biometric::{
        AuthenticatorAttachment, MockAuthenticator, MockAuthenticatorOutcome, MockCredentialCall,
        ResidentKey, UserVerification,
    };
    use crate::error::PlatformError;
    use crate::store::MemoryCredentialStore;

    /// Store whose value no longer decodes until it is overwritten or cleared.
    struct CorruptStore {
        corrupt: Cell<bool>,
        inner: MemoryCredentialStore,
    }

    impl CorruptStore {
        fn new() -> Self {
            Self {
                corrupt: Cell::new(true),
                inner: MemoryCredentialStore::new(),
            }
        }
    }

    impl CredentialStore for CorruptStore {
        fn get(&self) -> Result<Option<CredentialId>, StoreError> {
            if self.corrupt.get() {
                return Err(StoreError::Corrupt("Invalid symbol 33, offset 3.".into()));
            }
            self.inner.get()
        }

        fn set(&self, id: &CredentialId) -> Result<(), StoreError> {
            self.corrupt.set(false);
            self.inner.set(id)
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.corrupt.set(false);
            self.inner.clear()
        }
    }

    struct Fixture {
        platform: Rc<MockAuthenticator>,
        store: Rc<MemoryCredentialStore>,
        gateway: BiometricGateway,
    }

    fn fixture(platform: MockAuthenticator, store: MemoryCredentialStore) -> Fixture {
        let platform = Rc::new(platform);
        let store = Rc::new(store);
        let gateway = BiometricGateway::new(
            platform.clone(),
            store.clone(),
            RelyingParty::for_hostname("localhost", "Test"),
            Duration::from_secs(60),
        );
        Fixture {
            platform,
            store,
            gateway,
        }
    }

    #[tokio::test]
    async fn test_register_persists_credential() {
        let f = fixture(MockAuthenticator::new(7), MemoryCredentialStore::new());

        let result = f.gateway.register().await.unwrap();
        assert_eq!(
            result,
            CapabilityResult {
                success: true,
                is_new_registration: true
            }
        );

        let stored = f.store.get().unwrap().expect("credential stored");
        assert!(!stored.is_empty());
        assert_eq!(f.platform.registered(), vec![stored]);
    }

    #[tokio::test]
    async fn test_register_options() {
        let f = fixture(MockAuthenticator::new(7), MemoryCredentialStore::new());
        f.gateway.register().await.unwrap();

        let calls = f.platform.calls();
        let MockCredentialCall::Create(options) = &calls[0] else {
            panic!("expected a create call, got {calls:?}");
        };
        assert!(options.challenge.len() >= 32);
        assert!(options.user.id.len() >= 16);
        assert_eq!(options.rp.id, "localhost");
        assert_eq!(options.attachment, AuthenticatorAttachment::Platform);
        assert_eq!(options.user_verification, UserVerification::Required);
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.algorithms, vec![COSE_ES256, COSE_RS256]);
    }

    #[tokio::test]
    async fn test_challenges_are_fresh() {
        let f = fixture(MockAuthenticator::new(7), MemoryCredentialStore::new());
        f.gateway.register().await.unwrap();
        f.gateway.authenticate().await.unwrap();
        f.gateway.authenticate().await.unwrap();

        let challenges: Vec<Vec<u8>> = f
            .platform
            .calls()
            .into_iter()
            .map(|c| match c {
                MockCredentialCall::Create(o) => o.challenge,
                MockCredentialCall::Get(o) => o.challenge,
            })
            .collect();
        assert_ne!(challenges[0], challenges[1]);
        assert_ne!(challenges[1], challenges[2]);
    }

    #[tokio::test]
    async fn test_authenticate_without_credential_is_invalid_state() {
        let f = fixture(MockAuthenticator::new(7), MemoryCredentialStore::new());

        let err = f.gateway.authenticate().await.unwrap_err();
        assert_eq!(err.kind, BiometricErrorKind::InvalidState);
        assert_eq!(err.message, "No registered credential. Register first.");
        assert!(f.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_allows_only_stored_credential() {
        let f = fixture(MockAuthenticator::new(7), MemoryCredentialStore::new());
        f.gateway.register().await.unwrap();
        let stored = f.store.get().unwrap().unwrap();

        let result = f.gateway.authenticate().await.unwrap();
        assert!(result.success);
        assert!(!result.is_new_registration);

        let calls = f.platform.calls();
        let MockCredentialCall::Get(options) = &calls[1] else {
            panic!("expected a get call, got {calls:?}");
        };
        assert_eq!(options.allow_credentials, vec![stored]);
        assert_eq!(options.rp_id, "localhost");
        assert_eq!(options.user_verification, UserVerification::Required);
    }

    #[tokio::test]
    async fn test_begin_picks_mode_from_store() {
        let f = fixture(MockAuthenticator::new(7), MemoryCredentialStore::new());

        let pending = f.gateway.begin().unwrap();
        assert_eq!(pending.mode(), BiometricMode::Register);
        pending.finish().await.unwrap();

        let pending = f.gateway.begin().unwrap();
        assert_eq!(pending.mode(), BiometricMode::Authenticate);
        pending.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let f = fixture(MockAuthenticator::unavailable(), MemoryCredentialStore::new());

        assert!(!f.gateway.check_support());
        let err = f.gateway.register().await.unwrap_err();
        assert_eq!(err.kind, BiometricErrorKind::NotSupported);
        assert!(f.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_platform_failures_are_classified() {
        let cases = [
            ("NotAllowedError", BiometricErrorKind::NotAllowed),
            ("InvalidStateError", BiometricErrorKind::InvalidState),
            ("AbortError", BiometricErrorKind::Timeout),
            ("NotSupportedError", BiometricErrorKind::NotSupported),
            ("UnknownError", BiometricErrorKind::Unknown),
        ];

        for (name, expected) in cases {
            let f = fixture(MockAuthenticator::new(1), MemoryCredentialStore::new());
            f.platform.push_outcome(MockAuthenticatorOutcome::Fail(PlatformError::new(
                name,
                "platform text",
            )));

            let err = f.gateway.register().await.unwrap_err();
            assert_eq!(err.kind, expected, "name: {name}");
            assert!(f.store.get().unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_forget_clears_store() {
        let f = fixture(MockAuthenticator::new(7), MemoryCredentialStore::new());
        f.gateway.register().await.unwrap();
        assert!(f.gateway.has_credential());

        f.gateway.forget().unwrap();
        assert!(!f.gateway.has_credential());
    }

    #[tokio::test]
    async fn test_policy_is_forwarded() {
        let platform = Rc::new(MockAuthenticator::new(7));
        let gateway = BiometricGateway::new(
            platform.clone(),
            Rc::new(MemoryCredentialStore::new()),
            RelyingParty::for_hostname("localhost", "Test"),
            Duration::from_secs(60),
        )
        .with_policy(AuthenticatorPolicy {
            attachment: AuthenticatorAttachment::CrossPlatform,
            resident_key: ResidentKey::Required,
            user_verification: UserVerification::Preferred,
        });

        gateway.register().await.unwrap();
        gateway.authenticate().await.unwrap();

        let calls = platform.calls();
        let MockCredentialCall::Create(create) = &calls[0] else {
            panic!("expected a create call, got {calls:?}");
        };
        assert_eq!(create.attachment, AuthenticatorAttachment::CrossPlatform);
        assert_eq!(create.resident_key, ResidentKey::Required);
        assert_eq!(create.user_verification, UserVerification::Preferred);
        let MockCredentialCall::Get(get) = &calls[1] else {
            panic!("expected a get call, got {calls:?}");
        };
        assert_eq!(get.user_verification, UserVerification::Preferred);
    }

    #[tokio::test]
    async fn test_corrupt_stored_id_is_replaced_by_registration() {
        let platform = Rc::new(MockAuthenticator::new(7));
        let store = Rc::new(CorruptStore::new());
        let gateway = BiometricGateway::new(
            platform.clone(),
            store.clone(),
            RelyingParty::for_hostname("localhost", "Test"),
            Duration::from_secs(60),
        );

        assert!(!gateway.has_credential());
        let pending = gateway.begin().unwrap();
        assert_eq!(pending.mode(), BiometricMode::Register);
        pending.finish().await.unwrap();

        assert_eq!(store.get().unwrap(), platform.registered().pop());
        assert!(gateway.has_credential());
    }

    #[tokio::test]
    async fn test_authenticate_with_corrupt_id_is_invalid_state() {
        let platform = Rc::new(MockAuthenticator::new(7));
        let store = Rc::new(CorruptStore::new());
        let gateway = BiometricGateway::new(
            platform.clone(),
            store.clone(),
            RelyingParty::for_hostname("localhost", "Test"),
            Duration::from_secs(60),
        );

        let err = gateway.authenticate().await.unwrap_err();
        assert_eq!(err.kind, BiometricErrorKind::InvalidState);
        assert_eq!(platform.call_count(), 0);
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_random_bytes_lengths() {
        let a = random_bytes::<32>().unwrap();
        let b = random_bytes::<32>().unwrap();
        assert_ne!(a, b);
    }
}
