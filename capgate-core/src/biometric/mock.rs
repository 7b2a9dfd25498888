//! Deterministic platform authenticator for testing.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use futures::channel::oneshot;
use sha3::{Digest, Sha3_256};

use super::{CreationOptions, CredentialId, CredentialPlatform, RequestOptions};
use crate::error::PlatformError;
use crate::mock::{MockGate, UserActivation};
use crate::platform::PlatformCall;

/// What the next create/get call should do.
#[derive(Debug, Clone)]
pub enum MockAuthenticatorOutcome {
    /// Behave like a real authenticator whose user approved the prompt.
    Approve,
    Fail(PlatformError),
}

/// A call received by [`MockAuthenticator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCredentialCall {
    Create(CreationOptions),
    Get(RequestOptions),
}

/// Platform authenticator double.
///
/// Credential ids are derived from the seed with SHA3, so the same seed always
/// produces the same sequence. `get` only succeeds for credentials this
/// authenticator created (or was seeded with), like a real one.
/// WARNING: Do not use in production.
pub struct MockAuthenticator {
    seed: u64,
    available: bool,
    outcomes: RefCell<VecDeque<MockAuthenticatorOutcome>>,
    calls: RefCell<Vec<MockCredentialCall>>,
    registered: RefCell<Vec<CredentialId>>,
    counter: Cell<u64>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    activation: Option<UserActivation>,
}

impl MockAuthenticator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            available: true,
            outcomes: RefCell::new(VecDeque::new()),
            calls: RefCell::new(Vec::new()),
            registered: RefCell::new(Vec::new()),
            counter: Cell::new(0),
            gate: RefCell::new(None),
            activation: None,
        }
    }

    /// A browser without `PublicKeyCredential`.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0)
        }
    }

    /// Authenticator that already holds `id`.
    pub fn with_credential(self, id: CredentialId) -> Self {
        self.registered.borrow_mut().push(id);
        self
    }

    /// Reject calls issued outside the user gesture held by `activation`.
    pub fn with_activation(mut self, activation: UserActivation) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn push_outcome(&self, outcome: MockAuthenticatorOutcome) {
        self.outcomes.borrow_mut().push_back(outcome);
    }

    /// Keep the next call pending until the returned gate is released.
    pub fn hold(&self) -> MockGate {
        let (gate, rx) = MockGate::pair();
        *self.gate.borrow_mut() = Some(rx);
        gate
    }

    pub fn calls(&self) -> Vec<MockCredentialCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn registered(&self) -> Vec<CredentialId> {
        self.registered.borrow().clone()
    }

    /// The id the next successful registration will produce.
    pub fn next_credential_id(&self) -> CredentialId {
        derive_credential_id(self.seed, self.counter.get())
    }

    fn next_outcome(&self) -> MockAuthenticatorOutcome {
        if let Some(activation) = &self.activation {
            if !activation.is_active() {
                return MockAuthenticatorOutcome::Fail(PlatformError::new(
                    "NotAllowedError",
                    "The request is not allowed by the user agent because there is no user activation.",
                ));
            }
        }
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(MockAuthenticatorOutcome::Approve)
    }

    fn settle<T: 'static>(&self, result: Result<T, PlatformError>) -> PlatformCall<T> {
        let gate = self.gate.borrow_mut().take();
        let activation = self.activation.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                // A dropped gate releases the call as well.
                let _ = gate.await;
            }
            if let Some(activation) = activation {
                activation.expire();
            }
            result
        })
    }
}

impl CredentialPlatform for MockAuthenticator {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create(&self, options: CreationOptions) -> PlatformCall<CredentialId> {
        self.calls
            .borrow_mut()
            .push(MockCredentialCall::Create(options));

        let result = match self.next_outcome() {
            MockAuthenticatorOutcome::Approve => {
                let id = self.next_credential_id();
                self.counter.set(self.counter.get() + 1);
                self.registered.borrow_mut().push(id.clone());
                Ok(id)
            }
            MockAuthenticatorOutcome::Fail(err) => Err(err),
        };
        self.settle(result)
    }

    fn get(&self, options: RequestOptions) -> PlatformCall<CredentialId> {
        let matching = {
            let registered = self.registered.borrow();
            options
                .allow_credentials
                .iter()
                .find(|id| registered.contains(id))
                .cloned()
        };
        self.calls.borrow_mut().push(MockCredentialCall::Get(options));

        let result = match self.next_outcome() {
            MockAuthenticatorOutcome::Approve => matching.ok_or_else(|| {
                PlatformError::new(
                    "NotAllowedError",
                    "No available authenticator recognized any of the allowed credentials.",
                )
            }),
            MockAuthenticatorOutcome::Fail(err) => Err(err),
        };
        self.settle(result)
    }
}

fn derive_credential_id(seed: u64, counter: u64) -> CredentialId {
    let mut hasher = Sha3_256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(b"capgate-mock-credential");
    hasher.update(counter.to_le_bytes());
    CredentialId::new(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::biometric::{RelyingParty, UserVerification};

    fn request(allow: Vec<CredentialId>) -> RequestOptions {
        RequestOptions {
            challenge: vec![0; 32],
            rp_id: "localhost".into(),
            allow_credentials: allow,
            user_verification: UserVerification::Required,
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_credential_ids_are_deterministic() {
        let a = MockAuthenticator::new(42);
        let b = MockAuthenticator::new(42);
        let c = MockAuthenticator::new(43);

        assert_eq!(a.next_credential_id(), b.next_credential_id());
        assert_ne!(a.next_credential_id(), c.next_credential_id());
        assert_eq!(a.next_credential_id().as_bytes().len(), 32);
    }

    #[tokio::test]
    async fn test_get_requires_known_credential() {
        let known = CredentialId::new(vec![9; 16]);
        let auth = MockAuthenticator::new(1).with_credential(known.clone());

        assert_eq!(auth.get(request(vec![known.clone()])).await.unwrap(), known);

        let err = auth
            .get(request(vec![CredentialId::new(vec![1; 16])]))
            .await
            .unwrap_err();
        assert_eq!(err.name, "NotAllowedError");
    }

    #[tokio::test]
    async fn test_activation_required_at_issue_time() {
        let activation = UserActivation::new();
        let auth = MockAuthenticator::new(1)
            .with_credential(CredentialId::new(vec![9; 16]))
            .with_activation(activation.clone());

        let err = auth
            .get(request(vec![CredentialId::new(vec![9; 16])]))
            .await
            .unwrap_err();
        assert_eq!(err.name, "NotAllowedError");

        activation.grant();
        let call = auth.get(request(vec![CredentialId::new(vec![9; 16])]));
        assert!(call.await.is_ok());
        assert!(!activation.is_active(), "awaiting ends the gesture");
    }

    #[tokio::test]
    async fn test_records_calls() {
        let auth = MockAuthenticator::new(1);
        let options = CreationOptions {
            challenge: vec![1; 32],
            rp: RelyingParty::for_hostname("localhost", "Test"),
            user: crate::biometric::UserEntity {
                id: vec![2; 16],
                name: "u".into(),
                display_name: "U".into(),
            },
            algorithms: vec![-7],
            attachment: crate::biometric::AuthenticatorAttachment::Platform,
            resident_key: crate::biometric::ResidentKey::Preferred,
            user_verification: UserVerification::Required,
            timeout: Duration::from_secs(1),
        };

        let id = auth.create(options.clone()).await.unwrap();
        assert_eq!(auth.calls(), vec![MockCredentialCall::Create(options)]);
        assert_eq!(auth.registered(), vec![id]);
    }
}
