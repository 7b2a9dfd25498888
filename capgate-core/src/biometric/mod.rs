//! Biometric authentication through platform credentials (WebAuthn).
//!
//! - `gateway`: [`BiometricGateway`], register/authenticate with classified errors
//! - `mock`: deterministic [`MockAuthenticator`]
//!
//! Challenges are generated locally. Without a relying-party backend to verify
//! assertions they only exercise the platform prompt; they prove nothing.

mod gateway;
mod mock;

pub use gateway::{BiometricGateway, BiometricMode, CapabilityResult, PendingBiometric};
pub use mock::{MockAuthenticator, MockAuthenticatorOutcome, MockCredentialCall};

use std::fmt;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::platform::PlatformCall;

/// Challenge length in bytes.
pub const CHALLENGE_LEN: usize = 32;

/// Random user handle length in bytes.
pub const USER_ID_LEN: usize = 16;

/// COSE ES256.
pub const COSE_ES256: i64 = -7;

/// COSE RS256.
pub const COSE_RS256: i64 = -257;

/// Raw credential identifier as returned by the authenticator.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialId(Vec<u8>);

impl CredentialId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn from_base64url(encoded: &str) -> Result<Self, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(encoded).map(Self)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64url())
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId({})", self.to_base64url())
    }
}

/// Relying party identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    /// Effective domain, e.g. `example.com` or `localhost`.
    pub id: String,
    /// Display name shown in the platform prompt.
    pub name: String,
}

impl RelyingParty {
    /// Derive the relying party from the page's hostname.
    pub fn for_hostname(hostname: &str, name: impl Into<String>) -> Self {
        let host = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
        let id = if host.is_empty() || host == "localhost" {
            "localhost".to_string()
        } else {
            host
        };
        Self {
            id,
            name: name.into(),
        }
    }
}

/// User entity for credential creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorAttachment {
    /// Built into the device (Touch ID, Windows Hello, Android biometrics).
    #[default]
    Platform,
    /// Roaming authenticator such as a security key or a phone.
    CrossPlatform,
}

impl AuthenticatorAttachment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::CrossPlatform => "cross-platform",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserVerification {
    #[default]
    Required,
    Preferred,
    Discouraged,
}

impl UserVerification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Discouraged => "discouraged",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidentKey {
    Required,
    #[default]
    Preferred,
    Discouraged,
}

impl ResidentKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Discouraged => "discouraged",
        }
    }
}

/// Authenticator requirements applied to both ceremonies.
///
/// The default asks for a built-in authenticator with mandatory user
/// verification, which is what makes the prompt biometric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatorPolicy {
    pub attachment: AuthenticatorAttachment,
    pub resident_key: ResidentKey,
    pub user_verification: UserVerification,
}

/// Options for `navigator.credentials.create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationOptions {
    pub challenge: Vec<u8>,
    pub rp: RelyingParty,
    pub user: UserEntity,
    /// COSE algorithm identifiers, most preferred first.
    pub algorithms: Vec<i64>,
    pub attachment: AuthenticatorAttachment,
    pub resident_key: ResidentKey,
    pub user_verification: UserVerification,
    pub timeout: Duration,
}

/// Options for `navigator.credentials.get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub challenge: Vec<u8>,
    pub rp_id: String,
    pub allow_credentials: Vec<CredentialId>,
    pub user_verification: UserVerification,
    pub timeout: Duration,
}

/// Platform credential API (`navigator.credentials`).
pub trait CredentialPlatform {
    /// Whether `PublicKeyCredential` exists.
    fn is_available(&self) -> bool;

    /// Create a credential. See [`PlatformCall`] for the eager-issue contract.
    fn create(&self, options: CreationOptions) -> PlatformCall<CredentialId>;

    /// Get an assertion. See [`PlatformCall`] for the eager-issue contract.
    fn get(&self, options: RequestOptions) -> PlatformCall<CredentialId>;
}
