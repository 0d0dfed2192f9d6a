use async_session::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// The event has exactly one host account.
pub const HOST_ID: i32 = 1;

#[derive(Debug, Clone)]
pub struct Host {
    id: i32,
    passcode_hash: [u8; 32],
}

impl AuthUser for Host {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Rotating HOST_PASSCODE invalidates every existing session.
    fn session_auth_hash(&self) -> &[u8] {
        &self.passcode_hash
    }
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub passcode: String,
    pub next: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("passcode", &"[redacted]")
            .field("next", &self.next)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Host not found")]
    UnknownUser,
}

#[derive(Debug, Clone)]
pub struct Backend {
    host: Host,
}

impl Backend {
    pub fn new(passcode: &str) -> Self {
        Self {
            host: Host {
                id: HOST_ID,
                passcode_hash: hash_passcode(passcode),
            },
        }
    }
}

fn hash_passcode(passcode: &str) -> [u8; 32] {
    Sha256::digest(passcode.as_bytes()).into()
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = Host;
    type Credentials = Credentials;
    type Error = BackendError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        if hash_passcode(&creds.passcode) == self.host.passcode_hash {
            debug!("Host passcode accepted");
            Ok(Some(self.host.clone()))
        } else {
            warn!("Rejected host login attempt");
            Ok(None)
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        if *user_id == self.host.id {
            Ok(Some(self.host.clone()))
        } else {
            Err(Self::Error::UnknownUser)
        }
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;
