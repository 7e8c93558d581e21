use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// An authenticated identity. `admin` is a capability claim supplied by the
/// provider, not derived from the identifier text. The trust decision this
/// gates is cosmetic until it is also enforced at the store level; that
/// enforcement is the backend's job, not this crate's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthError {
    InvalidCredentials,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
        }
    }
}

impl Error for AuthError {}

/// The external authentication collaborator: email/password login, logout,
/// and a live current-user value.
pub trait AuthProvider: Send + Sync {
    fn login(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<AuthUser, AuthError>> + Send;

    fn logout(&self) -> impl Future<Output = ()> + Send;

    fn current_user(&self) -> impl Future<Output = Option<AuthUser>> + Send;
}

struct Account {
    password: String,
    admin: bool,
}

/// Credential-map provider: one live session at a time, the way a single
/// browser profile holds one signed-in user. Suitable for the demo admin
/// view and for tests; not an account system.
pub struct StaticAuth {
    accounts: HashMap<String, Account>,
    session: Mutex<Option<AuthUser>>,
}

impl StaticAuth {
    pub fn new() -> Self {
        StaticAuth {
            accounts: HashMap::new(),
            session: Mutex::new(None),
        }
    }

    /// Register an account. `admin` is the capability claim handed to
    /// whoever logs in with these credentials.
    pub fn with_account(mut self, email: &str, password: &str, admin: bool) -> Self {
        self.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                admin,
            },
        );
        self
    }
}

impl Default for StaticAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for StaticAuth {
    async fn login(&self, identifier: &str, secret: &str) -> Result<AuthUser, AuthError> {
        let account = self
            .accounts
            .get(identifier)
            .filter(|account| account.password == secret)
            .ok_or(AuthError::InvalidCredentials)?;

        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: identifier.to_string(),
            admin: account.admin,
        };
        *self.session.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    async fn logout(&self) {
        *self.session.lock().unwrap() = None;
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.session.lock().unwrap().clone()
    }
}
