use std::env;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::user::{self, Role};
use crate::{ErrorKind, Raw, Redact};

pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Identity = Arc<dyn service::IdentityContext + Send + Sync>;

const BEARER: &str = "Bearer ";

#[derive(Clone, PartialEq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Accepts an `Authorization` header value with or without the bearer scheme.
    pub fn from_header(value: &str) -> Self {
        let value = value.trim();
        Self::new(value.strip_prefix(BEARER).unwrap_or(value).trim())
    }
}

impl Redact for Credential {}

impl Raw for Credential {
    fn raw(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.redact())
    }
}

/// The authenticated party of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Caller {
    id: user::Id,
    role: Role,
}

impl Caller {
    pub fn new(id: user::Id, role: Role) -> Self {
        Self { id, role }
    }

    pub fn id(&self) -> user::Id {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: u64,
}

#[derive(Clone)]
pub struct Config {
    secret: String,
    leeway: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret: String::from("guidance-development-secret"),
            leeway: 0,
        }
    }
}

impl Config {
    pub fn new(secret: impl Into<String>, leeway: u64) -> Self {
        Self {
            secret: secret.into(),
            leeway,
        }
    }

    pub fn env() -> anyhow::Result<Self> {
        let secret = env::var("JWT_SECRET_KEY")?;
        let leeway = match env::var("JWT_LEEWAY") {
            Ok(l) => l.parse()?,
            Err(_) => Self::default().leeway,
        };

        Ok(Self { secret, leeway })
    }

    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    pub fn leeway(&self) -> u64 {
        self.leeway
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret", &self.redact())
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl Redact for Config {}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("credential is missing")]
    MissingCredential,
    #[error("token subject is malformed: {0}")]
    MalformedSubject(String),
    #[error("unknown user: {0}")]
    UnknownUser(user::Id),
    #[error("user is inactive: {0}")]
    InactiveUser(user::Id),

    #[error(transparent)]
    _JsonWebtoken(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    _User(#[from] user::Error),
}

impl From<&Error> for ErrorKind {
    fn from(e: &Error) -> Self {
        match e {
            Error::MissingCredential
            | Error::MalformedSubject(_)
            | Error::UnknownUser(_)
            | Error::InactiveUser(_)
            | Error::_JsonWebtoken(_) => Self::Unauthenticated,
            Error::_User(e) => e.into(),
        }
    }
}
