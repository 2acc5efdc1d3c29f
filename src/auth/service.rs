use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use log::{debug, warn};

use super::{Caller, Config, Credential, TokenClaims};
use crate::Raw;
use crate::user;

#[async_trait]
pub trait IdentityContext {
    async fn resolve_caller(&self, credential: &Credential) -> super::Result<Caller>;
}

#[derive(Clone)]
pub struct JwtIdentity {
    key: DecodingKey,
    validation: Validation,
    users: user::Service,
}

impl JwtIdentity {
    pub fn new(cfg: &Config, users: user::Service) -> Self {
        let validation = {
            let mut v = Validation::new(Algorithm::HS256);
            v.set_required_spec_claims(&["exp", "sub"]);
            v.leeway = cfg.leeway();
            v
        };

        Self {
            key: DecodingKey::from_secret(cfg.secret()),
            validation,
            users,
        }
    }
}

#[async_trait]
impl IdentityContext for JwtIdentity {
    async fn resolve_caller(&self, credential: &Credential) -> super::Result<Caller> {
        if credential.raw().is_empty() {
            return Err(super::Error::MissingCredential);
        }

        let claims = decode::<TokenClaims>(credential.raw(), &self.key, &self.validation)
            .map_err(|e| {
                warn!("Rejected credential {credential:?}: {e}");
                super::Error::from(e)
            })?
            .claims;

        let id = claims
            .sub
            .parse::<i32>()
            .map(user::Id)
            .map_err(|_| super::Error::MalformedSubject(claims.sub.clone()))?;

        let user = match self.users.find(&id).await {
            Ok(u) => u,
            Err(user::Error::NotFound(id)) => {
                warn!("Token subject {id} is not a known user");
                return Err(super::Error::UnknownUser(id));
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active() {
            warn!("Token subject {id} is inactive");
            return Err(super::Error::InactiveUser(id));
        }

        debug!("Resolved caller {id} as {}", user.role());
        Ok(Caller::new(id, user.role()))
    }
}
