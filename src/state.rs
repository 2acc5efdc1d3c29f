use std::sync::Arc;

use log::info;

use crate::assignment::repository::SqliteAssignmentRepository;
use crate::assignment::service::AssignmentServiceImpl;
use crate::auth::service::JwtIdentity;
use crate::auth::{self, Caller, Credential};
use crate::broadcast::repository::SqliteBroadcastRepository;
use crate::broadcast::service::BroadcastServiceImpl;
use crate::integration::{self, db};
use crate::thread::repository::SqliteThreadRepository;
use crate::thread::service::ThreadServiceImpl;
use crate::user::repository::SqliteUserRepository;
use crate::user::service::UserServiceImpl;
use crate::{assignment, broadcast, thread, user};

#[derive(Clone)]
pub struct AppState {
    pub identity: auth::Identity,
    pub user_service: user::Service,
    pub assignment_service: assignment::Service,
    pub thread_service: thread::Service,
    pub broadcast_service: broadcast::Service,
}

impl AppState {
    pub fn init(cfg: &integration::Config) -> crate::Result<Self> {
        let pool = cfg.db.connect()?;
        info!("Connected to database '{}'", cfg.db.url());

        Ok(Self::with_pool(pool, &cfg.auth))
    }

    pub fn with_pool(pool: db::Pool, auth: &auth::Config) -> Self {
        let user_service: user::Service = Arc::new(UserServiceImpl::new(Arc::new(
            SqliteUserRepository::new(pool.clone()),
        )));

        let assignment_service: assignment::Service = Arc::new(AssignmentServiceImpl::new(
            Arc::new(SqliteAssignmentRepository::new(pool.clone())),
            user_service.clone(),
        ));

        let thread_service: thread::Service = Arc::new(ThreadServiceImpl::new(
            Arc::new(SqliteThreadRepository::new(pool.clone())),
            assignment_service.clone(),
            user_service.clone(),
        ));

        let broadcast_service: broadcast::Service = Arc::new(BroadcastServiceImpl::new(
            Arc::new(SqliteBroadcastRepository::new(pool)),
            assignment_service.clone(),
            user_service.clone(),
        ));

        Self {
            identity: Arc::new(JwtIdentity::new(auth, user_service.clone())),
            user_service,
            assignment_service,
            thread_service,
            broadcast_service,
        }
    }

    pub async fn caller(&self, credential: &Credential) -> crate::Result<Caller> {
        Ok(self.identity.resolve_caller(credential).await?)
    }
}
