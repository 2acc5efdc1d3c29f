use std::env;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use guidance_service::auth::{self, Credential, TokenClaims};
use guidance_service::integration::db;
use guidance_service::state::AppState;
use guidance_service::user::{self, Role};
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "integration-secret";

pub struct Portal {
    pub state: AppState,
    file: Option<PathBuf>,
}

impl Portal {
    pub fn start() -> Self {
        Self::open(db::Config::in_memory(), None)
    }

    /// Portal backed by a database file with a multi-connection pool.
    #[allow(dead_code)]
    pub fn on_disk(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = env::temp_dir().join(format!("{name}-{}-{nanos}.db", std::process::id()));

        Self::open(db::Config::new(path.to_string_lossy(), 8), Some(path))
    }

    fn open(cfg: db::Config, file: Option<PathBuf>) -> Self {
        let pool = cfg.connect().unwrap();

        Self {
            state: AppState::with_pool(pool, &auth::Config::new(SECRET, 0)),
            file,
        }
    }

    pub async fn user(&self, username: &str, role: Role) -> (user::Id, Credential) {
        let u = self
            .state
            .user_service
            .create(username, None, role)
            .await
            .unwrap();

        (u.id(), token_for(u.id()))
    }
}

impl Drop for Portal {
    fn drop(&mut self) {
        if let Some(path) = &self.file {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub fn token_for(id: user::Id) -> Credential {
    let claims = TokenClaims {
        sub: id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    Credential::from_header(&format!("Bearer {token}"))
}
