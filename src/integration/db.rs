use std::env;
use std::time::Duration;

use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};
use diesel::sql_types::{Nullable, Text};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const MEMORY: &str = ":memory:";

pub type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

diesel::define_sql_function! {
    /// Unicode lowercase, registered on every pooled connection.
    fn fold(text: Nullable<Text>) -> Nullable<Text>;
}

#[derive(Clone, Debug)]
pub struct Config {
    url: String,
    pool_size: u32,
    busy_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::from("guidance.db"),
            pool_size: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn env() -> anyhow::Result<Self> {
        let url = env::var("DATABASE_URL")?;
        let pool_size = match env::var("DB_POOL_SIZE") {
            Ok(size) => size.parse()?,
            Err(_) => Self::default().pool_size,
        };

        Ok(Self {
            url,
            pool_size,
            ..Self::default()
        })
    }

    pub fn new(url: impl Into<String>, pool_size: u32) -> Self {
        Self {
            url: url.into(),
            pool_size,
            ..Self::default()
        }
    }

    /// Private database living inside a single pooled connection.
    pub fn in_memory() -> Self {
        Self {
            url: String::from(MEMORY),
            pool_size: 1,
            ..Self::default()
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connect(&self) -> super::Result<Pool> {
        debug!("Connecting to SQLite database '{}'", self.url);

        let manager = ConnectionManager::<SqliteConnection>::new(&self.url);
        let mut builder = r2d2::Pool::builder()
            .max_size(self.pool_size)
            .connection_customizer(Box::new(ConnectionOptions {
                busy_timeout: self.busy_timeout,
            }));

        // every new connection to :memory: is a fresh empty database
        if self.url == MEMORY {
            builder = builder.max_size(1).idle_timeout(None).max_lifetime(None);
        }

        let pool = builder.build(manager)?;
        migrate(&pool)?;

        Ok(pool)
    }
}

pub fn migrate(pool: &Pool) -> super::Result<()> {
    let mut pooled = pool.get()?;
    let conn: &mut SqliteConnection = &mut pooled;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| super::Error::Migration(e.to_string()))?;

    info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)?;

        fold_utils::register_impl(conn, |text: Option<String>| text.map(|t| t.to_lowercase()))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Integer identifier newtype usable directly in diesel queries and rows.
macro_rules! integer_id {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
            diesel::expression::AsExpression,
            diesel::deserialize::FromSqlRow,
        )]
        #[diesel(sql_type = diesel::sql_types::Integer)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            pub const fn get(&self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Integer, diesel::sqlite::Sqlite>
            for $name
        {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::sqlite::Sqlite>,
            ) -> diesel::serialize::Result {
                out.set_value(self.0);
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Integer, diesel::sqlite::Sqlite>
            for $name
        {
            fn from_sql(
                value: <diesel::sqlite::Sqlite as diesel::backend::Backend>::RawValue<'_>,
            ) -> diesel::deserialize::Result<Self> {
                <i32 as diesel::deserialize::FromSql<
                    diesel::sql_types::Integer,
                    diesel::sqlite::Sqlite,
                >>::from_sql(value)
                .map(Self)
            }
        }
    };
}

pub(crate) use integer_id;

#[cfg(test)]
pub mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use diesel::{QueryDsl, RunQueryDsl};

    use crate::schema::users;
    use crate::user::model::NewUser;
    use crate::user::repository::{SqliteUserRepository, UserRepository};
    use crate::user::{self, Role};

    use super::*;

    pub fn pool() -> Pool {
        Config::in_memory()
            .connect()
            .expect("in-memory database should open")
    }

    /// Database file under the temp dir, removed on drop.
    pub struct FileDb {
        pub pool: Pool,
        path: PathBuf,
    }

    impl Drop for FileDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    pub fn file_pool(name: &str, pool_size: u32) -> FileDb {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        let path = env::temp_dir().join(format!("{name}-{}-{nanos}.db", std::process::id()));

        let pool = Config::new(path.to_string_lossy(), pool_size)
            .connect()
            .expect("file database should open");

        FileDb { pool, path }
    }

    pub fn seed_user(pool: &Pool, username: &str, role: Role) -> user::Id {
        SqliteUserRepository::new(pool.clone())
            .insert(&NewUser::new(username, None, role))
            .expect("user should be inserted")
            .id()
    }

    #[test]
    fn should_migrate_in_memory_database() {
        let pool = pool();
        let mut conn = pool.get().unwrap();

        let count = users::table
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();

        assert_eq!(count, 0);
    }

    #[test]
    fn should_enable_foreign_keys() {
        let pool = pool();
        let mut conn = pool.get().unwrap();

        let res = conn.batch_execute(
            "INSERT INTO assignments (teacher_id, student_id, created_at) \
             VALUES (100, 200, '2025-01-01 00:00:00')",
        );

        assert!(res.is_err());
    }
}
