use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;
use diesel::result::DatabaseErrorKind;

use crate::integration::db;
use crate::schema::users;

use super::model::{NewUser, User};
use super::{Id, Role};

pub trait UserRepository {
    fn insert(&self, user: &NewUser) -> super::Result<User>;

    fn find_by_id(&self, id: &Id) -> super::Result<Option<User>>;

    fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>>;

    fn exists(&self, id: &Id) -> super::Result<bool>;

    fn find_active_ids(&self, role: Option<&Role>) -> super::Result<Vec<Id>>;
}

pub struct SqliteUserRepository {
    pool: db::Pool,
}

impl SqliteUserRepository {
    pub fn new(pool: db::Pool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    fn insert(&self, u: &NewUser) -> super::Result<User> {
        let mut conn = self.pool.get()?;

        let res = diesel::insert_into(users::table)
            .values(u)
            .returning(User::as_returning())
            .get_result(&mut conn);

        match res {
            Ok(user) => Ok(user),
            Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(super::Error::UsernameTaken(u.username().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_id(&self, id: &Id) -> super::Result<Option<User>> {
        let mut conn = self.pool.get()?;

        let u = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(u)
    }

    fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut conn = self.pool.get()?;

        let users = users::table
            .filter(users::id.eq_any(ids))
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut conn)?;

        Ok(users)
    }

    fn exists(&self, id: &Id) -> super::Result<bool> {
        let mut conn = self.pool.get()?;

        let exists = diesel::select(diesel::dsl::exists(users::table.find(id)))
            .get_result::<bool>(&mut conn)?;

        Ok(exists)
    }

    fn find_active_ids(&self, role: Option<&Role>) -> super::Result<Vec<Id>> {
        let mut conn = self.pool.get()?;

        let mut query = users::table
            .filter(users::is_active.eq(true))
            .select(users::id)
            .order(users::id.asc())
            .into_boxed();

        if let Some(r) = role {
            query = query.filter(users::role.eq(r));
        }

        let ids = query.load::<Id>(&mut conn)?;

        Ok(ids)
    }
}
