use diesel::BoolExpressionMethods;
use diesel::EscapeExpressionMethods;
use diesel::ExpressionMethods;
use diesel::NullableExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;
use diesel::TextExpressionMethods;
use diesel::dsl::{InnerJoin, IntoBoxed};
use diesel::result::DatabaseErrorKind;
use diesel::sqlite::Sqlite;

use crate::integration::db;
use crate::model::{self, Pagination};
use crate::schema::{assignments, users};
use crate::user::{self, model::User};

use super::model::{Assignment, NewAssignment};

pub trait AssignmentRepository {
    fn find_teacher_of(&self, student: &user::Id) -> super::Result<Option<user::Id>>;

    fn find_students_of(&self, teacher: &user::Id) -> super::Result<Vec<user::Id>>;

    fn exists(&self, teacher: &user::Id, student: &user::Id) -> super::Result<bool>;

    fn insert(&self, a: &NewAssignment) -> super::Result<Assignment>;

    fn delete(&self, teacher: &user::Id, student: &user::Id) -> super::Result<usize>;

    fn find_page(
        &self,
        teacher: &user::Id,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<(Vec<(Assignment, User)>, i64)>;
}

pub struct SqliteAssignmentRepository {
    pool: db::Pool,
}

impl SqliteAssignmentRepository {
    pub fn new(pool: db::Pool) -> Self {
        Self { pool }
    }
}

type ManagedQuery<'a> = IntoBoxed<'a, InnerJoin<assignments::table, users::table>, Sqlite>;

fn managed_by<'a>(teacher: &'a user::Id, pattern: Option<&'a str>) -> ManagedQuery<'a> {
    let mut query = assignments::table
        .inner_join(users::table)
        .into_boxed()
        .filter(assignments::teacher_id.eq(teacher));

    if let Some(p) = pattern {
        query = query.filter(
            db::fold(users::username.nullable())
                .like(p)
                .escape(model::LIKE_ESCAPE)
                .or(db::fold(users::real_name).like(p).escape(model::LIKE_ESCAPE)),
        );
    }

    query
}

impl AssignmentRepository for SqliteAssignmentRepository {
    fn find_teacher_of(&self, student: &user::Id) -> super::Result<Option<user::Id>> {
        let mut conn = self.pool.get()?;

        let teacher = assignments::table
            .filter(assignments::student_id.eq(student))
            .select(assignments::teacher_id)
            .first::<user::Id>(&mut conn)
            .optional()?;

        Ok(teacher)
    }

    fn find_students_of(&self, teacher: &user::Id) -> super::Result<Vec<user::Id>> {
        let mut conn = self.pool.get()?;

        let students = assignments::table
            .filter(assignments::teacher_id.eq(teacher))
            .select(assignments::student_id)
            .order(assignments::student_id.asc())
            .load::<user::Id>(&mut conn)?;

        Ok(students)
    }

    fn exists(&self, teacher: &user::Id, student: &user::Id) -> super::Result<bool> {
        let mut conn = self.pool.get()?;

        let exists = diesel::select(diesel::dsl::exists(
            assignments::table.filter(
                assignments::teacher_id
                    .eq(teacher)
                    .and(assignments::student_id.eq(student)),
            ),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(exists)
    }

    fn insert(&self, a: &NewAssignment) -> super::Result<Assignment> {
        let mut conn = self.pool.get()?;

        let res = diesel::insert_into(assignments::table)
            .values(a)
            .returning(Assignment::as_returning())
            .get_result(&mut conn);

        match res {
            Ok(a) => Ok(a),
            Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(super::Error::AlreadyAssigned(a.student_id()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, teacher: &user::Id, student: &user::Id) -> super::Result<usize> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(
            assignments::table.filter(
                assignments::teacher_id
                    .eq(teacher)
                    .and(assignments::student_id.eq(student)),
            ),
        )
        .execute(&mut conn)?;

        Ok(deleted)
    }

    fn find_page(
        &self,
        teacher: &user::Id,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<(Vec<(Assignment, User)>, i64)> {
        let mut conn = self.pool.get()?;
        let pattern = keyword.map(model::like_pattern);

        let total = managed_by(teacher, pattern.as_deref())
            .count()
            .get_result::<i64>(&mut conn)?;

        let items = managed_by(teacher, pattern.as_deref())
            .order((assignments::created_at.desc(), assignments::id.desc()))
            .limit(p.limit())
            .offset(p.offset())
            .select((Assignment::as_select(), User::as_select()))
            .load::<(Assignment, User)>(&mut conn)?;

        Ok((items, total))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::integration::db::tests::{pool, seed_user};
    use crate::user::Role;
    use crate::user::model::NewUser;
    use crate::user::repository::{SqliteUserRepository, UserRepository};

    #[test]
    fn should_find_teacher_of_student() {
        let pool = pool();
        let repo = SqliteAssignmentRepository::new(pool.clone());
        let t = seed_user(&pool, "teacher", Role::Teacher);
        let s = seed_user(&pool, "student", Role::Student);

        repo.insert(&NewAssignment::new(t, s)).unwrap();

        assert_eq!(repo.find_teacher_of(&s).unwrap(), Some(t));
        assert_eq!(repo.find_students_of(&t).unwrap(), vec![s]);
        assert!(repo.exists(&t, &s).unwrap());
        assert_eq!(repo.find_teacher_of(&t).unwrap(), None);
    }

    #[test]
    fn should_allow_single_advisor_per_student() {
        let pool = pool();
        let repo = SqliteAssignmentRepository::new(pool.clone());
        let t1 = seed_user(&pool, "t1", Role::Teacher);
        let t2 = seed_user(&pool, "t2", Role::Teacher);
        let s = seed_user(&pool, "s", Role::Student);

        repo.insert(&NewAssignment::new(t1, s)).unwrap();
        let res = repo.insert(&NewAssignment::new(t2, s));

        assert!(matches!(res, Err(super::super::Error::AlreadyAssigned(id)) if id == s));
    }

    #[test]
    fn should_delete_assignment() {
        let pool = pool();
        let repo = SqliteAssignmentRepository::new(pool.clone());
        let t = seed_user(&pool, "t", Role::Teacher);
        let s = seed_user(&pool, "s", Role::Student);
        repo.insert(&NewAssignment::new(t, s)).unwrap();

        assert_eq!(repo.delete(&t, &s).unwrap(), 1);
        assert_eq!(repo.delete(&t, &s).unwrap(), 0);
        assert_eq!(repo.find_teacher_of(&s).unwrap(), None);
    }

    #[test]
    fn should_find_page_matching_keyword() {
        let pool = pool();
        let repo = SqliteAssignmentRepository::new(pool.clone());
        let t = seed_user(&pool, "t", Role::Teacher);
        let alice = seed_user(&pool, "alice", Role::Student);
        let bob = seed_user(&pool, "bob", Role::Student);
        let malice = seed_user(&pool, "MALICE", Role::Student);
        for s in [alice, bob, malice] {
            repo.insert(&NewAssignment::new(t, s)).unwrap();
        }

        let (items, total) = repo
            .find_page(&t, Some("alic"), &Pagination::default())
            .unwrap();
        let ids = items.iter().map(|(_, u)| u.id()).collect::<Vec<_>>();

        assert_eq!(total, 2);
        assert_eq!(ids, vec![malice, alice]);

        let (none, total) = repo
            .find_page(&t, Some("a%"), &Pagination::default())
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(total, 0);

        let emilie = SqliteUserRepository::new(pool.clone())
            .insert(&NewUser::new("e1", Some("Émilie Durand"), Role::Student))
            .unwrap()
            .id();
        repo.insert(&NewAssignment::new(t, emilie)).unwrap();
        let (items, total) = repo
            .find_page(&t, Some("émilie"), &Pagination::default())
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].1.id(), emilie);
    }
}
