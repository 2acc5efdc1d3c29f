use diesel::BoolExpressionMethods;
use diesel::EscapeExpressionMethods;
use diesel::ExpressionMethods;
use diesel::NullableExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;
use diesel::TextExpressionMethods;
use diesel::sqlite::Sqlite;

use crate::integration::db;
use crate::model::{self, Pagination};
use crate::schema::{messages, questions};
use crate::user;

use super::Id;
use super::model::{Message, NewMessage, NewQuestion, Question};

/// Whose questions a listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    CreatedBy(user::Id),
    AdvisedBy(user::Id),
}

pub trait ThreadRepository {
    fn create(&self, q: &NewQuestion, body: &str) -> super::Result<(Question, Message)>;

    fn find_by_id(&self, id: &Id) -> super::Result<Option<Question>>;

    fn find_page(
        &self,
        scope: &Scope,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<(Vec<Question>, i64)>;

    fn find_by_teacher(&self, teacher: &user::Id) -> super::Result<Vec<Question>>;

    fn append_message(&self, m: &NewMessage) -> super::Result<Message>;

    fn list_messages(&self, id: &Id) -> super::Result<Vec<Message>>;

    fn list_messages_of(&self, ids: &[Id]) -> super::Result<Vec<Message>>;

    fn mark_read_excluding_sender(&self, id: &Id, viewer: &user::Id) -> super::Result<usize>;

    fn delete(&self, id: &Id) -> super::Result<()>;
}

pub struct SqliteThreadRepository {
    pool: db::Pool,
}

impl SqliteThreadRepository {
    pub fn new(pool: db::Pool) -> Self {
        Self { pool }
    }
}

fn scoped<'a>(scope: &Scope, pattern: Option<&'a str>) -> questions::BoxedQuery<'a, Sqlite> {
    let mut query = questions::table.into_boxed();

    query = match *scope {
        Scope::CreatedBy(id) => query.filter(questions::creator_id.eq(id)),
        Scope::AdvisedBy(id) => query.filter(questions::teacher_id.eq(id)),
    };

    if let Some(p) = pattern {
        query = query.filter(
            db::fold(questions::title.nullable())
                .like(p)
                .escape(model::LIKE_ESCAPE),
        );
    }

    query
}

impl ThreadRepository for SqliteThreadRepository {
    fn create(&self, q: &NewQuestion, body: &str) -> super::Result<(Question, Message)> {
        let mut conn = self.pool.get()?;

        conn.immediate_transaction::<_, super::Error, _>(|conn| {
            let question = diesel::insert_into(questions::table)
                .values(q)
                .returning(Question::as_returning())
                .get_result(conn)?;

            let seed = NewMessage::new(question.id(), q.creator_id(), body)?.at(q.created_at());
            let message = diesel::insert_into(messages::table)
                .values(&seed)
                .returning(Message::as_returning())
                .get_result(conn)?;

            Ok((question, message))
        })
    }

    fn find_by_id(&self, id: &Id) -> super::Result<Option<Question>> {
        let mut conn = self.pool.get()?;

        let q = questions::table
            .find(id)
            .select(Question::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(q)
    }

    fn find_page(
        &self,
        scope: &Scope,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<(Vec<Question>, i64)> {
        let mut conn = self.pool.get()?;
        let pattern = keyword.map(model::like_pattern);

        let total = scoped(scope, pattern.as_deref())
            .count()
            .get_result::<i64>(&mut conn)?;

        let items = scoped(scope, pattern.as_deref())
            .order((questions::created_at.desc(), questions::id.desc()))
            .limit(p.limit())
            .offset(p.offset())
            .select(Question::as_select())
            .load(&mut conn)?;

        Ok((items, total))
    }

    fn find_by_teacher(&self, teacher: &user::Id) -> super::Result<Vec<Question>> {
        let mut conn = self.pool.get()?;

        let qs = questions::table
            .filter(questions::teacher_id.eq(teacher))
            .order((
                questions::creator_id.asc(),
                questions::created_at.desc(),
                questions::id.desc(),
            ))
            .select(Question::as_select())
            .load(&mut conn)?;

        Ok(qs)
    }

    fn append_message(&self, m: &NewMessage) -> super::Result<Message> {
        let mut conn = self.pool.get()?;

        conn.immediate_transaction::<_, super::Error, _>(|conn| {
            let exists = diesel::select(diesel::dsl::exists(
                questions::table.find(m.question_id()),
            ))
            .get_result::<bool>(conn)?;

            if !exists {
                return Err(super::Error::NotFound(m.question_id()));
            }

            let message = diesel::insert_into(messages::table)
                .values(m)
                .returning(Message::as_returning())
                .get_result(conn)?;

            Ok(message)
        })
    }

    fn list_messages(&self, id: &Id) -> super::Result<Vec<Message>> {
        self.list_messages_of(std::slice::from_ref(id))
    }

    fn list_messages_of(&self, ids: &[Id]) -> super::Result<Vec<Message>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut conn = self.pool.get()?;

        let ms = messages::table
            .filter(messages::question_id.eq_any(ids))
            .order((messages::created_at.asc(), messages::id.asc()))
            .select(Message::as_select())
            .load(&mut conn)?;

        Ok(ms)
    }

    fn mark_read_excluding_sender(&self, id: &Id, viewer: &user::Id) -> super::Result<usize> {
        let mut conn = self.pool.get()?;

        let changed = diesel::update(
            messages::table.filter(
                messages::question_id
                    .eq(id)
                    .and(messages::sender_id.ne(viewer))
                    .and(messages::is_read.eq(false)),
            ),
        )
        .set(messages::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(changed)
    }

    fn delete(&self, id: &Id) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        conn.immediate_transaction::<_, super::Error, _>(|conn| {
            diesel::delete(messages::table.filter(messages::question_id.eq(id))).execute(conn)?;

            let deleted = diesel::delete(questions::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(super::Error::NotFound(*id));
            }

            Ok(())
        })
    }
}
