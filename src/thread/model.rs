use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use super::{Id, MessageId, Status};
use crate::schema::{messages, questions};
use crate::user::{self, Role};

#[derive(Queryable, Selectable, Clone, Debug, PartialEq)]
#[diesel(table_name = questions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Question {
    id: Id,
    title: String,
    creator_id: user::Id,
    teacher_id: Option<user::Id>,
    created_at: NaiveDateTime,
}

impl Question {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn creator_id(&self) -> user::Id {
        self.creator_id
    }

    pub fn teacher_id(&self) -> Option<user::Id> {
        self.teacher_id
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn is_participant(&self, id: &user::Id) -> bool {
        self.creator_id == *id || self.teacher_id.as_ref() == Some(id)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = questions)]
pub struct NewQuestion<'a> {
    title: &'a str,
    creator_id: user::Id,
    teacher_id: Option<user::Id>,
    created_at: NaiveDateTime,
}

impl<'a> NewQuestion<'a> {
    pub fn new(
        creator_id: user::Id,
        teacher_id: Option<user::Id>,
        title: &'a str,
    ) -> super::Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(super::Error::EmptyTitle);
        }
        if teacher_id == Some(creator_id) {
            return Err(super::Error::SelfAdvised);
        }

        Ok(Self {
            title,
            creator_id,
            teacher_id,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn creator_id(&self) -> user::Id {
        self.creator_id
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

#[derive(Queryable, Selectable, Clone, Debug, PartialEq)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Message {
    id: MessageId,
    question_id: Id,
    sender_id: user::Id,
    content: String,
    is_read: bool,
    created_at: NaiveDateTime,
}

impl Message {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn question_id(&self) -> Id {
        self.question_id
    }

    pub fn sender_id(&self) -> user::Id {
        self.sender_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = messages)]
pub struct NewMessage<'a> {
    question_id: Id,
    sender_id: user::Id,
    content: &'a str,
    is_read: bool,
    created_at: NaiveDateTime,
}

impl<'a> NewMessage<'a> {
    pub fn new(question_id: Id, sender_id: user::Id, content: &'a str) -> super::Result<Self> {
        Ok(Self {
            question_id,
            sender_id,
            content: non_empty_content(content)?,
            is_read: false,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub(super) fn at(self, created_at: NaiveDateTime) -> Self {
        Self { created_at, ..self }
    }

    pub fn question_id(&self) -> Id {
        self.question_id
    }
}

pub fn non_empty_content(content: &str) -> super::Result<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(super::Error::EmptyContent);
    }
    Ok(content)
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct QuestionDto {
    pub id: Id,
    pub title: String,
    pub creator_id: user::Id,
    pub teacher_id: Option<user::Id>,
    pub created_at: NaiveDateTime,
    pub status: Status,
}

impl QuestionDto {
    pub fn new(q: &Question, status: Status) -> Self {
        Self {
            id: q.id(),
            title: q.title().to_string(),
            creator_id: q.creator_id(),
            teacher_id: q.teacher_id(),
            created_at: q.created_at(),
            status,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MessageDto {
    pub id: MessageId,
    pub sender_id: user::Id,
    pub sender_role: Option<Role>,
    pub content: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl MessageDto {
    pub fn new(m: &Message, roles: &HashMap<user::Id, Role>) -> Self {
        Self {
            id: m.id(),
            sender_id: m.sender_id(),
            sender_role: roles.get(&m.sender_id()).copied(),
            content: m.content().to_string(),
            is_read: m.is_read(),
            created_at: m.created_at(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct QuestionDetailDto {
    pub question: QuestionDto,
    pub messages: Vec<MessageDto>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DashboardGroup {
    pub student_id: user::Id,
    pub student_name: String,
    pub questions: Vec<QuestionDto>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_trim_and_validate_new_question() {
        let q = NewQuestion::new(user::Id(1), Some(user::Id(2)), "  Proposal  ").unwrap();
        assert_eq!(q.title, "Proposal");

        assert!(matches!(
            NewQuestion::new(user::Id(1), None, " \n "),
            Err(super::super::Error::EmptyTitle)
        ));
        assert!(matches!(
            NewQuestion::new(user::Id(1), Some(user::Id(1)), "Proposal"),
            Err(super::super::Error::SelfAdvised)
        ));
    }

    #[test]
    fn should_reject_blank_message() {
        assert!(matches!(
            NewMessage::new(Id(1), user::Id(1), "\t"),
            Err(super::super::Error::EmptyContent)
        ));
    }
}
