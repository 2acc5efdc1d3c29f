use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use super::Id;
use crate::schema::assignments;
use crate::user::{self, model::User};

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = assignments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Assignment {
    id: Id,
    teacher_id: user::Id,
    student_id: user::Id,
    created_at: NaiveDateTime,
}

impl Assignment {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn teacher_id(&self) -> user::Id {
        self.teacher_id
    }

    pub fn student_id(&self) -> user::Id {
        self.student_id
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = assignments)]
pub struct NewAssignment {
    teacher_id: user::Id,
    student_id: user::Id,
    created_at: NaiveDateTime,
}

impl NewAssignment {
    pub fn new(teacher_id: user::Id, student_id: user::Id) -> Self {
        Self {
            teacher_id,
            student_id,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn student_id(&self) -> user::Id {
        self.student_id
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ManagedStudentDto {
    pub id: user::Id,
    pub username: String,
    pub real_name: Option<String>,
    pub display_name: String,
    pub assigned_at: NaiveDateTime,
}

impl From<(Assignment, User)> for ManagedStudentDto {
    fn from((a, u): (Assignment, User)) -> Self {
        Self {
            id: u.id(),
            username: u.username().to_string(),
            real_name: u.real_name().map(String::from),
            display_name: u.display_name().to_string(),
            assigned_at: a.created_at(),
        }
    }
}
