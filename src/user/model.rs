use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use super::{Id, Role};
use crate::schema::users;

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    id: Id,
    username: String,
    real_name: Option<String>,
    role: Role,
    is_active: bool,
    created_at: NaiveDateTime,
}

impl User {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn real_name(&self) -> Option<&str> {
        self.real_name.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Real name when present and non-blank, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.real_name()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.username.as_str())
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    username: &'a str,
    real_name: Option<&'a str>,
    role: Role,
    is_active: bool,
    created_at: NaiveDateTime,
}

impl<'a> NewUser<'a> {
    pub fn new(username: &'a str, real_name: Option<&'a str>, role: Role) -> Self {
        Self {
            username,
            real_name,
            role,
            is_active: true,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn inactive(self) -> Self {
        Self {
            is_active: false,
            ..self
        }
    }

    pub fn username(&self) -> &str {
        self.username
    }
}
