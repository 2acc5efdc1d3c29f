use std::sync::Arc;

use serde::Deserialize;

use crate::ErrorKind;
use crate::assignment;
use crate::integration::db::integer_id;
use crate::user::{self, Role};

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::BroadcastRepository + Send + Sync>;
pub type Service = Arc<dyn service::BroadcastService + Send + Sync>;

integer_id!(Id);
integer_id!(ReceiptId);

/// Who a broadcast is delivered to.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Addressing {
    All {
        #[serde(default)]
        recipient_type: Option<Role>,
    },
    TeacherStudents,
    Users {
        user_ids: Vec<user::Id>,
    },
}

impl Addressing {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::All { .. } => "all",
            Self::TeacherStudents => "teacher_students",
            Self::Users { .. } => "users",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("broadcast content must not be empty")]
    EmptyContent,
    #[error("broadcast has no recipients")]
    NoRecipients,
    #[error("{role} cannot send a broadcast to '{target}'")]
    NotAllowed { role: Role, target: &'static str },
    #[error("system announcements cannot target '{0}'")]
    UnsupportedTarget(&'static str),
    #[error("broadcast not found: {0}")]
    NotFound(Id),

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Assignment(#[from] assignment::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}

impl From<&Error> for ErrorKind {
    fn from(e: &Error) -> Self {
        match e {
            Error::EmptyContent | Error::NoRecipients | Error::UnsupportedTarget(_) => {
                Self::Validation
            }
            Error::NotAllowed { .. } => Self::Forbidden,
            Error::NotFound(_) => Self::NotFound,
            Error::_User(e) => e.into(),
            Error::_Assignment(e) => e.into(),
            Error::_R2d2(_) | Error::_Diesel(_) => Self::Internal,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_deserialize_addressing() {
        let all: Addressing = serde_json::from_str(r#"{"target":"all"}"#).unwrap();
        let teachers: Addressing =
            serde_json::from_str(r#"{"target":"all","recipient_type":"teacher"}"#).unwrap();
        let mine: Addressing = serde_json::from_str(r#"{"target":"teacher_students"}"#).unwrap();
        let users: Addressing =
            serde_json::from_str(r#"{"target":"users","user_ids":[3,5]}"#).unwrap();

        assert_eq!(all, Addressing::All { recipient_type: None });
        assert_eq!(
            teachers,
            Addressing::All {
                recipient_type: Some(Role::Teacher)
            }
        );
        assert_eq!(mine, Addressing::TeacherStudents);
        assert_eq!(
            users,
            Addressing::Users {
                user_ids: vec![user::Id(3), user::Id(5)]
            }
        );
    }

    #[test]
    fn should_reject_unknown_target() {
        assert!(serde_json::from_str::<Addressing>(r#"{"target":"everyone"}"#).is_err());
    }
}
