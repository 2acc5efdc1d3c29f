use std::sync::Arc;

use crate::ErrorKind;
use crate::integration::db::integer_id;
use crate::user::{self, Role};

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::AssignmentRepository + Send + Sync>;
pub type Service = Arc<dyn service::AssignmentService + Send + Sync>;

integer_id!(Id);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0} is not allowed to manage students")]
    Forbidden(Role),
    #[error("student not found: {0}")]
    StudentNotFound(user::Id),
    #[error("user {0} is not a student")]
    NotStudent(user::Id),
    #[error("student {0} already has an advisor")]
    AlreadyAssigned(user::Id),
    #[error("student {student} is not managed by {teacher}")]
    NotAssigned {
        teacher: user::Id,
        student: user::Id,
    },

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}

impl From<&Error> for ErrorKind {
    fn from(e: &Error) -> Self {
        match e {
            Error::Forbidden(_) => Self::Forbidden,
            Error::StudentNotFound(_) | Error::NotAssigned { .. } => Self::NotFound,
            Error::NotStudent(_) => Self::Validation,
            Error::AlreadyAssigned(_) => Self::Conflict,
            Error::_User(e) => e.into(),
            Error::_R2d2(_) | Error::_Diesel(_) => Self::Internal,
        }
    }
}
