use std::sync::Arc;

use crate::ErrorKind;
use crate::integration::db::integer_id;
use crate::user::{self, Role};
use crate::assignment;

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod status;

pub use status::{Status, Viewer};

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::ThreadRepository + Send + Sync>;
pub type Service = Arc<dyn service::ThreadService + Send + Sync>;

integer_id!(Id);
integer_id!(MessageId);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("question not found: {0}")]
    NotFound(Id),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("message must not be empty")]
    EmptyContent,
    #[error("a question cannot be advised by its own creator")]
    SelfAdvised,
    #[error("only students can ask questions")]
    StudentsOnly,
    #[error("only teachers have a dashboard")]
    TeachersOnly,
    #[error("{0} cannot list questions")]
    CannotList(Role),
    #[error("not a participant of question {0}")]
    NotParticipant(Id),
    #[error("only the creator can delete question {0}")]
    NotCreator(Id),

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
            Error::NotFound(_) => Self::NotFound,
            Error::EmptyTitle | Error::EmptyContent | Error::SelfAdvised => Self::Validation,
            Error::StudentsOnly
            | Error::TeachersOnly
            | Error::CannotList(_)
            | Error::NotParticipant(_)
            | Error::NotCreator(_) => Self::Forbidden,
            Error::_User(e) => e.into(),
            Error::_Assignment(e) => e.into(),
            Error::_R2d2(_) | Error::_Diesel(_) => Self::Internal,
        }
    }
}
