use log::error;
use serde::Serialize;

use crate::model::InvalidPagination;
use crate::{assignment, auth, broadcast, integration, thread, user};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Unauthenticated,
    Conflict,
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Auth(#[from] auth::Error),
    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Assignment(#[from] assignment::Error),
    #[error(transparent)]
    _Thread(#[from] thread::Error),
    #[error(transparent)]
    _Broadcast(#[from] broadcast::Error),
    #[error(transparent)]
    _Pagination(#[from] InvalidPagination),
    #[error(transparent)]
    _Integration(#[from] integration::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::_Auth(e) => e.into(),
            Self::_User(e) => e.into(),
            Self::_Assignment(e) => e.into(),
            Self::_Thread(e) => e.into(),
            Self::_Broadcast(e) => e.into(),
            Self::_Pagination(_) => ErrorKind::Validation,
            Self::_Integration(_) => ErrorKind::Internal,
        }
    }

    /// User-visible message. Internal causes are never exposed.
    pub fn message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Something went wrong".to_owned(),
            _ => self.to_string(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<Error> for ErrorResponse {
    fn from(e: Error) -> Self {
        if e.kind() == ErrorKind::Internal {
            error!("Internal error: {e:?}");
        }

        Self {
            kind: e.kind(),
            message: e.message(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_hide_internal_details() {
        let e = Error::from(user::Error::_Diesel(diesel::result::Error::NotFound));
        assert_eq!(e.message(), "Something went wrong");

        let resp = ErrorResponse::from(e);

        assert_eq!(resp.kind, ErrorKind::Internal);
        assert_eq!(resp.message, "Something went wrong");
    }

    #[test]
    fn should_expose_domain_messages() {
        let e = Error::from(thread::Error::NotFound(thread::Id(3)));

        assert_eq!(e.kind(), ErrorKind::NotFound);
        assert_eq!(e.message(), "question not found: 3");
    }

    #[test]
    fn should_classify_invalid_pagination_as_validation() {
        let e = Error::from(crate::model::Pagination::new(0, 10).unwrap_err());

        assert_eq!(e.kind(), ErrorKind::Validation);
    }

    #[test]
    fn should_serialize_kind_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();

        assert_eq!(json, r#""not_found""#);
    }
}
