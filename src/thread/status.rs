use serde::Serialize;

use crate::auth::Caller;
use crate::user::{self, Role};

use super::model::MessageDto;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    PendingAnswer,
    PendingReview,
    AwaitingAnswer,
    Answered,
    Unknown,
    Open,
}

/// Party a status is computed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Viewer {
    Student(user::Id),
    Teacher(user::Id),
}

impl Viewer {
    /// `None` for callers outside the student-teacher conversation.
    pub fn of(caller: &Caller) -> Option<Self> {
        match caller.role() {
            Role::Student => Some(Self::Student(caller.id())),
            Role::Teacher => Some(Self::Teacher(caller.id())),
            Role::Admin => None,
        }
    }

    pub fn id(&self) -> user::Id {
        match self {
            Self::Student(id) | Self::Teacher(id) => *id,
        }
    }
}

/// Status of a thread from the viewer's perspective; `messages` must be in thread order.
pub fn derive(messages: &[MessageDto], viewer: Option<Viewer>) -> Status {
    let Some(last) = messages.last() else {
        return Status::Unknown;
    };

    let Some(viewer) = viewer else {
        return Status::Open;
    };

    let unread = messages
        .iter()
        .any(|m| m.sender_id != viewer.id() && !m.is_read);
    let last_by_student = last.sender_role == Some(Role::Student);

    match viewer {
        Viewer::Teacher(_) if unread || last_by_student => Status::PendingAnswer,
        Viewer::Student(_) if unread => Status::PendingReview,
        Viewer::Student(_) if last_by_student => Status::AwaitingAnswer,
        _ => Status::Answered,
    }
}
