use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use super::{Id, ReceiptId};
use crate::schema::{broadcast_receipts, broadcasts};
use crate::user;

#[derive(Queryable, Selectable, Clone, Debug, PartialEq)]
#[diesel(table_name = broadcasts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Broadcast {
    id: Id,
    sender_id: Option<user::Id>,
    content: String,
    created_at: NaiveDateTime,
}

impl Broadcast {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn sender_id(&self) -> Option<user::Id> {
        self.sender_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = broadcasts)]
pub struct NewBroadcast<'a> {
    sender_id: Option<user::Id>,
    content: &'a str,
    created_at: NaiveDateTime,
}

impl<'a> NewBroadcast<'a> {
    pub fn new(sender_id: Option<user::Id>, content: &'a str) -> super::Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(super::Error::EmptyContent);
        }

        Ok(Self {
            sender_id,
            content,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn sender_id(&self) -> Option<user::Id> {
        self.sender_id
    }
}

#[derive(Queryable, Selectable, Clone, Debug, PartialEq)]
#[diesel(table_name = broadcast_receipts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Receipt {
    id: ReceiptId,
    broadcast_id: Id,
    recipient_id: user::Id,
    is_read: bool,
    read_at: Option<NaiveDateTime>,
}

impl Receipt {
    pub fn id(&self) -> ReceiptId {
        self.id
    }

    pub fn broadcast_id(&self) -> Id {
        self.broadcast_id
    }

    pub fn recipient_id(&self) -> user::Id {
        self.recipient_id
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn read_at(&self) -> Option<NaiveDateTime> {
        self.read_at
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = broadcast_receipts)]
pub struct NewReceipt {
    broadcast_id: Id,
    recipient_id: user::Id,
    is_read: bool,
}

impl NewReceipt {
    pub fn new(broadcast_id: Id, recipient_id: user::Id) -> Self {
        Self {
            broadcast_id,
            recipient_id,
            is_read: false,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SendReceipt {
    pub message_id: Id,
    pub recipient_count: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct InboxItem {
    pub message_id: Id,
    pub sender_id: Option<user::Id>,
    pub sender_name: Option<String>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub is_read: bool,
    pub read_at: Option<NaiveDateTime>,
}

impl InboxItem {
    pub fn new(b: &Broadcast, r: &Receipt, sender_name: Option<String>) -> Self {
        Self {
            message_id: b.id(),
            sender_id: b.sender_id(),
            sender_name,
            content: b.content().to_string(),
            created_at: b.created_at(),
            is_read: r.is_read(),
            read_at: r.read_at(),
        }
    }
}
