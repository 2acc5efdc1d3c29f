use std::collections::BTreeSet;

use async_trait::async_trait;
use log::{debug, info};

use super::model::{InboxItem, NewBroadcast, SendReceipt};
use super::{Addressing, Id, Repository};
use crate::assignment;
use crate::auth::Caller;
use crate::model::{Page, Pagination};
use crate::user::{self, Role};

#[async_trait]
pub trait BroadcastService {
    async fn send(
        &self,
        sender: &Caller,
        addressing: &Addressing,
        content: &str,
    ) -> super::Result<SendReceipt>;

    async fn announce(&self, addressing: &Addressing, content: &str)
    -> super::Result<SendReceipt>;

    async fn list_inbox(&self, caller: &Caller, p: &Pagination) -> super::Result<Page<InboxItem>>;

    async fn unread_count(&self, caller: &Caller) -> super::Result<i64>;

    async fn mark_read(&self, caller: &Caller, id: &Id) -> super::Result<()>;
}

#[derive(Clone)]
pub struct BroadcastServiceImpl {
    repo: Repository,
    assignment_service: assignment::Service,
    user_service: user::Service,
}

impl BroadcastServiceImpl {
    pub fn new(
        repo: Repository,
        assignment_service: assignment::Service,
        user_service: user::Service,
    ) -> Self {
        Self {
            repo,
            assignment_service,
            user_service,
        }
    }

    async fn existing(&self, ids: &[user::Id]) -> super::Result<BTreeSet<user::Id>> {
        let found = self.user_service.find_many(ids).await?;

        Ok(found.into_keys().collect())
    }

    async fn resolve(
        &self,
        sender: Option<&Caller>,
        addressing: &Addressing,
    ) -> super::Result<BTreeSet<user::Id>> {
        let caller = sender.map(|c| (c.id(), c.role()));
        let not_allowed = |role: Role| super::Error::NotAllowed {
            role,
            target: addressing.name(),
        };

        let recipients = match (addressing, caller) {
            (_, Some((_, Role::Student))) => return Err(not_allowed(Role::Student)),
            (Addressing::All { recipient_type }, None | Some((_, Role::Admin))) => {
                self.user_service
                    .active_users_of(recipient_type.as_ref())
                    .await?
            }
            (Addressing::TeacherStudents, Some((teacher, Role::Teacher))) => {
                self.assignment_service
                    .get_managed_students(&teacher)
                    .await?
            }
            (Addressing::TeacherStudents, None) => {
                return Err(super::Error::UnsupportedTarget(addressing.name()));
            }
            (Addressing::Users { user_ids }, _) => self.existing(user_ids).await?,
            (_, Some((_, role))) => return Err(not_allowed(role)),
        };

        Ok(recipients)
    }

    async fn deliver(
        &self,
        sender: Option<&Caller>,
        addressing: &Addressing,
        content: &str,
    ) -> super::Result<SendReceipt> {
        let new_broadcast = NewBroadcast::new(sender.map(Caller::id), content)?;

        let mut recipients = self.resolve(sender, addressing).await?;
        if let Some(s) = sender {
            recipients.remove(&s.id());
        }
        if recipients.is_empty() {
            return Err(super::Error::NoRecipients);
        }

        let recipients = recipients.into_iter().collect::<Vec<_>>();
        let broadcast = self.repo.insert(&new_broadcast, &recipients)?;

        info!(
            "Broadcast {} to '{}' delivered to {} recipient(s)",
            broadcast.id(),
            addressing.name(),
            recipients.len()
        );

        Ok(SendReceipt {
            message_id: broadcast.id(),
            recipient_count: recipients.len(),
        })
    }
}

#[async_trait]
impl BroadcastService for BroadcastServiceImpl {
    async fn send(
        &self,
        sender: &Caller,
        addressing: &Addressing,
        content: &str,
    ) -> super::Result<SendReceipt> {
        self.deliver(Some(sender), addressing, content).await
    }

    async fn announce(
        &self,
        addressing: &Addressing,
        content: &str,
    ) -> super::Result<SendReceipt> {
        self.deliver(None, addressing, content).await
    }

    async fn list_inbox(&self, caller: &Caller, p: &Pagination) -> super::Result<Page<InboxItem>> {
        let (rows, total) = self.repo.find_inbox(&caller.id(), p)?;

        let senders = rows
            .iter()
            .filter_map(|(b, _)| b.sender_id())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let names = self.user_service.find_many(&senders).await?;

        let items = rows
            .iter()
            .map(|(b, r)| {
                let sender_name = b
                    .sender_id()
                    .and_then(|id| names.get(&id))
                    .map(|u| u.display_name().to_string());
                InboxItem::new(b, r, sender_name)
            })
            .collect();

        Ok(Page::new(items, total, p))
    }

    async fn unread_count(&self, caller: &Caller) -> super::Result<i64> {
        self.repo.count_unread(&caller.id())
    }

    async fn mark_read(&self, caller: &Caller, id: &Id) -> super::Result<()> {
        if self.repo.mark_read(&caller.id(), id)? {
            debug!("Broadcast {id} read by {}", caller.id());
        }
        Ok(())
    }
}
