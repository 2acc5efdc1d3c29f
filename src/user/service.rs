use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use log::debug;

use super::model::{NewUser, User};
use super::{Id, Repository, Role};

#[async_trait]
pub trait UserService {
    async fn create(&self, username: &str, real_name: Option<&str>, role: Role)
    -> super::Result<User>;

    async fn find(&self, id: &Id) -> super::Result<User>;

    async fn find_many(&self, ids: &[Id]) -> super::Result<HashMap<Id, User>>;

    async fn exists(&self, id: &Id) -> super::Result<bool>;

    async fn display_name(&self, id: &Id) -> super::Result<String>;

    async fn find_roles(&self, ids: &[Id]) -> super::Result<HashMap<Id, Role>>;

    async fn active_users_of(&self, role: Option<&Role>) -> super::Result<BTreeSet<Id>>;
}

#[derive(Clone)]
pub struct UserServiceImpl {
    repo: Repository,
}

impl UserServiceImpl {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create(
        &self,
        username: &str,
        real_name: Option<&str>,
        role: Role,
    ) -> super::Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(super::Error::EmptyUsername);
        }

        let real_name = real_name.map(str::trim).filter(|n| !n.is_empty());
        let user = self.repo.insert(&NewUser::new(username, real_name, role))?;

        debug!("Created {} '{}' with id {}", user.role(), username, user.id());
        Ok(user)
    }

    async fn find(&self, id: &Id) -> super::Result<User> {
        self.repo
            .find_by_id(id)?
            .ok_or(super::Error::NotFound(*id))
    }

    async fn find_many(&self, ids: &[Id]) -> super::Result<HashMap<Id, User>> {
        let users = self
            .repo
            .find_by_ids(ids)?
            .into_iter()
            .map(|u| (u.id(), u))
            .collect();

        Ok(users)
    }

    async fn exists(&self, id: &Id) -> super::Result<bool> {
        self.repo.exists(id)
    }

    async fn display_name(&self, id: &Id) -> super::Result<String> {
        self.find(id).await.map(|u| u.display_name().to_string())
    }

    async fn find_roles(&self, ids: &[Id]) -> super::Result<HashMap<Id, Role>> {
        let roles = self
            .repo
            .find_by_ids(ids)?
            .iter()
            .map(|u| (u.id(), u.role()))
            .collect();

        Ok(roles)
    }

    async fn active_users_of(&self, role: Option<&Role>) -> super::Result<BTreeSet<Id>> {
        self.repo
            .find_active_ids(role)
            .map(|ids| ids.into_iter().collect())
    }
}
