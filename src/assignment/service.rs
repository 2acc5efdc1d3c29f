use std::collections::BTreeSet;

use async_trait::async_trait;
use log::debug;

use super::Repository;
use super::model::{Assignment, ManagedStudentDto, NewAssignment};
use crate::auth::Caller;
use crate::model::{Page, Pagination};
use crate::user::{self, Role};

#[async_trait]
pub trait AssignmentService {
    async fn get_advisor_of(&self, student: &user::Id) -> super::Result<Option<user::Id>>;

    async fn get_managed_students(&self, teacher: &user::Id)
    -> super::Result<BTreeSet<user::Id>>;

    async fn is_managed(&self, teacher: &user::Id, student: &user::Id) -> super::Result<bool>;

    async fn assign(&self, caller: &Caller, student: &user::Id) -> super::Result<Assignment>;

    async fn unassign(&self, caller: &Caller, student: &user::Id) -> super::Result<()>;

    async fn list_managed(
        &self,
        caller: &Caller,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<Page<ManagedStudentDto>>;
}

#[derive(Clone)]
pub struct AssignmentServiceImpl {
    repo: Repository,
    user_service: user::Service,
}

impl AssignmentServiceImpl {
    pub fn new(repo: Repository, user_service: user::Service) -> Self {
        Self { repo, user_service }
    }
}

fn ensure_teacher(caller: &Caller) -> super::Result<()> {
    if !caller.is_teacher() {
        return Err(super::Error::Forbidden(caller.role()));
    }
    Ok(())
}

#[async_trait]
impl AssignmentService for AssignmentServiceImpl {
    async fn get_advisor_of(&self, student: &user::Id) -> super::Result<Option<user::Id>> {
        self.repo.find_teacher_of(student)
    }

    async fn get_managed_students(
        &self,
        teacher: &user::Id,
    ) -> super::Result<BTreeSet<user::Id>> {
        self.repo
            .find_students_of(teacher)
            .map(|ids| ids.into_iter().collect())
    }

    async fn is_managed(&self, teacher: &user::Id, student: &user::Id) -> super::Result<bool> {
        self.repo.exists(teacher, student)
    }

    async fn assign(&self, caller: &Caller, student: &user::Id) -> super::Result<Assignment> {
        ensure_teacher(caller)?;

        let target = match self.user_service.find(student).await {
            Ok(u) => u,
            Err(user::Error::NotFound(id)) => return Err(super::Error::StudentNotFound(id)),
            Err(e) => return Err(e.into()),
        };

        if target.role() != Role::Student {
            return Err(super::Error::NotStudent(*student));
        }

        if self.repo.find_teacher_of(student)?.is_some() {
            return Err(super::Error::AlreadyAssigned(*student));
        }

        let a = self.repo.insert(&NewAssignment::new(caller.id(), *student))?;

        debug!("Assigned student {} to teacher {}", student, caller.id());
        Ok(a)
    }

    async fn unassign(&self, caller: &Caller, student: &user::Id) -> super::Result<()> {
        ensure_teacher(caller)?;

        let deleted = self.repo.delete(&caller.id(), student)?;
        if deleted == 0 {
            return Err(super::Error::NotAssigned {
                teacher: caller.id(),
                student: *student,
            });
        }

        debug!("Unassigned student {} from teacher {}", student, caller.id());
        Ok(())
    }

    async fn list_managed(
        &self,
        caller: &Caller,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<Page<ManagedStudentDto>> {
        ensure_teacher(caller)?;

        let (items, total) = self
            .repo
            .find_page(&caller.id(), crate::model::keyword(keyword), p)?;

        Ok(Page::new(items, total, p).map(ManagedStudentDto::from))
    }
}
