use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use log::debug;

use super::model::{
    DashboardGroup, Message, MessageDto, NewMessage, NewQuestion, Question, QuestionDetailDto,
    QuestionDto, non_empty_content,
};
use super::repository::Scope;
use super::{Id, Repository, Status, Viewer, status};
use crate::assignment;
use crate::auth::Caller;
use crate::model::{Page, Pagination};
use crate::user::{self, Role};

#[async_trait]
pub trait ThreadService {
    async fn create(&self, caller: &Caller, title: &str, body: &str) -> super::Result<QuestionDto>;

    async fn list(
        &self,
        caller: &Caller,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<Page<QuestionDto>>;

    async fn get_detail(&self, caller: &Caller, id: &Id) -> super::Result<QuestionDetailDto>;

    async fn reply(&self, caller: &Caller, id: &Id, body: &str) -> super::Result<MessageDto>;

    async fn delete(&self, caller: &Caller, id: &Id) -> super::Result<()>;

    async fn teacher_dashboard(&self, caller: &Caller) -> super::Result<Vec<DashboardGroup>>;
}

#[derive(Clone)]
pub struct ThreadServiceImpl {
    repo: Repository,
    assignment_service: assignment::Service,
    user_service: user::Service,
}

impl ThreadServiceImpl {
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
}

#[async_trait]
impl ThreadService for ThreadServiceImpl {
    async fn create(&self, caller: &Caller, title: &str, body: &str) -> super::Result<QuestionDto> {
        let body = non_empty_content(body)?;
        if title.trim().is_empty() {
            return Err(super::Error::EmptyTitle);
        }
        if !caller.is_student() {
            return Err(super::Error::StudentsOnly);
        }

        let advisor = self.assignment_service.get_advisor_of(&caller.id()).await?;
        let new_question = NewQuestion::new(caller.id(), advisor, title)?;
        let (question, seed) = self.repo.create(&new_question, body)?;

        debug!(
            "Student {} opened question {} for advisor {:?}",
            caller.id(),
            question.id(),
            advisor
        );

        let roles = HashMap::from([(caller.id(), caller.role())]);
        let messages = [MessageDto::new(&seed, &roles)];
        let status = status::derive(&messages, Viewer::of(caller));

        Ok(QuestionDto::new(&question, status))
    }

    async fn list(
        &self,
        caller: &Caller,
        keyword: Option<&str>,
        p: &Pagination,
    ) -> super::Result<Page<QuestionDto>> {
        let scope = match caller.role() {
            Role::Student => Scope::CreatedBy(caller.id()),
            Role::Teacher => Scope::AdvisedBy(caller.id()),
            role => return Err(super::Error::CannotList(role)),
        };

        let (questions, total) = self
            .repo
            .find_page(&scope, crate::model::keyword(keyword), p)?;
        let items = self.with_statuses(&questions, caller).await?;

        Ok(Page::new(items, total, p))
    }

    async fn get_detail(&self, caller: &Caller, id: &Id) -> super::Result<QuestionDetailDto> {
        let question = self.find_participating(caller, id)?;

        let marked = self.repo.mark_read_excluding_sender(id, &caller.id())?;
        if marked > 0 {
            debug!("Marked {marked} message(s) of question {id} read for {}", caller.id());
        }

        let messages = self.repo.list_messages(id)?;
        let roles = self.roles_of(&messages).await?;
        let messages = messages
            .iter()
            .map(|m| MessageDto::new(m, &roles))
            .collect::<Vec<_>>();
        let status = status::derive(&messages, Viewer::of(caller));

        Ok(QuestionDetailDto {
            question: QuestionDto::new(&question, status),
            messages,
        })
    }

    async fn reply(&self, caller: &Caller, id: &Id, body: &str) -> super::Result<MessageDto> {
        let new_message = NewMessage::new(*id, caller.id(), body)?;
        self.find_participating(caller, id)?;

        let message = self.repo.append_message(&new_message)?;
        debug!("{} {} replied to question {id}", caller.role(), caller.id());

        let roles = HashMap::from([(caller.id(), caller.role())]);
        Ok(MessageDto::new(&message, &roles))
    }

    async fn delete(&self, caller: &Caller, id: &Id) -> super::Result<()> {
        let question = self
            .repo
            .find_by_id(id)?
            .ok_or(super::Error::NotFound(*id))?;

        if question.creator_id() != caller.id() {
            return Err(super::Error::NotCreator(*id));
        }

        self.repo.delete(id)?;
        debug!("Deleted question {id}");
        Ok(())
    }

    async fn teacher_dashboard(&self, caller: &Caller) -> super::Result<Vec<DashboardGroup>> {
        if !caller.is_teacher() {
            return Err(super::Error::TeachersOnly);
        }

        let questions = self.repo.find_by_teacher(&caller.id())?;
        let items = self.with_statuses(&questions, caller).await?;

        let creators = questions
            .iter()
            .map(Question::creator_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let students = self.user_service.find_many(&creators).await?;

        let mut groups: Vec<DashboardGroup> = Vec::new();
        for dto in items {
            match groups.last_mut() {
                Some(g) if g.student_id == dto.creator_id => g.questions.push(dto),
                _ => {
                    let student_name = students
                        .get(&dto.creator_id)
                        .map(|u| u.display_name().to_string())
                        .unwrap_or_else(|| dto.creator_id.to_string());

                    groups.push(DashboardGroup {
                        student_id: dto.creator_id,
                        student_name,
                        questions: vec![dto],
                    });
                }
            }
        }

        Ok(groups)
    }
}

impl ThreadServiceImpl {
    fn find_participating(&self, caller: &Caller, id: &Id) -> super::Result<Question> {
        let question = self
            .repo
            .find_by_id(id)?
            .ok_or(super::Error::NotFound(*id))?;

        if !question.is_participant(&caller.id()) {
            return Err(super::Error::NotParticipant(*id));
        }

        Ok(question)
    }

    async fn roles_of(&self, messages: &[Message]) -> super::Result<HashMap<user::Id, Role>> {
        let senders = messages
            .iter()
            .map(Message::sender_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        Ok(self.user_service.find_roles(&senders).await?)
    }

    /// Question DTOs in input order with statuses for `caller`.
    async fn with_statuses(
        &self,
        questions: &[Question],
        caller: &Caller,
    ) -> super::Result<Vec<QuestionDto>> {
        let ids = questions.iter().map(Question::id).collect::<Vec<_>>();
        let messages = self.repo.list_messages_of(&ids)?;
        let roles = self.roles_of(&messages).await?;

        let mut by_question: HashMap<Id, Vec<MessageDto>> = HashMap::new();
        for m in &messages {
            by_question
                .entry(m.question_id())
                .or_default()
                .push(MessageDto::new(m, &roles));
        }

        let viewer = Viewer::of(caller);
        let dtos = questions
            .iter()
            .map(|q| {
                let status = by_question
                    .get(&q.id())
                    .map_or(Status::Unknown, |ms| status::derive(ms, viewer));
                QuestionDto::new(q, status)
            })
            .collect();

        Ok(dtos)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::assignment::repository::SqliteAssignmentRepository;
    use crate::assignment::service::AssignmentServiceImpl;
    use crate::integration::db::tests::{pool, seed_user};
    use crate::thread::Error;
    use crate::thread::repository::SqliteThreadRepository;
    use crate::user::repository::SqliteUserRepository;
    use crate::user::service::UserServiceImpl;

    struct Fixture {
        service: ThreadServiceImpl,
        student: Caller,
        teacher: Caller,
        outsider: Caller,
        admin: Caller,
    }

    async fn fixture() -> Fixture {
        let pool = pool();
        let users: user::Service =
            Arc::new(UserServiceImpl::new(Arc::new(SqliteUserRepository::new(pool.clone()))));
        let assignments: assignment::Service = Arc::new(AssignmentServiceImpl::new(
            Arc::new(SqliteAssignmentRepository::new(pool.clone())),
            users.clone(),
        ));

        let student = Caller::new(seed_user(&pool, "student", Role::Student), Role::Student);
        let teacher = Caller::new(seed_user(&pool, "teacher", Role::Teacher), Role::Teacher);
        let outsider = Caller::new(seed_user(&pool, "outsider", Role::Teacher), Role::Teacher);
        let admin = Caller::new(seed_user(&pool, "admin", Role::Admin), Role::Admin);
        assignments.assign(&teacher, &student.id()).await.unwrap();

        Fixture {
            service: ThreadServiceImpl::new(
                Arc::new(SqliteThreadRepository::new(pool)),
                assignments,
                users,
            ),
            student,
            teacher,
            outsider,
            admin,
        }
    }

    #[tokio::test]
    async fn should_create_question_for_advisor() {
        let f = fixture().await;

        let q = f.service.create(&f.student, "Proposal", "Please review").await.unwrap();

        assert_eq!(q.teacher_id, Some(f.teacher.id()));
        assert_eq!(q.status, Status::AwaitingAnswer);
    }

    #[tokio::test]
    async fn should_validate_before_checking_role() {
        let f = fixture().await;

        assert!(matches!(
            f.service.create(&f.teacher, "  ", "body").await,
            Err(Error::EmptyTitle)
        ));
        assert!(matches!(
            f.service.create(&f.teacher, "title", "").await,
            Err(Error::EmptyContent)
        ));
        assert!(matches!(
            f.service.create(&f.teacher, "title", "body").await,
            Err(Error::StudentsOnly)
        ));
    }

    #[tokio::test]
    async fn should_mark_read_and_derive_status_on_detail() {
        let f = fixture().await;
        let q = f.service.create(&f.student, "Proposal", "Please review").await.unwrap();

        let teacher_view = f.service.get_detail(&f.teacher, &q.id).await.unwrap();
        assert_eq!(teacher_view.question.status, Status::PendingAnswer);
        assert!(teacher_view.messages[0].is_read);
        assert_eq!(teacher_view.messages[0].sender_role, Some(Role::Student));

        f.service.reply(&f.teacher, &q.id, "Looks good").await.unwrap();
        let page = f.service.list(&f.student, None, &Pagination::default()).await.unwrap();
        assert_eq!(page.items[0].status, Status::PendingReview);

        let student_view = f.service.get_detail(&f.student, &q.id).await.unwrap();
        assert_eq!(student_view.question.status, Status::Answered);
        assert!(student_view.messages.iter().all(|m| m.is_read));

        let again = f.service.get_detail(&f.student, &q.id).await.unwrap();
        assert_eq!(again, student_view);
    }

    #[tokio::test]
    async fn should_forbid_non_participants() {
        let f = fixture().await;
        let q = f.service.create(&f.student, "Proposal", "Please review").await.unwrap();

        assert!(matches!(
            f.service.get_detail(&f.outsider, &q.id).await,
            Err(Error::NotParticipant(_))
        ));
        assert!(matches!(
            f.service.reply(&f.outsider, &q.id, "hi").await,
            Err(Error::NotParticipant(_))
        ));
        assert!(matches!(
            f.service.get_detail(&f.admin, &q.id).await,
            Err(Error::NotParticipant(_))
        ));
        assert!(matches!(
            f.service.get_detail(&f.teacher, &Id(404)).await,
            Err(Error::NotFound(Id(404)))
        ));
        assert!(matches!(
            f.service.list(&f.admin, None, &Pagination::default()).await,
            Err(Error::CannotList(Role::Admin))
        ));

        let outsider_page = f.service.list(&f.outsider, None, &Pagination::default()).await.unwrap();
        assert_eq!(outsider_page.total, 0);

        let own = f.service.get_detail(&f.student, &q.id).await.unwrap();
        assert!(!own.messages[0].is_read);
    }

    #[tokio::test]
    async fn should_validate_reply_before_lookup() {
        let f = fixture().await;

        assert!(matches!(
            f.service.reply(&f.teacher, &Id(404), "  ").await,
            Err(Error::EmptyContent)
        ));
        assert!(matches!(
            f.service.reply(&f.teacher, &Id(404), "hi").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_only_let_creator_delete() {
        let f = fixture().await;
        let q = f.service.create(&f.student, "Proposal", "Please review").await.unwrap();

        assert!(matches!(
            f.service.delete(&f.teacher, &q.id).await,
            Err(Error::NotCreator(_))
        ));

        f.service.delete(&f.student, &q.id).await.unwrap();
        assert!(matches!(
            f.service.get_detail(&f.student, &q.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_group_dashboard_by_student() {
        let f = fixture().await;
        let first = f.service.create(&f.student, "First", "one").await.unwrap();
        let second = f.service.create(&f.student, "Second", "two").await.unwrap();

        let groups = f.service.teacher_dashboard(&f.teacher).await.unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].student_name, "student");
        let ids = groups[0].questions.iter().map(|q| q.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(groups[0]
            .questions
            .iter()
            .all(|q| q.status == Status::PendingAnswer));

        assert!(matches!(
            f.service.teacher_dashboard(&f.student).await,
            Err(Error::TeachersOnly)
        ));
    }
}
