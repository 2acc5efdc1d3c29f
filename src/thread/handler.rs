use serde::Deserialize;

use super::Id;
use super::model::{DashboardGroup, MessageDto, QuestionDetailDto, QuestionDto};
use crate::auth::Credential;
use crate::model::{Page, PageParams, Pagination};
use crate::state::AppState;

#[derive(Deserialize, Debug, Clone)]
pub struct CreateParams {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListParams {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ReplyParams {
    pub content: String,
}

pub async fn create_thread(
    state: &AppState,
    credential: &Credential,
    params: CreateParams,
) -> crate::Result<QuestionDto> {
    let caller = state.caller(credential).await?;

    let q = state
        .thread_service
        .create(&caller, &params.title, &params.content)
        .await?;

    Ok(q)
}

pub async fn list_threads(
    state: &AppState,
    credential: &Credential,
    params: ListParams,
) -> crate::Result<Page<QuestionDto>> {
    let caller = state.caller(credential).await?;
    let p = Pagination::try_from(params.page)?;

    let page = state
        .thread_service
        .list(&caller, params.keyword.as_deref(), &p)
        .await?;

    Ok(page)
}

pub async fn get_thread_detail(
    state: &AppState,
    credential: &Credential,
    id: Id,
) -> crate::Result<QuestionDetailDto> {
    let caller = state.caller(credential).await?;

    Ok(state.thread_service.get_detail(&caller, &id).await?)
}

pub async fn reply_to_thread(
    state: &AppState,
    credential: &Credential,
    id: Id,
    params: ReplyParams,
) -> crate::Result<MessageDto> {
    let caller = state.caller(credential).await?;

    Ok(state
        .thread_service
        .reply(&caller, &id, &params.content)
        .await?)
}

pub async fn delete_thread(state: &AppState, credential: &Credential, id: Id) -> crate::Result<()> {
    let caller = state.caller(credential).await?;

    Ok(state.thread_service.delete(&caller, &id).await?)
}

pub async fn teacher_dashboard(
    state: &AppState,
    credential: &Credential,
) -> crate::Result<Vec<DashboardGroup>> {
    let caller = state.caller(credential).await?;

    Ok(state.thread_service.teacher_dashboard(&caller).await?)
}
