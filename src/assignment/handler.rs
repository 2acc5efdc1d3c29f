use serde::Deserialize;

use super::model::{Assignment, ManagedStudentDto};
use crate::auth::Credential;
use crate::model::{Page, PageParams, Pagination};
use crate::state::AppState;
use crate::user;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ManagedParams {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

pub async fn assign_student(
    state: &AppState,
    credential: &Credential,
    student: user::Id,
) -> crate::Result<Assignment> {
    let caller = state.caller(credential).await?;

    Ok(state.assignment_service.assign(&caller, &student).await?)
}

pub async fn unassign_student(
    state: &AppState,
    credential: &Credential,
    student: user::Id,
) -> crate::Result<()> {
    let caller = state.caller(credential).await?;

    Ok(state.assignment_service.unassign(&caller, &student).await?)
}

pub async fn list_managed_students(
    state: &AppState,
    credential: &Credential,
    params: ManagedParams,
) -> crate::Result<Page<ManagedStudentDto>> {
    let caller = state.caller(credential).await?;
    let p = Pagination::try_from(params.page)?;

    let page = state
        .assignment_service
        .list_managed(&caller, params.keyword.as_deref(), &p)
        .await?;

    Ok(page)
}
