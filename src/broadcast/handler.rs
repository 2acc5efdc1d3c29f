use serde::Deserialize;

use super::model::{InboxItem, SendReceipt};
use super::{Addressing, Id};
use crate::auth::Credential;
use crate::model::{Page, PageParams, Pagination};
use crate::state::AppState;

#[derive(Deserialize, Debug, Clone)]
pub struct SendParams {
    #[serde(flatten)]
    pub addressing: Addressing,
    pub content: String,
}

pub async fn send_broadcast(
    state: &AppState,
    credential: &Credential,
    params: SendParams,
) -> crate::Result<SendReceipt> {
    let caller = state.caller(credential).await?;

    let receipt = state
        .broadcast_service
        .send(&caller, &params.addressing, &params.content)
        .await?;

    Ok(receipt)
}

pub async fn list_inbox(
    state: &AppState,
    credential: &Credential,
    params: PageParams,
) -> crate::Result<Page<InboxItem>> {
    let caller = state.caller(credential).await?;
    let p = Pagination::try_from(params)?;

    Ok(state.broadcast_service.list_inbox(&caller, &p).await?)
}

pub async fn unread_count(state: &AppState, credential: &Credential) -> crate::Result<i64> {
    let caller = state.caller(credential).await?;

    Ok(state.broadcast_service.unread_count(&caller).await?)
}

pub async fn mark_broadcast_read(
    state: &AppState,
    credential: &Credential,
    id: Id,
) -> crate::Result<()> {
    let caller = state.caller(credential).await?;

    Ok(state.broadcast_service.mark_read(&caller, &id).await?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::user;

    #[test]
    fn should_deserialize_send_params() {
        let p: SendParams = serde_json::from_str(
            r#"{"target":"users","user_ids":[4],"content":"Reminder"}"#,
        )
        .unwrap();

        assert_eq!(
            p.addressing,
            Addressing::Users {
                user_ids: vec![user::Id(4)]
            }
        );
        assert_eq!(p.content, "Reminder");
    }
}
