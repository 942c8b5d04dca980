use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    chat::{
        event::{UpdateMeetingLink, UpdateSessionLimit},
        ChatSettings,
    },
    id::ChatId,
};
use kernel::notify::Subscription;
use kernel::repository::chat::ChatRepository;
use shared::error::{AppError, AppResult};

use crate::store::{model::chat::ChatSettingsDoc, DocumentStore, CHATS};

#[derive(new)]
pub struct ChatRepositoryImpl {
    db: DocumentStore,
}

#[async_trait]
impl ChatRepository for ChatRepositoryImpl {
    async fn find_settings(&self, chat_id: ChatId) -> AppResult<ChatSettings> {
        let doc = self
            .db
            .get_as::<ChatSettingsDoc>(CHATS, &chat_id.to_string())
            .await?
            .unwrap_or_default();
        Ok(doc.into_settings(chat_id))
    }

    async fn find_all_settings(&self) -> AppResult<Vec<ChatSettings>> {
        Ok(self
            .db
            .list(CHATS)
            .await?
            .into_iter()
            .filter_map(|(key, value)| {
                let chat_id = key.parse::<ChatId>().ok();
                let doc = serde_json::from_value::<ChatSettingsDoc>(value).ok();
                match (chat_id, doc) {
                    (Some(chat_id), Some(doc)) => Some(doc.into_settings(chat_id)),
                    _ => {
                        // 壊れたドキュメントは一覧から落とすだけでエラーにしない
                        tracing::warn!(chat_id = %key, "skipping unparsable chat settings document");
                        None
                    }
                }
            })
            .collect())
    }

    async fn update_meeting_link(&self, event: UpdateMeetingLink) -> AppResult<()> {
        let key = event.chat_id.to_string();
        let mut doc = self
            .db
            .get_as::<ChatSettingsDoc>(CHATS, &key)
            .await?
            .unwrap_or_default();
        // 空白のみのリンクは未設定として扱う
        doc.meeting_link = Some(event.meeting_link).filter(|link| !link.trim().is_empty());
        self.db.put_as(CHATS, &key, &doc).await
    }

    async fn update_session_limit(&self, event: UpdateSessionLimit) -> AppResult<()> {
        if event.session_limit < 0 {
            return Err(AppError::UnprocessableEntity(format!(
                "残セッション数（{}）は 0 以上である必要があります。",
                event.session_limit
            )));
        }
        let key = event.chat_id.to_string();
        let mut doc = self
            .db
            .get_as::<ChatSettingsDoc>(CHATS, &key)
            .await?
            .unwrap_or_default();
        doc.session_limit = event.session_limit;
        self.db.put_as(CHATS, &key, &doc).await
    }

    fn subscribe(&self) -> Subscription {
        self.db.subscribe(CHATS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_document_reads_as_defaults() -> anyhow::Result<()> {
        let repo = ChatRepositoryImpl::new(DocumentStore::new(8));
        let chat_id = ChatId::new();

        let settings = repo.find_settings(chat_id).await?;
        assert_eq!(settings, ChatSettings::defaulted(chat_id));
        Ok(())
    }

    #[tokio::test]
    async fn meeting_link_and_limit_edits_persist() -> anyhow::Result<()> {
        let repo = ChatRepositoryImpl::new(DocumentStore::new(8));
        let chat_id = ChatId::new();

        repo.update_meeting_link(UpdateMeetingLink::new(
            chat_id,
            "https://zoom.example/j/42".into(),
        ))
        .await?;
        repo.update_session_limit(UpdateSessionLimit::new(chat_id, 3)).await?;

        let settings = repo.find_settings(chat_id).await?;
        assert_eq!(settings.meeting_link.as_deref(), Some("https://zoom.example/j/42"));
        assert_eq!(settings.session_limit, 3);
        assert!(!settings.allow_zoom_link);

        let err = repo
            .update_session_limit(UpdateSessionLimit::new(chat_id, -1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        Ok(())
    }

    #[tokio::test]
    async fn blank_link_is_stored_as_unset() -> anyhow::Result<()> {
        let repo = ChatRepositoryImpl::new(DocumentStore::new(8));
        let chat_id = ChatId::new();

        repo.update_meeting_link(UpdateMeetingLink::new(chat_id, "   ".into()))
            .await?;
        let settings = repo.find_settings(chat_id).await?;
        assert!(!settings.has_meeting_link());
        Ok(())
    }
}
