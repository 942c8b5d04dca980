use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    chat::{
        event::{UpdateMeetingLink, UpdateSessionLimit},
        ChatSettings,
    },
    id::ChatId,
};
use crate::notify::Subscription;

#[async_trait]
pub trait ChatRepository: Send + Sync {
    // 設定を取得する。ドキュメントが無ければデフォルト値（暗黙の初期化）
    async fn find_settings(&self, chat_id: ChatId) -> AppResult<ChatSettings>;
    async fn find_all_settings(&self) -> AppResult<Vec<ChatSettings>>;
    async fn update_meeting_link(&self, event: UpdateMeetingLink) -> AppResult<()>;
    async fn update_session_limit(&self, event: UpdateSessionLimit) -> AppResult<()>;
    // チャット設定の変更通知を購読する
    fn subscribe(&self) -> Subscription;
}
