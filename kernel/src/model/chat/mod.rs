use crate::model::id::ChatId;

pub mod event;

// チャット（生徒と講師のペア）単位の残セッション数とリンク可視化の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub chat_id: ChatId,
    pub session_limit: i32,
    pub allow_zoom_link: bool,
    pub meeting_link: Option<String>,
}

impl ChatSettings {
    // ドキュメントが存在しない場合の暗黙デフォルト（初回読み取り時）
    pub fn defaulted(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            session_limit: 0,
            allow_zoom_link: false,
            meeting_link: None,
        }
    }

    pub fn has_meeting_link(&self) -> bool {
        self.meeting_link
            .as_deref()
            .is_some_and(|link| !link.trim().is_empty())
    }
}
