use kernel::model::{chat::ChatSettings, id::ChatId};
use serde::{Deserialize, Serialize};

// チャット設定ドキュメント。存在しない場合は Default が暗黙の初期値
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettingsDoc {
    #[serde(default)]
    pub session_limit: i32,
    #[serde(default)]
    pub allow_zoom_link: bool,
    #[serde(default)]
    pub meeting_link: Option<String>,
}

impl ChatSettingsDoc {
    // 残セッション数を 1 減らす。0 で下限クランプし、負にはならない
    pub fn decrement_session_limit(&mut self) -> i32 {
        self.session_limit = (self.session_limit - 1).max(0);
        self.session_limit
    }

    // リンク可視化フラグを立てる。単調で、この処理系が自動で戻すことはない
    pub fn grant_link_visibility(&mut self) {
        self.allow_zoom_link = true;
    }

    pub fn into_settings(self, chat_id: ChatId) -> ChatSettings {
        let ChatSettingsDoc {
            session_limit,
            allow_zoom_link,
            meeting_link,
        } = self;
        ChatSettings {
            chat_id,
            session_limit,
            allow_zoom_link,
            meeting_link,
        }
    }
}
