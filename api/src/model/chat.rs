use garde::Validate;
use kernel::model::{chat::ChatSettings, id::ChatId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettingsResponse {
    pub chat_id: ChatId,
    pub session_limit: i32,
    pub allow_zoom_link: bool,
    pub meeting_link: Option<String>,
}

impl From<ChatSettings> for ChatSettingsResponse {
    fn from(value: ChatSettings) -> Self {
        let ChatSettings {
            chat_id,
            session_limit,
            allow_zoom_link,
            meeting_link,
        } = value;
        Self {
            chat_id,
            session_limit,
            allow_zoom_link,
            meeting_link,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingLinkRequest {
    #[garde(length(min = 1))]
    pub meeting_link: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionLimitRequest {
    #[garde(range(min = 0))]
    pub session_limit: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLinkResponse {
    pub visible: bool,
    pub meeting_link: Option<String>,
    pub phase: Option<String>,
}
