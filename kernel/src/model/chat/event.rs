use derive_new::new;

use crate::model::id::ChatId;

#[derive(new, Debug)]
pub struct UpdateMeetingLink {
    pub chat_id: ChatId,
    pub meeting_link: String,
}

#[derive(new, Debug)]
pub struct UpdateSessionLimit {
    pub chat_id: ChatId,
    pub session_limit: i32,
}
