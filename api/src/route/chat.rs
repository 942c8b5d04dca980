use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::chat::{
    show_chat_bookings, show_chat_settings, show_session_link, update_meeting_link,
    update_session_limit,
};

pub fn build_chat_routers() -> Router<AppRegistry> {
    let chat_routers = Router::new()
        .route("/:chat_id/settings", get(show_chat_settings))
        .route("/:chat_id/meeting-link", put(update_meeting_link))
        .route("/:chat_id/session-limit", put(update_session_limit))
        .route("/:chat_id/session-link", get(show_session_link))
        .route("/:chat_id/bookings", get(show_chat_bookings));

    Router::new().nest("/chats", chat_routers)
}
