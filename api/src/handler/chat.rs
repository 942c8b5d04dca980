use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use garde::Validate;
use kernel::model::{
    chat::event::{UpdateMeetingLink, UpdateSessionLimit},
    id::ChatId,
    session::{active_window_phase, should_show_link},
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::{
    extractor::AuthorizedUser,
    model::{
        booking::BookingsResponse,
        chat::{
            ChatSettingsResponse, SessionLinkResponse, UpdateMeetingLinkRequest,
            UpdateSessionLimitRequest,
        },
    },
};

pub async fn show_chat_settings(
    _user: AuthorizedUser,
    Path(chat_id): Path<ChatId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ChatSettingsResponse>> {
    registry
        .chat_repository()
        .find_settings(chat_id)
        .await
        .map(ChatSettingsResponse::from)
        .map(Json)
}

pub async fn update_meeting_link(
    user: AuthorizedUser,
    Path(chat_id): Path<ChatId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateMeetingLinkRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;
    // リンクの設定は管理者か講師が行う
    if !(user.is_admin() || user.is_teacher()) {
        return Err(AppError::ForbiddenOperation);
    }
    registry
        .chat_repository()
        .update_meeting_link(UpdateMeetingLink::new(chat_id, req.meeting_link))
        .await
        .map(|_| StatusCode::OK)
}

pub async fn update_session_limit(
    user: AuthorizedUser,
    Path(chat_id): Path<ChatId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateSessionLimitRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    registry
        .chat_repository()
        .update_session_limit(UpdateSessionLimit::new(chat_id, req.session_limit))
        .await
        .map(|_| StatusCode::OK)
}

// 「いま」リンクを表示すべきかをオンデマンドで導出する。
// クライアント側は 30 秒周期の再取得と変更通知で追従する
pub async fn show_session_link(
    _user: AuthorizedUser,
    Path(chat_id): Path<ChatId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SessionLinkResponse>> {
    let settings = registry.chat_repository().find_settings(chat_id).await?;
    let requests = registry
        .booking_request_repository()
        .find_by_chat_id(chat_id)
        .await?;

    let now = Local::now().naive_local();
    let visible = should_show_link(&settings, &requests, now);
    let phase = active_window_phase(&requests, now).map(|p| p.as_ref().to_string());

    Ok(Json(SessionLinkResponse {
        visible,
        meeting_link: visible.then_some(settings.meeting_link).flatten(),
        phase,
    }))
}

pub async fn show_chat_bookings(
    _user: AuthorizedUser,
    Path(chat_id): Path<ChatId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    registry
        .booking_request_repository()
        .find_by_chat_id(chat_id)
        .await
        .map(BookingsResponse::from)
        .map(Json)
}
