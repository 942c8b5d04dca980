use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::id::BookingRequestId;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::{
    extractor::AuthorizedUser,
    model::booking::{
        ApproveResponse, BookingResponse, BookingsResponse, SubmitBookingRequest,
        SubmitBookingRequestWithUser,
    },
};

pub async fn submit_booking(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<SubmitBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    req.validate(&())?;

    let event = SubmitBookingRequestWithUser::new(user.id(), user.role, req).try_into()?;
    registry
        .booking_request_repository()
        .submit(event)
        .await
        .map(BookingResponse::from)
        .map(Json)
}

pub async fn approve_booking(
    user: AuthorizedUser,
    Path(request_id): Path<BookingRequestId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ApproveResponse>> {
    ensure_admin(&user)?;
    registry
        .booking_request_repository()
        .approve(request_id)
        .await
        .map(ApproveResponse::from)
        .map(Json)
}

pub async fn reject_booking(
    user: AuthorizedUser,
    Path(request_id): Path<BookingRequestId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    ensure_admin(&user)?;
    registry
        .booking_request_repository()
        .reject(request_id)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn delete_booking(
    user: AuthorizedUser,
    Path(request_id): Path<BookingRequestId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    ensure_admin(&user)?;
    registry
        .booking_request_repository()
        .delete(request_id)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn show_booking_list(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    ensure_admin(&user)?;
    registry
        .booking_request_repository()
        .find_all()
        .await
        .map(BookingsResponse::from)
        .map(Json)
}

// 承認・却下・削除と全件一覧は管理者のみ
fn ensure_admin(user: &AuthorizedUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::ForbiddenOperation)
    }
}
