use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{
    id::{SlotId, TeacherId},
    slot::event::ClearSlot,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::{
    extractor::AuthorizedUser,
    model::slot::{
        parse_date, AvailabilityQuery, SaveSlotRequest, SaveSlotRequestWithTeacherId,
        SlotsResponse,
    },
};

pub async fn save_slot(
    user: AuthorizedUser,
    Path(teacher_id): Path<TeacherId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<SaveSlotRequest>,
) -> AppResult<Json<SlotsResponse>> {
    req.validate(&())?;
    ensure_owner_or_admin(&user, teacher_id)?;

    if req.is_recurring {
        let event = SaveSlotRequestWithTeacherId::new(teacher_id, req).try_into()?;
        registry
            .slot_repository()
            .expand_recurring(event)
            .await
            .map(SlotsResponse::from)
            .map(Json)
    } else {
        let event = SaveSlotRequestWithTeacherId::new(teacher_id, req).try_into()?;
        registry
            .slot_repository()
            .save(event)
            .await
            .map(|slot| SlotsResponse::from(vec![slot]))
            .map(Json)
    }
}

pub async fn clear_slot(
    user: AuthorizedUser,
    Path((teacher_id, slot_id)): Path<(TeacherId, SlotId)>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    ensure_owner_or_admin(&user, teacher_id)?;
    registry
        .slot_repository()
        .clear(ClearSlot::new(teacher_id, slot_id))
        .await
        .map(|_| StatusCode::OK)
}

pub async fn show_slot_list(
    _user: AuthorizedUser,
    Path(teacher_id): Path<TeacherId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SlotsResponse>> {
    registry
        .slot_repository()
        .find_by_owner(teacher_id)
        .await
        .map(SlotsResponse::from)
        .map(Json)
}

pub async fn show_available_slots(
    _user: AuthorizedUser,
    Path(teacher_id): Path<TeacherId>,
    Query(query): Query<AvailabilityQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SlotsResponse>> {
    query.validate(&())?;

    let date = parse_date(&query.date)?;
    registry
        .slot_repository()
        .available_slots_for(teacher_id, date)
        .await
        .map(SlotsResponse::from)
        .map(Json)
}

// スロットを編集できるのは保持する講師本人と管理者のみ
fn ensure_owner_or_admin(user: &AuthorizedUser, teacher_id: TeacherId) -> AppResult<()> {
    if user.is_admin() || user.id().raw() == teacher_id.raw() {
        Ok(())
    } else {
        Err(AppError::ForbiddenOperation)
    }
}
