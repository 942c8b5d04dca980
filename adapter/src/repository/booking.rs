use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use derive_new::new;
use kernel::model::{
    booking::{event::SubmitBooking, ApprovalOutcome, BookingRequest, BookingStatus},
    id::{BookingRequestId, ChatId, TeacherId},
    slot::{filter_available, Slot},
};
use kernel::notify::Subscription;
use kernel::repository::booking::BookingRequestRepository;
use shared::error::{AppError, AppResult};

use crate::store::{
    model::{
        booking::{slot_limit_key, BookingRequestDoc, SlotLimitDoc},
        chat::ChatSettingsDoc,
        slot::TeacherSlotsDoc,
        student::StudentDoc,
    },
    DocumentStore, BOOKING_REQUESTS, CHATS, SLOT_LIMITS, STUDENTS, TEACHER_SLOTS,
};

#[derive(new)]
pub struct BookingRequestRepositoryImpl {
    db: DocumentStore,
}

#[async_trait]
impl BookingRequestRepository for BookingRequestRepositoryImpl {
    // 予約リクエストの提出。前提条件は順に評価し、最初の失敗で打ち切る
    async fn submit(&self, event: SubmitBooking) -> AppResult<BookingRequest> {
        let SubmitBooking {
            chat_id,
            slot_id,
            teacher_id,
            course_id,
            course_name,
            date,
            requested_by,
            requested_by_role,
        } = event;

        // ① 提出時点でまだ予約可能なスロットか（古いクライアント表示は信用しない）
        let now = Local::now().naive_local();
        let available = self.load_available(teacher_id, date, now).await?;
        let Some(slot) = available.into_iter().find(|s| s.id == slot_id) else {
            return Err(AppError::SlotExpired(format!(
                "スロット（{slot_id}）は予約できなくなっています。"
            )));
        };

        // ② (コース, スロット) に申請数上限が設定されていれば超えないこと
        let limit_key = slot_limit_key(&course_id, &slot_id);
        if let Some(limit_doc) = self
            .db
            .get_as::<SlotLimitDoc>(SLOT_LIMITS, &limit_key)
            .await?
        {
            let slot_key = slot_id.to_string();
            let course_key = course_id.to_string();
            let existing = self
                .db
                .list(BOOKING_REQUESTS)
                .await?
                .into_iter()
                .filter_map(|(_, value)| serde_json::from_value::<BookingRequestDoc>(value).ok())
                .filter(|doc| doc.slot_id == slot_key && doc.course_id == course_key)
                .count();
            if existing as u32 >= limit_doc.limit {
                return Err(AppError::SlotLimitReached(format!(
                    "スロット（{slot_id}）の申請数が上限（{}）に達しています。",
                    limit_doc.limit
                )));
            }
        }

        // 在籍情報のスナップショット。提出時点の値を写し取り、以後更新しない
        let student = self
            .db
            .get_as::<StudentDoc>(STUDENTS, &requested_by.to_string())
            .await?
            .unwrap_or_default();

        let request = BookingRequest {
            id: BookingRequestId::new(),
            chat_id,
            slot_id,
            teacher_id,
            course_id,
            course_name,
            date,
            time: slot.time_range_label(),
            requested_by,
            requested_by_role,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
            student_name: student.name,
            student_email: student.email,
            payment_status_at_request: student.payment_status,
        };

        // 上の検査とこの書き込みの間を直列化するロックは無い。
        // 同じスロットに複数の pending が並ぶ余地は仕様どおり残している
        self.db
            .put_as(
                BOOKING_REQUESTS,
                &request.id.to_string(),
                &BookingRequestDoc::from(&request),
            )
            .await?;

        Ok(request)
    }

    // 承認。ステータス更新に成功したら、クレジット減算とスロット削除を
    // それぞれ独立のベストエフォートで実行する（ロールバックしない）
    async fn approve(&self, request_id: BookingRequestId) -> AppResult<ApprovalOutcome> {
        let key = request_id.to_string();
        let Some(mut doc) = self
            .db
            .get_as::<BookingRequestDoc>(BOOKING_REQUESTS, &key)
            .await?
        else {
            return Err(AppError::EntityNotFound(format!(
                "リクエスト（{request_id}）が見つかりませんでした。"
            )));
        };
        if doc.status != BookingStatus::Pending {
            return Err(AppError::UnprocessableEntity(format!(
                "リクエスト（{request_id}）は {} のため承認できません。",
                doc.status.as_ref()
            )));
        }

        // ① ステータスを承認済みへ。ここで失敗したら全体を失敗とする
        doc.status = BookingStatus::Approved;
        doc.approved_at = Some(Utc::now());
        self.db.put_as(BOOKING_REQUESTS, &key, &doc).await?;

        // ② チャットのクレジットを減算し、リンク可視化フラグを立てる
        let credit_update_failed = match self.apply_approval_credit(&doc.chat_id).await {
            Ok(remaining) => {
                tracing::info!(chat_id = %doc.chat_id, remaining, "session credit decremented");
                false
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    chat_id = %doc.chat_id,
                    "credit update failed after approval"
                );
                true
            }
        };

        // ③ 消費されたスロットをストアから削除する（0 件や複数件でもエラーにしない）
        let slot_cleanup_failed = match self.cleanup_consumed_slot(&doc).await {
            Ok(removed) => {
                tracing::info!(
                    slot_id = %doc.slot_id,
                    teacher_id = %doc.teacher_id,
                    removed,
                    "consumed slot removed from store"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    slot_id = %doc.slot_id,
                    "slot cleanup failed after approval"
                );
                true
            }
        };

        Ok(ApprovalOutcome::from_flags(
            credit_update_failed,
            slot_cleanup_failed,
        ))
    }

    // 却下。スロットにもクレジットにも触れない
    async fn reject(&self, request_id: BookingRequestId) -> AppResult<()> {
        let key = request_id.to_string();
        let Some(mut doc) = self
            .db
            .get_as::<BookingRequestDoc>(BOOKING_REQUESTS, &key)
            .await?
        else {
            return Err(AppError::EntityNotFound(format!(
                "リクエスト（{request_id}）が見つかりませんでした。"
            )));
        };
        if doc.status != BookingStatus::Pending {
            return Err(AppError::UnprocessableEntity(format!(
                "リクエスト（{request_id}）は {} のため却下できません。",
                doc.status.as_ref()
            )));
        }

        doc.status = BookingStatus::Rejected;
        doc.rejected_at = Some(Utc::now());
        self.db.put_as(BOOKING_REQUESTS, &key, &doc).await
    }

    // どのステータスからでも物理削除。消費済みスロットは復活しない
    async fn delete(&self, request_id: BookingRequestId) -> AppResult<()> {
        self.db
            .delete(BOOKING_REQUESTS, &request_id.to_string())
            .await
            .map(|_| ())
    }

    async fn find_by_id(&self, request_id: BookingRequestId) -> AppResult<Option<BookingRequest>> {
        match self
            .db
            .get_as::<BookingRequestDoc>(BOOKING_REQUESTS, &request_id.to_string())
            .await?
        {
            None => Ok(None),
            Some(doc) => Ok(Some(doc.try_into()?)),
        }
    }

    async fn find_all(&self) -> AppResult<Vec<BookingRequest>> {
        let mut requests = self.load_all().await?;
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn find_by_chat_id(&self, chat_id: ChatId) -> AppResult<Vec<BookingRequest>> {
        let mut requests = self.load_all().await?;
        requests.retain(|r| r.chat_id == chat_id);
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    fn subscribe(&self) -> Subscription {
        self.db.subscribe(BOOKING_REQUESTS)
    }
}

impl BookingRequestRepositoryImpl {
    async fn load_available(
        &self,
        teacher_id: TeacherId,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> AppResult<Vec<Slot>> {
        let Some(doc) = self
            .db
            .get_as::<TeacherSlotsDoc>(TEACHER_SLOTS, &teacher_id.to_string())
            .await?
        else {
            return Ok(Vec::new());
        };
        let slots: Vec<Slot> = doc
            .slots
            .into_values()
            .filter_map(|slot_doc| slot_doc.into_slot(teacher_id))
            .collect();
        Ok(filter_available(&slots, date, now))
    }

    async fn apply_approval_credit(&self, chat_id: &str) -> AppResult<i32> {
        let mut chat = self
            .db
            .get_as::<ChatSettingsDoc>(CHATS, chat_id)
            .await?
            .unwrap_or_default();
        chat.grant_link_visibility();
        let remaining = chat.decrement_session_limit();
        self.db.put_as(CHATS, chat_id, &chat).await?;
        Ok(remaining)
    }

    async fn cleanup_consumed_slot(&self, doc: &BookingRequestDoc) -> AppResult<usize> {
        let Some(mut slots) = self
            .db
            .get_as::<TeacherSlotsDoc>(TEACHER_SLOTS, &doc.teacher_id)
            .await?
        else {
            return Ok(0);
        };
        let before = slots.slots.len();
        slots.slots.retain(|id, _| id != &doc.slot_id);
        let removed = before - slots.slots.len();
        if removed == 0 {
            return Ok(0);
        }
        slots.slot_ids.retain(|id| id != &doc.slot_id);
        self.db.put_as(TEACHER_SLOTS, &doc.teacher_id, &slots).await?;
        Ok(removed)
    }

    async fn load_all(&self) -> AppResult<Vec<BookingRequest>> {
        Ok(self
            .db
            .list(BOOKING_REQUESTS)
            .await?
            .into_iter()
            .filter_map(|(key, value)| {
                let parsed = serde_json::from_value::<BookingRequestDoc>(value)
                    .ok()
                    .and_then(|doc| BookingRequest::try_from(doc).ok());
                if parsed.is_none() {
                    // 壊れたドキュメントは一覧から落とすだけでエラーにしない
                    tracing::warn!(request_id = %key, "skipping unparsable booking request document");
                }
                parsed
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::slot::SlotRepositoryImpl;
    use kernel::model::{
        id::{CourseId, SlotId, UserId},
        role::Role,
        slot::event::SaveSlot,
        time::TimeOfDay,
    };
    use kernel::repository::slot::SlotRepository;
    use serde_json::json;

    struct Fixture {
        store: DocumentStore,
        slots: SlotRepositoryImpl,
        bookings: BookingRequestRepositoryImpl,
        teacher: TeacherId,
        chat: ChatId,
        course: CourseId,
        student: UserId,
    }

    fn t(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    async fn fixture(session_limit: i32) -> anyhow::Result<Fixture> {
        let store = DocumentStore::new(16);
        let slots = SlotRepositoryImpl::new(store.clone());
        let bookings = BookingRequestRepositoryImpl::new(store.clone());
        let (teacher, chat, course, student) =
            (TeacherId::new(), ChatId::new(), CourseId::new(), UserId::new());

        store
            .put(
                CHATS,
                &chat.to_string(),
                json!({ "sessionLimit": session_limit, "allowZoomLink": false }),
            )
            .await?;
        store
            .put(
                STUDENTS,
                &student.to_string(),
                json!({
                    "name": "Hanako Yamada",
                    "email": "hanako@example.com",
                    "paymentStatus": "paid"
                }),
            )
            .await?;
        slots
            .save(SaveSlot::new(
                teacher,
                SlotId::new(1),
                d(2024, 6, 10),
                t(10, 0),
                t(11, 0),
            ))
            .await?;

        Ok(Fixture {
            store,
            slots,
            bookings,
            teacher,
            chat,
            course,
            student,
        })
    }

    fn submit_event(f: &Fixture) -> SubmitBooking {
        SubmitBooking::new(
            f.chat,
            SlotId::new(1),
            f.teacher,
            f.course,
            "Algebra".into(),
            d(2024, 6, 10),
            f.student,
            Role::Student,
        )
    }

    async fn chat_doc(f: &Fixture) -> anyhow::Result<ChatSettingsDoc> {
        Ok(f.store
            .get_as::<ChatSettingsDoc>(CHATS, &f.chat.to_string())
            .await?
            .unwrap())
    }

    #[tokio::test]
    async fn approval_consumes_slot_and_decrements_credit() -> anyhow::Result<()> {
        let f = fixture(1).await?;

        let request = f.bookings.submit(submit_event(&f)).await?;
        assert_eq!(request.status, BookingStatus::Pending);
        assert_eq!(request.time, "10:00 AM - 11:00 AM");
        assert_eq!(request.student_name, "Hanako Yamada");

        let outcome = f.bookings.approve(request.id).await?;
        assert_eq!(outcome, ApprovalOutcome::FullySucceeded);

        let chat = chat_doc(&f).await?;
        assert_eq!(chat.session_limit, 0);
        assert!(chat.allow_zoom_link);

        // 消費されたスロットは以後の可用性クエリに現れない
        let available = f.slots.available_slots_for(f.teacher, d(2024, 6, 10)).await?;
        assert!(available.iter().all(|s| s.id != SlotId::new(1)));

        let approved = f.bookings.find_by_id(request.id).await?.unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);
        assert!(approved.approved_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn approval_at_zero_credit_still_succeeds() -> anyhow::Result<()> {
        // 承認に残クレジットの前提条件は無い。0 のままの減算は no-op
        let f = fixture(0).await?;
        let request = f.bookings.submit(submit_event(&f)).await?;

        let outcome = f.bookings.approve(request.id).await?;
        assert_eq!(outcome, ApprovalOutcome::FullySucceeded);

        let chat = chat_doc(&f).await?;
        assert_eq!(chat.session_limit, 0);
        assert!(chat.allow_zoom_link);
        Ok(())
    }

    #[tokio::test]
    async fn submit_fails_when_slot_no_longer_available() -> anyhow::Result<()> {
        let f = fixture(1).await?;
        let first = f.bookings.submit(submit_event(&f)).await?;
        f.bookings.approve(first.id).await?;

        // 承認でスロットが消えた後の提出は SlotExpired
        let err = f.bookings.submit(submit_event(&f)).await.unwrap_err();
        assert!(matches!(err, AppError::SlotExpired(_)));
        Ok(())
    }

    #[tokio::test]
    async fn two_submits_for_same_slot_both_pend() -> anyhow::Result<()> {
        // 検査と書き込みの間を直列化しない現行挙動の固定。
        // 同じスロットに pending が 2 件並びうる
        let f = fixture(2).await?;
        let other_student = UserId::new();

        let first = f.bookings.submit(submit_event(&f)).await?;
        let mut second_event = submit_event(&f);
        second_event.requested_by = other_student;
        let second = f.bookings.submit(second_event).await?;

        assert_eq!(first.status, BookingStatus::Pending);
        assert_eq!(second.status, BookingStatus::Pending);
        assert_eq!(first.slot_id, second.slot_id);
        assert_eq!(f.bookings.find_all().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn slot_limit_document_caps_submissions() -> anyhow::Result<()> {
        let f = fixture(2).await?;
        f.store
            .put(
                SLOT_LIMITS,
                &slot_limit_key(&f.course, &SlotId::new(1)),
                json!({ "limit": 1 }),
            )
            .await?;

        f.bookings.submit(submit_event(&f)).await?;
        let err = f.bookings.submit(submit_event(&f)).await.unwrap_err();
        assert!(matches!(err, AppError::SlotLimitReached(_)));
        Ok(())
    }

    #[tokio::test]
    async fn rejection_touches_neither_slots_nor_credit() -> anyhow::Result<()> {
        let f = fixture(1).await?;
        let request = f.bookings.submit(submit_event(&f)).await?;

        f.bookings.reject(request.id).await?;

        let rejected = f.bookings.find_by_id(request.id).await?.unwrap();
        assert_eq!(rejected.status, BookingStatus::Rejected);
        assert!(rejected.rejected_at.is_some());

        let chat = chat_doc(&f).await?;
        assert_eq!(chat.session_limit, 1);
        assert!(!chat.allow_zoom_link);
        let available = f.slots.available_slots_for(f.teacher, d(2024, 6, 10)).await?;
        assert_eq!(available.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn terminal_statuses_cannot_transition_again() -> anyhow::Result<()> {
        let f = fixture(3).await?;
        let request = f.bookings.submit(submit_event(&f)).await?;
        f.bookings.approve(request.id).await?;

        // 二重承認は弾かれ、クレジットが二重に減ることはない
        let err = f.bookings.approve(request.id).await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        let err = f.bookings.reject(request.id).await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));

        let chat = chat_doc(&f).await?;
        assert_eq!(chat.session_limit, 2);
        Ok(())
    }

    #[tokio::test]
    async fn visibility_flag_survives_reject_and_delete() -> anyhow::Result<()> {
        let f = fixture(2).await?;
        let first = f.bookings.submit(submit_event(&f)).await?;
        let mut second_event = submit_event(&f);
        second_event.requested_by = UserId::new();
        let second = f.bookings.submit(second_event).await?;

        f.bookings.approve(first.id).await?;
        assert!(chat_doc(&f).await?.allow_zoom_link);

        f.bookings.reject(second.id).await?;
        f.bookings.delete(first.id).await?;
        f.bookings.delete(second.id).await?;

        // 却下や削除でフラグが自動で戻ることはない
        assert!(chat_doc(&f).await?.allow_zoom_link);
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_valid_from_any_status_and_idempotent() -> anyhow::Result<()> {
        let f = fixture(1).await?;
        let request = f.bookings.submit(submit_event(&f)).await?;
        f.bookings.approve(request.id).await?;

        f.bookings.delete(request.id).await?;
        assert!(f.bookings.find_by_id(request.id).await?.is_none());
        // 既に無いリクエストの削除も成功扱い
        f.bookings.delete(request.id).await?;

        // 削除しても消費済みスロットは復活しない
        let available = f.slots.available_slots_for(f.teacher, d(2024, 6, 10)).await?;
        assert!(available.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn slot_cleanup_failure_leaves_request_approved() -> anyhow::Result<()> {
        let f = fixture(1).await?;
        let request = f.bookings.submit(submit_event(&f)).await?;

        f.store.fail_writes_to(TEACHER_SLOTS);
        let outcome = f.bookings.approve(request.id).await?;
        assert_eq!(
            outcome,
            ApprovalOutcome::PartiallySucceeded {
                credit_update_failed: false,
                slot_cleanup_failed: true,
            }
        );

        // リクエストは承認のまま。スロットは残留する（既知の整合性ギャップ）
        let approved = f.bookings.find_by_id(request.id).await?.unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);
        f.store.restore_writes_to(TEACHER_SLOTS);
        let available = f.slots.available_slots_for(f.teacher, d(2024, 6, 10)).await?;
        assert_eq!(available.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn credit_failure_is_reported_without_rolling_back_status() -> anyhow::Result<()> {
        let f = fixture(1).await?;
        let request = f.bookings.submit(submit_event(&f)).await?;

        f.store.fail_writes_to(CHATS);
        let outcome = f.bookings.approve(request.id).await?;
        assert_eq!(
            outcome,
            ApprovalOutcome::PartiallySucceeded {
                credit_update_failed: true,
                slot_cleanup_failed: false,
            }
        );

        let approved = f.bookings.find_by_id(request.id).await?.unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);
        f.store.restore_writes_to(CHATS);
        assert_eq!(chat_doc(&f).await?.session_limit, 1);
        Ok(())
    }

    #[tokio::test]
    async fn snapshot_defaults_when_student_profile_is_missing() -> anyhow::Result<()> {
        let f = fixture(1).await?;
        let mut event = submit_event(&f);
        event.requested_by = UserId::new();

        let request = f.bookings.submit(event).await?;
        assert_eq!(request.student_name, "");
        assert_eq!(request.student_email, "");
        assert_eq!(
            request.payment_status_at_request,
            kernel::model::booking::PaymentStatus::Unknown
        );
        Ok(())
    }
}
