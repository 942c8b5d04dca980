use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    booking::{event::SubmitBooking, ApprovalOutcome, BookingRequest},
    id::{BookingRequestId, ChatId},
};
use crate::notify::Subscription;

#[async_trait]
pub trait BookingRequestRepository: Send + Sync {
    // 予約リクエストを提出する（前提条件を提出時点で再評価する）
    async fn submit(&self, event: SubmitBooking) -> AppResult<BookingRequest>;
    // 承認する。ステータス更新後の副作用は独立のベストエフォート
    async fn approve(&self, request_id: BookingRequestId) -> AppResult<ApprovalOutcome>;
    // 却下する。スロットにもクレジットにも触れない
    async fn reject(&self, request_id: BookingRequestId) -> AppResult<()>;
    // どのステータスからでも物理削除する
    async fn delete(&self, request_id: BookingRequestId) -> AppResult<()>;
    async fn find_by_id(&self, request_id: BookingRequestId) -> AppResult<Option<BookingRequest>>;
    async fn find_all(&self) -> AppResult<Vec<BookingRequest>>;
    async fn find_by_chat_id(&self, chat_id: ChatId) -> AppResult<Vec<BookingRequest>>;
    // リクエスト集合の変更通知を購読する
    fn subscribe(&self) -> Subscription;
}
