use async_trait::async_trait;
use chrono::NaiveDate;
use shared::error::AppResult;

use crate::model::{
    id::TeacherId,
    slot::{
        event::{ClearSlot, SaveRecurringSlots, SaveSlot},
        Slot,
    },
};
use crate::notify::Subscription;

#[async_trait]
pub trait SlotRepository: Send + Sync {
    // スロットを保存する（同一 (講師, ID) があれば上書き）
    async fn save(&self, event: SaveSlot) -> AppResult<Slot>;
    // 繰り返しルールを具体的なスロット列へ展開して保存する
    async fn expand_recurring(&self, event: SaveRecurringSlots) -> AppResult<Vec<Slot>>;
    // スロットを削除する。存在しない場合は no-op
    async fn clear(&self, event: ClearSlot) -> AppResult<()>;
    // 講師の全スロットを取得する
    async fn find_by_owner(&self, teacher_id: TeacherId) -> AppResult<Vec<Slot>>;
    // 指定日の予約可能スロットを開始時刻昇順で取得する
    async fn available_slots_for(&self, teacher_id: TeacherId, date: NaiveDate)
        -> AppResult<Vec<Slot>>;
    // スロット集合の変更通知を購読する
    fn subscribe(&self) -> Subscription;
}
