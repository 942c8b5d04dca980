use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use derive_new::new;
use kernel::model::{
    id::TeacherId,
    slot::{
        event::{ClearSlot, SaveRecurringSlots, SaveSlot},
        filter_available, Slot,
    },
};
use kernel::notify::Subscription;
use kernel::repository::slot::SlotRepository;
use shared::error::{AppError, AppResult};

use crate::store::{
    model::slot::{SlotDoc, TeacherSlotsDoc},
    DocumentStore, TEACHER_SLOTS,
};

#[derive(new)]
pub struct SlotRepositoryImpl {
    db: DocumentStore,
}

#[async_trait]
impl SlotRepository for SlotRepositoryImpl {
    async fn save(&self, event: SaveSlot) -> AppResult<Slot> {
        let SaveSlot {
            owner,
            id,
            date,
            start,
            end,
        } = event;
        if start >= end {
            return Err(AppError::UnprocessableEntity(format!(
                "開始時刻（{start}）は終了時刻（{end}）より前である必要があります。"
            )));
        }

        let slot = Slot {
            id,
            owner,
            date,
            start,
            end,
            is_recurring: false,
            recurring_group_id: None,
        };

        let key = owner.to_string();
        let mut doc: TeacherSlotsDoc = self
            .db
            .get_as(TEACHER_SLOTS, &key)
            .await?
            .unwrap_or_default();
        let slot_key = slot.id.to_string();
        // 新規挿入時のみ ID リストへ追加する（上書きはリストの構成を変えない）
        if !doc.slots.contains_key(&slot_key) {
            doc.slot_ids.push(slot_key.clone());
        }
        doc.slots.insert(slot_key, SlotDoc::from(&slot));
        self.db.put_as(TEACHER_SLOTS, &key, &doc).await?;

        Ok(slot)
    }

    async fn expand_recurring(&self, event: SaveRecurringSlots) -> AppResult<Vec<Slot>> {
        if event.start >= event.end {
            return Err(AppError::UnprocessableEntity(format!(
                "開始時刻（{}）は終了時刻（{}）より前である必要があります。",
                event.start, event.end
            )));
        }

        let expanded = kernel::model::slot::expand_recurring(&event);
        if expanded.is_empty() {
            // 曜日集合が空、または終了日が開始日より前。エラーではなく no-op
            return Ok(expanded);
        }

        let key = event.owner.to_string();
        let mut doc: TeacherSlotsDoc = self
            .db
            .get_as(TEACHER_SLOTS, &key)
            .await?
            .unwrap_or_default();
        for slot in &expanded {
            let slot_key = slot.id.to_string();
            if !doc.slots.contains_key(&slot_key) {
                doc.slot_ids.push(slot_key.clone());
            }
            doc.slots.insert(slot_key, SlotDoc::from(slot));
        }
        self.db.put_as(TEACHER_SLOTS, &key, &doc).await?;

        Ok(expanded)
    }

    async fn clear(&self, event: ClearSlot) -> AppResult<()> {
        let key = event.owner.to_string();
        let Some(mut doc) = self
            .db
            .get_as::<TeacherSlotsDoc>(TEACHER_SLOTS, &key)
            .await?
        else {
            return Ok(());
        };
        let slot_key = event.slot_id.to_string();
        if doc.slots.remove(&slot_key).is_none() {
            // 存在しないスロットの削除は no-op
            return Ok(());
        }
        doc.slot_ids.retain(|id| id != &slot_key);
        self.db.put_as(TEACHER_SLOTS, &key, &doc).await
    }

    async fn find_by_owner(&self, teacher_id: TeacherId) -> AppResult<Vec<Slot>> {
        let mut slots = self.load_slots(teacher_id).await?;
        slots.sort_by(|a, b| (a.date, a.start).cmp(&(b.date, b.start)));
        Ok(slots)
    }

    async fn available_slots_for(
        &self,
        teacher_id: TeacherId,
        date: NaiveDate,
    ) -> AppResult<Vec<Slot>> {
        let slots = self.load_slots(teacher_id).await?;
        Ok(filter_available(&slots, date, Local::now().naive_local()))
    }

    fn subscribe(&self) -> Subscription {
        self.db.subscribe(TEACHER_SLOTS)
    }
}

impl SlotRepositoryImpl {
    async fn load_slots(&self, teacher_id: TeacherId) -> AppResult<Vec<Slot>> {
        let key = teacher_id.to_string();
        let Some(doc) = self
            .db
            .get_as::<TeacherSlotsDoc>(TEACHER_SLOTS, &key)
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(doc
            .slots
            .into_values()
            .filter_map(|slot_doc| {
                let raw_id = slot_doc.id.clone();
                let slot = slot_doc.into_slot(teacher_id);
                if slot.is_none() {
                    // 壊れたドキュメントは表示から落とすだけでエラーにしない
                    tracing::warn!(
                        slot_id = %raw_id,
                        teacher_id = %teacher_id,
                        "skipping unparsable slot document"
                    );
                }
                slot
            })
            .collect())
    }
}
