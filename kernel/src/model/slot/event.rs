use chrono::NaiveDate;
use derive_new::new;

use crate::model::{
    id::{SlotId, TeacherId},
    slot::RecurrenceRule,
    time::TimeOfDay,
};

#[derive(new, Debug)]
pub struct SaveSlot {
    pub owner: TeacherId,
    pub id: SlotId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

#[derive(new, Debug)]
pub struct SaveRecurringSlots {
    pub owner: TeacherId,
    pub base_id: SlotId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub rule: RecurrenceRule,
}

#[derive(new, Debug)]
pub struct ClearSlot {
    pub owner: TeacherId,
    pub slot_id: SlotId,
}
