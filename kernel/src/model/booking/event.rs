use chrono::NaiveDate;
use derive_new::new;

use crate::model::{
    id::{ChatId, CourseId, SlotId, TeacherId, UserId},
    role::Role,
};

#[derive(new, Debug)]
pub struct SubmitBooking {
    pub chat_id: ChatId,
    pub slot_id: SlotId,
    pub teacher_id: TeacherId,
    pub course_id: CourseId,
    pub course_name: String,
    pub date: NaiveDate,
    pub requested_by: UserId,
    pub requested_by_role: Role,
}
