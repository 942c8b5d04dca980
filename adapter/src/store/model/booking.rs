use chrono::{DateTime, Utc};
use kernel::model::{
    booking::{BookingRequest, BookingStatus, PaymentStatus},
    id::{CourseId, SlotId},
    role::Role,
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequestDoc {
    pub id: String,
    pub chat_id: String,
    pub slot_id: String,
    pub teacher_id: String,
    pub course_id: String,
    pub course_name: String,
    pub date: String,
    pub time: String,
    pub requested_by: String,
    pub requested_by_role: Role,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    pub student_name: String,
    pub student_email: String,
    #[serde(default)]
    pub payment_status_at_request: PaymentStatus,
}

impl From<&BookingRequest> for BookingRequestDoc {
    fn from(value: &BookingRequest) -> Self {
        Self {
            id: value.id.to_string(),
            chat_id: value.chat_id.to_string(),
            slot_id: value.slot_id.to_string(),
            teacher_id: value.teacher_id.to_string(),
            course_id: value.course_id.to_string(),
            course_name: value.course_name.clone(),
            date: value.date.to_string(),
            time: value.time.clone(),
            requested_by: value.requested_by.to_string(),
            requested_by_role: value.requested_by_role,
            status: value.status,
            created_at: value.created_at,
            approved_at: value.approved_at,
            rejected_at: value.rejected_at,
            student_name: value.student_name.clone(),
            student_email: value.student_email.clone(),
            payment_status_at_request: value.payment_status_at_request,
        }
    }
}

impl TryFrom<BookingRequestDoc> for BookingRequest {
    type Error = AppError;

    fn try_from(value: BookingRequestDoc) -> Result<Self, Self::Error> {
        let BookingRequestDoc {
            id,
            chat_id,
            slot_id,
            teacher_id,
            course_id,
            course_name,
            date,
            time,
            requested_by,
            requested_by_role,
            status,
            created_at,
            approved_at,
            rejected_at,
            student_name,
            student_email,
            payment_status_at_request,
        } = value;
        Ok(BookingRequest {
            id: id.parse()?,
            chat_id: chat_id.parse()?,
            slot_id: slot_id.parse()?,
            teacher_id: teacher_id.parse()?,
            course_id: course_id.parse()?,
            course_name,
            date: date.trim().parse().map_err(|_| {
                AppError::ConversionEntityError(format!("日付を解釈できません: {date}"))
            })?,
            time,
            requested_by: requested_by.parse()?,
            requested_by_role,
            status,
            created_at,
            approved_at,
            rejected_at,
            student_name,
            student_email,
            payment_status_at_request,
        })
    }
}

// (コース, スロット) ごとの申請数上限。ドキュメントが存在する場合のみ適用
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotLimitDoc {
    pub limit: u32,
}

pub fn slot_limit_key(course_id: &CourseId, slot_id: &SlotId) -> String {
    format!("{course_id}/{slot_id}")
}
