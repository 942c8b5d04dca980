use chrono::{DateTime, NaiveDate, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    booking::{event::SubmitBooking, ApprovalOutcome, BookingRequest, BookingStatus, PaymentStatus},
    id::{BookingRequestId, ChatId, CourseId, SlotId, TeacherId, UserId},
    role::Role,
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::model::slot::parse_date;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBookingRequest {
    #[garde(skip)]
    pub chat_id: ChatId,
    #[garde(length(min = 1))]
    pub slot_id: String,
    #[garde(skip)]
    pub teacher_id: TeacherId,
    #[garde(skip)]
    pub course_id: CourseId,
    #[garde(length(min = 1))]
    pub course_name: String,
    #[garde(length(min = 1))]
    pub date: String,
}

#[derive(new)]
pub struct SubmitBookingRequestWithUser(UserId, Role, SubmitBookingRequest);

impl TryFrom<SubmitBookingRequestWithUser> for SubmitBooking {
    type Error = AppError;

    fn try_from(value: SubmitBookingRequestWithUser) -> Result<Self, Self::Error> {
        let SubmitBookingRequestWithUser(user_id, role, req) = value;
        Ok(SubmitBooking {
            chat_id: req.chat_id,
            slot_id: req.slot_id.parse::<SlotId>()?,
            teacher_id: req.teacher_id,
            course_id: req.course_id,
            course_name: req.course_name,
            date: parse_date(&req.date)?,
            requested_by: user_id,
            requested_by_role: role,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub items: Vec<BookingResponse>,
}

impl From<Vec<BookingRequest>> for BookingsResponse {
    fn from(value: Vec<BookingRequest>) -> Self {
        Self {
            items: value.into_iter().map(BookingResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: BookingRequestId,
    pub chat_id: ChatId,
    pub slot_id: SlotId,
    pub teacher_id: TeacherId,
    pub course_id: CourseId,
    pub course_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub requested_by: UserId,
    pub requested_by_role: Role,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub student_name: String,
    pub student_email: String,
    pub payment_status_at_request: PaymentStatus,
}

impl From<BookingRequest> for BookingResponse {
    fn from(value: BookingRequest) -> Self {
        let BookingRequest {
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
        Self {
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
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub outcome: String,
    pub credit_update_failed: bool,
    pub slot_cleanup_failed: bool,
}

impl From<ApprovalOutcome> for ApproveResponse {
    fn from(value: ApprovalOutcome) -> Self {
        match value {
            ApprovalOutcome::FullySucceeded => Self {
                outcome: "fullySucceeded".into(),
                credit_update_failed: false,
                slot_cleanup_failed: false,
            },
            ApprovalOutcome::PartiallySucceeded {
                credit_update_failed,
                slot_cleanup_failed,
            } => Self {
                outcome: "partiallySucceeded".into(),
                credit_update_failed,
                slot_cleanup_failed,
            },
        }
    }
}
