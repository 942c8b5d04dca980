use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::model::{
    id::{BookingRequestId, ChatId, CourseId, SlotId, TeacherId, UserId},
    role::Role,
    time::{parse_time_range, SessionWindow},
};

pub mod event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

// 提出時点のスナップショットとして保存される在籍支払い状態。
// 以後の支払い状況の変化でこの値が更新されることはない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    #[default]
    Unknown,
}

// 生徒によるスロット 1 件への予約申請
#[derive(Debug, Clone)]
pub struct BookingRequest {
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

impl BookingRequest {
    // date と time 文字列からセッションの時間帯を再構成する。
    // time が崩れている場合は None（対象外扱い）
    pub fn window(&self) -> Option<SessionWindow> {
        parse_time_range(self.date, &self.time)
    }
}

// 承認処理の結果。ステータス更新後のクレジット減算とスロット削除は
// それぞれ独立のベストエフォートで、どちらが失敗してもステータスは
// 承認のまま残る。全体の失敗は AppResult の Err 側で表す
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    FullySucceeded,
    PartiallySucceeded {
        credit_update_failed: bool,
        slot_cleanup_failed: bool,
    },
}

impl ApprovalOutcome {
    pub fn from_flags(credit_update_failed: bool, slot_cleanup_failed: bool) -> Self {
        if credit_update_failed || slot_cleanup_failed {
            Self::PartiallySucceeded {
                credit_update_failed,
                slot_cleanup_failed,
            }
        } else {
            Self::FullySucceeded
        }
    }
}
