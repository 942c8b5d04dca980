use chrono::NaiveDateTime;

use crate::model::{
    booking::{BookingRequest, BookingStatus},
    chat::ChatSettings,
    time::{classify, SessionPhase},
};

// 「いま」ミーティングリンクを表示してよいかを導出する。リンクが設定済みで
// 可視化フラグが立っており、承認済みリクエストのいずれかの時間帯に now が
// 含まれる場合に true。クロックが境界をまたぐことが再評価のトリガーなので、
// 呼び出し側はデータ変更イベントに加えて一定周期（既定 30 秒）で呼び直す
pub fn should_show_link(
    settings: &ChatSettings,
    requests: &[BookingRequest],
    now: NaiveDateTime,
) -> bool {
    if !settings.allow_zoom_link || !settings.has_meeting_link() {
        return false;
    }
    active_window_phase(requests, now).is_some()
}

// 承認済みリクエストのうち now を含む時間帯の分類を返す（表示用）
pub fn active_window_phase(requests: &[BookingRequest], now: NaiveDateTime) -> Option<SessionPhase> {
    requests
        .iter()
        .filter(|r| r.status == BookingStatus::Approved)
        .filter_map(|r| r.window())
        .map(|w| classify(now, &w))
        .find(|p| !matches!(p, SessionPhase::Upcoming | SessionPhase::Ended))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        booking::PaymentStatus,
        id::{BookingRequestId, ChatId, CourseId, SlotId, TeacherId, UserId},
        role::Role,
    };
    use chrono::{NaiveDate, Utc};

    fn request(status: BookingStatus, date: NaiveDate, time: &str) -> BookingRequest {
        BookingRequest {
            id: BookingRequestId::new(),
            chat_id: ChatId::new(),
            slot_id: SlotId::new(1),
            teacher_id: TeacherId::new(),
            course_id: CourseId::new(),
            course_name: "Algebra".into(),
            date,
            time: time.into(),
            requested_by: UserId::new(),
            requested_by_role: Role::Student,
            status,
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
            student_name: "Test Student".into(),
            student_email: "student@example.com".into(),
            payment_status_at_request: PaymentStatus::Paid,
        }
    }

    fn settings(allow: bool, link: Option<&str>) -> ChatSettings {
        ChatSettings {
            chat_id: ChatId::new(),
            session_limit: 1,
            allow_zoom_link: allow,
            meeting_link: link.map(Into::into),
        }
    }

    #[test]
    fn link_is_shown_only_inside_an_approved_window() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let approved = vec![request(BookingStatus::Approved, date, "10:00 AM - 11:00 AM")];
        let chat = settings(true, Some("https://zoom.example/j/1"));

        let inside = date.and_hms_opt(10, 30, 0).unwrap();
        let outside = date.and_hms_opt(12, 0, 0).unwrap();
        assert!(should_show_link(&chat, &approved, inside));
        assert!(!should_show_link(&chat, &approved, outside));
    }

    #[test]
    fn pending_and_rejected_windows_never_show_the_link() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let requests = vec![
            request(BookingStatus::Pending, date, "10:00 AM - 11:00 AM"),
            request(BookingStatus::Rejected, date, "10:00 AM - 11:00 AM"),
        ];
        let chat = settings(true, Some("https://zoom.example/j/1"));
        let inside = date.and_hms_opt(10, 30, 0).unwrap();
        assert!(!should_show_link(&chat, &requests, inside));
    }

    #[test]
    fn missing_link_or_withdrawn_flag_hides_the_session() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let approved = vec![request(BookingStatus::Approved, date, "10:00 AM - 11:00 AM")];
        let inside = date.and_hms_opt(10, 30, 0).unwrap();

        assert!(!should_show_link(&settings(true, None), &approved, inside));
        assert!(!should_show_link(&settings(true, Some("   ")), &approved, inside));
        assert!(!should_show_link(
            &settings(false, Some("https://zoom.example/j/1")),
            &approved,
            inside
        ));
    }

    #[test]
    fn malformed_time_strings_are_treated_as_not_applicable() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let approved = vec![request(BookingStatus::Approved, date, "not a range")];
        let chat = settings(true, Some("https://zoom.example/j/1"));
        let inside = date.and_hms_opt(10, 30, 0).unwrap();
        assert!(!should_show_link(&chat, &approved, inside));
    }
}
