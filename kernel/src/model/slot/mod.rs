use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::model::{
    id::{SlotId, TeacherId},
    time::{SessionWindow, TimeOfDay},
};

use self::event::SaveRecurringSlots;

pub mod event;

// 講師が提供する予約可能な時間枠。具体的な 1 日付に紐づく
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub owner: TeacherId,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub is_recurring: bool,
    pub recurring_group_id: Option<String>,
}

impl Slot {
    // 予約リクエストの time フィールドに入る「開始 - 終了」表記
    pub fn time_range_label(&self) -> String {
        format!("{} - {}", self.start.format_12h(), self.end.format_12h())
    }

    pub fn window(&self) -> SessionWindow {
        SessionWindow {
            start: self.date.and_time(self.start.to_naive()),
            end: self.date.and_time(self.end.to_naive()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub days_of_week: Vec<Weekday>,
    pub end_date: NaiveDate,
}

impl RecurrenceRule {
    // 同じルールを保存し直しても同一になるように、基底 ID・頻度・
    // 曜日リスト（辞書順）から決定的に合成する
    pub fn group_id(&self, base: &SlotId) -> String {
        let mut days: Vec<&'static str> = self.days_of_week.iter().map(|d| day_name(*d)).collect();
        days.sort_unstable();
        days.dedup();
        format!("{}:{}:{}", base, self.frequency.as_ref(), days.join("-"))
    }
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

// 繰り返しルールを日付範囲の走査で具体的なスロット列へ展開する。
// 曜日集合が空、または終了日が開始日より前なら空を返す（エラーではない）
pub fn expand_recurring(event: &SaveRecurringSlots) -> Vec<Slot> {
    let group_id = event.rule.group_id(&event.base_id);
    let mut slots = Vec::new();
    let mut current = event.date;
    let mut seq = 0u32;
    while current <= event.rule.end_date {
        if event.rule.days_of_week.contains(&current.weekday()) {
            slots.push(Slot {
                id: SlotId::expanded(event.base_id.base(), seq),
                owner: event.owner,
                date: current,
                start: event.start,
                end: event.end,
                is_recurring: true,
                recurring_group_id: Some(group_id.clone()),
            });
            seq += 1;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    slots
}

// 指定日の予約可能スロットを開始時刻昇順で返す。クエリ日が now と同じ
// 日付の場合、終了時刻が現在時刻以前のスロットは新規の予約者から
// 見えなくなる（既存リクエストに埋め込み済みのスロットには影響しない）
pub fn filter_available(slots: &[Slot], date: NaiveDate, now: NaiveDateTime) -> Vec<Slot> {
    let mut available: Vec<Slot> = slots
        .iter()
        .filter(|s| s.date == date)
        .filter(|s| date != now.date() || s.end.to_naive() > now.time())
        .cloned()
        .collect();
    available.sort_by_key(|s| s.start);
    available
}
