use std::collections::BTreeMap;

use kernel::model::{
    id::{SlotId, TeacherId},
    slot::Slot,
    time::TimeOfDay,
};
use serde::{Deserialize, Serialize};

// 講師 1 人分のスロット集合。ストレージ上のキーは講師 ID（グローバル）で、
// slots のキーはその講師スコープのスロット ID
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSlotsDoc {
    #[serde(default)]
    pub slots: BTreeMap<String, SlotDoc>,
    #[serde(default)]
    pub slot_ids: Vec<String>,
}

// シリアライズ境界のスロット表現。時刻は 12 時間表記の時刻部と
// メリディアンを別フィールドで持つ（外部コラボレータが期待する形）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDoc {
    pub id: String,
    pub date: String,
    pub start_time: String,
    #[serde(default)]
    pub start_period: Option<String>,
    pub end_time: String,
    #[serde(default)]
    pub end_period: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_group_id: Option<String>,
}

impl SlotDoc {
    // 講師 ID を与えてドメイン型へ変換する。ID・日付・時刻のいずれかが
    // 解釈できないドキュメントは None（読み取り側は警告ログの上でスキップ）
    pub fn into_slot(self, owner: TeacherId) -> Option<Slot> {
        let SlotDoc {
            id,
            date,
            start_time,
            start_period,
            end_time,
            end_period,
            is_recurring,
            recurring_group_id,
        } = self;
        let id: SlotId = id.parse().ok()?;
        let date = date.trim().parse().ok()?;
        let start = TimeOfDay::parse(&join_period(&start_time, start_period.as_deref()))?;
        let end = TimeOfDay::parse(&join_period(&end_time, end_period.as_deref()))?;
        Some(Slot {
            id,
            owner,
            date,
            start,
            end,
            is_recurring,
            recurring_group_id,
        })
    }
}

fn join_period(clock: &str, period: Option<&str>) -> String {
    match period {
        Some(p) if !p.trim().is_empty() => format!("{} {}", clock.trim(), p.trim()),
        _ => clock.trim().to_string(),
    }
}

impl From<&Slot> for SlotDoc {
    fn from(value: &Slot) -> Self {
        let (start_time, start_period) = value.start.split_12h();
        let (end_time, end_period) = value.end.split_12h();
        Self {
            id: value.id.to_string(),
            date: value.date.to_string(),
            start_time,
            start_period: Some(start_period),
            end_time,
            end_period: Some(end_period),
            is_recurring: value.is_recurring,
            recurring_group_id: value.recurring_group_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn document_roundtrips_through_meridian_split_fields() {
        let owner = TeacherId::new();
        let slot = Slot {
            id: SlotId::new(1),
            owner,
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            start: TimeOfDay::new(14, 0).unwrap(),
            end: TimeOfDay::new(15, 30).unwrap(),
            is_recurring: false,
            recurring_group_id: None,
        };

        let doc = SlotDoc::from(&slot);
        assert_eq!(doc.date, "2024-06-10");
        assert_eq!(doc.start_time, "2:00");
        assert_eq!(doc.start_period.as_deref(), Some("PM"));
        assert_eq!(doc.end_time, "3:30");
        assert_eq!(doc.end_period.as_deref(), Some("PM"));

        assert_eq!(doc.into_slot(owner), Some(slot));
    }

    #[test]
    fn broken_documents_convert_to_none() {
        let doc = SlotDoc {
            id: "1".into(),
            date: "2024-06-10".into(),
            start_time: "".into(),
            start_period: None,
            end_time: "11:00".into(),
            end_period: Some("AM".into()),
            is_recurring: false,
            recurring_group_id: None,
        };
        assert_eq!(doc.into_slot(TeacherId::new()), None);
    }
}
