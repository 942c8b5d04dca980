use chrono::{NaiveDate, Weekday};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{SlotId, TeacherId},
    slot::{
        event::{SaveRecurringSlots, SaveSlot},
        Frequency, RecurrenceRule, Slot,
    },
    time::TimeOfDay,
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlotRequest {
    #[garde(range(min = 1))]
    pub id: u32,
    #[garde(length(min = 1))]
    pub date: String,
    #[garde(length(min = 1))]
    pub start_time: String,
    #[garde(length(min = 1))]
    pub end_time: String,
    #[garde(skip)]
    #[serde(default)]
    pub is_recurring: bool,
    #[garde(skip)]
    #[serde(default)]
    pub frequency: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub days_of_week: Option<Vec<String>>,
    #[garde(skip)]
    #[serde(default)]
    pub recurrence_end_date: Option<String>,
}

#[derive(new)]
pub struct SaveSlotRequestWithTeacherId(TeacherId, SaveSlotRequest);

impl TryFrom<SaveSlotRequestWithTeacherId> for SaveSlot {
    type Error = AppError;

    fn try_from(value: SaveSlotRequestWithTeacherId) -> Result<Self, Self::Error> {
        let SaveSlotRequestWithTeacherId(teacher_id, req) = value;
        Ok(SaveSlot {
            owner: teacher_id,
            id: SlotId::new(req.id),
            date: parse_date(&req.date)?,
            start: parse_time(&req.start_time)?,
            end: parse_time(&req.end_time)?,
        })
    }
}

impl TryFrom<SaveSlotRequestWithTeacherId> for SaveRecurringSlots {
    type Error = AppError;

    fn try_from(value: SaveSlotRequestWithTeacherId) -> Result<Self, Self::Error> {
        let SaveSlotRequestWithTeacherId(teacher_id, req) = value;
        let frequency = req
            .frequency
            .as_deref()
            .ok_or_else(|| {
                AppError::UnprocessableEntity("繰り返しの頻度が指定されていません。".into())
            })?
            .trim()
            .parse::<Frequency>()?;
        let days_of_week = req
            .days_of_week
            .unwrap_or_default()
            .iter()
            .map(|day| parse_weekday(day))
            .collect::<Result<Vec<Weekday>, _>>()?;
        let end_date = req.recurrence_end_date.as_deref().ok_or_else(|| {
            AppError::UnprocessableEntity("繰り返しの終了日が指定されていません。".into())
        })?;
        Ok(SaveRecurringSlots {
            owner: teacher_id,
            base_id: SlotId::new(req.id),
            date: parse_date(&req.date)?,
            start: parse_time(&req.start_time)?,
            end: parse_time(&req.end_time)?,
            rule: RecurrenceRule {
                frequency,
                days_of_week,
                end_date: parse_date(end_date)?,
            },
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    #[garde(length(min = 1))]
    pub date: String,
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    s.trim().parse().map_err(|_| {
        AppError::UnprocessableEntity(format!(
            "日付（{s}）は YYYY-MM-DD 形式である必要があります。"
        ))
    })
}

fn parse_time(s: &str) -> Result<TimeOfDay, AppError> {
    TimeOfDay::parse(s)
        .ok_or_else(|| AppError::UnprocessableEntity(format!("時刻（{s}）を解釈できません。")))
}

fn parse_weekday(s: &str) -> Result<Weekday, AppError> {
    s.trim()
        .parse()
        .map_err(|_| AppError::UnprocessableEntity(format!("曜日（{s}）を解釈できません。")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub items: Vec<SlotResponse>,
}

impl From<Vec<Slot>> for SlotsResponse {
    fn from(value: Vec<Slot>) -> Self {
        Self {
            items: value.into_iter().map(SlotResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub is_recurring: bool,
    pub recurring_group_id: Option<String>,
}

impl From<Slot> for SlotResponse {
    fn from(value: Slot) -> Self {
        let Slot {
            id,
            owner: _,
            date,
            start,
            end,
            is_recurring,
            recurring_group_id,
        } = value;
        Self {
            id: id.to_string(),
            date: date.to_string(),
            start_time: start.format_12h(),
            end_time: end.format_12h(),
            is_recurring,
            recurring_group_id,
        }
    }
}
