use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use strum::AsRefStr;

// 残り時間がこの分数以下になったら「終了間際」とみなす
pub const ENDING_SOON_MINUTES: i64 = 15;

// 時刻の正規化表現。内部は常に 24 時間制で持ち、午前/午後に分かれた
// 文字列はシリアライズ境界でのみ出し入れする
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    // `"h:mm AM"` / `"h:mm PM"` の 12 時間表記、または `"HH:MM"` の
    // 24 時間表記（メリディアンなし）を受け付ける。解釈できない場合は
    // None を返し、呼び出し側は「対象外」として扱う
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let (clock, meridian) = match s.split_once(char::is_whitespace) {
            Some((clock, meridian)) => (clock.trim(), Some(meridian.trim())),
            None => (s, None),
        };
        let (h, m) = clock.split_once(':')?;
        let hour: u8 = h.trim().parse().ok()?;
        let minute: u8 = m.trim().parse().ok()?;
        match meridian {
            None => Self::new(hour, minute),
            Some(p) => {
                let hour = match (p.to_ascii_uppercase().as_str(), hour) {
                    ("AM", 12) => 0,
                    ("AM", h @ 1..=11) => h,
                    ("PM", 12) => 12,
                    ("PM", h @ 1..=11) => h + 12,
                    _ => return None,
                };
                Self::new(hour, minute)
            }
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or_default()
    }

    pub fn format_24h(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    // シリアライズ境界用の 12 時間表記（時刻部とメリディアンの組）
    pub fn split_12h(&self) -> (String, String) {
        let period = if self.hour < 12 { "AM" } else { "PM" };
        let hour12 = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        (format!("{}:{:02}", hour12, self.minute), period.to_string())
    }

    pub fn format_12h(&self) -> String {
        let (clock, period) = self.split_12h();
        format!("{clock} {period}")
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_24h())
    }
}

// 承認済み予約のミーティングリンクを表示すべき開始・終了の瞬間の組
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SessionWindow {
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        !matches!(
            classify(now, self),
            SessionPhase::Upcoming | SessionPhase::Ended
        )
    }
}

// `"10:00 AM - 11:00 AM"` 形式の時間帯文字列を当日の時間帯へ変換する。
// `-` 区切りが無い、どちらかの側が空、解釈不能のいずれも None
// （呼び出し側でエラーにせず「対象外」として扱う）
pub fn parse_time_range(date: NaiveDate, time_range: &str) -> Option<SessionWindow> {
    let (start_raw, end_raw) = time_range.split_once('-')?;
    let start = TimeOfDay::parse(start_raw)?;
    let end = TimeOfDay::parse(end_raw)?;
    Some(SessionWindow {
        start: date.and_time(start.to_naive()),
        end: date.and_time(end.to_naive()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionPhase {
    Upcoming,
    Active,
    EndingSoon,
    Ending,
    Ended,
}

// now を時間帯に対して分類する。両端は閉区間。終了間際は残り (0, 15] 分、
// 残りちょうど 0 分（now == end）は Ending
pub fn classify(now: NaiveDateTime, window: &SessionWindow) -> SessionPhase {
    if now < window.start {
        return SessionPhase::Upcoming;
    }
    if now > window.end {
        return SessionPhase::Ended;
    }
    let remaining = window.end.signed_duration_since(now);
    if remaining <= Duration::zero() {
        SessionPhase::Ending
    } else if remaining <= Duration::minutes(ENDING_SOON_MINUTES) {
        SessionPhase::EndingSoon
    } else {
        SessionPhase::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn t(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[rstest]
    #[case("10:00 AM", 10, 0)]
    #[case("12:00 AM", 0, 0)]
    #[case("12:30 PM", 12, 30)]
    #[case("9:05 pm", 21, 5)]
    #[case("  11:45 PM ", 23, 45)]
    #[case("22:15", 22, 15)]
    #[case("07:30", 7, 30)]
    fn parses_both_clock_forms(#[case] input: &str, #[case] hour: u8, #[case] minute: u8) {
        assert_eq!(TimeOfDay::parse(input), Some(t(hour, minute)));
    }

    #[rstest]
    #[case("")]
    #[case("25:00")]
    #[case("10:60")]
    #[case("0:30 AM")]
    #[case("13:00 PM")]
    #[case("10:00 XM")]
    #[case("10 AM")]
    fn rejects_unparsable_clock_strings(#[case] input: &str) {
        assert_eq!(TimeOfDay::parse(input), None);
    }

    #[test]
    fn splits_back_into_meridian_form() {
        assert_eq!(t(0, 0).split_12h(), ("12:00".into(), "AM".into()));
        assert_eq!(t(12, 5).split_12h(), ("12:05".into(), "PM".into()));
        assert_eq!(t(15, 30).format_12h(), "3:30 PM");
        assert_eq!(t(9, 0).format_24h(), "09:00");
    }

    #[test]
    fn parses_time_range_with_trimmed_sides() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let window = parse_time_range(date, "10:00 AM - 11:00 AM").unwrap();
        assert_eq!(window.start, date.and_time(t(10, 0).to_naive()));
        assert_eq!(window.end, date.and_time(t(11, 0).to_naive()));

        // メリディアンなしの 24 時間表記はそのまま通る
        let window = parse_time_range(date, "13:00-14:30").unwrap();
        assert_eq!(window.start.time(), t(13, 0).to_naive());
        assert_eq!(window.end.time(), t(14, 30).to_naive());
    }

    #[rstest]
    #[case("10:00 AM 11:00 AM")]
    #[case(" - 11:00 AM")]
    #[case("10:00 AM - ")]
    #[case("garbage - 11:00 AM")]
    #[case("")]
    fn time_range_parse_fails_silently(#[case] input: &str) {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(parse_time_range(date, input), None);
    }

    fn window() -> SessionWindow {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        parse_time_range(date, "10:00 AM - 11:00 AM").unwrap()
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[rstest]
    #[case(at(9, 59), SessionPhase::Upcoming)]
    #[case(at(10, 0), SessionPhase::Active)]
    #[case(at(10, 44), SessionPhase::Active)]
    #[case(at(10, 45), SessionPhase::EndingSoon)]
    #[case(at(10, 50), SessionPhase::EndingSoon)]
    #[case(at(11, 0), SessionPhase::Ending)]
    #[case(at(11, 1), SessionPhase::Ended)]
    fn classifies_now_against_window(#[case] now: NaiveDateTime, #[case] expected: SessionPhase) {
        assert_eq!(classify(now, &window()), expected);
    }

    #[test]
    fn ten_minutes_before_end_is_ending_soon() {
        assert_eq!(classify(at(10, 50), &window()), SessionPhase::EndingSoon);
    }

    #[test]
    fn phases_refine_the_inclusive_window() {
        // EndingSoon / Ending は必ず閉区間の内側でしか出ない
        for minute in 0..=70u32 {
            let now = at(10, 0) + Duration::minutes(minute as i64);
            let phase = classify(now, &window());
            if matches!(phase, SessionPhase::EndingSoon | SessionPhase::Ending) {
                assert!(window().contains(now));
            }
        }
    }
}
