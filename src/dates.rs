// dates.rs

use chrono::{
    DateTime, Datelike, Duration as Dur, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc, Weekday,
};

use crate::error::{Result, StoreError};

const INVALID_DATE: &str = "Invalid date format. Use YYYY-MM-DD";

/// Parses a due date typed by the user. `now` anchors relative forms such as
/// "tomorrow" or "in 3 days". Dates in the past are accepted.
pub fn parse_due_date<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Err(StoreError::validation(INVALID_DATE));
    }

    let tz = now.timezone();
    let today = now.date_naive();
    let words: Vec<&str> = input.split_whitespace().collect();

    let parsed = match words.as_slice() {
        ["now"] => Some(now.with_timezone(&Utc)),

        ["today"] => start_of(&tz, today),
        ["tomorrow"] | ["tmr"] => start_of(&tz, today + Dur::days(1)),
        ["yesterday"] => start_of(&tz, today - Dur::days(1)),
        ["week"] | ["next", "week"] => start_of(&tz, today + Dur::days(7)),

        [day] if parse_weekday_name(day).is_some() => {
            weekday_after(day, today, 0).and_then(|d| start_of(&tz, d))
        }
        ["next", day] if parse_weekday_name(day).is_some() => {
            weekday_after(day, today, 7).and_then(|d| start_of(&tz, d))
        }

        ["in", num, unit] | [num, unit] if num.parse::<i64>().is_ok() => {
            parse_offset(num, unit).and_then(|delta| now.with_timezone(&Utc).checked_add_signed(delta))
        }

        [date_str, time_str] => parse_date_time_combo(date_str, time_str)
            .and_then(|dt| tz.from_local_datetime(&dt).earliest())
            .map(|dt| dt.with_timezone(&Utc)),

        [date_str] => NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .ok()
            .and_then(|d| start_of(&tz, d)),

        _ => None,
    };

    parsed.ok_or_else(|| StoreError::validation(INVALID_DATE))
}

/// Parses "HH:MM" (24h) or "h:MM am/pm" into a time of day.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Err(StoreError::validation("Please select a time"));
    }

    if let Ok(time) = NaiveTime::parse_from_str(&input, "%H:%M") {
        return Ok(time);
    }

    if input.ends_with("am") || input.ends_with("pm") {
        let is_pm = input.ends_with("pm");
        let time_part = input.trim_end_matches("am").trim_end_matches("pm").trim();

        if let Ok(time) = NaiveTime::parse_from_str(time_part, "%H:%M") {
            if time.hour() == 0 || time.hour() > 12 {
                return Err(StoreError::validation("Invalid time format. Use HH:MM"));
            }
            let hour = match (is_pm, time.hour()) {
                (true, 12) => 12,
                (true, h) => h + 12,
                (false, 12) => 0,
                (false, h) => h,
            };
            if let Some(t) = NaiveTime::from_hms_opt(hour, time.minute(), 0) {
                return Ok(t);
            }
        }
    }

    Err(StoreError::validation("Invalid time format. Use HH:MM"))
}

/// The date part of a due date as the user would type it back in.
pub fn due_date_input(due: &DateTime<Utc>) -> String {
    let local = due.with_timezone(&Local);
    if local.time() == NaiveTime::MIN {
        local.format("%Y-%m-%d").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// First instant of `date` in `tz`. When midnight is skipped by a clock
/// change the day starts at the first local time that exists.
fn start_of<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=180)
        .step_by(15)
        .find_map(|m| tz.from_local_datetime(&(midnight + Dur::minutes(m))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_weekday_name(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence of `day` strictly after `from`, pushed out by `extra` days.
fn weekday_after(day: &str, from: NaiveDate, extra: i64) -> Option<NaiveDate> {
    let target = parse_weekday_name(day)?;
    let mut days = target.num_days_from_monday() as i64 - from.weekday().num_days_from_monday() as i64;
    if days <= 0 {
        days += 7;
    }
    Some(from + Dur::days(days + extra))
}

fn parse_offset(num: &str, unit: &str) -> Option<Dur> {
    let num: i64 = num.parse().ok()?;
    if num < 0 {
        return None;
    }
    match unit {
        "minute" | "minutes" | "min" | "m" => Dur::try_minutes(num),
        "hour" | "hours" | "hr" | "h" => Dur::try_hours(num),
        "day" | "days" | "d" => Dur::try_days(num),
        "week" | "weeks" | "w" => Dur::try_days(num.checked_mul(7)?),
        _ => None,
    }
}

fn parse_date_time_combo(date_str: &str, time_str: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time_str, "%H:%M").ok()?;
    Some(NaiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-13 is a Wednesday.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, 15, 30, 0).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_iso_date_is_start_of_day() {
        assert_eq!(parse_due_date("2024-01-01", &now()).unwrap(), midnight(2024, 1, 1));
        assert_eq!(parse_due_date("  2024-12-31 ", &now()).unwrap(), midnight(2024, 12, 31));
    }

    #[test]
    fn test_date_and_time() {
        assert_eq!(
            parse_due_date("2024-03-20 09:15", &now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 20, 9, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(parse_due_date("today", &now()).unwrap(), midnight(2024, 3, 13));
        assert_eq!(parse_due_date("Tomorrow", &now()).unwrap(), midnight(2024, 3, 14));
        assert_eq!(parse_due_date("tmr", &now()).unwrap(), midnight(2024, 3, 14));
        assert_eq!(parse_due_date("yesterday", &now()).unwrap(), midnight(2024, 3, 12));
        assert_eq!(parse_due_date("next week", &now()).unwrap(), midnight(2024, 3, 20));
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(parse_due_date("friday", &now()).unwrap(), midnight(2024, 3, 15));
        assert_eq!(parse_due_date("wed", &now()).unwrap(), midnight(2024, 3, 20));
        assert_eq!(parse_due_date("mon", &now()).unwrap(), midnight(2024, 3, 18));
        assert_eq!(parse_due_date("next fri", &now()).unwrap(), midnight(2024, 3, 22));
    }

    #[test]
    fn test_offsets() {
        assert_eq!(parse_due_date("in 3 days", &now()).unwrap(), now() + Dur::days(3));
        assert_eq!(parse_due_date("2 hours", &now()).unwrap(), now() + Dur::hours(2));
        assert_eq!(parse_due_date("in 1 week", &now()).unwrap(), now() + Dur::days(7));
        assert!(parse_due_date("in 3 fortnights", &now()).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        for input in [
            "",
            "   ",
            "soon",
            "2024-13-01",
            "31/12/2024",
            "2024-02-30",
            "in x days",
            "in 100000000 days",
            "in 9223372036854775807 minutes",
            "9999999999999999 weeks",
            "in 9223372036854775807 hours",
        ] {
            let err = parse_due_date(input, &now()).unwrap_err();
            assert!(err.is_validation(), "{input:?} should be a validation error");
            assert_eq!(err.to_string(), INVALID_DATE);
        }
    }

    #[test]
    fn test_time_of_day_24h() {
        assert_eq!(parse_time_of_day("09:05").unwrap(), NaiveTime::from_hms_opt(9, 5, 0).unwrap());
        assert_eq!(parse_time_of_day("23:59").unwrap(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        assert_eq!(parse_time_of_day("7:00").unwrap(), NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    }

    #[test]
    fn test_time_of_day_12h() {
        assert_eq!(parse_time_of_day("9:30 pm").unwrap(), NaiveTime::from_hms_opt(21, 30, 0).unwrap());
        assert_eq!(parse_time_of_day("12:15am").unwrap(), NaiveTime::from_hms_opt(0, 15, 0).unwrap());
        assert_eq!(parse_time_of_day("12:00 PM").unwrap(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert!(parse_time_of_day("13:00 pm").is_err());
    }

    #[test]
    fn test_time_of_day_rejects() {
        assert_eq!(parse_time_of_day("").unwrap_err().to_string(), "Please select a time");
        assert!(parse_time_of_day("24:00").is_err());
        assert!(parse_time_of_day("noon").is_err());
    }

    /// UTC except on 2024-03-31, when local clocks jump from 00:00 to 01:00.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn in_gap(local: &NaiveDateTime) -> bool {
            local.date() == NaiveDate::from_ymd_opt(2024, 3, 31).unwrap() && local.hour() == 0
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = chrono::FixedOffset;

        fn from_offset(_: &chrono::FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, _: &NaiveDate) -> chrono::LocalResult<chrono::FixedOffset> {
            chrono::LocalResult::Single(chrono::FixedOffset::east_opt(0).unwrap())
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> chrono::LocalResult<chrono::FixedOffset> {
            if Self::in_gap(local) {
                chrono::LocalResult::None
            } else {
                chrono::LocalResult::Single(chrono::FixedOffset::east_opt(0).unwrap())
            }
        }

        fn offset_from_utc_date(&self, _: &NaiveDate) -> chrono::FixedOffset {
            chrono::FixedOffset::east_opt(0).unwrap()
        }

        fn offset_from_utc_datetime(&self, _: &NaiveDateTime) -> chrono::FixedOffset {
            chrono::FixedOffset::east_opt(0).unwrap()
        }
    }

    #[test]
    fn test_day_without_midnight_starts_after_the_gap() {
        let now = MidnightGap.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2024, 3, 30)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        );
        let expected = Utc.with_ymd_and_hms(2024, 3, 31, 1, 0, 0).unwrap();
        assert_eq!(parse_due_date("2024-03-31", &now).unwrap(), expected);
        assert_eq!(parse_due_date("tomorrow", &now).unwrap(), expected);
        assert_eq!(
            parse_due_date("2024-04-01", &now).unwrap(),
            midnight(2024, 4, 1)
        );
    }
}
