// format.rs
//
// Human-readable date labels for task lists.

use chrono::{DateTime, Duration as Dur, TimeZone, Utc};

const DAY_MS: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueUrgency {
    Overdue,
    DueSoon,
    Normal,
}

/// "Today at 03:30 PM", "Yesterday", or "Mar 5, 2024", relative to `now`'s
/// calendar day.
pub fn format_date<Tz: TimeZone>(date: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let date = date.with_timezone(&now.timezone());
    let today = now.date_naive();

    if date.date_naive() == today {
        format!("Today at {}", date.format("%I:%M %p"))
    } else if Some(date.date_naive()) == today.checked_sub_signed(Dur::days(1)) {
        "Yesterday".to_string()
    } else {
        date.format("%b %-d, %Y").to_string()
    }
}

/// Whole days until `due`, rounded up. Negative once the due date has passed.
pub fn days_until_due<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    let ms = due.signed_duration_since(now.with_timezone(&Utc)).num_milliseconds();
    (ms as f64 / DAY_MS).ceil() as i64
}

pub fn due_label<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> Option<String> {
    match days_until_due(due, now) {
        d if d < 0 => None,
        0 => Some("Today".to_string()),
        1 => Some("Tomorrow".to_string()),
        d => Some(format!("{} days", d)),
    }
}

pub fn due_urgency<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> DueUrgency {
    if *due < now.with_timezone(&Utc) {
        DueUrgency::Overdue
    } else if days_until_due(due, now) <= 1 {
        DueUrgency::DueSoon
    } else {
        DueUrgency::Normal
    }
}

/// "Due: Mar 20, 2024 (7 days)" style line for a task with a due date.
pub fn due_line<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let shown = format_date(due, now);
    match due_label(due, now) {
        Some(label) => format!("Due: {} ({})", shown, label),
        None => format!("Due: {}", shown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_format_date_today() {
        let d = Utc.with_ymd_and_hms(2024, 3, 13, 9, 5, 0).unwrap();
        assert_eq!(format_date(&d, &now()), "Today at 09:05 AM");
    }

    #[test]
    fn test_format_date_yesterday_and_older() {
        let y = Utc.with_ymd_and_hms(2024, 3, 12, 23, 59, 0).unwrap();
        assert_eq!(format_date(&y, &now()), "Yesterday");
        let old = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(format_date(&old, &now()), "Mar 5, 2024");
        let future = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        assert_eq!(format_date(&future, &now()), "Jan 20, 2025");
    }

    #[test]
    fn test_days_until_due_rounds_up() {
        assert_eq!(days_until_due(&(now() + Dur::hours(1)), &now()), 1);
        assert_eq!(days_until_due(&(now() + Dur::days(3)), &now()), 3);
        assert_eq!(days_until_due(&now(), &now()), 0);
        assert_eq!(days_until_due(&(now() - Dur::hours(30)), &now()), -1);
    }

    #[test]
    fn test_due_labels() {
        assert_eq!(due_label(&now(), &now()).as_deref(), Some("Today"));
        assert_eq!(due_label(&(now() + Dur::hours(5)), &now()).as_deref(), Some("Tomorrow"));
        assert_eq!(due_label(&(now() + Dur::days(4)), &now()).as_deref(), Some("4 days"));
        assert_eq!(due_label(&(now() - Dur::days(2)), &now()), None);
    }

    #[test]
    fn test_due_urgency() {
        assert_eq!(due_urgency(&(now() - Dur::minutes(1)), &now()), DueUrgency::Overdue);
        assert_eq!(due_urgency(&(now() + Dur::hours(20)), &now()), DueUrgency::DueSoon);
        assert_eq!(due_urgency(&(now() + Dur::days(3)), &now()), DueUrgency::Normal);
    }

    #[test]
    fn test_due_line() {
        let due = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        assert_eq!(due_line(&due, &now()), "Due: Mar 20, 2024 (7 days)");
        let past = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(due_line(&past, &now()), "Due: Mar 1, 2024");
    }
}
