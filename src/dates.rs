//! Relative due-date grammar shared by the task form and detail views.
//!
//! Every function takes the reference day explicitly; callers get it from
//! their [`Clock`](crate::clock::Clock).

use chrono::{Days, NaiveDate};

use crate::errors::{Result, ZvaultError};

const EDIT_FORMAT: &str = "%Y-%m-%d";

/// Parses a due date.
///
/// Accepted: empty (no date), `today`, `tomorrow`, `next week`
/// (case-insensitive), `+Nd`, `+Nw`, `YYYY-MM-DD`.
pub fn parse(input: &str, today: NaiveDate) -> Result<Option<NaiveDate>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let lower = trimmed.to_lowercase();
    let invalid = || ZvaultError::InvalidDate(trimmed.to_string());

    match lower.as_str() {
        "today" => return Ok(Some(today)),
        "tomorrow" => return shift(today, 1).map(Some).ok_or_else(invalid),
        "next week" => return shift(today, 7).map(Some).ok_or_else(invalid),
        _ => {}
    }

    if let Some(offset) = lower.strip_prefix('+') {
        let (digits, scale) = if let Some(n) = offset.strip_suffix('d') {
            (n, 1)
        } else if let Some(n) = offset.strip_suffix('w') {
            (n, 7)
        } else {
            return Err(invalid());
        };
        let n: i64 = digits.parse().map_err(|_| invalid())?;
        let days = n.checked_mul(scale).ok_or_else(invalid)?;
        return shift(today, days).map(Some).ok_or_else(invalid);
    }

    NaiveDate::parse_from_str(trimmed, EDIT_FORMAT)
        .map(Some)
        .map_err(|_| invalid())
}

fn shift(day: NaiveDate, by: i64) -> Option<NaiveDate> {
    if by >= 0 {
        day.checked_add_days(Days::new(by.unsigned_abs()))
    } else {
        day.checked_sub_days(Days::new(by.unsigned_abs()))
    }
}

/// Human wording for a date relative to `today`.
pub fn format_relative(date: NaiveDate, today: NaiveDate) -> String {
    let days = (date - today).num_days();
    match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        2..=7 => format!("in {days} days"),
        8..=14 => "next week".to_string(),
        d if d > 14 => date.format("%b %-d").to_string(),
        d => format!("overdue by {} days", -d),
    }
}

pub fn format_due(date: Option<NaiveDate>, today: NaiveDate) -> String {
    date.map(|d| format_relative(d, today)).unwrap_or_default()
}

pub fn is_overdue(date: Option<NaiveDate>, today: NaiveDate) -> bool {
    date.is_some_and(|d| d < today)
}

/// `YYYY-MM-DD`, or empty when there is no date.
pub fn format_for_edit(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(EDIT_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reference() -> NaiveDate {
        day(2026, 2, 18)
    }

    #[test]
    fn tomorrow_round_trips_to_tomorrow() {
        let parsed = parse("tomorrow", reference()).unwrap().unwrap();
        assert_eq!(parsed, day(2026, 2, 19));
        assert_eq!(format_relative(parsed, reference()), "tomorrow");
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(parse("TODAY", reference()).unwrap(), Some(reference()));
        assert_eq!(parse("Next Week", reference()).unwrap(), Some(day(2026, 2, 25)));
    }

    #[test]
    fn offsets() {
        assert_eq!(parse("+3d", reference()).unwrap(), Some(day(2026, 2, 21)));
        assert_eq!(parse("+2w", reference()).unwrap(), Some(day(2026, 3, 4)));
        assert_eq!(parse("+0d", reference()).unwrap(), Some(reference()));
    }

    #[test]
    fn absolute_date() {
        assert_eq!(parse("2026-12-25", reference()).unwrap(), Some(day(2026, 12, 25)));
    }

    #[test]
    fn empty_means_no_date() {
        assert_eq!(parse("   ", reference()).unwrap(), None);
    }

    #[test]
    fn garbage_names_accepted_forms() {
        for bad in ["soon", "+xd", "+3m", "2026-13-40", "+d"] {
            let err = parse(bad, reference()).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("YYYY-MM-DD"), "{bad}: {msg}");
            assert!(msg.contains("tomorrow"), "{bad}: {msg}");
        }
    }

    #[test]
    fn relative_wording() {
        let r = reference();
        assert_eq!(format_relative(r, r), "today");
        assert_eq!(format_relative(day(2026, 2, 17), r), "yesterday");
        assert_eq!(format_relative(day(2026, 2, 20), r), "in 2 days");
        assert_eq!(format_relative(day(2026, 2, 25), r), "in 7 days");
        assert_eq!(format_relative(day(2026, 2, 26), r), "next week");
        assert_eq!(format_relative(day(2026, 3, 4), r), "next week");
        assert_eq!(format_relative(day(2026, 3, 5), r), "Mar 5");
        assert_eq!(format_relative(day(2026, 2, 15), r), "overdue by 3 days");
    }

    #[test]
    fn overdue_is_strictly_before_today() {
        let r = reference();
        assert!(is_overdue(Some(day(2026, 2, 17)), r));
        assert!(!is_overdue(Some(r), r));
        assert!(!is_overdue(None, r));
    }

    #[test]
    fn edit_format() {
        assert_eq!(format_for_edit(Some(day(2026, 1, 5))), "2026-01-05");
        assert_eq!(format_for_edit(None), "");
        assert_eq!(format_due(None, reference()), "");
    }
}
