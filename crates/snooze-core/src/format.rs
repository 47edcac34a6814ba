//! Format inference.
//!
//! The host dialog pre-fills its date and time inputs in the user's locale
//! convention. The replacement value is rendered in whatever shape the
//! existing value has, so the host accepts it as if it had been typed.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Date shapes the host is known to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePattern {
    /// `Jan 10, 2026`
    MonthDayYear,
    /// `10 Jan, 2026`
    DayMonthYear,
    /// `01/10/2026` (US ordering, even for day-first locales)
    SlashUs,
    /// `10.01.2026`
    Dotted,
    /// `2026-01-10`
    Iso,
}

impl DatePattern {
    /// Infer the pattern of an existing date string. First match wins;
    /// the two textual shapes must match exactly.
    pub fn infer(original: &str) -> Self {
        if month_day_year().is_match(original) {
            DatePattern::MonthDayYear
        } else if day_month_year().is_match(original) {
            DatePattern::DayMonthYear
        } else if original.contains('/') {
            DatePattern::SlashUs
        } else if original.contains('.') {
            DatePattern::Dotted
        } else if original.contains('-') {
            DatePattern::Iso
        } else {
            DatePattern::MonthDayYear
        }
    }

    /// `chrono` format string for this pattern.
    pub fn strftime(self) -> &'static str {
        match self {
            DatePattern::MonthDayYear => "%b %-d, %Y",
            DatePattern::DayMonthYear => "%-d %b, %Y",
            DatePattern::SlashUs => "%m/%d/%Y",
            DatePattern::Dotted => "%d.%m.%Y",
            DatePattern::Iso => "%Y-%m-%d",
        }
    }
}

/// Time shapes the host is known to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePattern {
    /// `1:30 PM`
    TwelveHour,
    /// `13:30`
    TwentyFourHour,
}

impl TimePattern {
    /// Twelve-hour when the original carries an AM/PM marker.
    pub fn infer(original: &str) -> Self {
        if meridiem().is_match(original) {
            TimePattern::TwelveHour
        } else {
            TimePattern::TwentyFourHour
        }
    }

    pub fn strftime(self) -> &'static str {
        match self {
            TimePattern::TwelveHour => "%-I:%M %p",
            TimePattern::TwentyFourHour => "%H:%M",
        }
    }

    pub fn is_12_hour(self) -> bool {
        self == TimePattern::TwelveHour
    }
}

/// Inferred rendering convention of one dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub date: DatePattern,
    pub time: TimePattern,
}

impl FormatSpec {
    pub fn infer(original_date: &str, original_time: &str) -> Self {
        Self {
            date: DatePattern::infer(original_date),
            time: TimePattern::infer(original_time),
        }
    }

    pub fn render_date(&self, target: &NaiveDateTime) -> String {
        target.format(self.date.strftime()).to_string()
    }

    pub fn render_time(&self, target: &NaiveDateTime) -> String {
        target.format(self.time.strftime()).to_string()
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.strftime(), self.time.strftime())
    }
}

/// Render `target`'s date in the shape of `original`.
pub fn render_date_like(target: &NaiveDateTime, original: &str) -> String {
    target
        .format(DatePattern::infer(original).strftime())
        .to_string()
}

/// Render `target`'s time in the shape of `original`.
pub fn render_time_like(target: &NaiveDateTime, original: &str) -> String {
    target
        .format(TimePattern::infer(original).strftime())
        .to_string()
}

fn month_day_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][a-z]{2}\s\d{1,2},\s\d{4}$").expect("valid regex"))
}

fn day_month_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}\s[A-Z][a-z]{2},\s\d{4}$").expect("valid regex"))
}

fn meridiem() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)AM|PM").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn target() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_month_day_year_shape() {
        assert_eq!(render_date_like(&target(), "Jan 1, 2025"), "Jan 10, 2026");
    }

    #[test]
    fn test_day_month_year_shape() {
        assert_eq!(render_date_like(&target(), "1 Jan, 2025"), "10 Jan, 2026");
    }

    #[test]
    fn test_slash_renders_us_order() {
        assert_eq!(render_date_like(&target(), "01/01/2025"), "01/10/2026");
        // Day-first strings still come out month-first.
        assert_eq!(render_date_like(&target(), "25/12/2025"), "01/10/2026");
    }

    #[test]
    fn test_dotted_shape() {
        assert_eq!(render_date_like(&target(), "01.01.2025"), "10.01.2026");
    }

    #[test]
    fn test_iso_shape() {
        assert_eq!(render_date_like(&target(), "2025-01-01"), "2026-01-10");
    }

    #[test]
    fn test_empty_and_unknown_default() {
        assert_eq!(render_date_like(&target(), ""), "Jan 10, 2026");
        assert_eq!(render_date_like(&target(), "tomorrow"), "Jan 10, 2026");
    }

    #[test]
    fn test_infer_priority() {
        assert_eq!(DatePattern::infer("Jan 1, 2025"), DatePattern::MonthDayYear);
        assert_eq!(DatePattern::infer("1 Jan, 2025"), DatePattern::DayMonthYear);
        // A slash beats a dot.
        assert_eq!(DatePattern::infer("01/01.2025"), DatePattern::SlashUs);
        assert_eq!(DatePattern::infer("01.01-2025"), DatePattern::Dotted);
    }

    #[test]
    fn test_textual_shapes_must_be_exact() {
        assert_eq!(DatePattern::infer("1 Jan,2025"), DatePattern::MonthDayYear);
        assert_eq!(DatePattern::infer("1  Jan, 2025"), DatePattern::MonthDayYear);
        assert_eq!(render_date_like(&target(), "1 jan, 2025"), "Jan 10, 2026");
        assert_eq!(render_date_like(&target(), " 1 Jan, 2025"), "Jan 10, 2026");
        assert_eq!(DatePattern::infer("JAN 1, 2025"), DatePattern::MonthDayYear);
        assert_eq!(render_date_like(&target(), "1 JAN, 2025"), "Jan 10, 2026");
    }

    #[test]
    fn test_meridiem_marker_anywhere() {
        assert_eq!(TimePattern::infer("08:00 am"), TimePattern::TwelveHour);
        assert_eq!(TimePattern::infer("8:00 a.m."), TimePattern::TwentyFourHour);
    }

    #[test]
    fn test_time_twelve_hour() {
        assert_eq!(render_time_like(&target(), "8:00 AM"), "1:30 PM");
        assert_eq!(render_time_like(&target(), "8:00 pm"), "1:30 PM");
        assert_eq!(render_time_like(&target(), "8:00PM"), "1:30 PM");
    }

    #[test]
    fn test_time_twenty_four_hour() {
        assert_eq!(render_time_like(&target(), "08:00"), "13:30");
        assert_eq!(render_time_like(&target(), ""), "13:30");
    }

    #[test]
    fn test_morning_time_pads_in_24_hour() {
        let early = NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        assert_eq!(render_time_like(&early, "17:00"), "08:05");
        assert_eq!(render_time_like(&early, "5:00 PM"), "8:05 AM");
    }

    #[test]
    fn test_format_spec() {
        let spec = FormatSpec::infer("2025-01-01", "9:00 AM");
        assert_eq!(spec.date, DatePattern::Iso);
        assert!(spec.time.is_12_hour());
        assert_eq!(spec.render_date(&target()), "2026-01-10");
        assert_eq!(spec.render_time(&target()), "1:30 PM");
    }
}
