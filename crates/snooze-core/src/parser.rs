//! Natural-language date parsing.
//!
//! [`DateParser`] is the seam to the parsing library; [`EnglishDateParser`]
//! wraps `chrono-english`. [`resolve_future`] applies the one rule the
//! automation cares about: a result is usable only when it lies strictly
//! after now.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Local};
use chrono_english::{Dialect, parse_date_string};
use regex::Regex;
use tracing::trace;

/// Best match of a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCandidate {
    pub resolved: DateTime<Local>,
    /// The part of the input that produced `resolved`.
    pub matched: String,
}

/// Free text to point in time, relative to a reference.
pub trait DateParser: Send + Sync {
    fn parse(&self, text: &str, reference: DateTime<Local>) -> Option<ParseCandidate>;
}

/// Parse `text` and keep the result only when it is strictly after `now`.
pub fn resolve_future(
    parser: &dyn DateParser,
    text: &str,
    now: DateTime<Local>,
) -> Option<ParseCandidate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let candidate = parser.parse(text, now)?;
    if candidate.resolved > now {
        Some(candidate)
    } else {
        trace!(%text, resolved = %candidate.resolved, "discarding non-future parse");
        None
    }
}

/// English parser with a forward bias.
///
/// A bare weekday that resolves at or before the reference moves one week
/// ahead; a bare clock time moves one day ahead.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishDateParser {
    day_first: bool,
}

impl EnglishDateParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Day-first numeric dates (`3/1` is the 3rd of January).
    pub fn day_first() -> Self {
        Self { day_first: true }
    }

    fn dialect(&self) -> Dialect {
        if self.day_first { Dialect::Uk } else { Dialect::Us }
    }
}

impl DateParser for EnglishDateParser {
    fn parse(&self, text: &str, reference: DateTime<Local>) -> Option<ParseCandidate> {
        let matched = normalize(text);
        if matched.is_empty() {
            return None;
        }
        let resolved = match parse_date_string(&matched, reference, self.dialect()) {
            Ok(resolved) => resolved,
            Err(err) => {
                trace!(text = %matched, ?err, "no date in text");
                return None;
            }
        };
        Some(ParseCandidate {
            resolved: push_forward(&matched, resolved, reference),
            matched,
        })
    }
}

/// Lowercase, collapse whitespace, drop the filler words the grammar does
/// not know ("in 2 days", "3 hours from now").
fn normalize(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words.first().is_some_and(|w| w.eq_ignore_ascii_case("in")) {
        words.remove(0);
    }
    let len = words.len();
    if len >= 2
        && words[len - 2].eq_ignore_ascii_case("from")
        && words[len - 1].eq_ignore_ascii_case("now")
    {
        words.truncate(len - 2);
    }
    words.join(" ").to_lowercase()
}

fn push_forward(
    text: &str,
    resolved: DateTime<Local>,
    reference: DateTime<Local>,
) -> DateTime<Local> {
    if resolved > reference || anchored().is_match(text) {
        return resolved;
    }
    if weekday().is_match(text) {
        resolved + Duration::days(7)
    } else if clock_time().is_match(text) {
        resolved + Duration::days(1)
    } else {
        resolved
    }
}

/// Phrases that pin the date explicitly and must not be moved.
fn anchored() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(today|now|yesterday|ago|last)\b").expect("valid regex")
    })
}

fn weekday() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(next\s+)?(mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)(day|nesday|sday|urday)?\b")
            .expect("valid regex")
    })
}

fn clock_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(at\s+)?\d{1,2}(:\d{2})?\s*(am|pm)?$|^(noon|midnight)$").expect("valid regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn reference() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 14, 15, 0, 0).single().unwrap()
    }

    /// Returns a fixed offset from the reference.
    struct Fixed(Duration);

    impl DateParser for Fixed {
        fn parse(&self, text: &str, reference: DateTime<Local>) -> Option<ParseCandidate> {
            Some(ParseCandidate {
                resolved: reference + self.0,
                matched: text.to_string(),
            })
        }
    }

    #[test]
    fn test_resolve_future_keeps_future() {
        let found = resolve_future(&Fixed(Duration::hours(1)), "soon", reference()).unwrap();
        assert_eq!(found.resolved, reference() + Duration::hours(1));
        assert_eq!(found.matched, "soon");
    }

    #[test]
    fn test_resolve_future_discards_now_and_past() {
        assert!(resolve_future(&Fixed(Duration::zero()), "now", reference()).is_none());
        assert!(resolve_future(&Fixed(Duration::hours(-3)), "earlier", reference()).is_none());
    }

    #[test]
    fn test_resolve_future_empty_text() {
        assert!(resolve_future(&Fixed(Duration::hours(1)), "   ", reference()).is_none());
    }

    #[test]
    fn test_english_tomorrow() {
        let parser = EnglishDateParser::new();
        let found = resolve_future(&parser, "Tomorrow", reference()).unwrap();
        assert_eq!(found.resolved.date_naive(), reference().date_naive().succ_opt().unwrap());
        assert_eq!(found.matched, "tomorrow");
    }

    #[test]
    fn test_english_yesterday_is_not_usable() {
        let parser = EnglishDateParser::new();
        assert!(parser.parse("yesterday", reference()).is_some());
        assert!(resolve_future(&parser, "yesterday", reference()).is_none());
    }

    #[test]
    fn test_english_gibberish() {
        let parser = EnglishDateParser::new();
        assert!(parser.parse("purple elephant", reference()).is_none());
    }

    #[test]
    fn test_normalize_filler_words() {
        assert_eq!(normalize("  In 2   Days "), "2 days");
        assert_eq!(normalize("3 hours from now"), "3 hours");
        assert_eq!(normalize("in"), "");
    }

    #[test]
    fn test_push_forward_weekday() {
        let past_wednesday = reference() - Duration::hours(2);
        let moved = push_forward("wednesday", past_wednesday, reference());
        assert_eq!(moved, past_wednesday + Duration::days(7));
        assert_eq!(moved.weekday(), chrono::Weekday::Wed);
    }

    #[test]
    fn test_push_forward_clock_time() {
        let earlier_today = reference() - Duration::hours(6);
        assert_eq!(
            push_forward("9am", earlier_today, reference()),
            earlier_today + Duration::days(1)
        );
    }

    #[test]
    fn test_push_forward_leaves_anchored_and_future() {
        let earlier = reference() - Duration::hours(6);
        assert_eq!(push_forward("today 9am", earlier, reference()), earlier);
        assert_eq!(push_forward("last friday", earlier, reference()), earlier);
        let later = reference() + Duration::hours(1);
        assert_eq!(push_forward("wednesday", later, reference()), later);
    }
}
