//! Text heuristics shared by phases, consensus, and review.
//!
//! These catch the common vision-model misfilings: date or venue text in the
//! artist field, explanatory prose where a venue name belongs, and
//! inconsistent casing/whitespace across providers.

use marquee_core::ShowDate;
use regex::Regex;
use std::sync::LazyLock;

static MONTH_OR_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|jun(e)?|jul(y)?|aug(ust)?|sep(t(ember)?)?|oct(ober)?|nov(ember)?|dec(ember)?|mon(day)?|tue(s(day)?)?|wed(nesday)?|thu(rs(day)?)?|fri(day)?|sat(urday)?|sun(day)?)\b",
    )
    .expect("month/weekday regex")
});

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}[/.\-]\d{1,2}([/.\-]\d{2,4})?\b|\b\d{4}-\d{2}-\d{2}\b")
        .expect("numeric date regex")
});

static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?(?:\s+(\d{4}))?",
    )
    .expect("day-month regex")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?(?:\s+(\d{4}))?",
    )
    .expect("month-day regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("iso date regex"));

static NUMERIC_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{2,4}))?\b").expect("numeric dmy regex")
});

/// Whether a string reads like date text rather than a name.
///
/// # Examples
///
/// ```
/// use marquee_pipeline::looks_like_date;
///
/// assert!(looks_like_date("Sunday 27 January"));
/// assert!(!looks_like_date("The National"));
/// ```
pub fn looks_like_date(text: &str) -> bool {
    MONTH_OR_WEEKDAY.is_match(text) || NUMERIC_DATE.is_match(text)
}

/// Whether a string reads like an explanatory sentence rather than a name.
///
/// Venue fields occasionally come back as "The venue appears to be the Fox
/// Theatre based on the logo"; real venue names are short and don't narrate.
pub fn looks_like_prose(text: &str) -> bool {
    let word_count = text.split_whitespace().count();
    if word_count > 8 {
        return true;
    }
    let lowered = text.to_lowercase();
    ["appears to", "likely", "based on", "seems to", "the poster", "i can see"]
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Normalize a value for cross-provider comparison: collapse whitespace and
/// lowercase.
///
/// # Examples
///
/// ```
/// use marquee_pipeline::normalize_for_match;
///
/// assert_eq!(
///     normalize_for_match("  The   Tivoli "),
///     normalize_for_match("the tivoli")
/// );
/// ```
pub fn normalize_for_match(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Deduplicate a list case-insensitively, preserving order and first casing,
/// discarding empty entries.
///
/// # Examples
///
/// ```
/// use marquee_pipeline::dedup_case_insensitive;
///
/// let acts = vec![
///     "Big Thief".to_string(),
///     "".to_string(),
///     "big thief".to_string(),
///     "Wednesday".to_string(),
/// ];
/// assert_eq!(dedup_case_insensitive(acts), vec!["Big Thief", "Wednesday"]);
/// ```
pub fn dedup_case_insensitive(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn expand_year(raw: &str) -> Option<i32> {
    let parsed: i32 = raw.parse().ok()?;
    if raw.len() == 2 {
        Some(2000 + parsed)
    } else {
        Some(parsed)
    }
}

fn valid_day(day: u32) -> bool {
    (1..=31).contains(&day)
}

fn valid_month(month: u32) -> bool {
    (1..=12).contains(&month)
}

/// Tolerantly parse a show date off poster text.
///
/// The raw text is always kept. Confidence reflects how much of the date was
/// recognized: full year/month/day 0.95, month+day 0.7, nothing 0.3.
///
/// # Examples
///
/// ```
/// use marquee_pipeline::parse_show_date;
///
/// let date = parse_show_date("Fri 14 June 2024");
/// assert_eq!(date.year, Some(2024));
/// assert_eq!(date.month, Some(6));
/// assert_eq!(date.day, Some(14));
///
/// let vague = parse_show_date("New Year's Eve");
/// assert!(vague.year.is_none());
/// assert!(vague.confidence < 0.5);
/// ```
pub fn parse_show_date(raw: &str) -> ShowDate {
    let mut year = None;
    let mut month = None;
    let mut day = None;

    if let Some(caps) = ISO_DATE.captures(raw) {
        year = caps[1].parse().ok();
        month = caps[2].parse().ok().filter(|m| valid_month(*m));
        day = caps[3].parse().ok().filter(|d| valid_day(*d));
    } else if let Some(caps) = DAY_MONTH.captures(raw) {
        day = caps[1].parse().ok().filter(|d| valid_day(*d));
        month = month_number(&caps[2]);
        year = caps.get(3).and_then(|y| expand_year(y.as_str()));
    } else if let Some(caps) = MONTH_DAY.captures(raw) {
        month = month_number(&caps[1]);
        day = caps[2].parse().ok().filter(|d| valid_day(*d));
        year = caps.get(3).and_then(|y| expand_year(y.as_str()));
    } else if let Some(caps) = NUMERIC_DMY.captures(raw) {
        // Day-first convention for ambiguous numeric dates
        day = caps[1].parse().ok().filter(|d| valid_day(*d));
        month = caps[2].parse().ok().filter(|m| valid_month(*m));
        year = caps.get(3).and_then(|y| expand_year(y.as_str()));
    }

    let confidence = match (year, month, day) {
        (Some(_), Some(_), Some(_)) => 0.95,
        (None, Some(_), Some(_)) => 0.7,
        _ => 0.3,
    };

    ShowDate {
        raw: raw.trim().to_string(),
        year,
        month,
        day,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_like_text_is_detected() {
        assert!(looks_like_date("Sunday 27 January Prince of Wales"));
        assert!(looks_like_date("14/06/2024"));
        assert!(looks_like_date("2024-06-14"));
        assert!(!looks_like_date("Fontaines D.C."));
    }

    #[test]
    fn prose_is_detected() {
        assert!(looks_like_prose(
            "The venue appears to be the Fox Theatre based on the logo"
        ));
        assert!(!looks_like_prose("Fox Theatre"));
        assert!(!looks_like_prose("Prince of Wales Hotel"));
    }

    #[test]
    fn normalization_collapses_case_and_whitespace() {
        assert_eq!(normalize_for_match("  THE   Tivoli  "), "the tivoli");
    }

    #[test]
    fn parse_day_month_year() {
        let d = parse_show_date("Sunday 27 January 2019");
        assert_eq!((d.year, d.month, d.day), (Some(2019), Some(1), Some(27)));
        assert_eq!(d.confidence, 0.95);
    }

    #[test]
    fn parse_month_day_without_year() {
        let d = parse_show_date("June 14");
        assert_eq!((d.year, d.month, d.day), (None, Some(6), Some(14)));
        assert_eq!(d.confidence, 0.7);
    }

    #[test]
    fn parse_iso_date() {
        let d = parse_show_date("doors 8pm 2024-06-14");
        assert_eq!((d.year, d.month, d.day), (Some(2024), Some(6), Some(14)));
    }

    #[test]
    fn parse_numeric_day_first() {
        let d = parse_show_date("14/06/24");
        assert_eq!((d.year, d.month, d.day), (Some(2024), Some(6), Some(14)));
    }

    #[test]
    fn parse_dash_separated_day_first() {
        // Every separator looks_like_date accepts must also parse
        let d = parse_show_date("14-06-2024");
        assert_eq!((d.year, d.month, d.day), (Some(2024), Some(6), Some(14)));
    }

    #[test]
    fn unparseable_date_keeps_raw_with_low_confidence() {
        let d = parse_show_date("New Year's Eve");
        assert_eq!(d.raw, "New Year's Eve");
        assert_eq!(d.confidence, 0.3);
    }

    #[test]
    fn ordinal_suffixes_are_tolerated() {
        let d = parse_show_date("27th January");
        assert_eq!((d.month, d.day), (Some(1), Some(27)));
    }
}
