//! Recurrence engine for chore schedules.
//!
//! Converts between a structured [`RecurrenceConfig`] and the RRULE text
//! encoding (RFC 5545, as parsed by the rrule crate), and projects future
//! occurrences from a rule. Pure functions, no I/O.

use chrono::{Duration, NaiveDate, Utc, Weekday};
use rrule::{Frequency, NWeekday, RRuleSet};
use serde::{Deserialize, Serialize};

/// RRULE BYDAY tokens, indexed 0=Monday..6=Sunday.
const BYDAY_TOKENS: [&str; 7] = ["MO", "TU", "WE", "TH", "FR", "SA", "SU"];

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// How a chore repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

/// Structured recurrence intent, convertible to and from RRULE text.
///
/// `weekday` uses the rule encoding's numbering: 0=Monday..6=Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    pub kind: RecurrenceKind,
    pub weekday: Option<u8>,
    pub monthday: Option<u8>,
}

/// Map a chrono weekday to the rule encoding's 0=Monday..6=Sunday index.
pub fn weekday_to_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_monday() as u8
}

/// Inverse of [`weekday_to_index`]; `None` for out-of-range input.
pub fn index_to_weekday(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Build RRULE text for a config, anchored at `anchor` (the first due date).
///
/// Returns `None` for [`RecurrenceKind::None`]. The anchor is encoded as the
/// rule's DTSTART so interval-based rules (biweekly) stay aligned to it.
pub fn generate_rrule(config: &RecurrenceConfig, anchor: NaiveDate) -> Option<String> {
    let mut parts = match config.kind {
        RecurrenceKind::None => return None,
        RecurrenceKind::Daily => vec!["FREQ=DAILY".to_string()],
        RecurrenceKind::Weekly => vec!["FREQ=WEEKLY".to_string()],
        RecurrenceKind::Biweekly => vec!["FREQ=WEEKLY".to_string(), "INTERVAL=2".to_string()],
        RecurrenceKind::Monthly => vec!["FREQ=MONTHLY".to_string()],
    };

    match config.kind {
        RecurrenceKind::Weekly | RecurrenceKind::Biweekly => {
            if let Some(token) = config.weekday.map(usize::from).and_then(|i| BYDAY_TOKENS.get(i)) {
                parts.push(format!("BYDAY={token}"));
            }
        }
        RecurrenceKind::Monthly => {
            if let Some(day) = config.monthday.filter(|d| (1..=31).contains(d)) {
                parts.push(format!("BYMONTHDAY={day}"));
            }
        }
        _ => {}
    }

    Some(format!(
        "DTSTART:{}T000000Z\nRRULE:{}",
        anchor.format("%Y%m%d"),
        parts.join(";")
    ))
}

/// Parse rule text back into a [`RecurrenceConfig`].
///
/// Unparseable or null input yields the `None` kind; this never errors, so
/// garbage persisted by older clients degrades to "no recurrence" rather
/// than breaking chore screens.
pub fn parse_rrule_config(rule: Option<&str>) -> RecurrenceConfig {
    let Some(set) = parse_rule_set(rule) else {
        return RecurrenceConfig::default();
    };
    let Some(rrule) = set.get_rrule().first() else {
        return RecurrenceConfig::default();
    };

    let weekday = rrule.get_by_weekday().iter().find_map(|day| match day {
        NWeekday::Every(wd) => Some(weekday_to_index(*wd)),
        NWeekday::Nth(_, _) => None,
    });
    let monthday = rrule
        .get_by_month_day()
        .iter()
        .find(|d| **d > 0)
        .map(|d| *d as u8);

    match rrule.get_freq() {
        Frequency::Daily => RecurrenceConfig {
            kind: RecurrenceKind::Daily,
            ..Default::default()
        },
        Frequency::Weekly if rrule.get_interval() == 2 => RecurrenceConfig {
            kind: RecurrenceKind::Biweekly,
            weekday,
            monthday: None,
        },
        Frequency::Weekly => RecurrenceConfig {
            kind: RecurrenceKind::Weekly,
            weekday,
            monthday: None,
        },
        Frequency::Monthly => RecurrenceConfig {
            kind: RecurrenceKind::Monthly,
            weekday: None,
            monthday,
        },
        // Anything else (yearly, hourly, multi-day BYDAY sets) is outside
        // the structured config space
        _ => RecurrenceConfig::default(),
    }
}

/// Human-readable description of a rule: "one time" for null, a generic
/// fallback for rules outside the structured config space.
pub fn describe_rrule(rule: Option<&str>) -> String {
    let Some(rule) = rule else {
        return "one time".to_string();
    };

    let config = parse_rrule_config(Some(rule));
    let on_weekday = |weekday: Option<u8>| {
        weekday
            .map(usize::from)
            .and_then(|i| WEEKDAY_NAMES.get(i))
            .map(|name| format!(" on {name}"))
            .unwrap_or_default()
    };

    match config.kind {
        RecurrenceKind::None => "custom recurrence".to_string(),
        RecurrenceKind::Daily => "every day".to_string(),
        RecurrenceKind::Weekly => format!("every week{}", on_weekday(config.weekday)),
        RecurrenceKind::Biweekly => format!("every 2 weeks{}", on_weekday(config.weekday)),
        RecurrenceKind::Monthly => match config.monthday {
            Some(day) => format!("every month on the {}", ordinal(day)),
            None => "every month".to_string(),
        },
    }
}

/// First occurrence strictly after `after`, if any.
pub fn next_occurrence(rule: Option<&str>, after: NaiveDate) -> Option<NaiveDate> {
    next_occurrences(rule, after, 1).into_iter().next()
}

/// Up to `count` occurrences strictly after `after`, ascending. Empty for
/// null or unparseable rules.
pub fn next_occurrences(rule: Option<&str>, after: NaiveDate, count: u16) -> Vec<NaiveDate> {
    let Some(set) = parse_rule_set(rule) else {
        return Vec::new();
    };

    // Nudge past midnight so an occurrence on `after` itself is excluded,
    // regardless of whether the iterator treats the bound as inclusive
    let tz: rrule::Tz = Utc.into();
    let cutoff = (after.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc()
        + Duration::seconds(1))
    .with_timezone(&tz);

    set.after(cutoff)
        .all(count)
        .dates
        .into_iter()
        .map(|dt| dt.date_naive())
        .collect()
}

fn parse_rule_set(rule: Option<&str>) -> Option<RRuleSet> {
    let rule = rule?.trim();
    if rule.is_empty() {
        return None;
    }

    // Rules we generate carry DTSTART; rules mirrored from provider events
    // may be a bare RRULE line or property value. Normalize before parsing.
    let mut text = String::new();
    if !rule.contains("DTSTART") {
        text.push_str("DTSTART:19700105T000000Z\n");
    }
    if rule.starts_with("FREQ=") {
        text.push_str("RRULE:");
    }
    text.push_str(rule);

    text.parse().ok()
}

fn ordinal(day: u8) -> String {
    let suffix = match (day % 10, day % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday_index_roundtrip() {
        for i in 0..7u8 {
            let weekday = index_to_weekday(i).unwrap();
            assert_eq!(weekday_to_index(weekday), i);
        }
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(index_to_weekday(weekday_to_index(weekday)), Some(weekday));
        }
        assert_eq!(index_to_weekday(7), None);
    }

    #[test]
    fn test_generate_none_is_null() {
        let config = RecurrenceConfig::default();
        assert_eq!(generate_rrule(&config, date(2025, 1, 6)), None);
    }

    #[test]
    fn test_generate_biweekly_markers() {
        let config = RecurrenceConfig {
            kind: RecurrenceKind::Biweekly,
            weekday: Some(0),
            monthday: None,
        };
        let rule = generate_rrule(&config, date(2025, 1, 6)).unwrap();

        assert!(rule.contains("FREQ=WEEKLY"));
        assert!(rule.contains("INTERVAL=2"));
        assert!(rule.contains("BYDAY=MO"));
        assert!(rule.contains("DTSTART:20250106"));
    }

    #[test]
    fn test_generate_monthly_monthday() {
        let config = RecurrenceConfig {
            kind: RecurrenceKind::Monthly,
            weekday: None,
            monthday: Some(15),
        };
        let rule = generate_rrule(&config, date(2025, 1, 15)).unwrap();

        assert!(rule.contains("FREQ=MONTHLY"));
        assert!(rule.contains("BYMONTHDAY=15"));
    }

    #[test]
    fn test_config_roundtrip() {
        let configs = [
            RecurrenceConfig {
                kind: RecurrenceKind::Daily,
                ..Default::default()
            },
            RecurrenceConfig {
                kind: RecurrenceKind::Weekly,
                weekday: Some(3),
                monthday: None,
            },
            RecurrenceConfig {
                kind: RecurrenceKind::Biweekly,
                weekday: Some(6),
                monthday: None,
            },
            RecurrenceConfig {
                kind: RecurrenceKind::Monthly,
                weekday: None,
                monthday: Some(28),
            },
        ];

        for config in configs {
            let rule = generate_rrule(&config, date(2025, 3, 1)).unwrap();
            assert_eq!(parse_rrule_config(Some(&rule)), config, "rule: {rule}");
        }
    }

    #[test]
    fn test_parse_null_and_garbage_yield_none_kind() {
        assert_eq!(parse_rrule_config(None).kind, RecurrenceKind::None);
        assert_eq!(
            parse_rrule_config(Some("garbage")).kind,
            RecurrenceKind::None
        );
        assert_eq!(parse_rrule_config(Some("")).kind, RecurrenceKind::None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe_rrule(None), "one time");
        assert_eq!(describe_rrule(Some("garbage")), "custom recurrence");

        let weekly = generate_rrule(
            &RecurrenceConfig {
                kind: RecurrenceKind::Weekly,
                weekday: Some(0),
                monthday: None,
            },
            date(2025, 1, 6),
        )
        .unwrap();
        assert_eq!(describe_rrule(Some(&weekly)), "every week on Monday");

        let monthly = generate_rrule(
            &RecurrenceConfig {
                kind: RecurrenceKind::Monthly,
                weekday: None,
                monthday: Some(3),
            },
            date(2025, 1, 3),
        )
        .unwrap();
        assert_eq!(describe_rrule(Some(&monthly)), "every month on the 3rd");
    }

    #[test]
    fn test_next_occurrences_daily() {
        let rule = generate_rrule(
            &RecurrenceConfig {
                kind: RecurrenceKind::Daily,
                ..Default::default()
            },
            date(2025, 1, 1),
        )
        .unwrap();

        let after = date(2025, 1, 10);
        let dates = next_occurrences(Some(&rule), after, 5);

        assert_eq!(dates.len(), 5);
        for (i, d) in dates.iter().enumerate() {
            assert!(*d > after);
            assert_eq!(*d, date(2025, 1, 11 + i as u32));
        }
    }

    #[test]
    fn test_next_occurrence_weekly_monday() {
        // Completing on a Monday rolls to the following Monday
        let rule = generate_rrule(
            &RecurrenceConfig {
                kind: RecurrenceKind::Weekly,
                weekday: Some(0),
                monthday: None,
            },
            date(2025, 1, 6),
        )
        .unwrap();

        let completed_on = date(2025, 1, 13); // a Monday
        assert_eq!(
            next_occurrence(Some(&rule), completed_on),
            Some(date(2025, 1, 20))
        );
    }

    #[test]
    fn test_next_occurrence_biweekly_stays_anchored() {
        let rule = generate_rrule(
            &RecurrenceConfig {
                kind: RecurrenceKind::Biweekly,
                weekday: Some(0),
                monthday: None,
            },
            date(2025, 1, 6),
        )
        .unwrap();

        // Anchor Jan 6; next on-pattern date after Jan 7 is Jan 20, not Jan 13
        assert_eq!(
            next_occurrence(Some(&rule), date(2025, 1, 7)),
            Some(date(2025, 1, 20))
        );
    }

    #[test]
    fn test_next_occurrence_null_or_garbage() {
        assert_eq!(next_occurrence(None, date(2025, 1, 1)), None);
        assert_eq!(next_occurrence(Some("garbage"), date(2025, 1, 1)), None);
        assert!(next_occurrences(Some("garbage"), date(2025, 1, 1), 5).is_empty());
    }

    #[test]
    fn test_bare_rrule_value_parses() {
        // Provider events store rules without DTSTART
        let config = parse_rrule_config(Some("FREQ=WEEKLY;BYDAY=MO"));
        assert_eq!(config.kind, RecurrenceKind::Weekly);
        assert_eq!(config.weekday, Some(0));

        let config = parse_rrule_config(Some("RRULE:FREQ=DAILY"));
        assert_eq!(config.kind, RecurrenceKind::Daily);
    }
}
