//! Timestamp rendering for the `timestamp` column.
//!
//! Layouts are written against the reference time `Mon Jan 2 15:04:05 MST
//! 2006`, so `2006-01-02 15:04:05` means `YYYY-MM-DD hh:mm:ss`. They are
//! translated to strftime once, when the formatter is built. A layout that
//! already contains `%` is used as a strftime pattern as-is.

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use prom_api::Timestamp;

use crate::ExportError;

/// Layout value selecting the raw seconds form.
pub const RAW_LAYOUT: &str = "-";

/// Reference-time tokens and their strftime equivalents. Longer tokens come
/// before their prefixes.
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("Z07:00", "%:z"),
    ("Z0700", "%z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Zone {
    #[default]
    Local,
    Utc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimestampFormatter {
    /// Seconds since the epoch, e.g. `1435781451.781`
    Raw,
    /// Calendar time rendered with a validated strftime pattern
    Pattern { strftime: String, zone: Zone },
}

impl TimestampFormatter {
    /// Build a formatter from a layout; empty or `-` selects [`TimestampFormatter::Raw`].
    pub fn new(layout: &str, zone: Zone) -> Result<Self, ExportError> {
        if layout.is_empty() || layout == RAW_LAYOUT {
            return Ok(TimestampFormatter::Raw);
        }

        let strftime = if layout.contains('%') {
            layout.to_string()
        } else {
            translate_layout(layout)
        };

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(ExportError::InvalidDateFormat(layout.to_string()));
        }

        Ok(TimestampFormatter::Pattern { strftime, zone })
    }

    pub fn format(&self, timestamp: Timestamp) -> String {
        let TimestampFormatter::Pattern { strftime, zone } = self else {
            return timestamp.to_string();
        };

        // Out of calendar range: fall back to seconds
        let Some(utc) = timestamp.to_datetime() else {
            return timestamp.to_string();
        };

        match zone {
            Zone::Utc => utc.format(strftime).to_string(),
            Zone::Local => utc.with_timezone(&Local).format(strftime).to_string(),
        }
    }
}

/// Translate a reference-time layout into a strftime pattern. Layouts
/// containing `%` never get here.
fn translate_layout(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    while let Some(ch) = rest.chars().next() {
        let token = LAYOUT_TOKENS
            .iter()
            .find_map(|(token, directive)| rest.strip_prefix(token).map(|tail| (tail, *directive)));

        if let Some((tail, directive)) = token {
            out.push_str(directive);
            rest = tail;
            continue;
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(layout: &str) -> TimestampFormatter {
        TimestampFormatter::new(layout, Zone::Utc).unwrap()
    }

    #[test]
    fn default_layout_translates_to_iso_like_pattern() {
        assert_eq!(translate_layout("2006-01-02 15:04:05"), "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn default_layout_one_second_after_epoch() {
        let formatter = utc("2006-01-02 15:04:05");
        assert_eq!(
            formatter.format(Timestamp::from_millis(1000)),
            "1970-01-01 00:00:01"
        );
    }

    #[test]
    fn raw_layouts() {
        for layout in ["-", ""] {
            let formatter = TimestampFormatter::new(layout, Zone::Local).unwrap();
            assert_eq!(formatter, TimestampFormatter::Raw);
            assert_eq!(formatter.format(Timestamp::from_millis(1000)), "1");
            assert_eq!(
                formatter.format(Timestamp::from_millis(1_435_781_451_781)),
                "1435781451.781"
            );
        }
    }

    #[test]
    fn names_and_fractions() {
        let formatter = utc("Mon, 02 Jan 2006 15:04:05.000 MST");
        assert_eq!(
            formatter.format(Timestamp::from_millis(1_435_781_451_781)),
            "Wed, 01 Jul 2015 20:10:51.781 UTC"
        );
    }

    #[test]
    fn twelve_hour_clock_and_unpadded_fields() {
        let formatter = utc("1/2/06 3:04PM");
        assert_eq!(
            formatter.format(Timestamp::from_millis(1_435_781_451_781)),
            "7/1/15 8:10PM"
        );
    }

    #[test]
    fn strftime_patterns_pass_through() {
        let formatter = utc("%Y%m%dT%H%M%S");
        assert_eq!(
            formatter.format(Timestamp::from_millis(86_400_000)),
            "19700102T000000"
        );
    }

    #[test]
    fn invalid_strftime_is_rejected() {
        let err = TimestampFormatter::new("%Y-%Q", Zone::Utc).unwrap_err();
        assert!(matches!(err, ExportError::InvalidDateFormat(_)));
    }

    #[test]
    fn out_of_range_falls_back_to_seconds() {
        let formatter = utc("2006");
        assert_eq!(formatter.format(Timestamp::from_millis(i64::MAX)), Timestamp::from_millis(i64::MAX).to_string());
    }

    #[test]
    fn local_zone_uses_local_offset() {
        let formatter = TimestampFormatter::new("2006-01-02 15:04:05 -0700", Zone::Local).unwrap();
        let expected = chrono::DateTime::from_timestamp(1_700_000_000, 0)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string();
        assert_eq!(formatter.format(Timestamp::from_millis(1_700_000_000_000)), expected);
    }
}
