use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

static WIRE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$").unwrap());

static WIRE_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?$").unwrap());

/// Parse the webhook's `DD/MM/YY` (or `DD/MM/YYYY`) date plus `HH:MM[:SS]`
/// time into a single UTC instant. Two-digit years are normalized to `20YY`.
/// An empty time means midnight; any malformed component yields `None`.
pub fn parse_wire_timestamp(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let caps = WIRE_DATE_RE.captures(date.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year_raw = &caps[3];
    let year: i32 = if year_raw.len() == 2 {
        2000 + year_raw.parse::<i32>().ok()?
    } else {
        year_raw.parse().ok()?
    };
    let d = NaiveDate::from_ymd_opt(year, month, day)?;

    let t = if time.trim().is_empty() {
        NaiveTime::from_hms_opt(0, 0, 0)?
    } else {
        let tc = WIRE_TIME_RE.captures(time.trim())?;
        let hh: u32 = tc[1].parse().ok()?;
        let mm: u32 = tc[2].parse().ok()?;
        let ss: u32 = tc.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
        NaiveTime::from_hms_opt(hh, mm, ss)?
    };

    Some(Utc.from_utc_datetime(&d.and_time(t)))
}

/// Month key (`YYYY-MM`) from either an ISO date (`YYYY-MM-...`) or the
/// wire `DD/MM/YY(YY)` format. `None` for anything unrecognizable.
pub fn month_key(date: &str) -> Option<String> {
    let date = date.trim();
    if date.contains('-') {
        let mut it = date.split('-');
        let y = it.next()?;
        let m = it.next()?;
        if y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()) && !m.is_empty() {
            let m2: u32 = m.get(..2.min(m.len()))?.parse().ok()?;
            if (1..=12).contains(&m2) {
                return Some(format!("{y}-{m2:02}"));
            }
        }
        return None;
    }
    if date.contains('/') {
        let caps = WIRE_DATE_RE.captures(date)?;
        let month: u32 = caps[2].parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let year_raw = &caps[3];
        let year = if year_raw.len() == 2 {
            format!("20{year_raw}")
        } else {
            year_raw.to_string()
        };
        return Some(format!("{year}-{month:02}"));
    }
    None
}

/// `YYYY-MM` -> `MM/YYYY` for display and export.
pub fn format_month_label(month_key: &str) -> String {
    match month_key.split_once('-') {
        Some((y, m)) if !y.is_empty() && !m.is_empty() => format!("{m}/{y}"),
        _ => month_key.to_string(),
    }
}

/// Currency display: 6 to 8 fractional digits, trailing zeros beyond the
/// sixth trimmed. Rounding happens only here, never at calculation time.
pub fn format_currency(v: f64) -> String {
    let mut s = format!("{v:.8}");
    for _ in 0..2 {
        if s.ends_with('0') {
            s.pop();
        }
    }
    format!("US$ {s}")
}

pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}

/// Default location for exported workbooks: the user's home directory, or
/// the current directory when no home can be determined.
pub fn default_export_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_two_digit_year_and_time() {
        let ts = parse_wire_timestamp("15/03/25", "14:30:05").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-03-15T14:30:05+00:00");
    }

    #[test]
    fn parses_four_digit_year_and_defaults_midnight() {
        let ts = parse_wire_timestamp("01/06/2025", "").unwrap();
        assert_eq!(ts.hour(), 0);
        assert_eq!(ts.to_rfc3339(), "2025-06-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_wire_timestamp("2025-03-15", "10:00:00").is_none());
        assert!(parse_wire_timestamp("32/01/25", "10:00:00").is_none());
        assert!(parse_wire_timestamp("15/13/25", "10:00:00").is_none());
        assert!(parse_wire_timestamp("", "").is_none());
        assert!(parse_wire_timestamp("15/03/25", "25:00:00").is_none());
    }

    #[test]
    fn month_keys_from_both_formats() {
        assert_eq!(month_key("15/03/25").as_deref(), Some("2025-03"));
        assert_eq!(month_key("01/12/2024").as_deref(), Some("2024-12"));
        assert_eq!(month_key("2025-03-15").as_deref(), Some("2025-03"));
        assert_eq!(month_key(""), None);
        assert_eq!(month_key("garbage"), None);
    }

    #[test]
    fn currency_keeps_six_to_eight_digits() {
        assert_eq!(format_currency(0.12), "US$ 0.120000");
        assert_eq!(format_currency(0.12345678), "US$ 0.12345678");
        assert_eq!(format_currency(0.1234567), "US$ 0.1234567");
    }

    #[test]
    fn month_label_flips_key() {
        assert_eq!(format_month_label("2025-03"), "03/2025");
        assert_eq!(format_month_label("unknown"), "unknown");
    }
}
