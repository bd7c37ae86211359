//! Date normalization for spreadsheet cells.
//!
//! Sheets hand back dates in whatever shape the person typing them chose:
//! ISO, `M/D/YYYY`, `D/M/YYYY`, `20 Feb 2026`, or a full timestamp. Every
//! comparison downstream works on the canonical `YYYY-MM-DD` form.
//!
//! Slash dates are disambiguated by magnitude only: a first field above 12
//! must be the day. When both fields are 12 or below the cell is read as
//! month/day, which is wrong for day/month sheets such as `02/03/2026`
//! meaning 2 March. There is no way to tell from the cell alone.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Date-only shapes tried by the generic fallback, in order.
const GENERIC_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%a, %d %b %Y",
    "%A, %B %d, %Y",
    "%a %b %d %Y",
];

/// Date-time shapes tried by the generic fallback; only the date part is kept.
const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Normalize a raw cell to `YYYY-MM-DD`, or `""` when it is not a date.
///
/// Never fails. The result is always either a valid calendar date or empty.
pub fn normalize_date(raw: &str) -> String {
    parse_sheet_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Parse a raw cell into a calendar date.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if is_iso_shape(raw) {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
    }

    if let Some(date) = parse_slash_date(raw) {
        return Some(date);
    }

    parse_generic(raw)
}

/// Render a raw cell as `20 Feb 2026`, or the trimmed cell when unparseable.
pub fn format_display_date(raw: &str) -> String {
    match parse_sheet_date(raw) {
        Some(date) => date.format("%d %b %Y").to_string(),
        None => raw.trim().to_string(),
    }
}

/// `NNNN-NN-NN` exactly.
fn is_iso_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// `A/B/YYYY` with one- or two-digit `A` and `B`.
fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let (first, second, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let short_field = |p: &str| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit());
    if !short_field(first) || !short_field(second) {
        return None;
    }
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let year: i32 = year.parse().ok()?;

    let (month, day) = if first > 12 {
        (second, first)
    } else {
        (first, second)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Years outside this window are misreads (e.g. `1/2/26` as year 1).
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

fn parse_generic(s: &str) -> Option<NaiveDate> {
    parse_generic_unchecked(s).filter(|d| PLAUSIBLE_YEARS.contains(&d.year()))
}

fn parse_generic_unchecked(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    GENERIC_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            GENERIC_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_passes_through() {
        assert_eq!(normalize_date("2026-02-20"), "2026-02-20");
        assert_eq!(normalize_date("  2026-02-20 "), "2026-02-20");
    }

    #[test]
    fn test_slash_first_field_over_twelve_is_day() {
        assert_eq!(normalize_date("13/02/2026"), "2026-02-13");
        assert_eq!(normalize_date("31/1/2026"), "2026-01-31");
    }

    #[test]
    fn test_slash_second_field_over_twelve_is_day() {
        assert_eq!(normalize_date("2/20/2026"), "2026-02-20");
    }

    #[test]
    fn test_slash_ambiguous_assumes_month_first() {
        assert_eq!(normalize_date("02/03/2026"), "2026-02-03");
        assert_eq!(normalize_date("12/11/2026"), "2026-12-11");
    }

    #[test]
    fn test_slash_pads_single_digits() {
        assert_eq!(normalize_date("1/5/2026"), "2026-01-05");
    }

    #[test]
    fn test_generic_named_month_forms() {
        assert_eq!(normalize_date("20 Feb 2026"), "2026-02-20");
        assert_eq!(normalize_date("Feb 20, 2026"), "2026-02-20");
        assert_eq!(normalize_date("February 20, 2026"), "2026-02-20");
        assert_eq!(normalize_date("2026/02/20"), "2026-02-20");
    }

    #[test]
    fn test_generic_datetime_keeps_date() {
        assert_eq!(normalize_date("2026-02-20T10:30:00Z"), "2026-02-20");
        assert_eq!(normalize_date("2026-02-20 10:30"), "2026-02-20");
    }

    #[test]
    fn test_unparseable_is_empty() {
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
        assert_eq!(normalize_date("tomorrow"), "");
        assert_eq!(normalize_date("TBD"), "");
    }

    #[test]
    fn test_never_partially_parsed() {
        // Right shape, impossible values.
        assert_eq!(normalize_date("2026-13-45"), "");
        assert_eq!(normalize_date("13/13/2026"), "");
        assert_eq!(normalize_date("2/30/2026"), "");
        assert_eq!(normalize_date("1/2/26"), "");
    }

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date("2/20/2026"), "20 Feb 2026");
        assert_eq!(format_display_date("2026-03-05"), "05 Mar 2026");
        assert_eq!(format_display_date("  someday "), "someday");
    }
}
