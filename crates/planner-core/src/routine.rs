//! Weekly class-routine grid parsing.
//!
//! The grid is day-major, slot-minor:
//!
//! ```text
//!            | Slot1 9:00-10:00 | Slot2 10:00-11:00 | ...
//! Monday     | CSE101 RoomA     |                   |
//!            | MAT201 RoomC     |                   |    <- continuation row
//! Tuesday    |                  | CSE220 RoomB      |
//! ```
//!
//! A day block starts at the row naming the weekday in column 0 and runs
//! until the next row naming any weekday. Blank column-0 rows belong to the
//! block above them.

use chrono::{Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Weekday names as they appear in the grid's first column.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// One scheduled class in a day block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Formatted slot label, e.g. `Slot 1 > 9:00-10:00`.
    #[serde(rename = "time")]
    pub slot_label: String,
    /// Cell text with line breaks flattened to `, `.
    pub details: String,
}

/// Full English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => WEEKDAY_NAMES[0],
        Weekday::Mon => WEEKDAY_NAMES[1],
        Weekday::Tue => WEEKDAY_NAMES[2],
        Weekday::Wed => WEEKDAY_NAMES[3],
        Weekday::Thu => WEEKDAY_NAMES[4],
        Weekday::Fri => WEEKDAY_NAMES[5],
        Weekday::Sat => WEEKDAY_NAMES[6],
    }
}

/// Parse a full weekday name, ignoring case and surrounding whitespace.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let raw = raw.trim();
    const DAYS: [Weekday; 7] = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];
    WEEKDAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(raw))
        .map(|i| DAYS[i])
}

/// The weekday right now in `tz`.
pub fn weekday_in(tz: Tz) -> Weekday {
    use chrono::Datelike;
    Utc::now().with_timezone(&tz).weekday()
}

/// Trim every cell. This is the shape fed to change detection, so cosmetic
/// whitespace edits in the sheet do not count as a routine change.
pub fn normalize_grid(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect())
        .collect()
}

/// Render a raw header cell as a slot label.
///
/// - `Slot1 9:00-10:00` → `Slot 1 > 9:00-10:00`
/// - `Slot 3` → `Slot 3 >`
/// - `Slot` → `Slot  >`
/// - `9:00` → `Slot > 9:00`
pub fn format_slot_label(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let Some(after) = strip_prefix_ignore_case(raw, "slot") else {
        return format!("Slot > {raw}");
    };

    if let Some((number, rest)) = split_slot_number(after) {
        let rest = rest.trim();
        return if rest.is_empty() {
            format!("Slot {number} >")
        } else {
            format!("Slot {number} > {rest}")
        };
    }

    // "slot" must end at a word boundary to count as the keyword.
    let at_boundary = after
        .chars()
        .next()
        .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
    if at_boundary {
        return format!("Slot {} >", after.trim());
    }

    format!("Slot > {raw}")
}

/// Classes for `day`, in grid order (row by row, slot by slot).
///
/// A weekday with no block in the grid yields an empty list.
pub fn parse_day_classes(grid: &[Vec<String>], day: Weekday) -> Vec<ClassEntry> {
    let Some(header) = grid.first() else {
        return Vec::new();
    };
    let target = weekday_name(day);

    let Some(start) = grid
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| first_cell(row).eq_ignore_ascii_case(target))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let mut classes = Vec::new();
    for (i, row) in grid.iter().enumerate().skip(start) {
        let marker = first_cell(row);
        if i > start && !marker.is_empty() && parse_weekday(marker).is_some() {
            break;
        }

        for (j, cell) in row.iter().enumerate().skip(1) {
            let info = cell.trim();
            if info.is_empty() {
                continue;
            }
            classes.push(ClassEntry {
                slot_label: format_slot_label(&slot_header(header, j)),
                details: flatten_lines(info, ", "),
            });
        }
    }

    classes
}

fn first_cell(row: &[String]) -> &str {
    row.first().map(|c| c.trim()).unwrap_or("")
}

/// Header text for column `j`; blank or missing headers fall back to `Slot <j>`.
fn slot_header(header: &[String], j: usize) -> String {
    let text = header
        .get(j)
        .map(|h| flatten_lines(h, " "))
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        format!("Slot {j}")
    } else {
        text.to_string()
    }
}

fn flatten_lines(text: &str, sep: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', sep)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

/// After the `slot` keyword: optional spaces, optional `>`, optional spaces,
/// then at least one digit. Returns the digits and what follows them.
fn split_slot_number(after: &str) -> Option<(&str, &str)> {
    let s = after.trim_start();
    let s = s.strip_prefix('>').unwrap_or(s).trim_start();
    let digits = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    Some((&s[..digits], &s[digits..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn entry(label: &str, details: &str) -> ClassEntry {
        ClassEntry {
            slot_label: label.to_string(),
            details: details.to_string(),
        }
    }

    #[test]
    fn test_format_slot_label_numbered() {
        assert_eq!(format_slot_label("Slot1 9:00-10:00"), "Slot 1 > 9:00-10:00");
        assert_eq!(format_slot_label("slot 2   10:00-11:00"), "Slot 2 > 10:00-11:00");
        assert_eq!(format_slot_label("SLOT > 4 13:00"), "Slot 4 > 13:00");
        assert_eq!(format_slot_label("Slot 3"), "Slot 3 >");
        assert_eq!(format_slot_label("Slot 12 (lab)"), "Slot 12 > (lab)");
    }

    #[test]
    fn test_format_slot_label_keyword_without_number() {
        assert_eq!(format_slot_label("Slot"), "Slot  >");
        assert_eq!(format_slot_label("slot A"), "Slot A >");
        assert_eq!(format_slot_label("Slot-B"), "Slot -B >");
    }

    #[test]
    fn test_format_slot_label_plain() {
        assert_eq!(format_slot_label("9:00"), "Slot > 9:00");
        assert_eq!(format_slot_label("Slots"), "Slot > Slots");
        assert_eq!(format_slot_label(""), "");
        assert_eq!(format_slot_label("   "), "");
    }

    #[test]
    fn test_weekday_round_trip_names() {
        assert_eq!(parse_weekday(" monday "), Some(Weekday::Mon));
        assert_eq!(parse_weekday("SATURDAY"), Some(Weekday::Sat));
        assert_eq!(parse_weekday("Mon"), None);
        assert_eq!(parse_weekday(""), None);
        assert_eq!(weekday_name(Weekday::Thu), "Thursday");
    }

    #[test]
    fn test_single_row_block() {
        let g = grid(&[
            &["", "9-10", "10-11"],
            &["Monday", "CSE101 RoomA", ""],
            &["Tuesday", "", "CSE220 RoomB"],
        ]);
        assert_eq!(
            parse_day_classes(&g, Weekday::Mon),
            vec![entry("Slot > 9-10", "CSE101 RoomA")]
        );
        assert_eq!(
            parse_day_classes(&g, Weekday::Tue),
            vec![entry("Slot > 10-11", "CSE220 RoomB")]
        );
    }

    #[test]
    fn test_block_spans_continuation_rows() {
        let g = grid(&[
            &["Day", "Slot1 9:00", "Slot2 10:00"],
            &["Sunday", "CSE101", ""],
            &["", "", "MAT201"],
            &["  ", "PHY110", "ENG102"],
            &["Monday", "CSE999", ""],
        ]);
        let classes = parse_day_classes(&g, Weekday::Sun);
        assert_eq!(
            classes,
            vec![
                entry("Slot 1 > 9:00", "CSE101"),
                entry("Slot 2 > 10:00", "MAT201"),
                entry("Slot 1 > 9:00", "PHY110"),
                entry("Slot 2 > 10:00", "ENG102"),
            ]
        );
    }

    #[test]
    fn test_block_ending_at_last_row() {
        let g = grid(&[
            &["", "9-10"],
            &["Monday", "CSE101"],
            &["Friday", "CSE300"],
            &["", "CSE301"],
        ]);
        let classes = parse_day_classes(&g, Weekday::Fri);
        assert_eq!(
            classes,
            vec![entry("Slot > 9-10", "CSE300"), entry("Slot > 9-10", "CSE301")]
        );
    }

    #[test]
    fn test_non_weekday_marker_does_not_end_block() {
        let g = grid(&[
            &["", "9-10"],
            &["Monday", "CSE101"],
            &["Lab", "CSE101L"],
            &["Tuesday", "CSE220"],
        ]);
        let classes = parse_day_classes(&g, Weekday::Mon);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[1].details, "CSE101L");
    }

    #[test]
    fn test_missing_weekday_is_empty() {
        let g = grid(&[&["", "9-10"], &["Monday", "CSE101"]]);
        for day in [
            Weekday::Sun,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ] {
            assert!(parse_day_classes(&g, day).is_empty(), "{day:?}");
        }
    }

    #[test]
    fn test_empty_and_header_only_grids() {
        assert!(parse_day_classes(&[], Weekday::Mon).is_empty());
        let g = grid(&[&["Monday", "9-10"]]);
        assert!(
            parse_day_classes(&g, Weekday::Mon).is_empty(),
            "header row is never a day block"
        );
    }

    #[test]
    fn test_newlines_in_header_and_cells() {
        let g = grid(&[
            &["", "Slot1\n9:00-10:00"],
            &["Wednesday", "CSE101\nDr. Rahman\nRoom 402"],
        ]);
        assert_eq!(
            parse_day_classes(&g, Weekday::Wed),
            vec![entry("Slot 1 > 9:00-10:00", "CSE101, Dr. Rahman, Room 402")]
        );
    }

    #[test]
    fn test_missing_or_blank_header_falls_back_to_slot_index() {
        let g = grid(&[
            &["", ""],
            &["Thursday", "CSE101", "CSE102"],
        ]);
        assert_eq!(
            parse_day_classes(&g, Weekday::Thu),
            vec![entry("Slot 1 >", "CSE101"), entry("Slot 2 >", "CSE102")]
        );
    }

    #[test]
    fn test_day_marker_is_case_insensitive_and_trimmed() {
        let g = grid(&[&["", "9-10"], &["  mOnDaY ", " CSE101 "]]);
        assert_eq!(
            parse_day_classes(&g, Weekday::Mon),
            vec![entry("Slot > 9-10", "CSE101")]
        );
    }

    #[test]
    fn test_normalize_grid_trims_cells() {
        let g = grid(&[&[" a ", "b\n"], &["", "  "]]);
        assert_eq!(normalize_grid(&g), grid(&[&["a", "b"], &["", ""]]));
    }
}
