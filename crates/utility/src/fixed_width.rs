//! Byte-slice helpers for ATCO-CIF's fixed-width records, where every field
//! is a slice of a line given by `[start:end)` byte offsets.

use chrono::NaiveDate;

/// Slices `line[start..end]`, clamping `end` to the line length so short
/// trailing records (a description running to end-of-line) don't panic.
pub fn field(line: &[u8], start: usize, end: usize) -> &[u8] {
    let end = end.min(line.len());
    if start >= end {
        return &[];
    }
    &line[start..end]
}

pub fn field_str(line: &[u8], start: usize, end: usize) -> String {
    String::from_utf8_lossy(field(line, start, end)).trim().to_owned()
}

/// Parses an ATCO-CIF `YYYYMMDD` date; the literal `99999999` means "no end"
/// and is returned as `None`.
pub fn parse_date(bytes: &[u8]) -> Option<NaiveDate> {
    if bytes == b"99999999" {
        return None;
    }
    let s = std::str::from_utf8(bytes).ok()?;
    if s.len() != 8 {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses an ATCO-CIF `HHMM` time into a duration-from-midnight; hours may
/// exceed 23 for trips that run past midnight.
pub fn parse_hhmm(bytes: &[u8]) -> Option<chrono::Duration> {
    let s = std::str::from_utf8(bytes).ok()?;
    if s.len() != 4 {
        return None;
    }
    let hours: i64 = s[0..2].parse().ok()?;
    let minutes: i64 = s[2..4].parse().ok()?;
    Some(chrono::Duration::hours(hours) + chrono::Duration::minutes(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_ended_date() {
        assert_eq!(parse_date(b"99999999"), None);
    }

    #[test]
    fn parses_concrete_date() {
        assert_eq!(
            parse_date(b"20240101"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn parses_time_past_midnight() {
        let d = parse_hhmm(b"2530").unwrap();
        assert_eq!(d.num_minutes(), 25 * 60 + 30);
    }
}
