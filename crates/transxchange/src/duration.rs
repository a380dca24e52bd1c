//! TransXChange expresses run-times and wait-times as ISO 8601 durations
//! (`PT1M30S`), unlike GTFS/ATCO-CIF's plain clock fields.

use chrono::Duration;

/// Parses a `PnYnMnDTnHnMnS`-style duration, restricted to the
/// hour/minute/second fields TransXChange actually emits.
pub fn parse_iso8601(text: &str) -> Option<Duration> {
    let text = text.trim();
    let rest = text.strip_prefix('P')?;
    let (_date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut total = Duration::zero();
    let mut number = String::new();
    for ch in time_part.chars() {
        match ch {
            '0'..='9' | '.' => number.push(ch),
            'H' => {
                total = total + Duration::hours(number.parse().ok()?);
                number.clear();
            }
            'M' => {
                total = total + Duration::minutes(number.parse().ok()?);
                number.clear();
            }
            'S' => {
                let seconds: f64 = number.parse().ok()?;
                total = total + Duration::milliseconds((seconds * 1000.0) as i64);
                number.clear();
            }
            _ => return None,
        }
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(
            parse_iso8601("PT1M30S"),
            Some(Duration::seconds(90))
        );
    }

    #[test]
    fn parses_hours_only() {
        assert_eq!(parse_iso8601("PT2H"), Some(Duration::hours(2)));
    }

    #[test]
    fn zero_duration_for_pt0s() {
        assert_eq!(parse_iso8601("PT0S"), Some(Duration::zero()));
    }
}
