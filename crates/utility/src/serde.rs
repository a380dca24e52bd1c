pub mod date_time {
    use core::fmt;

    use chrono::NaiveDate;
    use serde::de::{self, Error, Unexpected, Visitor};
    use serde::Deserializer;

    /// Deserializes a GTFS-style `YYYYMMDD` date string.
    pub fn deserialize_yyyymmdd<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DateVisitor;

        impl<'de> Visitor<'de> for DateVisitor {
            type Value = NaiveDate;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string in the format YYYYMMDD")
            }

            fn visit_str<E>(self, value: &str) -> Result<NaiveDate, E>
            where
                E: de::Error,
            {
                NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| {
                    de::Error::invalid_value(Unexpected::Str(value), &self)
                })
            }
        }

        deserializer.deserialize_str(DateVisitor)
    }
}

pub mod duration {
    use chrono::Duration;
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes a duration-from-midnight as `hh:mm:ss`; `hh` may exceed 23
    /// for trips that run past midnight.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.num_seconds();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }

    pub fn parse_duration(s: &str) -> Option<Duration> {
        let mut parts = s.splitn(3, ':');
        let hours: i64 = parts.next()?.parse().ok()?;
        let minutes: i64 = parts.next()?.parse().ok()?;
        let seconds: i64 = parts.next()?.parse().ok()?;
        Some(Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).ok_or_else(|| D::Error::custom("expected hh:mm:ss"))
    }

    pub fn serialize_option<S>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize_option<'de, D>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            Some(s) if !s.is_empty() => parse_duration(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom("expected hh:mm:ss")),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::duration::*;
    use chrono::Duration;

    #[test]
    fn formats_times_past_midnight() {
        assert_eq!(format_duration(Duration::minutes(25 * 60 + 5)), "25:05:00");
    }

    #[test]
    fn round_trips_hh_mm_ss() {
        let d = Duration::hours(8) + Duration::minutes(30);
        assert_eq!(parse_duration(&format_duration(d)), Some(d));
    }
}
