//! Display timezone for notification timestamps.
//!
//! Only fixed offsets are supported: `UTC`, `GMT`, `GMT+8`, `GMT-4`.
//! Anything that does not parse falls back to UTC.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::fmt;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A fixed-offset display timezone with the label the user configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneSpec {
    label: String,
    offset: FixedOffset,
}

impl TimeZoneSpec {
    pub fn utc() -> Self {
        Self {
            label: "UTC".to_string(),
            offset: Utc.fix(),
        }
    }

    /// Parse a timezone label. Case-insensitive, surrounding whitespace ignored.
    ///
    /// The label is kept as written (upper-cased) even when the offset falls
    /// back to UTC, so messages show what was configured.
    pub fn parse(raw: &str) -> Self {
        let label = raw.trim().to_uppercase();
        if label.is_empty() {
            return Self::utc();
        }
        let offset = parse_offset(&label).unwrap_or_else(|| Self::utc().offset);
        Self { label, offset }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Render an instant as local wall time, e.g. `2024-05-01 20:00:00`.
    pub fn format(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

impl Default for TimeZoneSpec {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for TimeZoneSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn parse_offset(label: &str) -> Option<FixedOffset> {
    if label == "UTC" {
        return Some(Utc.fix());
    }
    let rest = label.strip_prefix("GMT")?;
    if rest.is_empty() {
        return Some(Utc.fix());
    }

    // "GMT4" is read as +4
    let (sign, digits) = match rest.as_bytes()[0] {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => (1, rest),
    };
    let hours: i32 = digits.parse().ok()?;
    FixedOffset::east_opt(hours.checked_mul(3600)?.checked_mul(sign)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_utc_and_gmt() {
        assert_eq!(TimeZoneSpec::parse("utc").offset().local_minus_utc(), 0);
        assert_eq!(TimeZoneSpec::parse("GMT").offset().local_minus_utc(), 0);
        assert_eq!(TimeZoneSpec::parse("GMT+8").offset().local_minus_utc(), 8 * 3600);
        assert_eq!(TimeZoneSpec::parse(" gmt-4 ").offset().local_minus_utc(), -4 * 3600);
        assert_eq!(TimeZoneSpec::parse("GMT4").offset().local_minus_utc(), 4 * 3600);
    }

    #[test]
    fn test_unparseable_falls_back_to_utc() {
        let tz = TimeZoneSpec::parse("Europe/Paris");
        assert_eq!(tz.offset().local_minus_utc(), 0);
        assert_eq!(tz.label(), "EUROPE/PARIS");

        // Out of range offsets are rejected by chrono
        assert_eq!(TimeZoneSpec::parse("GMT+30").offset().local_minus_utc(), 0);
        assert_eq!(TimeZoneSpec::parse("GMT+x").offset().local_minus_utc(), 0);
        assert_eq!(TimeZoneSpec::parse("GMT+999999999").offset().local_minus_utc(), 0);
        assert_eq!(TimeZoneSpec::parse("GMT-2147483647").offset().local_minus_utc(), 0);
        assert_eq!(TimeZoneSpec::parse("GMT+24").offset().local_minus_utc(), 0);
        assert_eq!(TimeZoneSpec::parse("").label(), "UTC");
    }

    #[test]
    fn test_format_local_time() {
        assert_eq!(TimeZoneSpec::utc().format(noon()), "2024-05-01 12:00:00");
        assert_eq!(TimeZoneSpec::parse("GMT+8").format(noon()), "2024-05-01 20:00:00");
        assert_eq!(TimeZoneSpec::parse("GMT-4").format(noon()), "2024-05-01 08:00:00");
    }
}
