use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::DateParseError;

/// Strict layouts, tried in order. Each one must consume the whole input.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.3f%:z", "%Y-%m-%dT%H:%M:%S%:z"];
const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.3f", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Year-first catch-all: any of `-/:.` between date parts, optional day,
/// optional time with optional seconds and fraction, optional offset.
static LENIENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<y>\d{4})[-/:.](?P<mo>\d{1,2})(?:[-/:.](?P<d>\d{1,2})(?:(?:T|\s+)(?P<h>\d{1,2}):(?P<mi>\d{2})(?::(?P<s>\d{2})(?:[.,](?P<f>\d{1,9}))?)?)?)?\s*(?:Z|[+-]\d{2}:?\d{2})?$",
    )
    .unwrap()
});

/// Parse a textual date as found in XMP and similar string metadata.
///
/// Offsets are accepted but dropped: the wall-clock time is returned as
/// written. Day/month order is always year-month-day.
pub fn parse_date(text: &str) -> Result<NaiveDateTime, DateParseError> {
    let s = text.trim();

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_local());
        }
    }

    for fmt in LOCAL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    if let Some(dt) = NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    parse_lenient(s).ok_or_else(|| DateParseError {
        input: text.to_string(),
    })
}

fn parse_lenient(s: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = LENIENT_RE.captures(s) {
        let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

        let year = caps.name("y")?.as_str().parse::<i32>().ok()?;
        let date = NaiveDate::from_ymd_opt(year, num("mo")?, num("d").unwrap_or(1))?;

        let nanos = match caps.name("f") {
            Some(f) => {
                let digits = f.as_str();
                let scale = 10u32.pow(9 - digits.len() as u32);
                digits.parse::<u32>().ok()? * scale
            }
            None => 0,
        };

        return date.and_hms_nano_opt(
            num("h").unwrap_or(0),
            num("mi").unwrap_or(0),
            num("s").unwrap_or(0),
            nanos,
        );
    }

    DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.naive_local())
}
