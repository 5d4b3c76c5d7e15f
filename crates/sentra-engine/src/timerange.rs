use crate::error::{EngineError, Result};
use chrono::{DateTime, Duration, Utc};

/// A point in time expressed relative to the evaluation instant: the literal
/// `"now"`, `"now-<duration>"`, or a bare duration meaning that far back from
/// now (`"5m"` is equivalent to `"now-5m"`). The raw string is kept so a
/// condition can reproduce its configuration exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeTime {
    raw: String,
    offset_secs: i64,
}

impl RelativeTime {
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || EngineError::Validation(format!("invalid time expression '{s}'"));

        let offset_secs = if s == "now" {
            0
        } else if let Some(rest) = s.strip_prefix("now-") {
            parse_duration_secs(rest).ok_or_else(invalid)?
        } else {
            let (negated, body) = match s.strip_prefix('-') {
                Some(body) => (true, body),
                None => (false, s),
            };
            let secs = parse_duration_secs(body).ok_or_else(invalid)?;
            if negated {
                -secs
            } else {
                secs
            }
        };

        Ok(Self {
            raw: s.to_string(),
            offset_secs,
        })
    }

    /// The expression as it appeared in the configuration.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::seconds(self.offset_secs)
    }
}

/// The time span one query part covers, resolved against the evaluation
/// context's `now` when the query is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub from: RelativeTime,
    pub to: RelativeTime,
}

impl TimeRange {
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            from: RelativeTime::parse(from)?,
            to: RelativeTime::parse(to)?,
        })
    }

    /// Resolve to `(from, to)` epoch-millisecond bounds.
    pub fn absolute_ms(&self, now: DateTime<Utc>) -> (i64, i64) {
        (
            self.from.resolve(now).timestamp_millis(),
            self.to.resolve(now).timestamp_millis(),
        )
    }
}

/// Parse compound durations like `"30m"`, `"1h"`, `"2h30m"` into seconds.
fn parse_duration_secs(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    let mut total_secs: i64 = 0;
    let mut num_buf = String::new();
    let mut has_unit = false;

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
        } else {
            let n: i64 = num_buf.parse().ok()?;
            num_buf.clear();
            match ch {
                's' => total_secs += n,
                'm' => total_secs += n * 60,
                'h' => total_secs += n * 3600,
                'd' => total_secs += n * 86400,
                _ => return None,
            }
            has_unit = true;
        }
    }

    if !num_buf.is_empty() {
        // Trailing digits with no unit
        return None;
    }

    has_unit.then_some(total_secs)
}
