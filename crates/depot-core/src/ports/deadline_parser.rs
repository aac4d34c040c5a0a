//! DeadlineParser port - retention-expression resolution.
//!
//! The production natural-language parser is an external collaborator; the
//! core consumes it as a pure function of `(expression, now)`. Two
//! implementations ship here: a small built-in parser good enough for
//! development, and a fixed test double.

use chrono::{DateTime, Duration, Utc};

/// Resolve a retention expression to an absolute instant.
///
/// The `Err` carries a human-readable reason; the retention manager maps it
/// to `InvalidDeadline`.
pub trait DeadlineParser: Send + Sync {
    fn parse(&self, expression: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String>;
}

/// Built-in parser: RFC 3339 timestamps, or relative forms such as
/// `in 3 days`, `2 hours`, `90 minutes`, `1 week`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleDeadlineParser;

impl DeadlineParser for SimpleDeadlineParser {
    fn parse(&self, expression: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        let text = expression.trim();
        if text.is_empty() {
            return Err("empty retention expression".to_string());
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Ok(ts.with_timezone(&Utc));
        }

        let rest = text.strip_prefix("in ").unwrap_or(text);
        let mut parts = rest.split_whitespace();

        let amount: i64 = parts
            .next()
            .ok_or_else(|| format!("cannot parse '{text}'"))?
            .parse()
            .map_err(|_| format!("cannot parse '{text}'"))?;
        let unit = parts.next().ok_or_else(|| format!("missing unit in '{text}'"))?;
        if parts.next().is_some() {
            return Err(format!("trailing input in '{text}'"));
        }

        let delta = match unit.trim_end_matches('s') {
            "minute" | "min" => Duration::minutes(amount),
            "hour" => Duration::hours(amount),
            "day" => Duration::days(amount),
            "week" => Duration::weeks(amount),
            other => return Err(format!("unknown unit '{other}'")),
        };

        Ok(now + delta)
    }
}

/// Test double: resolves every expression to a preset instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedDeadlineParser(pub DateTime<Utc>);

impl DeadlineParser for FixedDeadlineParser {
    fn parse(&self, _expression: &str, _now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        Ok(self.0)
    }
}
