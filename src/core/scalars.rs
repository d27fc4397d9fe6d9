//! Wire formats for dates, times and decimals.
//!
//! Outputs are always `YYYY-MM-DD`, `HH:MM:SS` and base-10 decimal strings.
//! Inputs from the upstream API are accepted in the looser shapes it is known
//! to produce (RFC 3339 timestamps, decimals as JSON numbers, `null`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Parse a calendar date from `YYYY-MM-DD` or a full timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
}

/// Parse `HH:MM:SS`, optionally with fractional seconds, or `HH:MM`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Round to cents, half-even, always carrying two decimal places.
pub fn money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

pub fn format_money(amount: Decimal) -> String {
    money(amount).to_string()
}

/// Serde adapters for tolerant upstream decoding.
pub mod lenient {
    use super::{parse_date, parse_decimal, parse_time};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number_text(value: &Value) -> Option<String> {
        match value {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Decimal from a JSON string or number; `null` and `""` are absent.
    pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        match value.as_ref().and_then(number_text) {
            None => Ok(None),
            Some(text) => parse_decimal(&text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid decimal '{}'", text))),
        }
    }

    /// Integer from a JSON number or numeric string. Fractions truncate;
    /// values outside the `i64` range are rejected, not saturated.
    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let Some(text) = value.as_ref().and_then(number_text) else {
            return Ok(None);
        };
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Some(n));
        }
        let truncated = text
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid integer '{}'", text)))?
            .trunc();
        if (i64::MIN as f64..i64::MAX as f64).contains(&truncated) {
            Ok(Some(truncated as i64))
        } else {
            Err(D::Error::custom(format!("integer '{}' is out of range", text)))
        }
    }

    pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        match value.as_ref().and_then(number_text) {
            None => Ok(None),
            Some(text) => text
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number '{}'", text))),
        }
    }

    /// Free text that the upstream sometimes sends as a number.
    pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Date or timestamp. An unreadable value is treated as undated.
    pub fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.and_then(|raw| {
            let parsed = parse_date(&raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                tracing::warn!(value = %raw, "Unreadable date from upstream, treating as undated");
            }
            parsed
        }))
    }

    pub fn opt_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.and_then(|raw| parse_time(&raw)))
    }
}
