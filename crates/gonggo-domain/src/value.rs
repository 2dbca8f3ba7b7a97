//! Typed field values and their conversion rules
//!
//! Values arrive from two places: the rule engine, which builds them from
//! regex captures, and language models, which return loosely typed JSON.
//! [`FieldValue::coerce`] is the single strict gate for the latter.

use crate::field::ValueKind;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// Multipliers for Korean magnitude words
const UNIT_EOK: f64 = 100_000_000.0;
const UNIT_CHEONMAN: f64 = 10_000_000.0;
const UNIT_BAEKMAN: f64 = 1_000_000.0;
const UNIT_MAN: f64 = 10_000.0;

/// Largest amount accepted (one quadrillion won)
const MAX_AMOUNT_WON: f64 = 1.0e15;

/// A typed value for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Calendar date
    Date(NaiveDate),
    /// Amount in won
    Amount(u64),
    /// Whole number
    Integer(i64),
    /// Percentage
    Percent(f64),
    /// Free text
    Text(String),
    /// Tag list
    List(Vec<String>),
}

impl FieldValue {
    /// The kind this value carries
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Date(_) => ValueKind::Date,
            FieldValue::Amount(_) => ValueKind::Amount,
            FieldValue::Integer(_) => ValueKind::Integer,
            FieldValue::Percent(_) => ValueKind::Percent,
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::List(_) => ValueKind::List,
        }
    }

    /// Convert a model-provided JSON value into a typed value of `kind`
    ///
    /// Returns `None` for JSON null, the literal string "null", empty
    /// strings and lists, and anything that does not fit the kind.
    pub fn coerce(kind: ValueKind, raw: &Value) -> Option<FieldValue> {
        if is_null_like(raw) {
            return None;
        }

        match kind {
            ValueKind::Date => raw.as_str().and_then(parse_date_text).map(FieldValue::Date),
            ValueKind::Amount => coerce_amount(raw).map(FieldValue::Amount),
            ValueKind::Integer => coerce_integer(raw).map(FieldValue::Integer),
            ValueKind::Percent => coerce_percent(raw).map(FieldValue::Percent),
            ValueKind::Text => coerce_text(raw).map(FieldValue::Text),
            ValueKind::List => coerce_list(raw).map(FieldValue::List),
        }
    }

    /// Human-readable rendering
    pub fn display(&self) -> String {
        match self {
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Amount(won) => format!("{}원", group_thousands(*won)),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Percent(p) => format!("{}%", p),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

/// Convert a decimal number and a Korean magnitude word to won
///
/// Recognised units: `억`, `천만`, `백만`, `만`. Any other unit yields
/// `None`, as do zero, negative and unparsable numbers.
///
/// # Examples
///
/// ```
/// use gonggo_domain::value::parse_budget_to_won;
///
/// assert_eq!(parse_budget_to_won("52", "억"), Some(5_200_000_000));
/// assert_eq!(parse_budget_to_won("300", "백만"), Some(300_000_000));
/// assert_eq!(parse_budget_to_won("0", "억"), None);
/// assert_eq!(parse_budget_to_won("10", "달러"), None);
/// ```
pub fn parse_budget_to_won(number: &str, unit: &str) -> Option<u64> {
    let multiplier = match unit.trim() {
        "억" => UNIT_EOK,
        "천만" => UNIT_CHEONMAN,
        "백만" => UNIT_BAEKMAN,
        "만" => UNIT_MAN,
        _ => return None,
    };
    let amount = parse_decimal(number)?;
    to_won(amount * multiplier)
}

/// Parse a plain won amount such as "150,000,000"
pub fn parse_won(number: &str) -> Option<u64> {
    let amount = parse_decimal(number)?;
    to_won(amount)
}

/// Build a validated calendar date; invalid combinations yield `None`
pub fn parse_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    if year.trim().len() != 4 {
        return None;
    }
    let y: i32 = year.trim().parse().ok()?;
    let m: u32 = month.trim().parse().ok()?;
    let d: u32 = day.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Parse a date written as `2025-03-15`, `2025.3.15`, `2025/03/15` or
/// `2025년 3월 15일`
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let runs: Vec<&str> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .collect();
    if runs.len() < 3 {
        return None;
    }
    parse_date(runs[0], runs[1], runs[2])
}

fn parse_decimal(number: &str) -> Option<f64> {
    let cleaned: String = number
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(value)
}

fn to_won(amount: f64) -> Option<u64> {
    if !amount.is_finite() || amount <= 0.0 || amount > MAX_AMOUNT_WON {
        return None;
    }
    let rounded = amount.round();
    if rounded < 1.0 {
        return None;
    }
    Some(rounded as u64)
}

fn is_null_like(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => {
            let t = s.trim();
            t.is_empty()
                || t.eq_ignore_ascii_case("null")
                || t.eq_ignore_ascii_case("none")
                || t.eq_ignore_ascii_case("n/a")
        }
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn coerce_amount(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => to_won(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim().trim_end_matches('원').trim();
            if let Some(won) = parse_won(s) {
                return Some(won);
            }
            // "5억", "300백만"
            let split = s
                .char_indices()
                .find(|(_, c)| !(c.is_ascii_digit() || *c == ',' || *c == '.'))
                .map(|(i, _)| i)?;
            let (number, unit) = s.split_at(split);
            parse_budget_to_won(number, unit)
        }
        _ => None,
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    let n = match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || !f.is_finite() {
                    return None;
                }
                f as i64
            }
        }
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()?
        }
        _ => return None,
    };
    if n > 0 {
        Some(n)
    } else {
        None
    }
}

fn coerce_percent(raw: &Value) -> Option<f64> {
    let p = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    if p.is_finite() && p > 0.0 && p <= 100.0 {
        Some(p)
    } else {
        None
    }
}

fn coerce_text(raw: &Value) -> Option<String> {
    let text = match raw {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(coerce_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    };
    text.filter(|s| !s.is_empty())
}

fn coerce_list(raw: &Value) -> Option<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        let t = s.trim();
        if !t.is_empty() && !t.eq_ignore_ascii_case("null") && !items.iter().any(|i| i == t) {
            items.push(t.to_string());
        }
    };

    match raw {
        Value::Array(values) => {
            for v in values {
                match v {
                    Value::String(s) => push(s),
                    Value::Number(n) => push(&n.to_string()),
                    _ => {}
                }
            }
        }
        Value::String(s) => {
            for part in s.split([',', '·', '、']) {
                push(part);
            }
        }
        _ => return None,
    }

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: non-positive numbers never convert, whatever the unit
        #[test]
        fn test_non_positive_never_converts(n in -1_000_000i64..=0, unit in "(억|천만|백만|만)") {
            prop_assert_eq!(parse_budget_to_won(&n.to_string(), &unit), None);
        }

        /// Property: 억 is exactly ten thousand 만
        #[test]
        fn test_eok_equals_ten_thousand_man(n in 1u64..10_000) {
            let eok = parse_budget_to_won(&n.to_string(), "억");
            let man = parse_budget_to_won(&(n * 10_000).to_string(), "만");
            prop_assert_eq!(eok, man);
            prop_assert_eq!(eok, Some(n * 100_000_000));
        }

        /// Property: unknown unit words are rejected
        #[test]
        fn test_unknown_unit_rejected(n in 1u64..1_000_000, unit in "[a-z]{1,4}") {
            prop_assert_eq!(parse_budget_to_won(&n.to_string(), &unit), None);
        }
    }
}
