//! Test-case input parsing.
//!
//! Raw test-case text carries one argument per line. Each line is read by
//! best-effort literal detection: booleans and numbers first, then JSON
//! (arrays, objects, quoted strings, `null`), and finally the raw line as
//! an opaque string. Numbers are checked before JSON so a bare `42` never
//! becomes anything but a number.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?|Infinity|NaN)$")
        .expect("invalid numeric literal regex")
});

/// A language-neutral value read from a test-case line
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<ParsedValue>),
    Object(Vec<(String, ParsedValue)>),
}

impl ParsedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParsedValue::Null)
    }

    pub fn as_array(&self) -> Option<&[ParsedValue]> {
        match self {
            ParsedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric view, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParsedValue::Int(i) => Some(*i as f64),
            ParsedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view; integral floats (`2.0`) and numeric strings are accepted
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParsedValue::Int(i) => Some(*i),
            ParsedValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            ParsedValue::Bool(b) => Some(*b as i64),
            ParsedValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text view; scalars are stringified, containers are not
    pub fn as_text(&self) -> Option<String> {
        match self {
            ParsedValue::String(s) => Some(s.clone()),
            ParsedValue::Int(i) => Some(i.to_string()),
            ParsedValue::Float(f) => Some(f.to_string()),
            ParsedValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => ParsedValue::Null,
            Value::Bool(b) => ParsedValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParsedValue::Int(i),
                None => ParsedValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ParsedValue::String(s),
            Value::Array(items) => {
                ParsedValue::Array(items.into_iter().map(ParsedValue::from_json).collect())
            }
            Value::Object(map) => ParsedValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ParsedValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Parse one test-case line into a value
pub fn parse_line(line: &str) -> ParsedValue {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return ParsedValue::Null;
    }

    match trimmed {
        "true" => return ParsedValue::Bool(true),
        "false" => return ParsedValue::Bool(false),
        _ => {}
    }

    if NUMERIC_LITERAL.is_match(trimmed) {
        return parse_number(trimmed);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => ParsedValue::from_json(value),
        Err(_) => ParsedValue::String(trimmed.to_string()),
    }
}

/// Parse multi-line test-case input; every non-blank line is one argument
pub fn parse_input(raw: &str) -> Vec<ParsedValue> {
    raw.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_number(literal: &str) -> ParsedValue {
    let unsigned = literal.trim_start_matches(['+', '-']);
    let negative = literal.starts_with('-');

    match unsigned {
        "Infinity" if negative => return ParsedValue::Float(f64::NEG_INFINITY),
        "Infinity" => return ParsedValue::Float(f64::INFINITY),
        "NaN" => return ParsedValue::Float(f64::NAN),
        _ => {}
    }

    let is_integral = !literal.contains(['.', 'e', 'E']);
    if is_integral {
        if let Ok(i) = literal.parse::<i64>() {
            return ParsedValue::Int(i);
        }
    }

    literal
        .parse::<f64>()
        .map(ParsedValue::Float)
        .unwrap_or_else(|_| ParsedValue::String(literal.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_line("true"), ParsedValue::Bool(true));
        assert_eq!(parse_line("false"), ParsedValue::Bool(false));
        assert_eq!(parse_line("42"), ParsedValue::Int(42));
        assert_eq!(parse_line("-7"), ParsedValue::Int(-7));
        assert_eq!(parse_line("2.5"), ParsedValue::Float(2.5));
        assert_eq!(parse_line("1e3"), ParsedValue::Float(1000.0));
        assert_eq!(parse_line("hello"), ParsedValue::String("hello".into()));
        assert_eq!(parse_line(""), ParsedValue::Null);
        assert_eq!(parse_line("null"), ParsedValue::Null);
    }

    #[test]
    fn test_parse_json_values() {
        assert_eq!(
            parse_line("[1,2,3]"),
            ParsedValue::Array(vec![
                ParsedValue::Int(1),
                ParsedValue::Int(2),
                ParsedValue::Int(3)
            ])
        );
        assert_eq!(parse_line("\"abc\""), ParsedValue::String("abc".into()));
        assert_eq!(
            parse_line("[3,null,4]"),
            ParsedValue::Array(vec![
                ParsedValue::Int(3),
                ParsedValue::Null,
                ParsedValue::Int(4)
            ])
        );
    }

    #[test]
    fn test_objects_keep_key_order() {
        let ParsedValue::Object(entries) = parse_line(r#"{"b":1,"a":2}"#) else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_non_finite_numbers() {
        assert_eq!(parse_line("Infinity"), ParsedValue::Float(f64::INFINITY));
        assert_eq!(parse_line("-Infinity"), ParsedValue::Float(f64::NEG_INFINITY));
        assert!(matches!(parse_line("NaN"), ParsedValue::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_huge_integer_becomes_float() {
        assert!(matches!(
            parse_line("123456789012345678901234"),
            ParsedValue::Float(_)
        ));
    }

    #[test]
    fn test_malformed_json_is_string() {
        assert_eq!(parse_line("[1,2"), ParsedValue::String("[1,2".into()));
    }

    #[test]
    fn test_parse_input_skips_blank_lines() {
        let values = parse_input("[2,7,11,15]\r\n\n9\n");
        assert_eq!(values.len(), 2);
        assert_eq!(values[1], ParsedValue::Int(9));
    }
}
