//! Value coercions shared by every marshaler.
//!
//! Inputs come from loosely formatted test cases, so a value is bent into
//! the declared type wherever a sensible reading exists.

use polyjudge_core::{infer_from_value, CanonicalType, ParsedValue, QuestionType};

pub(crate) fn int_of(value: &ParsedValue) -> i64 {
    value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        })
        .unwrap_or(0)
}

pub(crate) fn float_of(value: &ParsedValue) -> f64 {
    match value {
        ParsedValue::Bool(b) => f64::from(u8::from(*b)),
        ParsedValue::String(s) => s.trim().parse().unwrap_or(0.0),
        other => other.as_f64().unwrap_or(0.0),
    }
}

pub(crate) fn bool_of(value: &ParsedValue) -> bool {
    match value {
        ParsedValue::Bool(b) => *b,
        ParsedValue::Int(i) => *i != 0,
        ParsedValue::Float(f) => *f != 0.0,
        ParsedValue::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub(crate) fn char_of(value: &ParsedValue) -> char {
    match value {
        ParsedValue::String(s) => s.chars().next().unwrap_or(' '),
        ParsedValue::Int(i @ 0..=9) => char::from_digit(*i as u32, 10).unwrap_or('0'),
        _ => ' ',
    }
}

pub(crate) fn text_of(value: &ParsedValue) -> String {
    match value {
        ParsedValue::String(s) => s.clone(),
        ParsedValue::Int(i) => i.to_string(),
        ParsedValue::Float(f) => f.to_string(),
        ParsedValue::Bool(b) => b.to_string(),
        ParsedValue::Null => String::new(),
        other => json_text(other),
    }
}

/// Elements of an array value; a scalar is a one-element list, null is empty
pub(crate) fn items_of(value: &ParsedValue) -> Vec<&ParsedValue> {
    match value {
        ParsedValue::Array(items) => items.iter().collect(),
        ParsedValue::Null => Vec::new(),
        other => vec![other],
    }
}

pub(crate) fn list_ints(value: &ParsedValue) -> Vec<i64> {
    items_of(value).into_iter().map(int_of).collect()
}

/// Level-order slots of a tree literal, `None` for gaps
pub(crate) fn tree_slots(value: &ParsedValue) -> Vec<Option<i64>> {
    items_of(value)
        .into_iter()
        .map(|item| match item {
            ParsedValue::Null => None,
            ParsedValue::String(s) if s.eq_ignore_ascii_case("null") => None,
            other => Some(int_of(other)),
        })
        .collect()
}

/// 1-indexed adjacency rows; non-list rows become empty rows
pub(crate) fn adjacency_rows(value: &ParsedValue) -> Vec<Vec<i64>> {
    items_of(value)
        .into_iter()
        .map(|row| match row {
            ParsedValue::Array(_) => list_ints(row),
            _ => Vec::new(),
        })
        .collect()
}

/// Concrete type for a value declared as `ty`.
/// `Any` is narrowed by shape; structural shapes stay dynamic because a
/// bare list under an `Any` parameter is data, not a structure.
/// `Int` and `IntArray` widen to their 64-bit forms when a value leaves the
/// 32-bit range, so the typed targets still get a literal that compiles.
pub(crate) fn resolve_type(value: &ParsedValue, ty: CanonicalType) -> CanonicalType {
    match ty {
        CanonicalType::Any => infer_from_value(value, QuestionType::Unset)
            .filter(|t| !t.is_structural())
            .unwrap_or(CanonicalType::Any),
        CanonicalType::Int if !fits_i32(value) => CanonicalType::Long,
        CanonicalType::IntArray if !items_of(value).into_iter().all(fits_i32) => {
            CanonicalType::LongArray
        }
        other => other,
    }
}

fn fits_i32(value: &ParsedValue) -> bool {
    i32::try_from(int_of(value)).is_ok()
}

/// Finite double in a form every target language accepts
pub(crate) fn float_literal(f: f64) -> String {
    let text = format!("{f:?}");
    match text.contains(['.', 'e', 'E']) {
        true => text,
        false => format!("{text}.0"),
    }
}

pub(crate) fn json_quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Compact JSON text of a parsed value
pub(crate) fn json_text(value: &ParsedValue) -> String {
    match value {
        ParsedValue::Null => "null".into(),
        ParsedValue::Bool(b) => b.to_string(),
        ParsedValue::Int(i) => i.to_string(),
        ParsedValue::Float(f) if f.is_finite() => float_literal(*f),
        ParsedValue::Float(f) => f.to_string(),
        ParsedValue::String(s) => json_quote(s),
        ParsedValue::Array(items) => {
            let inner: Vec<String> = items.iter().map(json_text).collect();
            format!("[{}]", inner.join(","))
        }
        ParsedValue::Object(fields) => {
            let inner: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{}:{}", json_quote(k), json_text(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escape {
    /// `\uXXXX` for control characters
    Java,
    /// three-digit octal for control characters
    Cpp,
}

/// Escape text for a double- or single-quoted literal in a C-family language
pub(crate) fn c_escape(s: &str, quote: char, style: Escape) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ if c == quote => {
                out.push('\\');
                out.push(c);
            }
            _ if (c as u32) < 0x20 => match style {
                Escape::Java => out.push_str(&format!("\\u{:04x}", c as u32)),
                Escape::Cpp => out.push_str(&format!("\\{:03o}", c as u32)),
            },
            _ => out.push(c),
        }
    }
    out
}
