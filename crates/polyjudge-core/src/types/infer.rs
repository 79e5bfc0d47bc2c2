use super::{CanonicalType, QuestionType};
use crate::ParsedValue;

/// Infer a canonical type from the shape of a parsed literal.
///
/// The question type disambiguates flat encodings that could be either a
/// plain array or a structure (`[1,2,3]` is a `ListNode` in a linked-list
/// question). Returns `None` when the shape says nothing useful.
pub fn infer_from_value(value: &ParsedValue, question: QuestionType) -> Option<CanonicalType> {
    let structural = question.structural_kind().map(|k| k.canonical());

    match value {
        ParsedValue::Null => structural,
        ParsedValue::Bool(_) => Some(CanonicalType::Boolean),
        ParsedValue::Int(i) if i32::try_from(*i).is_ok() => Some(CanonicalType::Int),
        ParsedValue::Int(_) => Some(CanonicalType::Long),
        ParsedValue::Float(_) => Some(CanonicalType::Double),
        ParsedValue::String(_) => Some(CanonicalType::String),
        ParsedValue::Object(_) => None,
        ParsedValue::Array(items) => infer_array(items, question, structural),
    }
}

fn infer_array(
    items: &[ParsedValue],
    question: QuestionType,
    structural: Option<CanonicalType>,
) -> Option<CanonicalType> {
    if items.is_empty() {
        return Some(structural.unwrap_or(CanonicalType::IntArray));
    }

    let all = |pred: fn(&ParsedValue) -> bool| items.iter().all(pred);
    let is_int = |v: &ParsedValue| matches!(v, ParsedValue::Int(_));
    let is_int_or_null = |v: &ParsedValue| matches!(v, ParsedValue::Int(_) | ParsedValue::Null);

    if all(|v| matches!(v, ParsedValue::Array(_))) {
        return match question {
            QuestionType::Graph => Some(CanonicalType::GraphAdjList),
            _ => Some(CanonicalType::IntMatrix),
        };
    }

    match question {
        QuestionType::LinkedList if all(is_int) => return Some(CanonicalType::ListNode),
        QuestionType::BinaryTree if all(is_int_or_null) => return Some(CanonicalType::TreeNode),
        _ => {}
    }

    if all(is_int) {
        let fits_i32 = items
            .iter()
            .all(|v| matches!(v, ParsedValue::Int(i) if i32::try_from(*i).is_ok()));
        return Some(match fits_i32 {
            true => CanonicalType::IntArray,
            false => CanonicalType::LongArray,
        });
    }

    if all(is_int_or_null) {
        return Some(CanonicalType::TreeNode);
    }

    if all(|v| matches!(v, ParsedValue::Int(_) | ParsedValue::Float(_))) {
        return Some(CanonicalType::DoubleArray);
    }

    if all(|v| matches!(v, ParsedValue::Bool(_))) {
        return Some(CanonicalType::BooleanArray);
    }

    if all(|v| matches!(v, ParsedValue::String(_))) {
        return Some(CanonicalType::StringArray);
    }

    None
}
