//! Schema normalization.
//!
//! Stored problem records carry parameter schemas of uneven quality: absent,
//! partial, or serialized as a JSON string. [`normalize_schema`] reconciles
//! whatever is stored with stored signatures, with the literal shape of the
//! first test case, and with taxonomy defaults, and always produces a fully
//! typed [`NormalizedSchema`].

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    infer_from_value, parse_input, parse_line, parse_signature, sanitize_identifier,
    CanonicalType, Language, ParsedSignature, ProblemSpec,
};

/// Signature languages, in the order they are consulted
const SIGNATURE_ORDER: [Language; 4] = [
    Language::Java,
    Language::Cpp,
    Language::Python,
    Language::JavaScript,
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CanonicalType,
}

/// Fully resolved parameter and return types for one generation request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSchema {
    pub params: Vec<Param>,
    pub return_type: CanonicalType,
}

impl NormalizedSchema {
    pub fn param_types(&self) -> impl Iterator<Item = CanonicalType> + '_ {
        self.params.iter().map(|p| p.ty)
    }

    /// Every type mentioned by the schema, return type last
    pub fn all_types(&self) -> impl Iterator<Item = CanonicalType> + '_ {
        self.param_types().chain(std::iter::once(self.return_type))
    }
}

#[derive(Debug, Default)]
struct StoredSchema {
    params: Vec<(Option<String>, Option<CanonicalType>)>,
    return_type: Option<CanonicalType>,
}

/// Resolve a problem's parameters and return type. Never fails.
pub fn normalize_schema(problem: &ProblemSpec) -> NormalizedSchema {
    let stored = read_stored_schema(problem.parameter_schema.as_ref());
    let signature = first_signature(problem);
    let question = problem.question_type;

    let first_case = problem.test_cases.first();
    let sample_inputs = first_case.map(|tc| parse_input(&tc.input)).unwrap_or_default();
    let sample_output = first_case
        .map(|tc| tc.expected_output.trim())
        .filter(|out| !out.is_empty())
        .map(parse_line);

    let sig_params = signature.as_ref().map(|s| s.params.as_slice()).unwrap_or_default();

    let names: Vec<Option<String>> = match (stored.params.is_empty(), sig_params.is_empty()) {
        (false, _) => stored.params.iter().map(|(name, _)| name.clone()).collect(),
        (true, false) => sig_params.iter().map(|p| p.name.clone()).collect(),
        (true, true) => vec![None; sample_inputs.len().max(1)],
    };

    let params = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let ty = stored
                .params
                .get(i)
                .and_then(|(_, ty)| *ty)
                .or_else(|| sig_params.get(i).and_then(|p| p.ty))
                .or_else(|| sample_inputs.get(i).and_then(|v| infer_from_value(v, question)))
                .or_else(|| question.default_param())
                .unwrap_or(CanonicalType::Int);

            let name = name
                .as_deref()
                .and_then(sanitize_identifier)
                .unwrap_or_else(|| positional_name(i));

            Param { name, ty }
        })
        .collect();

    let return_type = stored
        .return_type
        .or_else(|| signature.as_ref().and_then(|s| s.return_type))
        .or_else(|| sample_output.as_ref().and_then(|v| infer_from_value(v, question)))
        .or_else(|| question.default_return())
        .unwrap_or(CanonicalType::Any);

    NormalizedSchema {
        params,
        return_type,
    }
}

fn positional_name(index: usize) -> String {
    match index {
        0 => "param".to_string(),
        i => format!("param{}", i + 1),
    }
}

fn first_signature(problem: &ProblemSpec) -> Option<ParsedSignature> {
    SIGNATURE_ORDER.iter().find_map(|lang| {
        let text = problem.signatures.get(lang)?;
        parse_signature(*lang, text)
    })
}

fn read_stored_schema(raw: Option<&Value>) -> StoredSchema {
    let parsed;
    let value = match raw {
        None | Some(Value::Null) => return StoredSchema::default(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(e) => {
                debug!(error = %e, "Stored parameter schema is not valid JSON, ignoring it");
                return StoredSchema::default();
            }
        },
        Some(v) => v,
    };

    let Some(obj) = value.as_object() else {
        debug!("Stored parameter schema is not an object, ignoring it");
        return StoredSchema::default();
    };

    let params = obj
        .get("params")
        .or_else(|| obj.get("parameters"))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(read_stored_param).collect())
        .unwrap_or_default();

    let return_type = ["returnType", "return_type", "return"]
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(Value::as_str)
        .and_then(CanonicalType::parse);

    StoredSchema {
        params,
        return_type,
    }
}

fn read_stored_param(entry: &Value) -> (Option<String>, Option<CanonicalType>) {
    match entry {
        Value::String(ty) => (None, CanonicalType::parse(ty)),
        Value::Object(obj) => {
            let name = obj.get("name").and_then(Value::as_str).map(str::to_string);
            let ty = obj.get("type").and_then(Value::as_str).and_then(CanonicalType::parse);
            (name, ty)
        }
        _ => (None, None),
    }
}
