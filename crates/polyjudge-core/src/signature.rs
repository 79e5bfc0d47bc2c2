//! Parsing of stored per-language signature strings.
//!
//! Signatures are free text written by problem authors, anything from a
//! bare prototype to a whole starter template. Only the shape of the first
//! plausible function is extracted; types that do not resolve are kept as
//! `None` so the normalizer can fall through to the next source.

use std::sync::LazyLock;

use regex::Regex;

use crate::{CanonicalType, Language};

static TYPED_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^\w])(long\s+long|[A-Za-z_][\w:]*(?:\s*<[^(){};]*>)?(?:\s*\[\s*\])*)(\s*[\*&]\s*|\s+)([A-Za-z_]\w*)\s*\(([^()]*)\)",
    )
    .expect("invalid typed signature regex")
});

static PY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"def\s+([A-Za-z_]\w*)\s*\(([^)]*)\)\s*(?:->\s*([^:]+?))?\s*:")
        .expect("invalid python signature regex")
});

static JS_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:function\s+([A-Za-z_$][\w$]*)\s*\(([^)]*)\)|(?:var|let|const)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:function\s*)?\(([^)]*)\))",
    )
    .expect("invalid javascript signature regex")
});

static JSDOC_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@param\s*\{([^}]+)\}\s*\[?([A-Za-z_$][\w$]*)").expect("invalid jsdoc param regex")
});

static JSDOC_RETURN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@returns?\s*\{([^}]+)\}").expect("invalid jsdoc return regex")
});

static TYPED_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?[\w>\]\*&])\s*([A-Za-z_]\w*)$").expect("invalid typed param regex")
});

const NOT_A_RETURN_TYPE: &[&str] = &["return", "new", "else", "throw", "case", "class", "struct"];

/// Function shape recovered from a signature string
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedSignature {
    pub name: Option<String>,
    pub params: Vec<SignatureParam>,
    pub return_type: Option<CanonicalType>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignatureParam {
    pub name: Option<String>,
    pub ty: Option<CanonicalType>,
}

/// Parse a stored signature written in `language`
pub fn parse_signature(language: Language, text: &str) -> Option<ParsedSignature> {
    match language {
        Language::Java | Language::Cpp => parse_typed(text),
        Language::Python => parse_python(text),
        Language::JavaScript => parse_javascript(text),
    }
}

fn parse_typed(text: &str) -> Option<ParsedSignature> {
    let caps = TYPED_FN.captures_iter(text).find(|c| {
        let ret = c[1].trim();
        !NOT_A_RETURN_TYPE.contains(&ret) && &c[3] != "Solution"
    })?;

    let ret = format!("{}{}", &caps[1], caps[2].trim());
    let params = split_top_level(&caps[4])
        .into_iter()
        .map(|raw| {
            let raw = raw.trim_start_matches("final ").trim_start_matches("const ");
            match TYPED_PARAM.captures(raw) {
                Some(p) => SignatureParam {
                    name: Some(p[2].to_string()),
                    ty: CanonicalType::parse(&p[1]),
                },
                None => SignatureParam {
                    name: None,
                    ty: CanonicalType::parse(raw),
                },
            }
        })
        .collect();

    Some(ParsedSignature {
        name: Some(caps[3].to_string()),
        params,
        return_type: CanonicalType::parse(&ret),
    })
}

fn parse_python(text: &str) -> Option<ParsedSignature> {
    let caps = PY_DEF.captures(text)?;

    let params = split_top_level(&caps[2])
        .into_iter()
        .filter(|p| *p != "self" && !p.starts_with('*'))
        .map(|raw| {
            let without_default = raw.split('=').next().unwrap_or(raw);
            match without_default.split_once(':') {
                Some((name, ty)) => SignatureParam {
                    name: Some(name.trim().to_string()),
                    ty: CanonicalType::parse(ty),
                },
                None => SignatureParam {
                    name: Some(without_default.trim().to_string()),
                    ty: None,
                },
            }
        })
        .collect();

    Some(ParsedSignature {
        name: Some(caps[1].to_string()),
        params,
        return_type: caps.get(3).and_then(|m| CanonicalType::parse(m.as_str())),
    })
}

fn parse_javascript(text: &str) -> Option<ParsedSignature> {
    let caps = JS_FN.captures(text)?;
    let name = caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str().to_string());
    let raw_params = caps.get(2).or_else(|| caps.get(4)).map_or("", |m| m.as_str());

    let doc_types: Vec<(String, Option<CanonicalType>)> = JSDOC_PARAM
        .captures_iter(text)
        .map(|c| (c[2].to_string(), CanonicalType::parse(&c[1])))
        .collect();

    let params = split_top_level(raw_params)
        .into_iter()
        .map(|raw| {
            let param_name = raw.split('=').next().unwrap_or(raw).trim().to_string();
            let ty = doc_types
                .iter()
                .find(|(n, _)| *n == param_name)
                .and_then(|(_, ty)| *ty);
            SignatureParam {
                name: Some(param_name),
                ty,
            }
        })
        .collect();

    Some(ParsedSignature {
        name,
        params,
        return_type: JSDOC_RETURN
            .captures(text)
            .and_then(|c| CanonicalType::parse(&c[1])),
    })
}

/// Split on commas that are not nested inside brackets
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '<' | '[' | '(' | '{' => depth += 1,
            '>' | ']' | ')' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}
