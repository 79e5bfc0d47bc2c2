//! Per-language toolchains.
//!
//! Each module owns the type mapper, starter template, literal renderer,
//! node-structure helper library, entry-point detector and harness composer
//! for one target language.

mod cpp;
mod java;
mod javascript;
mod python;

pub use cpp::CppToolchain;
pub use java::JavaToolchain;
pub use javascript::JavaScriptToolchain;
pub use python::PythonToolchain;

use polyjudge_core::{NormalizedSchema, Position, QuestionType, StructuralKind};

use crate::toolchain::LanguageToolchain;

/// Structures whose definitions the starter template should show
pub(crate) fn template_kinds(
    schema: &NormalizedSchema,
    question: QuestionType,
) -> Vec<StructuralKind> {
    StructuralKind::ALL
        .into_iter()
        .filter(|kind| {
            question.structural_kind() == Some(*kind)
                || schema.all_types().any(|ty| ty.structural_kind() == Some(*kind))
        })
        .collect()
}

pub(crate) fn kind_title(kind: StructuralKind) -> &'static str {
    match kind {
        StructuralKind::LinkedList => "Definition for singly-linked list.",
        StructuralKind::BinaryTree => "Definition for a binary tree node.",
        StructuralKind::Graph => "Definition for a graph node (built from a 1-indexed adjacency list).",
    }
}

/// Plain-text summary of the expected shape, for custom-class problems
pub(crate) fn shape_summary(
    toolchain: &dyn LanguageToolchain,
    schema: &NormalizedSchema,
) -> Vec<String> {
    let params: Vec<String> = schema
        .params
        .iter()
        .map(|p| {
            let ty = toolchain.map_type(p.ty, Position::Param).unwrap_or("?");
            format!("{}: {}", p.name, ty)
        })
        .collect();
    let ret = toolchain
        .map_type(schema.return_type, Position::Return)
        .unwrap_or("?");

    vec![
        "Custom class problem: implement the method below on your class.".to_string(),
        format!("Parameters: {}", params.join(", ")),
        format!("Returns: {ret}"),
    ]
}

/// Prefix every line of `text` for a line-comment block
pub(crate) fn comment_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| match line.is_empty() {
            true => prefix.trim_end().to_string(),
            false => format!("{prefix}{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
