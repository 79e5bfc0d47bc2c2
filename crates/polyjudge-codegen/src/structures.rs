//! Which node-structure helpers a harness needs, and where they go.
//!
//! A helper has two halves: the type definition and the builder/serializer
//! functions. The definition is skipped when the user declared the type
//! themselves; the functions are always emitted when the structure is in
//! play. Anything the user's code names must appear before it.

use polyjudge_core::StructuralKind;
use regex::Regex;

use crate::source::strip_comments;
use crate::toolchain::{HarnessRequest, LanguageToolchain, ResultNormalizer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    BeforeUser,
    AfterUser,
    Omitted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HelperPlan {
    pub kind: StructuralKind,
    pub definition: Placement,
    pub functions: Placement,
}

impl HelperPlan {
    pub fn new(kind: StructuralKind, declared: bool, referenced: bool) -> Self {
        let (definition, functions) = match (declared, referenced) {
            (true, _) => (Placement::Omitted, Placement::AfterUser),
            (false, true) => (Placement::BeforeUser, Placement::BeforeUser),
            (false, false) => (Placement::AfterUser, Placement::AfterUser),
        };
        Self {
            kind,
            definition,
            functions,
        }
    }
}

/// Whether the type name appears as a whole word
pub fn references_type(stripped: &str, type_name: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(type_name)))
        .map(|re| re.is_match(stripped))
        .unwrap_or(false)
}

/// Helper plans for every structure the request touches, in a fixed order
pub fn plan_helpers(
    toolchain: &dyn LanguageToolchain,
    request: &HarnessRequest<'_>,
) -> Vec<HelperPlan> {
    let stripped = strip_comments(request.user_source, toolchain.comment_syntax());

    StructuralKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let declared = toolchain.declares_type(&stripped, kind.type_name());
            let referenced = references_type(&stripped, kind.type_name());

            let in_args = request.args.iter().any(|a| a.ty.structural_kind() == Some(kind));
            let needed = in_args
                || match request.normalizer {
                    Some(ResultNormalizer::Structure(k)) => k == kind,
                    Some(ResultNormalizer::Dynamic) => declared || referenced,
                    None => false,
                };

            match needed {
                true => Some(HelperPlan::new(kind, declared, referenced)),
                false => None,
            }
        })
        .collect()
}

/// Fragments scheduled for one placement, definition ahead of functions
pub fn fragments_at(
    plans: &[HelperPlan],
    placement: Placement,
    definition: impl Fn(StructuralKind) -> &'static str,
    functions: impl Fn(StructuralKind) -> &'static str,
) -> Vec<&'static str> {
    let mut out = Vec::new();
    for plan in plans {
        if plan.definition == placement {
            out.push(definition(plan.kind));
        }
        if plan.functions == placement {
            out.push(functions(plan.kind));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_rules() {
        let declared = HelperPlan::new(StructuralKind::LinkedList, true, true);
        assert_eq!(declared.definition, Placement::Omitted);
        assert_eq!(declared.functions, Placement::AfterUser);

        let referenced = HelperPlan::new(StructuralKind::BinaryTree, false, true);
        assert_eq!(referenced.definition, Placement::BeforeUser);
        assert_eq!(referenced.functions, Placement::BeforeUser);

        let unseen = HelperPlan::new(StructuralKind::Graph, false, false);
        assert_eq!(unseen.definition, Placement::AfterUser);
        assert_eq!(unseen.functions, Placement::AfterUser);
    }

    #[test]
    fn test_references_type_whole_word() {
        assert!(references_type("ListNode* head", "ListNode"));
        assert!(!references_type("MyListNode* head", "ListNode"));
    }

    #[test]
    fn test_fragments_at() {
        let plans = [
            HelperPlan::new(StructuralKind::LinkedList, true, true),
            HelperPlan::new(StructuralKind::BinaryTree, false, false),
        ];
        let after = fragments_at(&plans, Placement::AfterUser, |k| k.type_name(), |_| "fns");
        assert_eq!(after, vec!["fns", "TreeNode", "fns"]);
        assert!(fragments_at(&plans, Placement::BeforeUser, |k| k.type_name(), |_| "fns").is_empty());
    }
}
