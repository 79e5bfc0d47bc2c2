use polyjudge_core::{
    CanonicalType, Language, NormalizedSchema, ParsedValue, Position, QuestionType,
    StructuralKind,
};

use crate::lang::{CppToolchain, JavaToolchain, JavaScriptToolchain, PythonToolchain};
use crate::literal::resolve_type;
use crate::source::CommentSyntax;

// ============================================================================
// Harness request
// ============================================================================

/// One argument ready to be spliced into a harness
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarshaledArg {
    /// Concrete type after narrowing `Any` by shape
    pub ty: CanonicalType,
    /// Source expression constructing the value
    pub expr: String,
}

/// How a returned value is made printable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultNormalizer {
    /// Flatten a node structure into its canonical list form
    Structure(StructuralKind),
    /// Inspect the value at run time and flatten whatever structure it is
    Dynamic,
}

impl ResultNormalizer {
    pub fn for_return(ty: CanonicalType) -> Option<ResultNormalizer> {
        match ty {
            CanonicalType::Any => Some(ResultNormalizer::Dynamic),
            other => other.structural_kind().map(ResultNormalizer::Structure),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HarnessRequest<'a> {
    pub user_source: &'a str,
    pub entry_point: &'a str,
    pub args: Vec<MarshaledArg>,
    pub return_type: CanonicalType,
    pub normalizer: Option<ResultNormalizer>,
}

impl<'a> HarnessRequest<'a> {
    pub fn new(
        user_source: &'a str,
        entry_point: &'a str,
        args: Vec<MarshaledArg>,
        return_type: CanonicalType,
    ) -> Self {
        Self {
            user_source,
            entry_point,
            args,
            return_type,
            normalizer: ResultNormalizer::for_return(return_type),
        }
    }

    /// Doubles print with fixed precision even when the runtime value is integral
    pub fn prints_floats(&self) -> bool {
        matches!(
            self.return_type,
            CanonicalType::Double | CanonicalType::DoubleArray
        )
    }
}

// ============================================================================
// Toolchain trait
// ============================================================================

/// Everything needed to speak one target language
pub trait LanguageToolchain: Send + Sync {
    fn language(&self) -> Language;

    fn comment_syntax(&self) -> CommentSyntax;

    /// Concrete type text; every canonical type maps, `Any` included
    fn map_type(&self, ty: CanonicalType, position: Position) -> Option<&'static str>;

    /// Source expression constructing `value` as `ty`
    fn render_literal(&self, value: &ParsedValue, ty: CanonicalType) -> String;

    /// Starter code for `entry_point` with the given schema
    fn render_template(
        &self,
        entry_point: &str,
        schema: &NormalizedSchema,
        question: QuestionType,
    ) -> String;

    /// Name of the callable the harness should invoke
    fn detect_entry_point(&self, source: &str, fallback: &str) -> String;

    /// Whether comment-stripped user source defines `type_name` itself
    fn declares_type(&self, stripped: &str, type_name: &str) -> bool;

    /// Complete runnable program for one test case
    fn compose_harness(&self, request: &HarnessRequest<'_>) -> String;

    fn marshal(&self, value: &ParsedValue, ty: CanonicalType) -> MarshaledArg {
        let ty = resolve_type(value, ty);
        MarshaledArg {
            ty,
            expr: self.render_literal(value, ty),
        }
    }
}

static PYTHON: PythonToolchain = PythonToolchain;
static JAVASCRIPT: JavaScriptToolchain = JavaScriptToolchain;
static JAVA: JavaToolchain = JavaToolchain;
static CPP: CppToolchain = CppToolchain;

pub fn toolchain_for(language: Language) -> &'static dyn LanguageToolchain {
    match language {
        Language::Python => &PYTHON,
        Language::JavaScript => &JAVASCRIPT,
        Language::Java => &JAVA,
        Language::Cpp => &CPP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_all_languages() {
        for language in Language::all() {
            assert_eq!(toolchain_for(*language).language(), *language);
        }
    }

    #[test]
    fn test_mappers_are_total() {
        for language in Language::all() {
            let toolchain = toolchain_for(*language);
            for ty in CanonicalType::ALL {
                for position in [Position::Param, Position::Return] {
                    let mapped = toolchain.map_type(ty, position);
                    assert!(
                        mapped.is_some_and(|t| !t.is_empty()),
                        "{language} has no mapping for {ty:?} as {position:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_normalizer_for_return() {
        assert_eq!(ResultNormalizer::for_return(CanonicalType::Int), None);
        assert_eq!(
            ResultNormalizer::for_return(CanonicalType::TreeNode),
            Some(ResultNormalizer::Structure(StructuralKind::BinaryTree))
        );
        assert_eq!(
            ResultNormalizer::for_return(CanonicalType::Any),
            Some(ResultNormalizer::Dynamic)
        );
    }
}
