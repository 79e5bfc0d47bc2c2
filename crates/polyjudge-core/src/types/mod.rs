//! Canonical type system.
//!
//! Every parameter and return value resolves to exactly one
//! [`CanonicalType`] before any code is generated. Per-language mappers
//! derive their concrete syntax from these tags.

mod infer;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use infer::infer_from_value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CanonicalType {
    Int,
    Long,
    Double,
    Boolean,
    Char,
    String,
    IntArray,
    LongArray,
    DoubleArray,
    BooleanArray,
    CharArray,
    StringArray,
    /// `List<List<Integer>>`
    IntMatrix,
    ListNode,
    TreeNode,
    GraphAdjList,
    Any,
}

/// The three pointer-based structures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructuralKind {
    LinkedList,
    BinaryTree,
    Graph,
}

impl StructuralKind {
    pub const ALL: [StructuralKind; 3] = [
        StructuralKind::LinkedList,
        StructuralKind::BinaryTree,
        StructuralKind::Graph,
    ];

    /// Name of the node type every language uses for this structure
    pub fn type_name(&self) -> &'static str {
        match self {
            StructuralKind::LinkedList => "ListNode",
            StructuralKind::BinaryTree => "TreeNode",
            StructuralKind::Graph => "GraphNode",
        }
    }

    pub fn canonical(&self) -> CanonicalType {
        match self {
            StructuralKind::LinkedList => CanonicalType::ListNode,
            StructuralKind::BinaryTree => CanonicalType::TreeNode,
            StructuralKind::Graph => CanonicalType::GraphAdjList,
        }
    }
}

/// Whether a type is rendered for a parameter or a value (return/local)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Param,
    Return,
}

impl CanonicalType {
    pub const ALL: [CanonicalType; 17] = [
        CanonicalType::Int,
        CanonicalType::Long,
        CanonicalType::Double,
        CanonicalType::Boolean,
        CanonicalType::Char,
        CanonicalType::String,
        CanonicalType::IntArray,
        CanonicalType::LongArray,
        CanonicalType::DoubleArray,
        CanonicalType::BooleanArray,
        CanonicalType::CharArray,
        CanonicalType::StringArray,
        CanonicalType::IntMatrix,
        CanonicalType::ListNode,
        CanonicalType::TreeNode,
        CanonicalType::GraphAdjList,
        CanonicalType::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::Int => "int",
            CanonicalType::Long => "long",
            CanonicalType::Double => "double",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Char => "char",
            CanonicalType::String => "String",
            CanonicalType::IntArray => "int[]",
            CanonicalType::LongArray => "long[]",
            CanonicalType::DoubleArray => "double[]",
            CanonicalType::BooleanArray => "boolean[]",
            CanonicalType::CharArray => "char[]",
            CanonicalType::StringArray => "String[]",
            CanonicalType::IntMatrix => "List<List<Integer>>",
            CanonicalType::ListNode => "ListNode",
            CanonicalType::TreeNode => "TreeNode",
            CanonicalType::GraphAdjList => "GraphAdjList",
            CanonicalType::Any => "Any",
        }
    }

    /// Parse a type spelling from any supported language.
    ///
    /// Accepts the canonical names plus common Java, C++, Python and
    /// JavaScript spellings. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<CanonicalType> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let key = unwrap_optional(&compact).trim_end_matches(['*', '&']);

        let ty = match key {
            "int" | "Integer" | "integer" | "i32" | "number" => CanonicalType::Int,
            "long" | "Long" | "longlong" | "int64_t" | "i64" | "bigint" => CanonicalType::Long,
            "double" | "Double" | "float" | "Float" | "f64" => CanonicalType::Double,
            "boolean" | "Boolean" | "bool" => CanonicalType::Boolean,
            "char" | "Character" | "character" => CanonicalType::Char,
            "String" | "string" | "str" => CanonicalType::String,
            "int[]" | "Integer[]" | "vector<int>" | "List<Integer>" | "List[int]" | "list[int]"
            | "number[]" => CanonicalType::IntArray,
            "long[]" | "Long[]" | "vector<long>" | "vector<longlong>" | "List<Long>" => {
                CanonicalType::LongArray
            }
            "double[]" | "Double[]" | "vector<double>" | "List<Double>" | "List[float]"
            | "list[float]" => CanonicalType::DoubleArray,
            "boolean[]" | "Boolean[]" | "vector<bool>" | "List<Boolean>" | "List[bool]"
            | "list[bool]" => CanonicalType::BooleanArray,
            "char[]" | "Character[]" | "vector<char>" | "List<Character>" => {
                CanonicalType::CharArray
            }
            "String[]" | "string[]" | "vector<string>" | "List<String>" | "List[str]"
            | "list[str]" => CanonicalType::StringArray,
            "List<List<Integer>>" | "int[][]" | "Integer[][]" | "vector<vector<int>>"
            | "List[List[int]]" | "list[list[int]]" | "number[][]" => CanonicalType::IntMatrix,
            "ListNode" => CanonicalType::ListNode,
            "TreeNode" => CanonicalType::TreeNode,
            "GraphAdjList" | "GraphNode" | "Node" => CanonicalType::GraphAdjList,
            "Any" | "any" | "Object" | "object" | "auto" | "*" => CanonicalType::Any,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            CanonicalType::IntArray
                | CanonicalType::LongArray
                | CanonicalType::DoubleArray
                | CanonicalType::BooleanArray
                | CanonicalType::CharArray
                | CanonicalType::StringArray
                | CanonicalType::IntMatrix
        )
    }

    pub fn structural_kind(&self) -> Option<StructuralKind> {
        match self {
            CanonicalType::ListNode => Some(StructuralKind::LinkedList),
            CanonicalType::TreeNode => Some(StructuralKind::BinaryTree),
            CanonicalType::GraphAdjList => Some(StructuralKind::Graph),
            _ => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.structural_kind().is_some()
    }

    /// Element type of a flat array
    pub fn element(&self) -> Option<CanonicalType> {
        match self {
            CanonicalType::IntArray => Some(CanonicalType::Int),
            CanonicalType::LongArray => Some(CanonicalType::Long),
            CanonicalType::DoubleArray => Some(CanonicalType::Double),
            CanonicalType::BooleanArray => Some(CanonicalType::Boolean),
            CanonicalType::CharArray => Some(CanonicalType::Char),
            CanonicalType::StringArray => Some(CanonicalType::String),
            CanonicalType::IntMatrix => Some(CanonicalType::IntArray),
            _ => None,
        }
    }
}

/// Strip `Optional[...]` wrappers and `|null` unions
fn unwrap_optional(s: &str) -> &str {
    for (open, close) in [("Optional[", ']'), ("Optional<", '>')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|r| r.strip_suffix(close)) {
            return inner;
        }
    }
    if s.contains('|') {
        if let Some(part) = s.split('|').find(|p| !matches!(*p, "null" | "undefined" | "None")) {
            return part;
        }
    }
    s
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CanonicalType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CanonicalType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CanonicalType::parse(&raw).unwrap_or(CanonicalType::Any))
    }
}

/// Problem taxonomy driving structural fallbacks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Array,
    String,
    Primitives,
    Math,
    Matrix,
    LinkedList,
    BinaryTree,
    Graph,
    CustomClass,
    #[default]
    Unset,
}

impl QuestionType {
    /// Lenient parse; unknown spellings are `Unset`
    pub fn parse(raw: &str) -> QuestionType {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "array" | "arrays" => QuestionType::Array,
            "string" | "strings" => QuestionType::String,
            "primitives" | "primitive" => QuestionType::Primitives,
            "math" => QuestionType::Math,
            "matrix" => QuestionType::Matrix,
            "linked_list" | "linkedlist" => QuestionType::LinkedList,
            "binary_tree" | "binarytree" | "tree" => QuestionType::BinaryTree,
            "graph" => QuestionType::Graph,
            "custom_class" | "customclass" => QuestionType::CustomClass,
            _ => QuestionType::Unset,
        }
    }

    /// Taxonomy default for a parameter, if the question type has one
    pub fn default_param(&self) -> Option<CanonicalType> {
        self.defaults().map(|(param, _)| param)
    }

    /// Taxonomy default for the return type, if the question type has one
    pub fn default_return(&self) -> Option<CanonicalType> {
        self.defaults().map(|(_, ret)| ret)
    }

    fn defaults(&self) -> Option<(CanonicalType, CanonicalType)> {
        use CanonicalType as T;
        match self {
            QuestionType::Array => Some((T::IntArray, T::IntArray)),
            QuestionType::String => Some((T::String, T::String)),
            QuestionType::Primitives | QuestionType::Math => Some((T::Int, T::Int)),
            QuestionType::Matrix => Some((T::IntMatrix, T::IntMatrix)),
            QuestionType::LinkedList => Some((T::ListNode, T::ListNode)),
            QuestionType::BinaryTree => Some((T::TreeNode, T::TreeNode)),
            QuestionType::Graph => Some((T::GraphAdjList, T::GraphAdjList)),
            QuestionType::CustomClass => Some((T::Any, T::Any)),
            QuestionType::Unset => None,
        }
    }

    /// Structure the question is about, if any
    pub fn structural_kind(&self) -> Option<StructuralKind> {
        match self {
            QuestionType::LinkedList => Some(StructuralKind::LinkedList),
            QuestionType::BinaryTree => Some(StructuralKind::BinaryTree),
            QuestionType::Graph => Some(StructuralKind::Graph),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(QuestionType::parse).unwrap_or_default())
    }
}
