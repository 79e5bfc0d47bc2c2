use std::sync::LazyLock;

use polyjudge_core::{
    CanonicalType, Language, NormalizedSchema, ParsedValue, Position, QuestionType,
    StructuralKind,
};
use regex::Regex;

use super::{comment_lines, kind_title, shape_summary, template_kinds};
use crate::detect::{names_in_order, pick_entry_point};
use crate::literal::{
    adjacency_rows, bool_of, char_of, float_of, float_literal, int_of, items_of, json_quote,
    list_ints, resolve_type, text_of, tree_slots,
};
use crate::source::{strip_comments, strip_indented_blocks, CommentSyntax};
use crate::structures::{fragments_at, plan_helpers, Placement};
use crate::toolchain::{HarnessRequest, LanguageToolchain, ResultNormalizer};

static DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+(?P<name>[A-Za-z_]\w*)[ \t]*\(")
        .expect("invalid def regex")
});

// ============================================================================
// Helper library
// ============================================================================

const PRELUDE: &str = "\
from typing import *
import bisect, collections, functools, heapq, itertools, json, math, sys
from collections import deque, defaultdict, Counter
";

const LIST_NODE: &str = r#"class ListNode:
    def __init__(self, val=0, next=None):
        self.val = val
        self.next = next
"#;

const TREE_NODE: &str = r#"class TreeNode:
    def __init__(self, val=0, left=None, right=None):
        self.val = val
        self.left = left
        self.right = right
"#;

const GRAPH_NODE: &str = r#"class GraphNode:
    def __init__(self, val=0, neighbors=None):
        self.val = val
        self.neighbors = neighbors if neighbors is not None else []
"#;

const LIST_FUNCTIONS: &str = r#"def build_linked_list(values):
    dummy = ListNode(0)
    tail = dummy
    for v in values:
        tail.next = ListNode(v)
        tail = tail.next
    return dummy.next


def serialize_linked_list(head):
    slow = fast = head
    while fast is not None and fast.next is not None:
        slow = slow.next
        fast = fast.next.next
        if slow is fast:
            raise ValueError("linked list contains a cycle")
    out = []
    while head is not None:
        out.append(head.val)
        head = head.next
    return out
"#;

const TREE_FUNCTIONS: &str = r#"def build_tree(values):
    if not values or values[0] is None:
        return None
    root = TreeNode(values[0])
    queue = collections.deque([root])
    i = 1
    while queue and i < len(values):
        node = queue.popleft()
        if i < len(values) and values[i] is not None:
            node.left = TreeNode(values[i])
            queue.append(node.left)
        i += 1
        if i < len(values) and values[i] is not None:
            node.right = TreeNode(values[i])
            queue.append(node.right)
        i += 1
    return root


def serialize_tree(root):
    out = []
    queue = collections.deque([root])
    while queue:
        node = queue.popleft()
        if node is None:
            out.append(None)
            continue
        out.append(node.val)
        queue.append(node.left)
        queue.append(node.right)
    while out and out[-1] is None:
        out.pop()
    return out
"#;

// Graphs are walked from node 1; rows for unreachable nodes are dropped.
const GRAPH_FUNCTIONS: &str = r#"def build_graph(adjacency):
    nodes = [GraphNode(i + 1) for i in range(len(adjacency))]
    for i, neighbors in enumerate(adjacency):
        for j in neighbors or []:
            if isinstance(j, int) and 1 <= j <= len(nodes):
                nodes[i].neighbors.append(nodes[j - 1])
    return nodes[0] if nodes else None


def serialize_graph(start):
    if start is None:
        return []
    seen = {start.val: start}
    queue = collections.deque([start])
    while queue:
        node = queue.popleft()
        for nb in node.neighbors:
            if nb.val not in seen:
                seen[nb.val] = nb
                queue.append(nb)
    size = max(seen)
    return [[nb.val for nb in seen[v].neighbors] if v in seen else [] for v in range(1, size + 1)]
"#;

const SUPPORT: &str = r#"def _pj_format(value, nested=False, floats=False):
    if value is None:
        return "null"
    if isinstance(value, bool):
        return "true" if value else "false"
    if isinstance(value, (int, float)):
        if isinstance(value, float) and math.isnan(value):
            return "NaN"
        if isinstance(value, float) and math.isinf(value):
            return "Infinity" if value > 0 else "-Infinity"
        if floats or isinstance(value, float):
            return "%.5f" % value
        return str(value)
    if isinstance(value, str):
        return json.dumps(value, ensure_ascii=False) if nested else value
    if isinstance(value, dict):
        return "{" + ",".join(json.dumps(str(k), ensure_ascii=False) + ":" + _pj_format(v, True, floats) for k, v in value.items()) + "}"
    if isinstance(value, (list, tuple)):
        return "[" + ",".join(_pj_format(v, True, floats) for v in value) + "]"
    return str(value)


def _pj_resolve(name):
    owner = globals().get("Solution")
    if isinstance(owner, type) and hasattr(owner, name):
        return getattr(owner(), name)
    return globals()[name]
"#;

fn definition(kind: StructuralKind) -> &'static str {
    match kind {
        StructuralKind::LinkedList => LIST_NODE,
        StructuralKind::BinaryTree => TREE_NODE,
        StructuralKind::Graph => GRAPH_NODE,
    }
}

fn functions(kind: StructuralKind) -> &'static str {
    match kind {
        StructuralKind::LinkedList => LIST_FUNCTIONS,
        StructuralKind::BinaryTree => TREE_FUNCTIONS,
        StructuralKind::Graph => GRAPH_FUNCTIONS,
    }
}

fn serializer(kind: StructuralKind) -> &'static str {
    match kind {
        StructuralKind::LinkedList => "serialize_linked_list",
        StructuralKind::BinaryTree => "serialize_tree",
        StructuralKind::Graph => "serialize_graph",
    }
}

fn duck_test(kind: StructuralKind) -> &'static str {
    match kind {
        StructuralKind::LinkedList => r#"hasattr(value, "val") and hasattr(value, "next")"#,
        StructuralKind::BinaryTree => r#"hasattr(value, "left") and hasattr(value, "right")"#,
        StructuralKind::Graph => r#"hasattr(value, "neighbors")"#,
    }
}

// ============================================================================
// Literals
// ============================================================================

fn float_text(f: f64) -> String {
    match f {
        f if f.is_nan() => "float('nan')".into(),
        f if f == f64::INFINITY => "float('inf')".into(),
        f if f == f64::NEG_INFINITY => "float('-inf')".into(),
        f => float_literal(f),
    }
}

fn dynamic(value: &ParsedValue) -> String {
    match value {
        ParsedValue::Null => "None".into(),
        ParsedValue::Bool(true) => "True".into(),
        ParsedValue::Bool(false) => "False".into(),
        ParsedValue::Int(i) => i.to_string(),
        ParsedValue::Float(f) => float_text(*f),
        ParsedValue::String(s) => json_quote(s),
        ParsedValue::Array(items) => {
            let inner: Vec<String> = items.iter().map(dynamic).collect();
            format!("[{}]", inner.join(", "))
        }
        ParsedValue::Object(fields) => {
            let inner: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{}: {}", json_quote(k), dynamic(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn join_ints(values: impl IntoIterator<Item = i64>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn literal(value: &ParsedValue, ty: CanonicalType) -> String {
    if value.is_null() && !ty.is_structural() {
        return "None".into();
    }

    match ty {
        CanonicalType::Int | CanonicalType::Long => int_of(value).to_string(),
        CanonicalType::Double => float_text(float_of(value)),
        CanonicalType::Boolean => match bool_of(value) {
            true => "True".into(),
            false => "False".into(),
        },
        CanonicalType::Char => json_quote(&char_of(value).to_string()),
        CanonicalType::String => json_quote(&text_of(value)),
        CanonicalType::IntArray
        | CanonicalType::LongArray
        | CanonicalType::DoubleArray
        | CanonicalType::BooleanArray
        | CanonicalType::CharArray
        | CanonicalType::StringArray
        | CanonicalType::IntMatrix => {
            let element = ty.element().unwrap_or(CanonicalType::Any);
            let inner: Vec<String> = items_of(value)
                .into_iter()
                .map(|item| literal(item, element))
                .collect();
            format!("[{}]", inner.join(", "))
        }
        CanonicalType::ListNode => format!("build_linked_list([{}])", join_ints(list_ints(value))),
        CanonicalType::TreeNode => {
            let slots: Vec<String> = tree_slots(value)
                .into_iter()
                .map(|slot| slot.map_or("None".to_string(), |v| v.to_string()))
                .collect();
            format!("build_tree([{}])", slots.join(", "))
        }
        CanonicalType::GraphAdjList => {
            let rows: Vec<String> = adjacency_rows(value)
                .into_iter()
                .map(|row| format!("[{}]", join_ints(row)))
                .collect();
            format!("build_graph([{}])", rows.join(", "))
        }
        CanonicalType::Any => match resolve_type(value, ty) {
            CanonicalType::Any => dynamic(value),
            concrete => literal(value, concrete),
        },
    }
}

// ============================================================================
// Toolchain
// ============================================================================

pub struct PythonToolchain;

impl PythonToolchain {
    fn normalize_fn(&self, kinds: &[StructuralKind]) -> String {
        let mut out = String::from("def _pj_normalize(value):\n");
        for kind in kinds {
            out.push_str(&format!(
                "    if {}:\n        return {}(value)\n",
                duck_test(*kind),
                serializer(*kind)
            ));
        }
        out.push_str("    return value\n");
        out
    }
}

impl LanguageToolchain for PythonToolchain {
    fn language(&self) -> Language {
        Language::Python
    }

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::Hash
    }

    fn map_type(&self, ty: CanonicalType, _position: Position) -> Option<&'static str> {
        let mapped = match ty {
            CanonicalType::Int | CanonicalType::Long => "int",
            CanonicalType::Double => "float",
            CanonicalType::Boolean => "bool",
            CanonicalType::Char | CanonicalType::String => "str",
            CanonicalType::IntArray | CanonicalType::LongArray => "List[int]",
            CanonicalType::DoubleArray => "List[float]",
            CanonicalType::BooleanArray => "List[bool]",
            CanonicalType::CharArray | CanonicalType::StringArray => "List[str]",
            CanonicalType::IntMatrix => "List[List[int]]",
            CanonicalType::ListNode => "Optional[ListNode]",
            CanonicalType::TreeNode => "Optional[TreeNode]",
            CanonicalType::GraphAdjList => "Optional[GraphNode]",
            CanonicalType::Any => "Any",
        };
        Some(mapped)
    }

    fn render_literal(&self, value: &ParsedValue, ty: CanonicalType) -> String {
        literal(value, ty)
    }

    fn render_template(
        &self,
        entry_point: &str,
        schema: &NormalizedSchema,
        question: QuestionType,
    ) -> String {
        let mut out = String::new();

        for kind in template_kinds(schema, question) {
            out.push_str(&format!("# {}\n", kind_title(kind)));
            out.push_str(&comment_lines(definition(kind).trim_end(), "# "));
            out.push('\n');
        }
        if question == QuestionType::CustomClass {
            out.push_str(&comment_lines(&shape_summary(self, schema).join("\n"), "# "));
            out.push('\n');
        }

        let params: Vec<String> = schema
            .params
            .iter()
            .map(|p| {
                let ty = self.map_type(p.ty, Position::Param).unwrap_or("Any");
                format!(", {}: {}", p.name, ty)
            })
            .collect();
        let ret = self
            .map_type(schema.return_type, Position::Return)
            .unwrap_or("Any");

        out.push_str("class Solution:\n");
        out.push_str(&format!(
            "    def {entry_point}(self{}) -> {ret}:\n",
            params.concat()
        ));
        out.push_str("        # Write your code here\n        pass\n");
        out
    }

    fn detect_entry_point(&self, source: &str, fallback: &str) -> String {
        let stripped = strip_comments(source, CommentSyntax::Hash);
        pick_entry_point(names_in_order(&[&DEF], &stripped), fallback)
    }

    fn declares_type(&self, stripped: &str, type_name: &str) -> bool {
        Regex::new(&format!(r"(?m)^[ \t]*class[ \t]+{}\b", regex::escape(type_name)))
            .map(|re| re.is_match(stripped))
            .unwrap_or(false)
    }

    fn compose_harness(&self, request: &HarnessRequest<'_>) -> String {
        let plans = plan_helpers(self, request);
        let user = strip_indented_blocks(request.user_source, |line| {
            line.starts_with("if __name__")
        });

        let mut out = String::from(PRELUDE);
        for fragment in fragments_at(&plans, Placement::BeforeUser, definition, functions) {
            out.push('\n');
            out.push_str(fragment);
        }

        out.push('\n');
        out.push_str(user.trim_end());
        out.push_str("\n\n");

        for fragment in fragments_at(&plans, Placement::AfterUser, definition, functions) {
            out.push_str(fragment);
            out.push('\n');
        }
        out.push_str(SUPPORT);

        let kinds: Vec<StructuralKind> = plans.iter().map(|p| p.kind).collect();
        if request.normalizer == Some(ResultNormalizer::Dynamic) {
            out.push('\n');
            out.push_str(&self.normalize_fn(&kinds));
        }

        out.push('\n');
        let names: Vec<String> = (0..request.args.len()).map(|i| format!("_pj_arg{i}")).collect();
        for (name, arg) in names.iter().zip(&request.args) {
            out.push_str(&format!("{name} = {}\n", arg.expr));
        }
        out.push_str(&format!(
            "_pj_result = _pj_resolve({})({})\n",
            json_quote(request.entry_point),
            names.join(", ")
        ));

        let normalized = match request.normalizer {
            Some(ResultNormalizer::Structure(kind)) => format!("{}(_pj_result)", serializer(kind)),
            Some(ResultNormalizer::Dynamic) => "_pj_normalize(_pj_result)".to_string(),
            None => "_pj_result".to_string(),
        };
        out.push_str(&format!("_pj_out = {normalized}\n"));

        let floats = match request.prints_floats() {
            true => "True",
            false => "False",
        };
        out.push_str(&format!("print(_pj_format(_pj_out, floats={floats}))\n"));
        out
    }
}
