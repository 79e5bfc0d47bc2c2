use std::sync::LazyLock;

use polyjudge_core::{
    CanonicalType, Language, NormalizedSchema, ParsedValue, Position, QuestionType,
    StructuralKind,
};
use regex::Regex;

use super::{comment_lines, kind_title, shape_summary, template_kinds};
use crate::detect::{names_in_order, pick_entry_point};
use crate::literal::{
    adjacency_rows, bool_of, char_of, float_literal, float_of, int_of, items_of, json_quote,
    list_ints, resolve_type, text_of, tree_slots,
};
use crate::source::{strip_comments, CommentSyntax};
use crate::structures::{fragments_at, plan_helpers, Placement};
use crate::toolchain::{HarnessRequest, LanguageToolchain, ResultNormalizer};

static FUNCTION_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfunction\b\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\(")
        .expect("invalid function regex")
});

static BOUND_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:var|let|const)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^()]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("invalid bound function regex")
});

static CLASS_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]+(?:static\s+)?(?:async\s+)?(?P<name>[A-Za-z_$][\w$]*)\s*\([^()]*\)\s*\{")
        .expect("invalid method regex")
});

static EXPORTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:module\.exports\s*=\s*\{?\s*|\bexports\.)(?P<name>[A-Za-z_$][\w$]*)",
    )
    .expect("invalid export regex")
});

// ============================================================================
// Helper library
// ============================================================================

const LIST_NODE: &str = r#"function ListNode(val, next) {
    this.val = (val === undefined ? 0 : val);
    this.next = (next === undefined ? null : next);
}
"#;

const TREE_NODE: &str = r#"function TreeNode(val, left, right) {
    this.val = (val === undefined ? 0 : val);
    this.left = (left === undefined ? null : left);
    this.right = (right === undefined ? null : right);
}
"#;

const GRAPH_NODE: &str = r#"function GraphNode(val, neighbors) {
    this.val = (val === undefined ? 0 : val);
    this.neighbors = (neighbors === undefined ? [] : neighbors);
}
"#;

const LIST_FUNCTIONS: &str = r#"function buildLinkedList(values) {
    const dummy = new ListNode(0);
    let tail = dummy;
    for (const v of values) {
        tail.next = new ListNode(v);
        tail = tail.next;
    }
    return dummy.next;
}

function serializeLinkedList(head) {
    let slow = head;
    let fast = head;
    while (fast != null && fast.next != null) {
        slow = slow.next;
        fast = fast.next.next;
        if (slow === fast) throw new Error("linked list contains a cycle");
    }
    const out = [];
    while (head != null) {
        out.push(head.val);
        head = head.next;
    }
    return out;
}
"#;

const TREE_FUNCTIONS: &str = r#"function buildTree(values) {
    if (!values.length || values[0] === null) return null;
    const root = new TreeNode(values[0]);
    const queue = [root];
    let head = 0;
    let i = 1;
    while (head < queue.length && i < values.length) {
        const node = queue[head++];
        if (i < values.length && values[i] !== null) {
            node.left = new TreeNode(values[i]);
            queue.push(node.left);
        }
        i++;
        if (i < values.length && values[i] !== null) {
            node.right = new TreeNode(values[i]);
            queue.push(node.right);
        }
        i++;
    }
    return root;
}

function serializeTree(root) {
    const out = [];
    const queue = [root];
    for (let head = 0; head < queue.length; head++) {
        const node = queue[head];
        if (node === null || node === undefined) {
            out.push(null);
            continue;
        }
        out.push(node.val);
        queue.push(node.left === undefined ? null : node.left);
        queue.push(node.right === undefined ? null : node.right);
    }
    while (out.length && out[out.length - 1] === null) out.pop();
    return out;
}
"#;

// Graphs are walked from node 1; rows for unreachable nodes are dropped.
const GRAPH_FUNCTIONS: &str = r#"function buildGraph(adjacency) {
    const nodes = adjacency.map((_, i) => new GraphNode(i + 1));
    adjacency.forEach((neighbors, i) => {
        for (const j of neighbors || []) {
            if (Number.isInteger(j) && j >= 1 && j <= nodes.length) nodes[i].neighbors.push(nodes[j - 1]);
        }
    });
    return nodes.length ? nodes[0] : null;
}

function serializeGraph(start) {
    if (start === null || start === undefined) return [];
    const seen = new Map([[start.val, start]]);
    const queue = [start];
    for (let head = 0; head < queue.length; head++) {
        for (const nb of queue[head].neighbors) {
            if (!seen.has(nb.val)) {
                seen.set(nb.val, nb);
                queue.push(nb);
            }
        }
    }
    const size = Math.max(...seen.keys());
    const out = [];
    for (let v = 1; v <= size; v++) {
        out.push(seen.has(v) ? seen.get(v).neighbors.map((nb) => nb.val) : []);
    }
    return out;
}
"#;

const SUPPORT: &str = r#"function __pjFormat(value, nested, floats) {
    if (value === null || value === undefined) return "null";
    if (typeof value === "boolean") return value ? "true" : "false";
    if (typeof value === "number") {
        if (Number.isNaN(value)) return "NaN";
        if (!Number.isFinite(value)) return value > 0 ? "Infinity" : "-Infinity";
        return floats || !Number.isInteger(value) ? value.toFixed(5) : String(value);
    }
    if (typeof value === "bigint") return value.toString();
    if (typeof value === "string") return nested ? JSON.stringify(value) : value;
    if (Array.isArray(value) || ArrayBuffer.isView(value)) {
        return "[" + Array.from(value, (v) => __pjFormat(v, true, floats)).join(",") + "]";
    }
    if (typeof value === "object") {
        return "{" + Object.keys(value).map((k) => JSON.stringify(k) + ":" + __pjFormat(value[k], true, floats)).join(",") + "}";
    }
    return String(value);
}
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
        StructuralKind::LinkedList => "serializeLinkedList",
        StructuralKind::BinaryTree => "serializeTree",
        StructuralKind::Graph => "serializeGraph",
    }
}

fn duck_test(kind: StructuralKind) -> &'static str {
    match kind {
        StructuralKind::LinkedList => r#""val" in value && "next" in value"#,
        StructuralKind::BinaryTree => r#""left" in value && "right" in value"#,
        StructuralKind::Graph => r#""neighbors" in value"#,
    }
}

// ============================================================================
// Literals
// ============================================================================

fn float_text(f: f64) -> String {
    match f {
        f if f.is_nan() => "NaN".into(),
        f if f == f64::INFINITY => "Infinity".into(),
        f if f == f64::NEG_INFINITY => "-Infinity".into(),
        f => float_literal(f),
    }
}

fn dynamic(value: &ParsedValue) -> String {
    match value {
        ParsedValue::Null => "null".into(),
        ParsedValue::Bool(b) => b.to_string(),
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

fn literal(value: &ParsedValue, ty: CanonicalType) -> String {
    if value.is_null() && !ty.is_structural() {
        return "null".into();
    }

    match ty {
        CanonicalType::Int | CanonicalType::Long => int_of(value).to_string(),
        CanonicalType::Double => float_text(float_of(value)),
        CanonicalType::Boolean => bool_of(value).to_string(),
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
        CanonicalType::ListNode => {
            let values: Vec<String> = list_ints(value).iter().map(i64::to_string).collect();
            format!("buildLinkedList([{}])", values.join(", "))
        }
        CanonicalType::TreeNode => {
            let slots: Vec<String> = tree_slots(value)
                .into_iter()
                .map(|slot| slot.map_or("null".to_string(), |v| v.to_string()))
                .collect();
            format!("buildTree([{}])", slots.join(", "))
        }
        CanonicalType::GraphAdjList => {
            let rows: Vec<String> = adjacency_rows(value)
                .into_iter()
                .map(|row| {
                    let row: Vec<String> = row.iter().map(i64::to_string).collect();
                    format!("[{}]", row.join(", "))
                })
                .collect();
            format!("buildGraph([{}])", rows.join(", "))
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

pub struct JavaScriptToolchain;

impl JavaScriptToolchain {
    fn normalize_fn(&self, kinds: &[StructuralKind]) -> String {
        let mut out = String::from("function __pjNormalize(value) {\n");
        for kind in kinds {
            out.push_str(&format!(
                "    if (value !== null && typeof value === \"object\" && {}) return {}(value);\n",
                duck_test(*kind),
                serializer(*kind)
            ));
        }
        out.push_str("    return value;\n}\n");
        out
    }
}

impl LanguageToolchain for JavaScriptToolchain {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::CLike
    }

    fn map_type(&self, ty: CanonicalType, _position: Position) -> Option<&'static str> {
        let mapped = match ty {
            CanonicalType::Int | CanonicalType::Long | CanonicalType::Double => "number",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Char => "character",
            CanonicalType::String => "string",
            CanonicalType::IntArray | CanonicalType::LongArray | CanonicalType::DoubleArray => {
                "number[]"
            }
            CanonicalType::BooleanArray => "boolean[]",
            CanonicalType::CharArray => "character[]",
            CanonicalType::StringArray => "string[]",
            CanonicalType::IntMatrix => "number[][]",
            CanonicalType::ListNode => "ListNode",
            CanonicalType::TreeNode => "TreeNode",
            CanonicalType::GraphAdjList => "GraphNode",
            CanonicalType::Any => "*",
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
            out.push_str(&format!("/**\n * {}\n", kind_title(kind)));
            out.push_str(&comment_lines(definition(kind).trim_end(), " * "));
            out.push_str("\n */\n");
        }

        out.push_str("/**\n");
        if question == QuestionType::CustomClass {
            out.push_str(&comment_lines(&shape_summary(self, schema).join("\n"), " * "));
            out.push('\n');
        }
        for param in &schema.params {
            let ty = self.map_type(param.ty, Position::Param).unwrap_or("*");
            out.push_str(&format!(" * @param {{{ty}}} {}\n", param.name));
        }
        let ret = self
            .map_type(schema.return_type, Position::Return)
            .unwrap_or("*");
        out.push_str(&format!(" * @return {{{ret}}}\n */\n"));

        let names: Vec<&str> = schema.params.iter().map(|p| p.name.as_str()).collect();
        out.push_str(&format!(
            "var {entry_point} = function({}) {{\n    // Write your code here\n}};\n",
            names.join(", ")
        ));
        out
    }

    fn detect_entry_point(&self, source: &str, fallback: &str) -> String {
        let stripped = strip_comments(source, CommentSyntax::CLike);
        let mut candidates = names_in_order(&[&EXPORTED], &stripped);
        candidates.extend(names_in_order(
            &[&FUNCTION_DECL, &BOUND_FUNCTION, &CLASS_METHOD],
            &stripped,
        ));
        pick_entry_point(candidates, fallback)
    }

    fn declares_type(&self, stripped: &str, type_name: &str) -> bool {
        let name = regex::escape(type_name);
        Regex::new(&format!(
            r"\b(?:class|function)\s+{name}\b|\b(?:var|let|const)\s+{name}\s*="
        ))
        .map(|re| re.is_match(stripped))
        .unwrap_or(false)
    }

    fn compose_harness(&self, request: &HarnessRequest<'_>) -> String {
        let plans = plan_helpers(self, request);
        let mut out = String::new();

        for fragment in fragments_at(&plans, Placement::BeforeUser, definition, functions) {
            out.push_str(fragment);
            out.push('\n');
        }

        out.push_str(request.user_source.trim_end());
        out.push_str("\n\n");

        for fragment in fragments_at(&plans, Placement::AfterUser, definition, functions) {
            out.push_str(fragment);
            out.push('\n');
        }
        out.push_str(SUPPORT);

        if request.normalizer == Some(ResultNormalizer::Dynamic) {
            let kinds: Vec<StructuralKind> = plans.iter().map(|p| p.kind).collect();
            out.push('\n');
            out.push_str(&self.normalize_fn(&kinds));
        }

        let entry = request.entry_point;
        out.push('\n');
        out.push_str(&format!(
            "const __pjTarget = (typeof Solution === \"function\" && typeof Solution.prototype.{entry} === \"function\")\n    ? (...args) => new Solution().{entry}(...args)\n    : {entry};\n"
        ));

        let names: Vec<String> = (0..request.args.len()).map(|i| format!("__pjArg{i}")).collect();
        for (name, arg) in names.iter().zip(&request.args) {
            out.push_str(&format!("const {name} = {};\n", arg.expr));
        }
        out.push_str(&format!(
            "const __pjResult = __pjTarget({});\n",
            names.join(", ")
        ));

        let normalized = match request.normalizer {
            Some(ResultNormalizer::Structure(kind)) => format!("{}(__pjResult)", serializer(kind)),
            Some(ResultNormalizer::Dynamic) => "__pjNormalize(__pjResult)".to_string(),
            None => "__pjResult".to_string(),
        };
        out.push_str(&format!("const __pjOut = {normalized};\n"));
        out.push_str(&format!(
            "console.log(__pjFormat(__pjOut, false, {}));\n",
            request.prints_floats()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::MarshaledArg;
    use polyjudge_core::{parse_line, Param};

    #[test]
    fn test_literals() {
        let tc = JavaScriptToolchain;
        assert_eq!(tc.render_literal(&parse_line("[1,2]"), CanonicalType::IntArray), "[1, 2]");
        assert_eq!(tc.render_literal(&parse_line("-Infinity"), CanonicalType::Double), "-Infinity");
        assert_eq!(tc.render_literal(&parse_line("[\"a\",\"b\"]"), CanonicalType::CharArray), "[\"a\", \"b\"]");
        assert_eq!(
            tc.render_literal(&parse_line("[1,null,2]"), CanonicalType::TreeNode),
            "buildTree([1, null, 2])"
        );
        assert_eq!(tc.render_literal(&parse_line("[[1,2],[3]]"), CanonicalType::Any), "[[1, 2], [3]]");
    }

    #[test]
    fn test_template_and_detection() {
        let tc = JavaScriptToolchain;
        let schema = NormalizedSchema {
            params: vec![
                Param { name: "nums".into(), ty: CanonicalType::IntArray },
                Param { name: "target".into(), ty: CanonicalType::Int },
            ],
            return_type: CanonicalType::IntArray,
        };
        let template = tc.render_template("twoSum", &schema, QuestionType::Array);
        assert!(template.contains(" * @param {number[]} nums"));
        assert!(template.contains(" * @return {number[]}"));
        assert!(template.contains("var twoSum = function(nums, target) {"));
        assert_eq!(tc.detect_entry_point(&template, "twoSum"), "twoSum");
    }

    #[test]
    fn test_detection_forms() {
        let tc = JavaScriptToolchain;
        assert_eq!(tc.detect_entry_point("const maxProfit = (prices) => 0;", "x"), "maxProfit");
        assert_eq!(tc.detect_entry_point("function dfs(n) {}\nfunction solve(n) { return dfs(n); }", "x"), "solve");
        assert_eq!(
            tc.detect_entry_point("function a() {}\nfunction b() {}\nmodule.exports = b;", "x"),
            "b"
        );
        assert_eq!(
            tc.detect_entry_point("class Solution {\n    constructor() {}\n    isValid(s) {\n        if (s) {\n        }\n    }\n}", "x"),
            "isValid"
        );
        assert_eq!(tc.detect_entry_point("// function hidden() {}", "fallback"), "fallback");
    }

    #[test]
    fn test_compose_two_sum() {
        let tc = JavaScriptToolchain;
        let user = "var twoSum = function(nums, target) {\n    return [0, 1];\n};";
        let args = vec![
            MarshaledArg { ty: CanonicalType::IntArray, expr: "[2, 7, 11, 15]".into() },
            MarshaledArg { ty: CanonicalType::Int, expr: "9".into() },
        ];
        let request = HarnessRequest::new(user, "twoSum", args, CanonicalType::IntArray);
        let program = tc.compose_harness(&request);
        assert!(program.contains("typeof Solution.prototype.twoSum"));
        assert!(program.contains("const __pjArg0 = [2, 7, 11, 15];"));
        assert!(program.contains("const __pjResult = __pjTarget(__pjArg0, __pjArg1);"));
        assert!(program.contains("console.log(__pjFormat(__pjOut, false, false));"));
        assert!(!program.contains("buildLinkedList"));
    }

    #[test]
    fn test_compose_tree_helpers() {
        let tc = JavaScriptToolchain;
        let user = "var maxDepth = function(root) {\n    return root ? 1 : 0;\n};";
        let args = vec![MarshaledArg { ty: CanonicalType::TreeNode, expr: "buildTree([1])".into() }];
        let request = HarnessRequest::new(user, "maxDepth", args, CanonicalType::Int);
        let program = tc.compose_harness(&request);
        let user_at = program.find("var maxDepth").unwrap_or(usize::MAX);
        let def_at = program.find("function TreeNode(").unwrap_or(0);
        assert!(user_at < def_at);
        assert!(program.contains("function buildTree(values)"));
        assert!(program.contains("const __pjOut = __pjResult;"));
    }
}
