use std::sync::LazyLock;

use polyjudge_core::{
    CanonicalType, Language, NormalizedSchema, ParsedValue, Position, QuestionType,
    StructuralKind,
};
use regex::Regex;

use super::{comment_lines, kind_title, shape_summary, template_kinds};
use crate::detect::{names_in_order, pick_entry_point, TYPED_DEFINITION};
use crate::literal::{
    adjacency_rows, bool_of, c_escape, char_of, float_literal, float_of, int_of, items_of,
    json_text, list_ints, resolve_type, text_of, tree_slots, Escape,
};
use crate::source::{hoist_lines, strip_comments, CommentSyntax};
use crate::structures::{fragments_at, plan_helpers, Placement};
use crate::toolchain::{HarnessRequest, LanguageToolchain, ResultNormalizer};

static PUBLIC_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^public\s+((?:(?:final|abstract|static|sealed)\s+)*(?:class|interface|enum|record)\b)",
    )
    .expect("invalid public type regex")
});

const BASE_IMPORTS: [&str; 2] = ["import java.util.*;", "import java.util.stream.*;"];

// ============================================================================
// Helper library
// ============================================================================

const LIST_NODE: &str = r#"class ListNode {
    int val;
    ListNode next;
    ListNode() {}
    ListNode(int val) { this.val = val; }
    ListNode(int val, ListNode next) { this.val = val; this.next = next; }
}
"#;

const TREE_NODE: &str = r#"class TreeNode {
    int val;
    TreeNode left;
    TreeNode right;
    TreeNode() {}
    TreeNode(int val) { this.val = val; }
    TreeNode(int val, TreeNode left, TreeNode right) {
        this.val = val;
        this.left = left;
        this.right = right;
    }
}
"#;

const GRAPH_NODE: &str = r#"class GraphNode {
    public int val;
    public List<GraphNode> neighbors;
    public GraphNode() { this(0); }
    public GraphNode(int val) { this.val = val; this.neighbors = new ArrayList<GraphNode>(); }
    public GraphNode(int val, List<GraphNode> neighbors) { this.val = val; this.neighbors = neighbors; }
}
"#;

const LIST_FUNCTIONS: &str = r#"    static ListNode buildLinkedList(int[] values) {
        ListNode dummy = new ListNode(0);
        ListNode tail = dummy;
        for (int v : values) {
            tail.next = new ListNode(v);
            tail = tail.next;
        }
        return dummy.next;
    }

    static List<Integer> serializeLinkedList(ListNode head) {
        ListNode slow = head;
        ListNode fast = head;
        while (fast != null && fast.next != null) {
            slow = slow.next;
            fast = fast.next.next;
            if (slow == fast) throw new IllegalStateException("linked list contains a cycle");
        }
        List<Integer> out = new ArrayList<>();
        while (head != null) {
            out.add(head.val);
            head = head.next;
        }
        return out;
    }
"#;

const TREE_FUNCTIONS: &str = r#"    static TreeNode buildTree(Integer[] values) {
        if (values.length == 0 || values[0] == null) return null;
        TreeNode root = new TreeNode(values[0]);
        Deque<TreeNode> queue = new ArrayDeque<>();
        queue.add(root);
        int i = 1;
        while (!queue.isEmpty() && i < values.length) {
            TreeNode node = queue.poll();
            if (i < values.length && values[i] != null) {
                node.left = new TreeNode(values[i]);
                queue.add(node.left);
            }
            i++;
            if (i < values.length && values[i] != null) {
                node.right = new TreeNode(values[i]);
                queue.add(node.right);
            }
            i++;
        }
        return root;
    }

    static List<Integer> serializeTree(TreeNode root) {
        List<Integer> out = new ArrayList<>();
        Queue<TreeNode> queue = new LinkedList<>();
        queue.add(root);
        while (!queue.isEmpty()) {
            TreeNode node = queue.poll();
            if (node == null) {
                out.add(null);
                continue;
            }
            out.add(node.val);
            queue.add(node.left);
            queue.add(node.right);
        }
        while (!out.isEmpty() && out.get(out.size() - 1) == null) out.remove(out.size() - 1);
        return out;
    }
"#;

// Graphs are walked from node 1; rows for unreachable nodes are dropped.
const GRAPH_FUNCTIONS: &str = r#"    static GraphNode buildGraph(int[][] adjacency) {
        GraphNode[] nodes = new GraphNode[adjacency.length];
        for (int i = 0; i < adjacency.length; i++) nodes[i] = new GraphNode(i + 1);
        for (int i = 0; i < adjacency.length; i++) {
            for (int j : adjacency[i]) {
                if (j >= 1 && j <= nodes.length) nodes[i].neighbors.add(nodes[j - 1]);
            }
        }
        return nodes.length == 0 ? null : nodes[0];
    }

    static List<List<Integer>> serializeGraph(GraphNode start) {
        List<List<Integer>> out = new ArrayList<>();
        if (start == null) return out;
        Map<Integer, GraphNode> seen = new HashMap<>();
        seen.put(start.val, start);
        Deque<GraphNode> queue = new ArrayDeque<>();
        queue.add(start);
        while (!queue.isEmpty()) {
            GraphNode node = queue.poll();
            for (GraphNode nb : node.neighbors) {
                if (!seen.containsKey(nb.val)) {
                    seen.put(nb.val, nb);
                    queue.add(nb);
                }
            }
        }
        int size = Collections.max(seen.keySet());
        for (int v = 1; v <= size; v++) {
            List<Integer> row = new ArrayList<>();
            GraphNode node = seen.get(v);
            if (node != null) for (GraphNode nb : node.neighbors) row.add(nb.val);
            out.add(row);
        }
        return out;
    }
"#;

const SUPPORT: &str = r#"    static List<List<Integer>> toNestedList(int[][] rows) {
        List<List<Integer>> out = new ArrayList<>();
        for (int[] row : rows) {
            List<Integer> inner = new ArrayList<>();
            for (int v : row) inner.add(v);
            out.add(inner);
        }
        return out;
    }

    static String pjQuote(String s) {
        StringBuilder out = new StringBuilder("\"");
        for (char c : s.toCharArray()) {
            switch (c) {
                case '"': out.append("\\\""); break;
                case '\\': out.append("\\\\"); break;
                case '\n': out.append("\\n"); break;
                case '\r': out.append("\\r"); break;
                case '\t': out.append("\\t"); break;
                default: out.append(c);
            }
        }
        return out.append('"').toString();
    }

    static String pjFormat(Object value, boolean nested) {
        if (value == null) return "null";
        if (value instanceof Boolean) return value.toString();
        if (value instanceof Double || value instanceof Float) {
            double d = ((Number) value).doubleValue();
            if (Double.isNaN(d)) return "NaN";
            if (Double.isInfinite(d)) return d > 0 ? "Infinity" : "-Infinity";
            return String.format(Locale.ROOT, "%.5f", d);
        }
        if (value instanceof Number) return value.toString();
        if (value instanceof Character || value instanceof CharSequence) {
            return nested ? pjQuote(value.toString()) : value.toString();
        }
        if (value.getClass().isArray()) {
            StringJoiner out = new StringJoiner(",", "[", "]");
            int length = java.lang.reflect.Array.getLength(value);
            for (int i = 0; i < length; i++) out.add(pjFormat(java.lang.reflect.Array.get(value, i), true));
            return out.toString();
        }
        if (value instanceof Iterable) {
            StringJoiner out = new StringJoiner(",", "[", "]");
            for (Object item : (Iterable<?>) value) out.add(pjFormat(item, true));
            return out.toString();
        }
        if (value instanceof Map) {
            StringJoiner out = new StringJoiner(",", "{", "}");
            for (Map.Entry<?, ?> e : ((Map<?, ?>) value).entrySet()) {
                out.add(pjQuote(String.valueOf(e.getKey())) + ":" + pjFormat(e.getValue(), true));
            }
            return out.toString();
        }
        return value.toString();
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

// ============================================================================
// Literals
// ============================================================================

fn float_text(f: f64) -> String {
    match f {
        f if f.is_nan() => "Double.NaN".into(),
        f if f == f64::INFINITY => "Double.POSITIVE_INFINITY".into(),
        f if f == f64::NEG_INFINITY => "Double.NEGATIVE_INFINITY".into(),
        f => float_literal(f),
    }
}

fn string_text(s: &str) -> String {
    format!("\"{}\"", c_escape(s, '"', Escape::Java))
}

fn char_text(c: char) -> String {
    format!("'{}'", c_escape(&c.to_string(), '\'', Escape::Java))
}

fn scalar(value: &ParsedValue, ty: CanonicalType) -> String {
    match ty {
        CanonicalType::Long => format!("{}L", int_of(value)),
        CanonicalType::Double => float_text(float_of(value)),
        CanonicalType::Boolean => bool_of(value).to_string(),
        CanonicalType::Char if value.is_null() => "'\\0'".into(),
        CanonicalType::Char => char_text(char_of(value)),
        CanonicalType::String if value.is_null() => "null".into(),
        CanonicalType::String => string_text(&text_of(value)),
        _ => int_of(value).to_string(),
    }
}

fn array(value: &ParsedValue, ty: CanonicalType) -> String {
    let element = ty.element().unwrap_or(CanonicalType::Int);
    let inner: Vec<String> = items_of(value)
        .into_iter()
        .map(|item| match element {
            CanonicalType::IntArray => brace_list(item, CanonicalType::Int),
            scalar_ty => scalar(item, scalar_ty),
        })
        .collect();

    let java_type = match ty {
        CanonicalType::IntMatrix => "int[][]",
        CanonicalType::LongArray => "long[]",
        CanonicalType::DoubleArray => "double[]",
        CanonicalType::BooleanArray => "boolean[]",
        CanonicalType::CharArray => "char[]",
        CanonicalType::StringArray => "String[]",
        _ => "int[]",
    };
    format!("new {java_type}{{{}}}", inner.join(", "))
}

fn brace_list(value: &ParsedValue, element: CanonicalType) -> String {
    let inner: Vec<String> = items_of(value)
        .into_iter()
        .map(|item| scalar(item, element))
        .collect();
    format!("{{{}}}", inner.join(", "))
}

fn join_ints(values: &[i64]) -> String {
    values.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

fn literal(value: &ParsedValue, ty: CanonicalType) -> String {
    match ty {
        CanonicalType::Int
        | CanonicalType::Long
        | CanonicalType::Double
        | CanonicalType::Boolean
        | CanonicalType::Char
        | CanonicalType::String => scalar(value, ty),
        _ if ty.is_array() && value.is_null() => "null".into(),
        CanonicalType::IntMatrix => format!("toNestedList({})", array(value, ty)),
        CanonicalType::IntArray
        | CanonicalType::LongArray
        | CanonicalType::DoubleArray
        | CanonicalType::BooleanArray
        | CanonicalType::CharArray
        | CanonicalType::StringArray => array(value, ty),
        CanonicalType::ListNode => {
            format!("buildLinkedList(new int[]{{{}}})", join_ints(&list_ints(value)))
        }
        CanonicalType::TreeNode => {
            let slots: Vec<String> = tree_slots(value)
                .into_iter()
                .map(|slot| slot.map_or("null".to_string(), |v| v.to_string()))
                .collect();
            format!("buildTree(new Integer[]{{{}}})", slots.join(", "))
        }
        CanonicalType::GraphAdjList => {
            let rows: Vec<String> = adjacency_rows(value)
                .iter()
                .map(|row| format!("{{{}}}", join_ints(row)))
                .collect();
            format!("buildGraph(new int[][]{{{}}})", rows.join(", "))
        }
        CanonicalType::Any => match resolve_type(value, ty) {
            CanonicalType::Any if value.is_null() => "null".into(),
            // no static shape fits; hand the solution the raw JSON text
            CanonicalType::Any => string_text(&json_text(value)),
            concrete => literal(value, concrete),
        },
    }
}

// ============================================================================
// Toolchain
// ============================================================================

pub struct JavaToolchain;

impl JavaToolchain {
    fn normalize_fn(&self, kinds: &[StructuralKind]) -> String {
        let mut out = String::from("    static Object pjNormalize(Object value) {\n");
        for kind in kinds {
            out.push_str(&format!(
                "        if (value instanceof {name}) return {}(({name}) value);\n",
                serializer(*kind),
                name = kind.type_name(),
            ));
        }
        out.push_str("        return value;\n    }\n");
        out
    }
}

impl LanguageToolchain for JavaToolchain {
    fn language(&self) -> Language {
        Language::Java
    }

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::CLike
    }

    fn map_type(&self, ty: CanonicalType, _position: Position) -> Option<&'static str> {
        let mapped = match ty {
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
            CanonicalType::GraphAdjList => "GraphNode",
            CanonicalType::Any => "Object",
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
        if question == QuestionType::CustomClass {
            out.push_str("/**\n");
            out.push_str(&comment_lines(&shape_summary(self, schema).join("\n"), " * "));
            out.push_str("\n */\n");
        }

        let params: Vec<String> = schema
            .params
            .iter()
            .map(|p| {
                let ty = self.map_type(p.ty, Position::Param).unwrap_or("Object");
                format!("{ty} {}", p.name)
            })
            .collect();
        let ret = self
            .map_type(schema.return_type, Position::Return)
            .unwrap_or("Object");

        out.push_str("class Solution {\n");
        out.push_str(&format!(
            "    public {ret} {entry_point}({}) {{\n",
            params.join(", ")
        ));
        out.push_str("        // Write your code here\n    }\n}\n");
        out
    }

    fn detect_entry_point(&self, source: &str, fallback: &str) -> String {
        let stripped = strip_comments(source, CommentSyntax::CLike);
        pick_entry_point(names_in_order(&[&TYPED_DEFINITION], &stripped), fallback)
    }

    fn declares_type(&self, stripped: &str, type_name: &str) -> bool {
        Regex::new(&format!(
            r"\b(?:class|interface|record)\s+{}\b",
            regex::escape(type_name)
        ))
        .map(|re| re.is_match(stripped))
        .unwrap_or(false)
    }

    fn compose_harness(&self, request: &HarnessRequest<'_>) -> String {
        let plans = plan_helpers(self, request);
        let (hoisted, user) = hoist_lines(request.user_source, |line| {
            (line.starts_with("import ") || line.starts_with("package ")) && line.ends_with(';')
        });
        let user = PUBLIC_TYPE.replace_all(&user, "${1}");

        let mut out = String::new();
        for import in BASE_IMPORTS {
            out.push_str(import);
            out.push('\n');
        }
        for line in &hoisted {
            if line.starts_with("import ") && !BASE_IMPORTS.contains(&line.as_str()) {
                out.push_str(line);
                out.push('\n');
            }
        }

        let no_functions = |_: StructuralKind| "";
        for fragment in fragments_at(&plans, Placement::BeforeUser, definition, no_functions) {
            out.push('\n');
            out.push_str(fragment);
        }

        out.push('\n');
        out.push_str(user.trim());
        out.push_str("\n\n");

        for fragment in fragments_at(&plans, Placement::AfterUser, definition, no_functions) {
            out.push_str(fragment);
            out.push('\n');
        }

        out.push_str("public class Main {\n");
        for plan in &plans {
            out.push_str(functions(plan.kind));
            out.push('\n');
        }
        out.push_str(SUPPORT);
        if request.normalizer == Some(ResultNormalizer::Dynamic) {
            let kinds: Vec<StructuralKind> = plans.iter().map(|p| p.kind).collect();
            out.push('\n');
            out.push_str(&self.normalize_fn(&kinds));
        }

        out.push_str("\n    public static void main(String[] args) {\n");
        let names: Vec<String> = (0..request.args.len()).map(|i| format!("arg{i}")).collect();
        for (name, arg) in names.iter().zip(&request.args) {
            let ty = self.map_type(arg.ty, Position::Return).unwrap_or("Object");
            out.push_str(&format!("        {ty} {name} = {};\n", arg.expr));
        }
        out.push_str(&format!(
            "        var result = new Solution().{}({});\n",
            request.entry_point,
            names.join(", ")
        ));

        let normalized = match request.normalizer {
            Some(ResultNormalizer::Structure(kind)) => format!("{}(result)", serializer(kind)),
            Some(ResultNormalizer::Dynamic) => "pjNormalize(result)".to_string(),
            None => "result".to_string(),
        };
        out.push_str(&format!("        Object out = {normalized};\n"));
        out.push_str("        System.out.println(pjFormat(out, false));\n    }\n}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::MarshaledArg;
    use polyjudge_core::{parse_line, Param};

    #[test]
    fn test_marshal_widens_out_of_range_ints() {
        let tc = JavaToolchain;
        assert_eq!(
            tc.marshal(&parse_line("5000000000"), CanonicalType::Int),
            MarshaledArg { ty: CanonicalType::Long, expr: "5000000000L".into() }
        );
        assert_eq!(
            tc.marshal(&parse_line("[1,3000000000]"), CanonicalType::IntArray),
            MarshaledArg { ty: CanonicalType::LongArray, expr: "new long[]{1L, 3000000000L}".into() }
        );
    }

    #[test]
    fn test_literals() {
        let tc = JavaToolchain;
        assert_eq!(tc.render_literal(&parse_line("[2,7,11,15]"), CanonicalType::IntArray), "new int[]{2, 7, 11, 15}");
        assert_eq!(tc.render_literal(&parse_line("5"), CanonicalType::Long), "5L");
        assert_eq!(tc.render_literal(&parse_line("NaN"), CanonicalType::Double), "Double.NaN");
        assert_eq!(tc.render_literal(&parse_line("\"it's\""), CanonicalType::Char), "'i'");
        assert_eq!(tc.render_literal(&parse_line("\"'\""), CanonicalType::Char), "'\\''");
        assert_eq!(tc.render_literal(&parse_line("[\"a\",\"b\"]"), CanonicalType::StringArray), "new String[]{\"a\", \"b\"}");
        assert_eq!(
            tc.render_literal(&parse_line("[[1,2],[3]]"), CanonicalType::IntMatrix),
            "toNestedList(new int[][]{{1, 2}, {3}})"
        );
        assert_eq!(
            tc.render_literal(&parse_line("[3,9,null]"), CanonicalType::TreeNode),
            "buildTree(new Integer[]{3, 9, null})"
        );
        assert_eq!(tc.render_literal(&parse_line("null"), CanonicalType::IntArray), "null");
        assert_eq!(tc.render_literal(&parse_line("{\"k\":1}"), CanonicalType::Any), "\"{\\\"k\\\":1}\"");
    }

    #[test]
    fn test_template() {
        let tc = JavaToolchain;
        let schema = NormalizedSchema {
            params: vec![Param { name: "root".into(), ty: CanonicalType::TreeNode }],
            return_type: CanonicalType::Int,
        };
        let template = tc.render_template("maxDepth", &schema, QuestionType::BinaryTree);
        assert!(template.contains(" * class TreeNode {"));
        assert!(template.contains("    public int maxDepth(TreeNode root) {"));
        assert_eq!(tc.detect_entry_point(&template, "maxDepth"), "maxDepth");
    }

    #[test]
    fn test_detect_skips_constructors_and_main() {
        let tc = JavaToolchain;
        let source = "class Solution {\n    public Solution() {\n    }\n    private int helper(int x) {\n        return x;\n    }\n    public static void main(String[] args) {\n    }\n    public boolean isPalindrome(String s) {\n        return true;\n    }\n}";
        assert_eq!(tc.detect_entry_point(source, "unknown"), "isPalindrome");
    }

    #[test]
    fn test_compose_hoists_imports_and_demotes_public() {
        let tc = JavaToolchain;
        let user = "import java.util.function.*;\nimport java.util.*;\n\npublic class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        return new int[]{0, 1};\n    }\n}";
        let args = vec![
            MarshaledArg { ty: CanonicalType::IntArray, expr: "new int[]{2, 7, 11, 15}".into() },
            MarshaledArg { ty: CanonicalType::Int, expr: "9".into() },
        ];
        let request = HarnessRequest::new(user, "twoSum", args, CanonicalType::IntArray);
        let program = tc.compose_harness(&request);

        assert!(program.starts_with("import java.util.*;\nimport java.util.stream.*;\nimport java.util.function.*;\n"));
        assert_eq!(program.matches("import java.util.*;").count(), 1);
        assert!(program.contains("\nclass Solution {"));
        assert_eq!(program.matches("public class").count(), 1);
        assert!(program.contains("public class Main {"));
        assert!(program.contains("        int[] arg0 = new int[]{2, 7, 11, 15};"));
        assert!(program.contains("        var result = new Solution().twoSum(arg0, arg1);"));
        assert!(program.contains("        Object out = result;"));
    }

    #[test]
    fn test_compose_dynamic_checks_only_present_structures() {
        let tc = JavaToolchain;
        let user = "class ListNode { int val; ListNode next; ListNode(int v) { val = v; } }\nclass Solution {\n    public Object make(int v) {\n        return new ListNode(v);\n    }\n}";
        let args = vec![MarshaledArg { ty: CanonicalType::Int, expr: "1".into() }];
        let request = HarnessRequest::new(user, "make", args, CanonicalType::Any);
        let program = tc.compose_harness(&request);

        assert_eq!(program.matches("class ListNode").count(), 1);
        assert!(program.contains("if (value instanceof ListNode) return serializeLinkedList((ListNode) value);"));
        assert!(!program.contains("TreeNode"));
        assert!(program.contains("Object out = pjNormalize(result);"));
    }
}
