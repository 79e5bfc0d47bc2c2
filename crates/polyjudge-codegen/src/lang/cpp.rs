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
    json_text, resolve_type, text_of, tree_slots, Escape,
};
use crate::source::{strip_braced_blocks, strip_comments, CommentSyntax};
use crate::structures::{fragments_at, plan_helpers, Placement};
use crate::toolchain::{HarnessRequest, LanguageToolchain, ResultNormalizer};

static MAIN_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:int|void|signed|auto)\s+main\s*\(").expect("invalid main regex")
});

static SOLUTION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:class|struct)\s+Solution\b").expect("invalid solution regex")
});

// ============================================================================
// Helper library
// ============================================================================

const PRELUDE: &str = r#"#include <bits/stdc++.h>
using namespace std;

struct PjFlat {
    vector<string> tokens;
};
"#;

const LIST_NODE: &str = r#"struct ListNode {
    int val;
    ListNode *next;
    ListNode() : val(0), next(nullptr) {}
    ListNode(int x) : val(x), next(nullptr) {}
    ListNode(int x, ListNode *next) : val(x), next(next) {}
};
"#;

const TREE_NODE: &str = r#"struct TreeNode {
    int val;
    TreeNode *left;
    TreeNode *right;
    TreeNode() : val(0), left(nullptr), right(nullptr) {}
    TreeNode(int x) : val(x), left(nullptr), right(nullptr) {}
    TreeNode(int x, TreeNode *left, TreeNode *right) : val(x), left(left), right(right) {}
};
"#;

const GRAPH_NODE: &str = r#"struct GraphNode {
    int val;
    vector<GraphNode*> neighbors;
    GraphNode() : val(0) {}
    GraphNode(int x) : val(x) {}
    GraphNode(int x, vector<GraphNode*> neighbors) : val(x), neighbors(neighbors) {}
};
"#;

const LIST_FUNCTIONS: &str = r#"ListNode* buildLinkedList(const vector<int>& values) {
    ListNode dummy(0);
    ListNode* tail = &dummy;
    for (int v : values) {
        tail->next = new ListNode(v);
        tail = tail->next;
    }
    return dummy.next;
}

vector<int> serializeLinkedList(ListNode* head) {
    ListNode* slow = head;
    ListNode* fast = head;
    while (fast != nullptr && fast->next != nullptr) {
        slow = slow->next;
        fast = fast->next->next;
        if (slow == fast) throw runtime_error("linked list contains a cycle");
    }
    vector<int> out;
    while (head != nullptr) {
        out.push_back(head->val);
        head = head->next;
    }
    return out;
}
"#;

const TREE_FUNCTIONS: &str = r#"TreeNode* buildTree(const vector<string>& values) {
    if (values.empty() || values[0] == "null") return nullptr;
    TreeNode* root = new TreeNode(stoi(values[0]));
    queue<TreeNode*> pending;
    pending.push(root);
    size_t i = 1;
    while (!pending.empty() && i < values.size()) {
        TreeNode* node = pending.front();
        pending.pop();
        if (i < values.size() && values[i] != "null") {
            node->left = new TreeNode(stoi(values[i]));
            pending.push(node->left);
        }
        i++;
        if (i < values.size() && values[i] != "null") {
            node->right = new TreeNode(stoi(values[i]));
            pending.push(node->right);
        }
        i++;
    }
    return root;
}

PjFlat serializeTree(TreeNode* root) {
    PjFlat out;
    queue<TreeNode*> pending;
    pending.push(root);
    while (!pending.empty()) {
        TreeNode* node = pending.front();
        pending.pop();
        if (node == nullptr) {
            out.tokens.push_back("null");
            continue;
        }
        out.tokens.push_back(to_string(node->val));
        pending.push(node->left);
        pending.push(node->right);
    }
    while (!out.tokens.empty() && out.tokens.back() == "null") out.tokens.pop_back();
    return out;
}
"#;

// Graphs are walked from node 1; rows for unreachable nodes are dropped.
const GRAPH_FUNCTIONS: &str = r#"GraphNode* buildGraph(const vector<vector<int>>& adjacency) {
    vector<GraphNode*> nodes;
    for (size_t i = 0; i < adjacency.size(); i++) nodes.push_back(new GraphNode((int) i + 1));
    for (size_t i = 0; i < adjacency.size(); i++) {
        for (int j : adjacency[i]) {
            if (j >= 1 && j <= (int) nodes.size()) nodes[i]->neighbors.push_back(nodes[j - 1]);
        }
    }
    return nodes.empty() ? nullptr : nodes[0];
}

vector<vector<int>> serializeGraph(GraphNode* start) {
    vector<vector<int>> out;
    if (start == nullptr) return out;
    map<int, GraphNode*> seen;
    seen[start->val] = start;
    queue<GraphNode*> pending;
    pending.push(start);
    while (!pending.empty()) {
        GraphNode* node = pending.front();
        pending.pop();
        for (GraphNode* nb : node->neighbors) {
            if (!seen.count(nb->val)) {
                seen[nb->val] = nb;
                pending.push(nb);
            }
        }
    }
    int size = seen.rbegin()->first;
    for (int v = 1; v <= size; v++) {
        vector<int> row;
        auto it = seen.find(v);
        if (it != seen.end()) {
            for (GraphNode* nb : it->second->neighbors) row.push_back(nb->val);
        }
        out.push_back(row);
    }
    return out;
}
"#;

const SUPPORT: &str = r#"string pjQuote(const string& s) {
    string out = "\"";
    for (char c : s) {
        switch (c) {
            case '"': out += "\\\""; break;
            case '\\': out += "\\\\"; break;
            case '\n': out += "\\n"; break;
            case '\r': out += "\\r"; break;
            case '\t': out += "\\t"; break;
            default: out += c;
        }
    }
    return out + "\"";
}

string pjFormat(bool v, bool nested = false) { return v ? "true" : "false"; }
string pjFormat(char v, bool nested = false) { string s(1, v); return nested ? pjQuote(s) : s; }
string pjFormat(const string& v, bool nested = false) { return nested ? pjQuote(v) : v; }
string pjFormat(const char* v, bool nested = false) { return pjFormat(string(v), nested); }

string pjFormat(double v, bool nested = false) {
    if (isnan(v)) return "NaN";
    if (isinf(v)) return v > 0 ? "Infinity" : "-Infinity";
    ostringstream out;
    out << fixed << setprecision(5) << v;
    return out.str();
}

string pjFormat(float v, bool nested = false) { return pjFormat((double) v, nested); }

template <typename T>
typename enable_if<is_integral<T>::value, string>::type pjFormat(T v, bool nested = false) {
    return to_string(v);
}

string pjFormat(const PjFlat& v, bool nested = false) {
    string out = "[";
    for (size_t i = 0; i < v.tokens.size(); i++) {
        if (i) out += ",";
        out += v.tokens[i];
    }
    return out + "]";
}

template <typename T>
string pjFormat(const vector<T>& v, bool nested = false) {
    string out = "[";
    for (size_t i = 0; i < v.size(); i++) {
        if (i) out += ",";
        out += pjFormat(v[i], true);
    }
    return out + "]";
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

fn format_overload(kind: StructuralKind) -> String {
    format!(
        "string pjFormat({}* value, bool nested = false) {{ return pjFormat({}(value), nested); }}\n",
        kind.type_name(),
        serializer(kind)
    )
}

// ============================================================================
// Literals
// ============================================================================

fn float_text(f: f64) -> String {
    match f {
        f if f.is_nan() => "numeric_limits<double>::quiet_NaN()".into(),
        f if f == f64::INFINITY => "numeric_limits<double>::infinity()".into(),
        f if f == f64::NEG_INFINITY => "-numeric_limits<double>::infinity()".into(),
        f => float_literal(f),
    }
}

fn string_text(s: &str) -> String {
    format!("\"{}\"", c_escape(s, '"', Escape::Cpp))
}

fn scalar(value: &ParsedValue, ty: CanonicalType) -> String {
    match ty {
        CanonicalType::Long => format!("{}LL", int_of(value)),
        CanonicalType::Double => float_text(float_of(value)),
        CanonicalType::Boolean => bool_of(value).to_string(),
        CanonicalType::Char if value.is_null() => "'\\0'".into(),
        CanonicalType::Char => {
            let c = char_of(value);
            let c = match c.is_ascii() {
                true => c,
                false => '?',
            };
            format!("'{}'", c_escape(&c.to_string(), '\'', Escape::Cpp))
        }
        CanonicalType::String => string_text(&text_of(value)),
        _ => int_of(value).to_string(),
    }
}

fn brace_list(value: &ParsedValue, element: CanonicalType) -> String {
    let inner: Vec<String> = items_of(value)
        .into_iter()
        .map(|item| match element {
            CanonicalType::IntArray => brace_list(item, CanonicalType::Int),
            scalar_ty => scalar(item, scalar_ty),
        })
        .collect();
    format!("{{{}}}", inner.join(", "))
}

fn literal(value: &ParsedValue, ty: CanonicalType) -> String {
    match ty {
        CanonicalType::Int
        | CanonicalType::Long
        | CanonicalType::Double
        | CanonicalType::Boolean
        | CanonicalType::Char
        | CanonicalType::String => scalar(value, ty),
        CanonicalType::IntArray
        | CanonicalType::LongArray
        | CanonicalType::DoubleArray
        | CanonicalType::BooleanArray
        | CanonicalType::CharArray
        | CanonicalType::StringArray
        | CanonicalType::IntMatrix => {
            let vector_type = CppToolchain.map_type(ty, Position::Return).unwrap_or("auto");
            let element = ty.element().unwrap_or(CanonicalType::Int);
            format!("{vector_type}{}", brace_list(value, element))
        }
        CanonicalType::ListNode => format!(
            "buildLinkedList(vector<int>{})",
            brace_list(value, CanonicalType::Int)
        ),
        CanonicalType::TreeNode => {
            let tokens: Vec<String> = tree_slots(value)
                .into_iter()
                .map(|slot| match slot {
                    Some(v) => format!("\"{v}\""),
                    None => "\"null\"".to_string(),
                })
                .collect();
            format!("buildTree(vector<string>{{{}}})", tokens.join(", "))
        }
        CanonicalType::GraphAdjList => {
            let rows: Vec<String> = adjacency_rows(value)
                .iter()
                .map(|row| {
                    let row: Vec<String> = row.iter().map(i64::to_string).collect();
                    format!("{{{}}}", row.join(", "))
                })
                .collect();
            format!("buildGraph(vector<vector<int>>{{{}}})", rows.join(", "))
        }
        CanonicalType::Any => match resolve_type(value, ty) {
            CanonicalType::Any if value.is_null() => "nullptr".into(),
            CanonicalType::Any => format!("string({})", string_text(&json_text(value))),
            concrete => literal(value, concrete),
        },
    }
}

// ============================================================================
// Toolchain
// ============================================================================

pub struct CppToolchain;

impl LanguageToolchain for CppToolchain {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::CLike
    }

    fn map_type(&self, ty: CanonicalType, position: Position) -> Option<&'static str> {
        let by_ref = position == Position::Param;
        let mapped = match ty {
            CanonicalType::Int => "int",
            CanonicalType::Long => "long long",
            CanonicalType::Double => "double",
            CanonicalType::Boolean => "bool",
            CanonicalType::Char => "char",
            CanonicalType::String => "string",
            CanonicalType::IntArray if by_ref => "vector<int>&",
            CanonicalType::IntArray => "vector<int>",
            CanonicalType::LongArray if by_ref => "vector<long long>&",
            CanonicalType::LongArray => "vector<long long>",
            CanonicalType::DoubleArray if by_ref => "vector<double>&",
            CanonicalType::DoubleArray => "vector<double>",
            CanonicalType::BooleanArray if by_ref => "vector<bool>&",
            CanonicalType::BooleanArray => "vector<bool>",
            CanonicalType::CharArray if by_ref => "vector<char>&",
            CanonicalType::CharArray => "vector<char>",
            CanonicalType::StringArray if by_ref => "vector<string>&",
            CanonicalType::StringArray => "vector<string>",
            CanonicalType::IntMatrix if by_ref => "vector<vector<int>>&",
            CanonicalType::IntMatrix => "vector<vector<int>>",
            CanonicalType::ListNode => "ListNode*",
            CanonicalType::TreeNode => "TreeNode*",
            CanonicalType::GraphAdjList => "GraphNode*",
            CanonicalType::Any => "auto",
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

        // `auto` parameters need C++20, so untyped ones become template parameters
        let mut generics = Vec::new();
        let mut params = Vec::with_capacity(schema.params.len());
        for p in &schema.params {
            let ty = match p.ty {
                CanonicalType::Any => {
                    let name = format!("T{}", generics.len() + 1);
                    generics.push(format!("typename {name}"));
                    name
                }
                ty => self.map_type(ty, Position::Param).unwrap_or("auto").to_string(),
            };
            params.push(format!("{ty} {}", p.name));
        }
        let ret = self
            .map_type(schema.return_type, Position::Return)
            .unwrap_or("auto");

        out.push_str("class Solution {\npublic:\n");
        if !generics.is_empty() {
            out.push_str(&format!("    template <{}>\n", generics.join(", ")));
        }
        out.push_str(&format!(
            "    {ret} {entry_point}({}) {{\n",
            params.join(", ")
        ));
        out.push_str("        // Write your code here\n    }\n};\n");
        out
    }

    fn detect_entry_point(&self, source: &str, fallback: &str) -> String {
        let stripped = strip_comments(source, CommentSyntax::CLike);
        pick_entry_point(names_in_order(&[&TYPED_DEFINITION], &stripped), fallback)
    }

    fn declares_type(&self, stripped: &str, type_name: &str) -> bool {
        Regex::new(&format!(
            r"\b(?:struct|class)\s+{}\s*(?::[^;{{]*)?\{{",
            regex::escape(type_name)
        ))
        .map(|re| re.is_match(stripped))
        .unwrap_or(false)
    }

    fn compose_harness(&self, request: &HarnessRequest<'_>) -> String {
        let plans = plan_helpers(self, request);
        let user = strip_braced_blocks(request.user_source, |line| MAIN_DEFINITION.is_match(line));
        let stripped = strip_comments(&user, CommentSyntax::CLike);

        let mut out = String::from(PRELUDE);
        for fragment in fragments_at(&plans, Placement::BeforeUser, definition, functions) {
            out.push('\n');
            out.push_str(fragment);
        }

        out.push('\n');
        out.push_str(user.trim());
        out.push_str("\n\n");

        for fragment in fragments_at(&plans, Placement::AfterUser, definition, functions) {
            out.push_str(fragment);
            out.push('\n');
        }
        out.push_str(SUPPORT);
        for plan in &plans {
            out.push_str(&format_overload(plan.kind));
        }

        out.push_str("\nint main() {\n");
        let names: Vec<String> = (0..request.args.len()).map(|i| format!("arg{i}")).collect();
        for (name, arg) in names.iter().zip(&request.args) {
            let ty = self.map_type(arg.ty, Position::Return).unwrap_or("auto");
            out.push_str(&format!("    {ty} {name} = {};\n", arg.expr));
        }

        let call = format!("{}({})", request.entry_point, names.join(", "));
        match SOLUTION_CLASS.is_match(&stripped) {
            true => {
                out.push_str("    Solution solution;\n");
                out.push_str(&format!("    auto result = solution.{call};\n"));
            }
            false => out.push_str(&format!("    auto result = {call};\n")),
        }

        let normalized = match request.normalizer {
            Some(ResultNormalizer::Structure(kind)) => format!("{}(result)", serializer(kind)),
            // overload resolution on pjFormat does the run-time dispatch
            Some(ResultNormalizer::Dynamic) | None => "result".to_string(),
        };
        out.push_str(&format!("    cout << pjFormat({normalized}) << endl;\n"));
        out.push_str("    return 0;\n}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::MarshaledArg;
    use polyjudge_core::{parse_line, Param};

    #[test]
    fn test_mapper_reference_params() {
        let tc = CppToolchain;
        assert_eq!(tc.map_type(CanonicalType::IntArray, Position::Param), Some("vector<int>&"));
        assert_eq!(tc.map_type(CanonicalType::IntArray, Position::Return), Some("vector<int>"));
        assert_eq!(tc.map_type(CanonicalType::Long, Position::Param), Some("long long"));
    }

    #[test]
    fn test_marshal_widens_out_of_range_ints() {
        let tc = CppToolchain;
        assert_eq!(
            tc.marshal(&parse_line("5000000000"), CanonicalType::Int),
            MarshaledArg { ty: CanonicalType::Long, expr: "5000000000LL".into() }
        );
        assert_eq!(
            tc.marshal(&parse_line("[1,3000000000]"), CanonicalType::IntArray),
            MarshaledArg { ty: CanonicalType::LongArray, expr: "vector<long long>{1LL, 3000000000LL}".into() }
        );
    }

    #[test]
    fn test_literals() {
        let tc = CppToolchain;
        assert_eq!(tc.render_literal(&parse_line("[2,7,11,15]"), CanonicalType::IntArray), "vector<int>{2, 7, 11, 15}");
        assert_eq!(tc.render_literal(&parse_line("[[1],[]]"), CanonicalType::IntMatrix), "vector<vector<int>>{{1}, {}}");
        assert_eq!(tc.render_literal(&parse_line("5"), CanonicalType::Long), "5LL");
        assert_eq!(tc.render_literal(&parse_line("\"a\\nb\""), CanonicalType::String), "\"a\\nb\"");
        assert_eq!(
            tc.render_literal(&parse_line("[3,9,20,null,null,15,7]"), CanonicalType::TreeNode),
            "buildTree(vector<string>{\"3\", \"9\", \"20\", \"null\", \"null\", \"15\", \"7\"})"
        );
        assert_eq!(tc.render_literal(&parse_line("[]"), CanonicalType::ListNode), "buildLinkedList(vector<int>{})");
        assert_eq!(
            tc.render_literal(&parse_line("Infinity"), CanonicalType::Double),
            "numeric_limits<double>::infinity()"
        );
    }

    #[test]
    fn test_template() {
        let tc = CppToolchain;
        let schema = NormalizedSchema {
            params: vec![
                Param { name: "nums".into(), ty: CanonicalType::IntArray },
                Param { name: "target".into(), ty: CanonicalType::Int },
            ],
            return_type: CanonicalType::IntArray,
        };
        let template = tc.render_template("twoSum", &schema, QuestionType::Array);
        assert!(template.contains("    vector<int> twoSum(vector<int>& nums, int target) {"));
        assert_eq!(tc.detect_entry_point(&template, "twoSum"), "twoSum");
    }

    #[test]
    fn test_template_untyped_params_become_template_parameters() {
        let tc = CppToolchain;
        let schema = NormalizedSchema {
            params: vec![
                Param { name: "data".into(), ty: CanonicalType::Any },
                Param { name: "k".into(), ty: CanonicalType::Int },
                Param { name: "extra".into(), ty: CanonicalType::Any },
            ],
            return_type: CanonicalType::Any,
        };
        let template = tc.render_template("process", &schema, QuestionType::CustomClass);
        assert!(template.contains("    template <typename T1, typename T2>\n    auto process(T1 data, int k, T2 extra) {"));
        assert!(!template.contains("(auto "));
        assert_eq!(tc.detect_entry_point(&template, "process"), "process");
    }

    #[test]
    fn test_declares_type_ignores_forward_declarations() {
        let tc = CppToolchain;
        assert!(tc.declares_type("struct ListNode {\n int val;\n};", "ListNode"));
        assert!(tc.declares_type("struct TreeNode : Base {", "TreeNode"));
        assert!(!tc.declares_type("struct ListNode;", "ListNode"));
    }

    #[test]
    fn test_compose_reverse_list() {
        let tc = CppToolchain;
        let user = "class Solution {\npublic:\n    ListNode* reverseList(ListNode* head) {\n        ListNode* prev = nullptr;\n        while (head) { ListNode* next = head->next; head->next = prev; prev = head; head = next; }\n        return prev;\n    }\n};\n\nint main() {\n    Solution s;\n    return 0;\n}\n";
        let args = vec![MarshaledArg {
            ty: CanonicalType::ListNode,
            expr: "buildLinkedList(vector<int>{1, 2, 3})".into(),
        }];
        let request = HarnessRequest::new(user, "reverseList", args, CanonicalType::ListNode);
        let program = tc.compose_harness(&request);

        assert!(program.starts_with("#include <bits/stdc++.h>\nusing namespace std;\n"));
        let def_at = program.find("struct ListNode {").unwrap_or(usize::MAX);
        let user_at = program.find("class Solution {").unwrap_or(0);
        assert!(def_at < user_at);
        assert_eq!(program.matches("int main()").count(), 1);
        assert!(!program.contains("Solution s;"));
        assert!(program.contains("    ListNode* arg0 = buildLinkedList(vector<int>{1, 2, 3});"));
        assert!(program.contains("    auto result = solution.reverseList(arg0);"));
        assert!(program.contains("    cout << pjFormat(serializeLinkedList(result)) << endl;"));
        assert!(program.contains("string pjFormat(ListNode* value, bool nested = false)"));
        assert!(!program.contains("TreeNode"));
    }

    #[test]
    fn test_compose_free_function() {
        let tc = CppToolchain;
        let user = "int add(int a, int b) {\n    return a + b;\n}";
        let args = vec![
            MarshaledArg { ty: CanonicalType::Int, expr: "1".into() },
            MarshaledArg { ty: CanonicalType::Int, expr: "2".into() },
        ];
        let request = HarnessRequest::new(user, "add", args, CanonicalType::Int);
        let program = tc.compose_harness(&request);
        assert!(program.contains("    auto result = add(arg0, arg1);"));
        assert!(!program.contains("Solution solution;"));
    }
}
