use polyjudge_codegen::{toolchain_for, HarnessBuilder};
use polyjudge_core::{Language, ProblemSpec};

fn two_sum() -> ProblemSpec {
    serde_json::from_str(
        r#"{
            "title": "Two Sum",
            "functionName": "twoSum",
            "questionType": "array",
            "parameterSchema": {
                "params": [{"name": "nums", "type": "int[]"}, {"name": "target", "type": "int"}],
                "returnType": "int[]"
            },
            "testCases": [
                {"input": "[2,7,11,15]\n9", "expectedOutput": "[0,1]"},
                {"input": "[3,2,4]\n6", "expectedOutput": "[1,2]", "isHidden": true}
            ]
        }"#,
    )
    .expect("valid problem")
}

fn reverse_list() -> ProblemSpec {
    serde_json::from_str(
        r#"{
            "title": "Reverse Linked List",
            "questionType": "linked_list",
            "testCases": [{"input": "[1,2,3,4,5]", "expectedOutput": "[5,4,3,2,1]"}]
        }"#,
    )
    .expect("valid problem")
}

#[test]
fn test_two_sum_templates_are_stable_and_detectable() {
    let problem = two_sum();
    let builder = HarnessBuilder::new(&problem);

    for language in Language::all() {
        let first = builder.template(*language);
        let second = builder.template(*language);
        assert_eq!(first, second, "{language} template is not deterministic");
        assert!(first.contains("twoSum"), "{language} template lacks entry point");
        assert_eq!(builder.entry_point(*language, &first), "twoSum");
    }
}

#[test]
fn test_two_sum_harness_per_language() {
    let problem = two_sum();
    let builder = HarnessBuilder::new(&problem);
    let input = &problem.test_cases[0].input;

    let python = builder.build(
        Language::Python,
        "class Solution:\n    def twoSum(self, nums, target):\n        return [0, 1]\n",
        input,
    );
    assert!(python.source.contains("_pj_arg0 = [2, 7, 11, 15]\n_pj_arg1 = 9\n"));

    let js = builder.build(
        Language::JavaScript,
        "var twoSum = function(nums, target) { return [0, 1]; };",
        input,
    );
    assert!(js.source.contains("const __pjArg0 = [2, 7, 11, 15];"));

    let java = builder.build(
        Language::Java,
        "class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        return new int[]{0, 1};\n    }\n}",
        input,
    );
    assert!(java.source.contains("int[] arg0 = new int[]{2, 7, 11, 15};"));
    assert!(java.source.contains("int arg1 = 9;"));

    let cpp = builder.build(
        Language::Cpp,
        "class Solution {\npublic:\n    vector<int> twoSum(vector<int>& nums, int target) {\n        return {0, 1};\n    }\n};",
        input,
    );
    assert!(cpp.source.contains("vector<int> arg0 = vector<int>{2, 7, 11, 15};"));
    assert!(cpp.source.contains("auto result = solution.twoSum(arg0, arg1);"));

    for program in [&python, &js, &java, &cpp] {
        assert_eq!(program.entry_point, "twoSum");
        assert!(!program.source.contains("ListNode"));
    }
}

#[test]
fn test_reverse_list_schema_and_helpers() {
    let problem = reverse_list();
    let builder = HarnessBuilder::new(&problem);
    assert_eq!(problem.fallback_entry_point(), "reverseLinkedList");

    let template = builder.template(Language::Java);
    assert!(template.contains("public ListNode reverseLinkedList(ListNode param) {"));

    let source = "/**\n * class ListNode { int val; ListNode next; }\n */\nclass Solution {\n    public ListNode reverseList(ListNode head) {\n        return head;\n    }\n}";
    let program = builder.build(Language::Java, source, &problem.test_cases[0].input);
    assert_eq!(program.entry_point, "reverseList");
    assert!(program.source.contains("ListNode arg0 = buildLinkedList(new int[]{1, 2, 3, 4, 5});"));
    assert!(program.source.contains("Object out = serializeLinkedList(result);"));
    // the commented definition does not count as a declaration
    assert!(program.source.contains("\nclass ListNode {\n    int val;"));
}

#[test]
fn test_detection_ignores_comments_and_local_names() {
    let cases = [
        (
            Language::Python,
            "class Solution:\n    def twoSum(self, nums, target):\n        seen = {}\n        return []\n",
            "# def decoy(x):\nclass Solution:\n    def twoSum(self, a, b):\n        lookup = {}\n        return []\n",
        ),
        (
            Language::JavaScript,
            "var twoSum = function(nums, target) { return []; };",
            "/* function decoy() {} */\nvar twoSum = function(xs, t) { const m = new Map(); return []; };",
        ),
        (
            Language::Java,
            "class Solution { public int[] twoSum(int[] nums, int target) { return null; } }",
            "// int[] decoy(int x) {\nclass Solution { public int[] twoSum(int[] a, int b) { int k = 0; return null; } }",
        ),
        (
            Language::Cpp,
            "class Solution { public: vector<int> twoSum(vector<int>& nums, int target) { return {}; } };",
            "/* int decoy(int x) { */\nclass Solution { public: vector<int> twoSum(vector<int>& a, int b) { return {}; } };",
        ),
    ];

    for (language, plain, noisy) in cases {
        let toolchain = toolchain_for(language);
        let expected = toolchain.detect_entry_point(plain, "solve");
        assert_eq!(expected, "twoSum", "{language}");
        assert_eq!(toolchain.detect_entry_point(noisy, "solve"), expected, "{language}");
    }
}

fn structural(title: &str, question_type: &str, ty: &str, input: &str) -> ProblemSpec {
    let json = serde_json::json!({
        "title": title,
        "questionType": question_type,
        "parameterSchema": {"params": [{"name": "arg", "type": ty}], "returnType": ty},
        "testCases": [{"input": input, "expectedOutput": input}]
    });
    serde_json::from_value(json).expect("valid problem")
}

fn compose_all(problem: &ProblemSpec) -> Vec<(Language, String)> {
    let builder = HarnessBuilder::new(problem);
    let input = &problem.test_cases[0].input;
    Language::all()
        .iter()
        .map(|language| {
            let user = builder.template(*language);
            (*language, builder.build(*language, &user, input).source)
        })
        .collect()
}

#[test]
fn test_list_serializers_detect_cycles_without_a_length_cap() {
    let problem = structural("Echo List", "linked_list", "ListNode", "[1,2,3]");
    for (language, source) in compose_all(&problem) {
        assert!(source.contains("linked list contains a cycle"), "{language}");
        assert!(!source.contains("10000"), "{language} caps the walk");
    }
}

#[test]
fn test_long_list_literal_is_emitted_whole() {
    let values: Vec<String> = (1..=10_001).map(|v| v.to_string()).collect();
    let input = format!("[{}]", values.join(","));
    let problem = structural("Echo List", "linked_list", "ListNode", &input);
    for (language, source) in compose_all(&problem) {
        assert!(source.contains("1, 2, 3, "), "{language}");
        assert!(source.contains("9999, 10000, 10001"), "{language}");
    }
}

#[test]
fn test_tree_serializers_trim_trailing_nulls() {
    let problem = structural("Echo Tree", "binary_tree", "TreeNode", "[1,null,2]");
    let trims = [
        (Language::Python, "while out and out[-1] is None:\n        out.pop()"),
        (Language::JavaScript, "while (out.length && out[out.length - 1] === null) out.pop();"),
        (Language::Java, "while (!out.isEmpty() && out.get(out.size() - 1) == null) out.remove(out.size() - 1);"),
        (Language::Cpp, "while (!out.tokens.empty() && out.tokens.back() == \"null\") out.tokens.pop_back();"),
    ];
    let programs = compose_all(&problem);
    for ((language, source), (expected_language, trim)) in programs.iter().zip(trims) {
        assert_eq!(*language, expected_language);
        assert!(source.contains(trim), "{language} keeps trailing nulls");
    }
}

#[test]
fn test_graph_helpers_are_one_indexed_and_rows_follow_reachability() {
    let problem = structural("Echo Graph", "graph", "GraphAdjList", "[[2],[1],[]]");
    let markers = [
        (Language::Python, "GraphNode(i + 1)", "for v in range(1, size + 1)"),
        (Language::JavaScript, "new GraphNode(i + 1)", "for (let v = 1; v <= size; v++)"),
        (Language::Java, "new GraphNode(i + 1)", "for (int v = 1; v <= size; v++)"),
        (Language::Cpp, "new GraphNode((int) i + 1)", "for (int v = 1; v <= size; v++)"),
    ];
    let programs = compose_all(&problem);
    for ((language, source), (expected_language, build, rows)) in programs.iter().zip(markers) {
        assert_eq!(*language, expected_language);
        assert!(source.contains(build), "{language} builder is not 1-indexed");
        assert!(source.contains("nodes[j - 1]"), "{language}");
        // rows run from 1 to the largest id reached from node 1, so an
        // isolated trailing node such as 3 in [[2],[1],[]] is not emitted
        assert!(source.contains(rows), "{language} row emission changed");
    }
}
