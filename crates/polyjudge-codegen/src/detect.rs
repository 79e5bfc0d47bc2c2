//! Entry-point detection shared by every language.

use std::sync::LazyLock;

use regex::Regex;

/// Names that are never the callable under test
const NOT_ENTRY_POINTS: &[&str] = &[
    // common helpers
    "main", "min", "max", "abs", "swap", "gcd", "lcm", "helper", "dfs", "bfs",
    // node types and the solution wrapper
    "ListNode", "TreeNode", "GraphNode", "Node", "Solution", "constructor",
    // injected helpers
    "build_linked_list", "build_tree", "build_graph",
    "serialize_linked_list", "serialize_tree", "serialize_graph",
    "buildLinkedList", "buildTree", "buildGraph",
    "serializeLinkedList", "serializeTree", "serializeGraph",
    // keywords that look like calls
    "if", "for", "while", "switch", "catch", "return", "sizeof", "function",
    "else", "new", "do", "try", "synchronized", "typeof", "delete",
];

/// Method or function definition in a typed C-family language:
/// a type token, a name, a flat parameter list, then the opening brace.
pub(crate) static TYPED_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[\w>\]]\s+|[\*&]\s*)(?P<name>[A-Za-z_]\w*)\s*\([^()]*\)\s*(?:const\s*)?(?:noexcept\s*)?(?:override\s*)?(?:throws\s+[\w\s,.]+?)?\{",
    )
    .expect("invalid definition regex")
});

pub(crate) fn is_candidate(name: &str) -> bool {
    !name.starts_with("__") && !NOT_ENTRY_POINTS.contains(&name)
}

/// Every `name` capture across the patterns, in source order
pub(crate) fn names_in_order(patterns: &[&Regex], text: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = patterns
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.name("name"))
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect();
    found.sort_by_key(|(start, _)| *start);

    let mut names: Vec<String> = Vec::new();
    for (_, name) in found {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Case and underscores folded away, so `two_sum` matches `twoSum`
fn folded(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The fallback if it is declared, else the first plausible candidate
pub(crate) fn pick_entry_point(candidates: Vec<String>, fallback: &str) -> String {
    let candidates: Vec<String> = candidates.into_iter().filter(|n| is_candidate(n)).collect();
    let wanted = folded(fallback);

    let chosen = candidates
        .iter()
        .find(|name| name.as_str() == fallback)
        .or_else(|| candidates.iter().find(|name| folded(name) == wanted))
        .or_else(|| candidates.first());

    match chosen {
        Some(name) => name.clone(),
        None => {
            tracing::debug!(fallback, "no entry point candidates, using fallback");
            fallback.to_string()
        }
    }
}
