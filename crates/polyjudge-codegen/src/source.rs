//! Text-level inspection and surgery on untrusted user source.
//!
//! None of this parses the languages involved. The scanners only know
//! enough about comments and string literals to keep commented-out code
//! and string contents from looking like declarations.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentSyntax {
    /// `#` line comments, `'`/`"` strings, triple-quoted strings
    Hash,
    /// `//` and `/* */` comments, `'`/`"`/backtick strings
    CLike,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Str(char),
    TripleStr(char),
    LineComment,
    BlockComment,
}

/// Remove comments and string contents, keeping line structure and quotes
pub fn strip_comments(source: &str, syntax: CommentSyntax) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut state = ScanState::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match state {
            ScanState::Code => match c {
                '#' if syntax == CommentSyntax::Hash => state = ScanState::LineComment,
                '/' if syntax == CommentSyntax::CLike && next == Some('/') => {
                    state = ScanState::LineComment;
                    i += 1;
                }
                '/' if syntax == CommentSyntax::CLike && next == Some('*') => {
                    state = ScanState::BlockComment;
                    out.push(' ');
                    i += 1;
                }
                '"' | '\'' if syntax == CommentSyntax::Hash && is_triple(&chars, i, c) => {
                    out.push_str(&c.to_string().repeat(3));
                    state = ScanState::TripleStr(c);
                    i += 2;
                }
                '"' | '\'' => {
                    out.push(c);
                    state = ScanState::Str(c);
                }
                '`' if syntax == CommentSyntax::CLike => {
                    out.push(c);
                    state = ScanState::Str(c);
                }
                _ => out.push(c),
            },
            ScanState::Str(quote) => match c {
                '\\' => i += 1,
                '\n' if quote != '`' => {
                    out.push('\n');
                    state = ScanState::Code;
                }
                _ if c == quote => {
                    out.push(c);
                    state = ScanState::Code;
                }
                '\n' => out.push('\n'),
                _ => {}
            },
            ScanState::TripleStr(quote) => match c {
                '\\' => i += 1,
                _ if c == quote && is_triple(&chars, i, quote) => {
                    out.push_str(&quote.to_string().repeat(3));
                    state = ScanState::Code;
                    i += 2;
                }
                '\n' => out.push('\n'),
                _ => {}
            },
            ScanState::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => match c {
                '*' if next == Some('/') => {
                    state = ScanState::Code;
                    i += 1;
                }
                '\n' => out.push('\n'),
                _ => {}
            },
        }
        i += 1;
    }

    out
}

fn is_triple(chars: &[char], i: usize, quote: char) -> bool {
    chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote)
}

/// Pull matching lines out of the source.
/// Returns `(hoisted_lines, remaining_source)`.
pub fn hoist_lines(source: &str, matches: impl Fn(&str) -> bool) -> (Vec<String>, String) {
    let mut hoisted = Vec::new();
    let mut rest = Vec::new();

    for line in source.lines() {
        match matches(line.trim()) {
            true => hoisted.push(line.trim().to_string()),
            false => rest.push(line),
        }
    }

    (hoisted, rest.join("\n"))
}

/// Drop every brace-delimited block whose first line satisfies `is_start`
pub fn strip_braced_blocks(source: &str, is_start: impl Fn(&str) -> bool) -> String {
    #[derive(PartialEq)]
    enum State {
        Normal,
        Skipping { depth: usize, opened: bool },
    }

    let mut state = State::Normal;
    let mut kept = Vec::new();

    for line in source.lines() {
        let trimmed = line.trim();
        let open = trimmed.matches('{').count();
        let close = trimmed.matches('}').count();

        state = match state {
            State::Skipping { depth, opened } => {
                let depth = (depth + open).saturating_sub(close);
                let opened = opened || open > 0;
                match opened && depth == 0 {
                    true => State::Normal,
                    false => State::Skipping { depth, opened },
                }
            }
            State::Normal if is_start(trimmed) => {
                let depth = open.saturating_sub(close);
                match open > 0 && depth == 0 {
                    true => State::Normal,
                    false => State::Skipping {
                        depth,
                        opened: open > 0,
                    },
                }
            }
            State::Normal => {
                kept.push(line);
                State::Normal
            }
        };
    }

    kept.join("\n")
}

/// Drop top-level indented blocks introduced by a line satisfying `is_start`
pub fn strip_indented_blocks(source: &str, is_start: impl Fn(&str) -> bool) -> String {
    let mut kept = Vec::new();
    let mut skipping = false;

    for line in source.lines() {
        let indented = line.starts_with([' ', '\t']);
        if skipping && (indented || line.trim().is_empty()) {
            continue;
        }
        skipping = !indented && is_start(line);
        if !skipping {
            kept.push(line);
        }
    }

    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_c_comments() {
        let src = "int a; // struct ListNode {\n/* class Solution {\n} */ int b = '/';\nchar* s = \"// not a comment\";";
        let out = strip_comments(src, CommentSyntax::CLike);
        assert!(!out.contains("ListNode"));
        assert!(!out.contains("Solution"));
        assert!(out.contains("int b"));
        assert!(!out.contains("not a comment"));
        assert_eq!(out.lines().count(), src.lines().count());
    }

    #[test]
    fn test_strip_hash_comments_and_docstrings() {
        let src = "# class ListNode:\ndef f():\n    \"\"\"def g(): pass\n    more\"\"\"\n    return '#'\n";
        let out = strip_comments(src, CommentSyntax::Hash);
        assert!(!out.contains("ListNode"));
        assert!(!out.contains("def g"));
        assert!(out.contains("def f"));
        assert!(out.contains("return ''"));
    }

    #[test]
    fn test_hoist_lines() {
        let (hoisted, rest) = hoist_lines(
            "import java.util.*;\nclass Solution {}\n  import java.io.*;",
            |l| l.starts_with("import "),
        );
        assert_eq!(hoisted, vec!["import java.util.*;", "import java.io.*;"]);
        assert_eq!(rest, "class Solution {}");
    }

    #[test]
    fn test_strip_braced_blocks() {
        let src = "int f() { return 1; }\nint main() {\n    if (x) {\n        f();\n    }\n    return 0;\n}\nint g() { return 2; }";
        let out = strip_braced_blocks(src, |l| l.starts_with("int main("));
        assert!(!out.contains("main"));
        assert!(out.contains("int f()"));
        assert!(out.contains("int g()"));
    }

    #[test]
    fn test_strip_braced_blocks_with_brace_on_next_line() {
        let src = "int main()\n{\n    return 0;\n}\nint keep;";
        let out = strip_braced_blocks(src, |l| l.starts_with("int main("));
        assert_eq!(out, "int keep;");
    }

    #[test]
    fn test_strip_indented_blocks() {
        let src = "def f():\n    return 1\n\nif __name__ == \"__main__\":\n    print(f())\n\n    print(2)\nx = 1";
        let out = strip_indented_blocks(src, |l| l.starts_with("if __name__"));
        assert!(!out.contains("print"));
        assert!(out.contains("def f"));
        assert!(out.contains("x = 1"));
    }
}
