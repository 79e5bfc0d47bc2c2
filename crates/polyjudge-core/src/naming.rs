/// Derive an entry-point name from a problem title.
///
/// Non-alphanumerics split tokens; the first token is lowercased and the
/// rest are capitalised (`"Two Sum"` becomes `twoSum`). Identifiers may not
/// start with a digit, so such names get a `solve` prefix.
pub fn derive_entry_point(title: &str) -> String {
    let mut name = String::new();

    for (i, token) in title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .enumerate()
    {
        let lower = token.to_ascii_lowercase();
        match i {
            0 => name.push_str(&lower),
            _ => {
                let mut chars = lower.chars();
                if let Some(first) = chars.next() {
                    name.push(first.to_ascii_uppercase());
                    name.push_str(chars.as_str());
                }
            }
        }
    }

    match name.chars().next() {
        None => "solution".to_string(),
        Some(c) if c.is_ascii_digit() => format!("solve{}", name),
        Some(_) => name,
    }
}

/// Reduce arbitrary text to a valid identifier, or `None` if nothing is left
pub fn sanitize_identifier(raw: &str) -> Option<String> {
    let ident: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    match ident.chars().next() {
        None => None,
        Some(c) if c.is_ascii_digit() => Some(format!("_{}", ident)),
        Some(_) => Some(ident),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_entry_point() {
        assert_eq!(derive_entry_point("Two Sum"), "twoSum");
        assert_eq!(derive_entry_point("Reverse Linked-List II"), "reverseLinkedListIi");
        assert_eq!(derive_entry_point("  LRU cache!! "), "lruCache");
        assert_eq!(derive_entry_point("3Sum Closest"), "solve3sumClosest");
        assert_eq!(derive_entry_point("???"), "solution");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("nums"), Some("nums".into()));
        assert_eq!(sanitize_identifier("my-list"), Some("mylist".into()));
        assert_eq!(sanitize_identifier("2d"), Some("_2d".into()));
        assert_eq!(sanitize_identifier(" - "), None);
    }
}
