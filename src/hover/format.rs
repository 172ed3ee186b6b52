//! Pure text-manipulation helpers used by both the hover parser and the
//! query command layer: paren balance, signature normalization, top-level
//! comma splitting, and prose wrapping.

/// True iff `(`/`)` counts in `s` match, with no prefix ever going negative.
/// Used both to decide when a signature is complete (parser step 3) and
/// as a universal property test target.
pub fn balanced_parens(s: &str) -> bool {
    let mut depth: i32 = 0;
    for ch in s.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Net paren balance (positive means more `(` than `)` so far), used while
/// accumulating signature continuation lines.
pub fn paren_balance(s: &str) -> i32 {
    let mut depth: i32 = 0;
    for ch in s.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Normalize a single-line signature so `&`/`*` bind to the type: collapse
/// ` &`→`&` and ` *`→`*`, then insert a single space if the following
/// character is an identifier character. Idempotent by construction
/// (idempotent): a second pass finds no more ` &`/` *` to collapse, and the
/// inserted space already separates the pointer/reference from the name so
/// a repeat run is a no-op.
pub fn format_signature(signature: &str) -> String {
    if signature.contains('\n') {
        // Multi-line signatures (template header + declaration) are left
        // left untouched.
        return signature.to_string();
    }

    let collapsed = collapse_ref_and_pointer(signature);
    insert_space_after_ref_and_pointer(&collapsed)
}

fn collapse_ref_and_pointer(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ' ' && i + 1 < chars.len() && (chars[i + 1] == '&' || chars[i + 1] == '*') {
            // Skip the space; the &/* is emitted on the next iteration.
            i += 1;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn insert_space_after_ref_and_pointer(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();
    for i in 0..chars.len() {
        out.push(chars[i]);
        if chars[i] == '&' || chars[i] == '*' {
            if let Some(&next) = chars.get(i + 1) {
                if is_identifier_char(next) {
                    out.push(' ');
                }
            }
        }
    }
    out
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Find the outermost `(...)` span in `s` and return the substring strictly
/// between the matching parens, or `None` if there is no balanced pair.
pub fn outermost_parens(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let start = s.find('(')?;
    let mut depth = 0i32;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    return Some(&s[start + 1..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a parameter list on commas that are not nested inside any bracket
/// pair, so `std::map<int, int> m, int x` splits into two parameters, not
/// three.
pub fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in s.chars() {
        match ch {
            '(' | '<' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | '>' | ']' | '}' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Greedy word wrap at `width` columns, used by `signature` and `interface`
/// to wrap descriptions (80 and 78 columns respectively).
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.len() + 1 + word.len() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Indent every line of `text` by `indent` spaces.
pub fn indent_lines(text: &str, indent: usize) -> String {
    let prefix = " ".repeat(indent);
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_parens_true_cases() {
        assert!(balanced_parens(""));
        assert!(balanced_parens("()"));
        assert!(balanced_parens("foo(int x, Bar(y))"));
    }

    #[test]
    fn balanced_parens_false_cases() {
        assert!(!balanced_parens("("));
        assert!(!balanced_parens(")("));
        assert!(!balanced_parens("foo(int x"));
    }

    #[test]
    fn format_signature_collapses_and_rebinds_reference() {
        let input = "void Foo(const std::string & name)";
        let formatted = format_signature(input);
        assert_eq!(formatted, "void Foo(const std::string& name)");
    }

    #[test]
    fn format_signature_is_idempotent() {
        let input = "const Bar * GetBar() const";
        let once = format_signature(input);
        let twice = format_signature(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn format_signature_leaves_trailing_reference_alone() {
        // Nothing after & so no space is inserted, e.g. a trailing return type.
        let input = "std::string &";
        assert_eq!(format_signature(input), "std::string&");
    }

    #[test]
    fn format_signature_skips_multiline() {
        let input = "template<typename T>\nvoid Foo(T & t)";
        assert_eq!(format_signature(input), input);
    }

    #[test]
    fn outermost_parens_extracts_between_matching_pair() {
        assert_eq!(
            outermost_parens("void Foo(int x, Bar(y)) const"),
            Some("int x, Bar(y)")
        );
        assert_eq!(outermost_parens("no parens here"), None);
    }

    #[test]
    fn split_top_level_commas_ignores_nested_brackets() {
        let parts = split_top_level_commas("std::map<int, int> m, int x");
        assert_eq!(parts, vec!["std::map<int, int> m", "int x"]);
    }

    #[test]
    fn wrap_text_breaks_at_width() {
        let wrapped = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert!(wrapped.iter().all(|l| l.len() <= 10));
        assert_eq!(wrapped.join(" "), "the quick brown fox jumps over the lazy dog");
    }
}
