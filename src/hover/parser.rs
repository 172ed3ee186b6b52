//! Turns a clangd hover markdown blob into a [`ParsedDocumentation`].
//! Intentionally line-oriented and tolerant: clangd's
//! hover format is not a stable contract, so every step here degrades to
//! an empty field rather than erroring.

use super::format::{balanced_parens, format_signature, outermost_parens, split_top_level_commas};
use super::types::{AccessLevel, Modifier, ParsedDocumentation};

pub fn parse(raw: &str) -> ParsedDocumentation {
    let mut doc = ParsedDocumentation::raw_only(raw);

    let Some((code_block, prose_lines)) = split_code_block(raw) else {
        return doc;
    };

    // Prose runs first: its `Parameters:` header, when present, must win
    // over the one the signature's own parens would otherwise produce.
    parse_prose(&prose_lines, &mut doc);
    parse_code_block(&code_block, &mut doc);

    if let Some(signature) = &doc.signature {
        apply_constructor_destructor_heuristic(signature, &mut doc);
    }

    doc
}

/// Extract the first fenced code block's body lines plus every other line
/// in the hover, in original order, as the "prose" to scan separately.
fn split_code_block(raw: &str) -> Option<(Vec<String>, Vec<String>)> {
    let lines: Vec<&str> = raw.lines().collect();
    let fence_start = lines.iter().position(|l| l.trim_start().starts_with("```"))?;
    let fence_end = lines[fence_start + 1..]
        .iter()
        .position(|l| l.trim_start().starts_with("```"))
        .map(|offset| fence_start + 1 + offset)?;

    let code_block = lines[fence_start + 1..fence_end]
        .iter()
        .map(|l| l.to_string())
        .collect();
    let prose = lines[..fence_start]
        .iter()
        .chain(lines[fence_end + 1..].iter())
        .map(|l| l.to_string())
        .collect();
    Some((code_block, prose))
}

fn parse_code_block(lines: &[String], doc: &mut ParsedDocumentation) {
    let mut idx = 0;
    let mut signature_lines: Vec<String> = Vec::new();
    let mut template_header: Option<String> = None;

    while idx < lines.len() {
        let line = lines[idx].trim();
        idx += 1;

        if line.is_empty() {
            continue;
        }
        if line.starts_with("// In ") {
            continue;
        }

        if let Some(level) = standalone_access_label(line) {
            doc.access_level = Some(level);
            continue;
        }

        let line = if let Some((level, rest)) = inline_access_prefix(line) {
            doc.access_level = Some(level);
            rest
        } else {
            line
        };

        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if template_header.is_none() && line.starts_with("template") && line.ends_with('>') {
            template_header = Some(line.to_string());
            continue;
        }

        signature_lines.push(line.to_string());
        if balanced_parens(&signature_lines.join(" ")) {
            break;
        }
        // Keep consuming non-empty, non-comment lines until balanced.
        while idx < lines.len() {
            let next = lines[idx].trim();
            idx += 1;
            if next.is_empty() || next.starts_with("//") {
                continue;
            }
            signature_lines.push(next.to_string());
            if balanced_parens(&signature_lines.join(" ")) {
                break;
            }
        }
        break;
    }

    if signature_lines.is_empty() {
        return;
    }

    let declaration = signature_lines.join(" ");
    let formatted = format_signature(&declaration);

    doc.signature = Some(match &template_header {
        Some(header) => format!("{header}\n{formatted}"),
        None => formatted.clone(),
    });
    doc.template_params = template_header;

    extract_modifiers(&formatted, doc);
    extract_parameters(&formatted, doc);
}

fn standalone_access_label(line: &str) -> Option<AccessLevel> {
    match line {
        "public:" => Some(AccessLevel::Public),
        "protected:" => Some(AccessLevel::Protected),
        "private:" => Some(AccessLevel::Private),
        _ => None,
    }
}

fn inline_access_prefix(line: &str) -> Option<(AccessLevel, &str)> {
    for (prefix, level) in [
        ("public:", AccessLevel::Public),
        ("protected:", AccessLevel::Protected),
        ("private:", AccessLevel::Private),
    ] {
        if let Some(rest) = line.strip_prefix(prefix) {
            if !rest.trim().is_empty() {
                return Some((level, rest.trim()));
            }
        }
    }
    None
}

fn extract_modifiers(signature: &str, doc: &mut ParsedDocumentation) {
    let mut modifiers = Vec::new();

    if let Some(last_paren) = signature.rfind(')') {
        let after = &signature[last_paren + 1..];
        if word_present(after, "const") {
            modifiers.push(Modifier::Const);
        }
    }

    for (word, modifier) in [
        ("virtual", Modifier::Virtual),
        ("static", Modifier::Static),
        ("override", Modifier::Override),
        ("inline", Modifier::Inline),
        ("explicit", Modifier::Explicit),
        ("noexcept", Modifier::Noexcept),
    ] {
        if word_present(signature, word) {
            modifiers.push(modifier);
        }
    }

    if signature.contains("= 0") {
        modifiers.push(Modifier::PureVirtual);
    }
    if signature.contains("= delete") {
        modifiers.push(Modifier::Deleted);
    }
    if signature.contains("= default") {
        modifiers.push(Modifier::Defaulted);
    }

    doc.modifiers = modifiers;
}

fn word_present(text: &str, target: &str) -> bool {
    text.split_whitespace()
        .any(|w| w.trim_matches(|c: char| "(),;".contains(c)) == target)
}

fn extract_parameters(signature: &str, doc: &mut ParsedDocumentation) {
    if doc.parameters_text.is_some() {
        // Prose already supplied an explicit Parameters: section; never
        // overwrite it with the signature-derived bullet list.
        return;
    }
    let Some(params) = outermost_parens(signature) else {
        return;
    };
    let trimmed = params.trim();
    if trimmed.is_empty() || trimmed == "void" {
        return;
    }

    let bullets = split_top_level_commas(trimmed)
        .into_iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n");
    doc.parameters_text = Some(format!("Parameters:\n{bullets}"));
}

fn parse_prose(lines: &[String], doc: &mut ParsedDocumentation) {
    let mut description_lines: Vec<String> = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx].trim();
        idx += 1;

        if line.is_empty() || is_markdown_separator(line) {
            continue;
        }
        if line.starts_with("Size:") || line.starts_with("Offset:") || line.to_lowercase().contains("alignment") {
            continue;
        }

        if let Some(rest) = line.strip_prefix("Type:") {
            doc.type_ = Some(rest.trim().trim_matches('`').to_string());
            continue;
        }

        if line.starts_with('\u{2192}') {
            if doc.return_type.is_none() {
                doc.return_type = Some(line.trim_start_matches('\u{2192}').trim().to_string());
            }
            continue;
        }

        if line.starts_with("Parameters:") {
            let mut bullets = Vec::new();
            while idx < lines.len() {
                let next = lines[idx].trim();
                if next.starts_with('-') {
                    bullets.push(next.to_string());
                    idx += 1;
                } else if next.is_empty() {
                    idx += 1;
                    break;
                } else {
                    break;
                }
            }
            if doc.parameters_text.is_none() {
                doc.parameters_text = Some(format!("Parameters:\n{}", bullets.join("\n")));
            }
            continue;
        }

        if line.starts_with('@') || !line.is_empty() {
            description_lines.push(line.to_string());
        }
    }

    if !description_lines.is_empty() {
        doc.description = Some(description_lines.join("\n"));
    }
}

fn is_markdown_separator(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '-' || c == '*' || c == '_')
}

/// If the callable name immediately before `(` looks like a constructor or
/// destructor, suppress any return type the prose scan picked up. This is
/// deliberately permissive and should not be tightened further: a
/// capitalized identifier with no known modifier and no `::` is treated as
/// a ctor/dtor name even though this can misfire on other capitalized free
/// functions (a known, accepted false-positive risk).
fn apply_constructor_destructor_heuristic(signature: &str, doc: &mut ParsedDocumentation) {
    let first_line = signature.lines().next().unwrap_or(signature);
    let Some(paren_idx) = first_line.find('(') else {
        return;
    };
    let before_paren = first_line[..paren_idx].trim_end();
    let Some(name) = before_paren.split(|c: char| c.is_whitespace() || c == ':').last() else {
        return;
    };

    let is_destructor = name.starts_with('~');
    let is_constructor_like = !name.is_empty()
        && name.chars().next().map(char::is_uppercase).unwrap_or(false)
        && !is_known_modifier(name)
        && !name.contains("::");

    if is_destructor || is_constructor_like {
        doc.return_type = None;
    }
}

fn is_known_modifier(word: &str) -> bool {
    matches!(
        word,
        "const" | "virtual" | "static" | "override" | "inline" | "explicit" | "noexcept"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_pure_virtual_round_trip() {
        let hover = "```cpp\nvirtual void Foo(int x) const = 0;\n```";
        let doc = parse(hover);

        assert_eq!(doc.signature.as_deref(), Some("virtual void Foo(int x) const = 0;"));
        assert!(doc.has_modifier(Modifier::Virtual));
        assert!(doc.has_modifier(Modifier::Const));
        assert!(doc.has_modifier(Modifier::PureVirtual));
        assert!(doc.return_type.is_none());
    }

    #[test]
    fn access_label_on_its_own_line() {
        let hover = "```cpp\npublic:\nvoid Foo()\n```";
        let doc = parse(hover);
        assert_eq!(doc.access_level, Some(AccessLevel::Public));
        assert_eq!(doc.signature.as_deref(), Some("void Foo()"));
    }

    #[test]
    fn inline_access_prefix_is_stripped() {
        let hover = "```cpp\nprivate: int count_\n```";
        let doc = parse(hover);
        assert_eq!(doc.access_level, Some(AccessLevel::Private));
        assert_eq!(doc.signature.as_deref(), Some("int count_"));
    }

    #[test]
    fn template_header_is_recorded_and_joined() {
        let hover = "```cpp\ntemplate <typename T>\nT Max(T a, T b)\n```";
        let doc = parse(hover);
        assert_eq!(doc.template_params.as_deref(), Some("template <typename T>"));
        assert_eq!(doc.signature.as_deref(), Some("template <typename T>\nT Max(T a, T b)"));
    }

    #[test]
    fn multiline_declaration_is_joined_until_balanced() {
        let hover = "```cpp\nvoid VeryLongFunctionNameThatWraps(\n    int a,\n    int b)\n```";
        let doc = parse(hover);
        assert_eq!(
            doc.signature.as_deref(),
            Some("void VeryLongFunctionNameThatWraps( int a, int b)")
        );
    }

    #[test]
    fn constructor_heuristic_suppresses_return_type() {
        let hover = "```cpp\nexplicit GameObject(const std::string &name)\n```\n\u{2192} `GameObject`";
        let doc = parse(hover);
        assert!(doc.return_type.is_none());
    }

    #[test]
    fn destructor_heuristic_suppresses_return_type() {
        let hover = "```cpp\n~GameObject()\n```\n\u{2192} `void`";
        let doc = parse(hover);
        assert!(doc.return_type.is_none());
    }

    #[test]
    fn prose_type_and_return_and_description() {
        // Lowercase callable name so the constructor/destructor heuristic
        // (which fires on any capitalized name) doesn't suppress returnType.
        let hover = "```cpp\nint getCount() const\n```\nType: `int`\n\u{2192} `int`\nReturns the current count.";
        let doc = parse(hover);
        assert_eq!(doc.type_.as_deref(), Some("int"));
        assert_eq!(doc.return_type.as_deref(), Some("`int`"));
        assert_eq!(doc.description.as_deref(), Some("Returns the current count."));
    }

    #[test]
    fn prose_parameters_header_is_not_overwritten_by_signature_parens() {
        let hover = "```cpp\nvoid Foo(int x)\n```\nParameters:\n- `x` the value";
        let doc = parse(hover);
        assert_eq!(
            doc.parameters_text.as_deref(),
            Some("Parameters:\n- `x` the value")
        );
    }

    #[test]
    fn drops_size_offset_and_alignment_lines() {
        let hover = "```cpp\nint x\n```\nSize: 4 bytes\nOffset: 8\nDefault alignment of 4";
        let doc = parse(hover);
        assert!(doc.description.is_none());
    }

    #[test]
    fn no_code_block_falls_back_to_raw() {
        let hover = "just some text, no fence";
        let doc = parse(hover);
        assert_eq!(doc.raw, hover);
        assert!(doc.signature.is_none());
    }
}
