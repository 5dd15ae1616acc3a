//! Identifier rules shared by plugin discovery and code generation.

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Maps a plugin file or directory stem to its module identifier.
pub(crate) fn plugin_identifier(stem: &str) -> String {
    stem.to_ascii_lowercase().replace('-', "_")
}

/// Checks that `identifier` can be declared as a Rust module.
pub(crate) fn check_module_name(identifier: &str) -> Result<(), &'static str> {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return Err("identifier is empty");
    };
    if first.is_ascii_digit() {
        return Err("identifier starts with a digit");
    }
    if !std::iter::once(first)
        .chain(chars)
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
    {
        return Err("identifier may only contain a-z, 0-9 and underscores");
    }
    if identifier.chars().all(|ch| ch == '_') {
        return Err("identifier has no letters or digits");
    }
    if KEYWORDS.contains(&identifier) {
        return Err("identifier is a reserved Rust keyword");
    }
    Ok(())
}

/// Checks that `name` is usable as a content type or field name.
pub(crate) fn check_type_name(name: &str) -> Result<(), &'static str> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("name is empty");
    };
    if !first.is_ascii_alphabetic() {
        return Err("name must start with an ASCII letter");
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err("name may only contain ASCII letters, digits and underscores");
    }
    Ok(())
}

/// Converts a type name such as `BlogPost` into `blog_post`.
///
/// Runs of capitals are treated as one word, so `HTTPRoute` becomes
/// `http_route`.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut snake = String::with_capacity(name.len() + 4);
    for (index, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() && index > 0 {
            let previous = chars.get(index - 1).copied();
            let next = chars.get(index + 1).copied();
            let after_lower = previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            let ends_acronym = previous.is_some_and(|p| p.is_ascii_uppercase())
                && next.is_some_and(|n| n.is_ascii_lowercase());
            if after_lower || ends_acronym {
                snake.push('_');
            }
        }
        snake.push(ch.to_ascii_lowercase());
    }
    snake
}
