// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Conversions between toolkit (Python) names and Rust names.

/// `QAChannel` -> `qa_channel`, `SHFQA` -> `shfqa`.
pub fn camel_to_snake(name: &str) -> String {
    let chars = name.chars().collect::<Vec<_>>();
    let mut snake = String::with_capacity(name.len() + 4);
    for (index, &c) in chars.iter().enumerate() {
        if index > 0 && c.is_ascii_uppercase() {
            let previous = chars[index - 1];
            let starts_word = chars.get(index + 1).is_some_and(char::is_ascii_lowercase);
            let after_lower = previous.is_ascii_lowercase() || previous.is_ascii_digit();
            if (starts_word || after_lower) && previous != '_' {
                snake.push('_');
            }
        }
        snake.push(c);
    }
    snake.to_lowercase()
}

/// `qa_channel` -> `QaChannel`.
pub fn snake_to_upper_camel(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Rust type name of a toolkit class, `SHFScope` -> `ShfScope`.
pub fn type_name(class_name: &str) -> String {
    snake_to_upper_camel(&camel_to_snake(class_name))
}

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn",
];

/// Identifier for an argument or method name, keywords as raw identifiers.
pub fn identifier(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Rust type of a Python annotation.
///
/// `argument` selects the borrowed form used for parameters. Unknown
/// annotations map to [`serde_json::Value`].
pub fn rust_type(annotation: Option<&str>, argument: bool) -> String {
    let annotation = annotation.unwrap_or_default().trim().replace("typing.", "");
    if let Some(inner) = strip_generic(&annotation, "Optional") {
        return format!("Option<{}>", rust_type(Some(inner), argument));
    }
    let optional = annotation
        .strip_suffix("| None")
        .or_else(|| annotation.strip_suffix("|None"));
    if let Some(inner) = optional {
        return format!("Option<{}>", rust_type(Some(inner), argument));
    }
    for list in ["List", "list", "Sequence"] {
        if let Some(inner) = strip_generic(&annotation, list) {
            let item = rust_type(Some(inner), false);
            return if argument { format!("&[{item}]") } else { format!("Vec<{item}>") };
        }
    }
    match (annotation.as_str(), argument) {
        ("bool", _) => "bool",
        ("int", _) => "i64",
        ("float", _) => "f64",
        ("str", true) => "&str",
        ("str", false) => "String",
        ("None" | "NoneType", false) => "()",
        (_, true) => "&serde_json::Value",
        (_, false) => "serde_json::Value",
    }
    .to_string()
}

fn strip_generic<'a>(annotation: &'a str, generic: &str) -> Option<&'a str> {
    annotation
        .strip_prefix(generic)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .map(str::trim)
}
