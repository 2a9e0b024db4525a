use std::sync::OnceLock;

static TOKEN_PATTERN: OnceLock<regex::Regex> = OnceLock::new();

fn pattern() -> &'static regex::Regex {
    TOKEN_PATTERN.get_or_init(|| regex::Regex::new(r"[A-Za-z0-9_]+").expect("valid regex"))
}

/// Lower-cases and splits into tokens, then further splits identifiers on
/// `snake_case`/`camelCase` boundaries so `getUserId` contributes both the
/// whole token and `get`, `user`, `id`. Deliberately simpler than the
/// embedding model's subword tokenizer: BM25 wants whole identifiers and
/// words, not wordpieces.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for raw in pattern().find_iter(text) {
        let word = raw.as_str();
        tokens.push(word.to_lowercase());
        for sub in split_identifier(word) {
            if sub.len() > 1 && sub.to_lowercase() != word.to_lowercase() {
                tokens.push(sub.to_lowercase());
            }
        }
    }
    tokens
}

fn split_identifier(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        if c == '_' {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
