//! Line-oriented tokenizer.
//!
//! A line is split on whitespace and on any of `, [ ] + - * / ( ) & | ~ ;`,
//! with those delimiters preserved as their own single-character tokens.
//! `;` begins a comment that runs to the end of the line.

const DELIMITERS: &[char] = &[',', '[', ']', '+', '-', '*', '/', '(', ')', '&', '|', '~', ';'];

/// Split one source line into tokens, with any trailing `;` comment removed.
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        if ch.is_whitespace() {
            flush(&mut current, &mut tokens);
        } else if DELIMITERS.contains(&ch) {
            flush(&mut current, &mut tokens);
            tokens.push(ch.to_string());
        } else {
            current.push(ch);
        }
    }
    flush(&mut current, &mut tokens);

    if let Some(comment_at) = tokens.iter().position(|t| t == ";") {
        tokens.truncate(comment_at);
    }
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}
