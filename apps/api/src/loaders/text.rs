use std::path::Path;

use crate::loaders::LoaderError;

/// Normalizes extracted document text.
///
/// Drops NUL bytes, collapses runs of spaces/tabs to one space, collapses three
/// or more consecutive newlines to two, then trims every line and the whole text.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut collapsed = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut newline_run = 0usize;

    for c in text.chars().filter(|&c| c != '\0') {
        match c {
            ' ' | '\t' => pending_space = true,
            '\n' => {
                pending_space = false;
                newline_run += 1;
                if newline_run <= 2 {
                    collapsed.push('\n');
                }
            }
            _ => {
                if pending_space {
                    collapsed.push(' ');
                    pending_space = false;
                }
                newline_run = 0;
                collapsed.push(c);
            }
        }
    }

    collapsed
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Cuts `text` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    format!("{}...", truncate_chars(text, max_chars))
}

/// The first `max_chars` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn load_jd_from_file(path: &Path) -> Result<String, LoaderError> {
    Ok(std::fs::read_to_string(path)?)
}

pub fn load_jd_from_text(text: &str) -> String {
    text.trim().to_string()
}
