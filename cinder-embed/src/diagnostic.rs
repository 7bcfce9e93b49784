// cinder-embed - Error rendering
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Render an error as `origin:line:column: message` followed by the
//! offending source line and a caret under the column.

use cinder_core::Error;

/// Render `err` raised while evaluating `source` read from `origin`.
///
/// Errors without a location, or whose line is past the end of `source`,
/// render as `origin: message` alone.
pub fn render_error(err: &Error, source: &str, origin: &str) -> String {
    let Some(loc) = err.location.filter(|loc| loc.is_known()) else {
        return format!("{}: {}", origin, err.message);
    };
    let header = format!("{}:{}:{}: {}", origin, loc.line, loc.column, err.message);
    let Some(text) = source.lines().nth(loc.line as usize - 1) else {
        return header;
    };
    let gutter = loc.line.to_string().len();
    // Tabs keep their width so the caret lines up under them.
    let pad: String = text
        .chars()
        .take(loc.column.saturating_sub(1) as usize)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    format!(
        "{header}\n{line:>gutter$} | {text}\n{blank:>gutter$} | {pad}^",
        line = loc.line,
        blank = "",
    )
}
