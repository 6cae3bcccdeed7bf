//! Unified diff rendering and fencing.

use similar::TextDiff;

/// Context lines around each hunk.
pub const CONTEXT_LINES: usize = 3;

const FENCE_CHAR: char = '`';
const MIN_FENCE_LEN: usize = 3;

/// Normalise CRLF line endings to LF.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Unified diff between two texts, labelled `a/<label>` and `b/<label>`.
///
/// Identical inputs produce an empty string.
pub fn unified_diff(original: &str, modified: &str, label: &str) -> String {
    let original = normalize_line_endings(original);
    let modified = normalize_line_endings(modified);

    TextDiff::from_lines(&original, &modified)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&format!("a/{label}"), &format!("b/{label}"))
        .to_string()
}

/// Shortest backtick fence (at least three) that does not occur in `body`.
pub fn fence_for(body: &str) -> String {
    let mut fence: String = std::iter::repeat(FENCE_CHAR).take(MIN_FENCE_LEN).collect();
    while body.contains(&fence) {
        fence.push(FENCE_CHAR);
    }
    fence
}

/// Wrap a diff body in a `diff` code fence that its contents cannot close.
pub fn fenced(body: &str) -> String {
    let fence = fence_for(body);
    format!("{fence}diff\n{body}{fence}\n\n")
}
