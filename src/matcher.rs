//! Locating edit targets inside a text buffer.
//!
//! Every successful lookup compiles down to a [`Replacement`]: a byte span in
//! the current buffer plus the text to put there. Exact substring matches are
//! tried first; only when they fail does the line-based fuzzy search run.

use tracing::debug;

/// Minimum normalised Levenshtein similarity for a "closest line" hint.
const HINT_THRESHOLD: f64 = 0.6;

/// How a replacement was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// `old_text` occurred verbatim
    Exact,
    /// Matched line-by-line ignoring surrounding whitespace
    Fuzzy,
}

/// A located byte-span replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Replacement does nothing until spliced into a buffer"]
pub struct Replacement {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text to insert at [byte_start, byte_end)
    pub text: String,
    pub kind: MatchKind,
}

impl Replacement {
    /// Produce a new buffer with this replacement applied.
    pub fn splice(&self, buffer: &str) -> String {
        let mut out =
            String::with_capacity(buffer.len() + self.text.len() - (self.byte_end - self.byte_start));
        out.push_str(&buffer[..self.byte_start]);
        out.push_str(&self.text);
        out.push_str(&buffer[self.byte_end..]);
        out
    }
}

/// Find where `old_text` lives in `buffer` and what should replace it.
///
/// Both texts must already be LF-normalised.
pub fn locate(buffer: &str, old_text: &str, new_text: &str) -> Option<Replacement> {
    if old_text.is_empty() {
        return None;
    }

    find_exact(buffer, old_text, new_text).or_else(|| {
        debug!("no exact match, falling back to whitespace-insensitive line search");
        find_fuzzy(buffer, old_text, new_text)
    })
}

fn find_exact(buffer: &str, old_text: &str, new_text: &str) -> Option<Replacement> {
    buffer.find(old_text).map(|byte_start| Replacement {
        byte_start,
        byte_end: byte_start + old_text.len(),
        text: new_text.to_string(),
        kind: MatchKind::Exact,
    })
}

/// Split on `\n`, remembering where each line starts.
fn lines_with_offsets(buffer: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    buffer
        .split('\n')
        .map(|line| {
            let start = offset;
            offset += line.len() + 1;
            (start, line)
        })
        .collect()
}

/// Earliest window whose lines equal `old_text`'s lines after trimming.
fn find_fuzzy(buffer: &str, old_text: &str, new_text: &str) -> Option<Replacement> {
    let old_lines: Vec<&str> = old_text.split('\n').collect();
    let buffer_lines = lines_with_offsets(buffer);

    if old_lines.len() > buffer_lines.len() {
        return None;
    }

    let position = buffer_lines.windows(old_lines.len()).position(|window| {
        window
            .iter()
            .zip(&old_lines)
            .all(|((_, line), old)| line.trim() == old.trim())
    })?;

    let window = &buffer_lines[position..position + old_lines.len()];
    let (byte_start, _) = window[0];
    let (last_start, last_line) = window[window.len() - 1];
    let matched: Vec<&str> = window.iter().map(|(_, line)| *line).collect();

    debug!(line = position + 1, lines = old_lines.len(), "fuzzy match");

    Some(Replacement {
        byte_start,
        byte_end: last_start + last_line.len(),
        text: reindent(&matched, &old_lines, new_text),
        kind: MatchKind::Fuzzy,
    })
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Carry the matched region's indentation over to the replacement lines.
///
/// The first line takes the indentation of the first matched line. Later
/// lines that pair up with an old line keep the matched line's indentation
/// and add however much deeper the new line is indented than the old one.
/// Lines with no indentation on either side, or past the end of the match,
/// are emitted as written.
fn reindent(matched: &[&str], old_lines: &[&str], new_text: &str) -> String {
    let mut out: Vec<String> = Vec::new();

    for (j, line) in new_text.split('\n').enumerate() {
        if j == 0 {
            let indent = matched.first().map(|l| leading_whitespace(l)).unwrap_or("");
            out.push(format!("{indent}{}", line.trim_start()));
            continue;
        }

        let Some(old_line) = old_lines.get(j) else {
            out.push(line.to_string());
            continue;
        };

        let old_indent = leading_whitespace(old_line);
        let new_indent = leading_whitespace(line);
        if old_indent.is_empty() || new_indent.is_empty() {
            out.push(line.to_string());
            continue;
        }

        let anchor = leading_whitespace(matched[j]);
        let relative = new_indent.len().saturating_sub(old_indent.len());
        out.push(format!(
            "{anchor}{}{}",
            " ".repeat(relative),
            line.trim_start()
        ));
    }

    out.join("\n")
}

/// The buffer line most similar to the first non-blank line of `old_text`.
///
/// Returns the 1-based line number and the line, when it is similar enough
/// to be worth showing.
pub fn closest_line<'a>(buffer: &'a str, old_text: &str) -> Option<(usize, &'a str)> {
    let needle = old_text.lines().map(str::trim).find(|l| !l.is_empty())?;

    buffer
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let score = strsim::normalized_levenshtein(needle, line.trim());
            (idx, line, score)
        })
        .filter(|(_, _, score)| *score >= HINT_THRESHOLD)
        .max_by(|a, b| a.2.total_cmp(&b.2).then(b.0.cmp(&a.0)))
        .map(|(idx, line, _)| (idx + 1, line))
}
