//! Indentation parser
//!
//! Builds the line tree for Cisco-style configuration text. A line's parent
//! is the nearest open line with smaller indentation, so a dedent that lands
//! between two open levels hangs off the shallower one. Indentation counts
//! leading whitespace characters; IOS indents the `quit` closing a
//! certificate chain with spaces and a tab.
//!
//! Comment lines (`!` or `#`) are kept so directives can be queried, but
//! they never open a section and may sit at any indentation.
//! `banner` blocks are opaque: their body lines hang off the banner line
//! whatever their indentation.

use thiserror::Error;

use super::{ConfigLine, ParsedConfig};

/// Errors raised when configuration text cannot be arranged into a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigParseError {
    #[error("line {line}: first configuration line is indented")]
    IndentedRoot { line: usize },

    #[error("line {line}: banner opened with '{delimiter}' is never closed")]
    UnterminatedBanner { line: usize, delimiter: String },
}

impl ConfigParseError {
    /// 1-based source line the error points at
    pub fn line(&self) -> usize {
        match self {
            Self::IndentedRoot { line } | Self::UnterminatedBanner { line, .. } => *line,
        }
    }
}

/// Open banner block: owning line index and closing delimiter
struct OpenBanner {
    owner: usize,
    delimiter: String,
    line: usize,
}

/// Parse configuration text into a line tree
pub fn parse(text: &str) -> Result<ParsedConfig, ConfigParseError> {
    let mut lines: Vec<ConfigLine> = Vec::new();
    // Open sections, strictly increasing indentation
    let mut stack: Vec<usize> = Vec::new();
    let mut banner: Option<OpenBanner> = None;

    for (offset, source_line) in text.lines().enumerate() {
        let number = offset + 1;
        let raw = source_line.trim_end();

        if let Some(open) = &banner {
            let closes = raw.contains(open.delimiter.as_str());
            if !raw.is_empty() && raw.trim() != open.delimiter {
                let owner = open.owner;
                push_line(&mut lines, Some(owner), number, raw, false);
            }
            if closes {
                banner = None;
            }
            continue;
        }

        if raw.is_empty() {
            continue;
        }

        let indent = indentation(raw);
        let body = raw.trim_start();

        if is_comment(body) {
            let parent = stack
                .iter()
                .rev()
                .copied()
                .find(|&i| lines.get(i).is_some_and(|l| l.indent < indent));
            push_line(&mut lines, parent, number, raw, true);
            continue;
        }

        while let Some(&top) = stack.last() {
            if lines.get(top).is_some_and(|l| l.indent >= indent) {
                stack.pop();
            } else {
                break;
            }
        }

        // A root line stays open for any indented line, so an empty stack
        // here means nothing at column 0 has been seen yet
        let parent = stack.last().copied();
        if parent.is_none() && indent > 0 {
            return Err(ConfigParseError::IndentedRoot { line: number });
        }

        let index = push_line(&mut lines, parent, number, raw, false);
        stack.push(index);

        if let Some((delimiter, closed)) = banner_delimiter(body) {
            if !closed {
                banner = Some(OpenBanner {
                    owner: index,
                    delimiter,
                    line: number,
                });
            }
        }
    }

    if let Some(open) = banner {
        return Err(ConfigParseError::UnterminatedBanner {
            line: open.line,
            delimiter: open.delimiter,
        });
    }

    Ok(ParsedConfig::from_lines(lines))
}

/// Leading whitespace characters; a tab counts as one
fn indentation(raw: &str) -> usize {
    raw.chars().take_while(|c| c.is_whitespace()).count()
}

fn is_comment(body: &str) -> bool {
    body.starts_with('!') || body.starts_with('#')
}

fn push_line(
    lines: &mut Vec<ConfigLine>,
    parent: Option<usize>,
    number: usize,
    raw: &str,
    comment: bool,
) -> usize {
    let index = lines.len();
    lines.push(ConfigLine {
        index,
        number,
        indent: indentation(raw),
        raw: raw.to_string(),
        comment,
        parent,
        children: Vec::new(),
    });
    if let Some(parent_line) = parent.and_then(|p| lines.get_mut(p)) {
        parent_line.children.push(index);
    }
    index
}

/// Delimiter of a `banner <kind> <delim>` line, and whether the banner closes
/// on the same line
///
/// ASA style `banner motd Some text` (alphanumeric start) is a single line.
fn banner_delimiter(body: &str) -> Option<(String, bool)> {
    let rest = body.strip_prefix("banner")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (_kind, rest) = rest.trim_start().split_once(char::is_whitespace)?;
    let rest = rest.trim_start();

    let first = rest.chars().next()?;
    if first.is_alphanumeric() {
        return None;
    }

    // IOS prints the delimiter as a caret pair like "^C"
    let delimiter: String = if first == '^' {
        rest.chars().take(2).collect()
    } else {
        first.to_string()
    };
    let after = rest.get(delimiter.len()..).unwrap_or("");
    let closed = after.contains(delimiter.as_str());
    Some((delimiter, closed))
}
