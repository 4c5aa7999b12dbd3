//! Structural classification of exposition-format lines.

/// What a single line of exposition text contributes to a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `# HELP <name> ...` or `# TYPE <name> ...`.
    Documentation(&'a str),
    /// `<name>{labels} <value>` or `<name> <value>`.
    Sample(&'a str),
    /// Blank lines, other comments, anything without a leading name.
    Ignored,
}

const KEYWORDS: [&str; 2] = ["HELP", "TYPE"];

/// Classifies one line without allocating.
pub fn classify(line: &str) -> LineKind<'_> {
    let rest = line.trim_start_matches(is_space);

    if let Some(comment) = rest.strip_prefix('#') {
        return documentation_name(comment).map_or(LineKind::Ignored, LineKind::Documentation);
    }

    let name = leading_token(rest, |c| c == '{' || is_space(c));
    if name.is_empty() {
        LineKind::Ignored
    } else {
        LineKind::Sample(name)
    }
}

fn documentation_name(comment: &str) -> Option<&str> {
    let comment = comment.trim_start_matches(is_space);
    let after = KEYWORDS
        .iter()
        .find_map(|kw| comment.strip_prefix(kw))?
        .trim_start_matches(is_space);

    let name = leading_token(after, is_space);
    (!name.is_empty()).then_some(name)
}

fn leading_token(s: &str, stop: impl Fn(char) -> bool) -> &str {
    let end = s.find(stop).unwrap_or(s.len());
    &s[..end]
}

#[inline]
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}
