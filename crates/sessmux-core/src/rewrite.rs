//! Attribution of per-session lines to the session they came from.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Label carrying the session identity.
pub const USER_LABEL: &str = "user";

/// Name an existing `user` label is moved to when attribution inserts its own;
/// prefixed with `exported_` again while the block already uses it.
pub const EXPORTED_USER_LABEL: &str = "exported_user";

/// How per-session lines are attributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteMode {
    /// Insert `user="<identity>"` into each sample's label block.
    #[default]
    Labels,
    /// Replace every literal `name=` with `user="<identity>",name=`.
    ///
    /// Byte-compatible with the historical exporter, including its breakage
    /// on label values that contain `name=`.
    Literal,
}

/// Rewrites lines of one session source.
#[derive(Debug, Clone)]
pub struct Attribution {
    mode: RewriteMode,
    /// `user="<escaped identity>"`.
    pair: String,
}

impl Attribution {
    pub fn new(identity: &str, mode: RewriteMode) -> Self {
        Self {
            mode,
            pair: format!("{USER_LABEL}=\"{}\"", escape_label_value(identity)),
        }
    }

    /// Rewrites a `# HELP` / `# TYPE` line.
    pub fn documentation<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match self.mode {
            RewriteMode::Labels => Cow::Borrowed(line),
            RewriteMode::Literal => self.literal(line),
        }
    }

    /// Rewrites a sample line.
    pub fn sample<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match self.mode {
            RewriteMode::Labels => self.insert_label(line),
            RewriteMode::Literal => self.literal(line),
        }
    }

    fn literal<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if line.contains("name=") {
            Cow::Owned(line.replace("name=", &format!("{},name=", self.pair)))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn insert_label<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let name_start = line.len() - line.trim_start_matches(is_space).len();
        let name_end = line[name_start..]
            .find(|c: char| c == '{' || is_space(c))
            .map_or(line.len(), |i| name_start + i);
        let open = name_end + (line[name_end..].len() - line[name_end..].trim_start_matches(is_space).len());

        if !line[open..].starts_with('{') {
            return Cow::Owned(format!(
                "{}{{{}}}{}",
                &line[..name_end],
                self.pair,
                &line[name_end..]
            ));
        }

        let inner_start = open + 1;
        let Some(block) = LabelBlock::scan(&line[inner_start..]) else {
            return Cow::Borrowed(line);
        };
        let close = inner_start + block.close;
        let inner = &line[inner_start..close];

        let mut out = String::with_capacity(line.len() + self.pair.len() + EXPORTED_USER_LABEL.len());
        out.push_str(&line[..inner_start]);
        out.push_str(&self.pair);

        if !inner.trim().is_empty() {
            out.push(',');
            let renamed = block.free_name();
            let mut cursor = 0;
            for (start, end) in &block.user_labels {
                out.push_str(&inner[cursor..*start]);
                out.push_str(&renamed);
                cursor = *end;
            }
            out.push_str(&inner[cursor..]);
        }

        out.push_str(&line[close..]);
        Cow::Owned(out)
    }
}

/// Positions found while scanning a label block, relative to the byte after `{`.
struct LabelBlock<'a> {
    /// Offset of the closing `}`.
    close: usize,
    /// Byte spans of label names equal to [`USER_LABEL`].
    user_labels: Vec<(usize, usize)>,
    /// Every label name in the block.
    names: Vec<&'a str>,
}

impl<'a> LabelBlock<'a> {
    /// Scans `name="value",...}`; `None` when the block never closes.
    fn scan(s: &'a str) -> Option<Self> {
        let bytes = s.as_bytes();
        let mut user_labels = Vec::new();
        let mut names = Vec::new();
        let mut i = 0;
        let mut name_start: Option<usize> = None;

        while i < bytes.len() {
            match bytes[i] {
                b'}' => {
                    return Some(Self {
                        close: i,
                        user_labels,
                        names,
                    });
                }
                b'"' => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != b'"' {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return None;
                    }
                }
                b'=' => {
                    if let Some(start) = name_start.take() {
                        let name = s[start..i].trim_end();
                        if name == USER_LABEL {
                            user_labels.push((start, start + name.len()));
                        }
                        names.push(name);
                    }
                }
                b',' => name_start = None,
                b if b.is_ascii_whitespace() => {}
                _ => {
                    if name_start.is_none() {
                        name_start = Some(i);
                    }
                }
            }
            i += 1;
        }
        None
    }

    /// First of `exported_user`, `exported_exported_user`, ... not used by the block.
    fn free_name(&self) -> String {
        let mut name = EXPORTED_USER_LABEL.to_string();
        while self.names.contains(&name.as_str()) {
            name.insert_str(0, "exported_");
        }
        name
    }
}

#[inline]
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

/// Escapes a label value per the text exposition format.
pub fn escape_label_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"', '\n']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
