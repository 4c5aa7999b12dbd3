use std::borrow::Cow;

use crate::{
    accumulator::Accumulator,
    line::{LineKind, classify},
    rewrite::Attribution,
};

/// Feeds classified lines of one source into an [`Accumulator`].
#[derive(Debug, Clone, Default)]
pub struct SourceParser {
    attribution: Option<Attribution>,
}

impl SourceParser {
    /// Parser for the host-wide source: lines pass through unmodified.
    pub fn passthrough() -> Self {
        Self { attribution: None }
    }

    /// Parser that attributes every line to a session.
    pub fn attributed(attribution: Attribution) -> Self {
        Self {
            attribution: Some(attribution),
        }
    }

    /// Applies one line. Returns `false` when the line was ignored.
    pub fn feed(&self, acc: &mut Accumulator, line: &str) -> bool {
        match classify(line) {
            LineKind::Documentation(name) => {
                let line = match &self.attribution {
                    Some(a) => a.documentation(line),
                    None => Cow::Borrowed(line),
                };
                acc.add_documentation(name, line);
                true
            }
            LineKind::Sample(name) => {
                let line = match &self.attribution {
                    Some(a) => a.sample(line),
                    None => Cow::Borrowed(line),
                };
                acc.add_sample(name, line);
                true
            }
            LineKind::Ignored => false,
        }
    }

    /// Applies every line of a complete document.
    pub fn feed_document(&self, acc: &mut Accumulator, text: &str) -> usize {
        text.lines().filter(|line| self.feed(acc, line)).count()
    }
}

/// Splits a chunked byte stream into lines.
///
/// Lines end at `\n`; a single trailing `\r` is dropped. Bytes that are not
/// valid UTF-8 are replaced rather than rejected.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers `chunk` and hands every completed line to `emit`.
    pub fn push(&mut self, chunk: &[u8], mut emit: impl FnMut(&str)) {
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(pos) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + pos;
            emit(&decode(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);
    }

    /// Hands the unterminated tail, if any, to `emit`.
    pub fn finish(self, mut emit: impl FnMut(&str)) {
        if !self.pending.is_empty() {
            emit(&decode(&self.pending));
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.pending.len()
    }
}

fn decode(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}
