//! Line-oriented sentinel detection in tracker output.
//!
//! Output arrives in arbitrary chunks. [`LineBuffer`] reassembles complete
//! lines so a sentinel split across two reads is still seen, and
//! [`SentinelTable`] maps each line to at most one [`SentinelEvent`].

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Summary line printed once the tracker has measured a run.
pub const EMISSIONS_MARKER: &str = "emissions:";
/// Announcement of the report file, followed by its path.
pub const EMISSIONS_FILE_MARKER: &str = "Saving emissions data to file";

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:\[[0-9;?]*[A-Za-z~]|\][^\x07]*\x07)").expect("ANSI pattern is valid")
});

/// Accumulates raw output and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without the
    /// line terminator.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    /// Flush a trailing partial line at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Remove terminal color and title escape sequences.
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_RE.replace_all(line, "")
}

/// What a sentinel line announced.
#[derive(Debug, Clone, PartialEq)]
pub enum SentinelEvent {
    /// Emissions summary; `None` when the value did not parse.
    Emissions(Option<f64>),
    /// Path of the emissions report file.
    EmissionsFile(String),
}

type Handler = Box<dyn Fn(&str) -> Option<SentinelEvent> + Send + Sync>;

struct SentinelRule {
    pattern: String,
    handler: Handler,
}

/// Ordered `{pattern, handler}` rules. The first rule whose pattern occurs
/// in a line handles it; the handler receives the text after the pattern.
#[derive(Default)]
pub struct SentinelTable {
    rules: Vec<SentinelRule>,
}

impl SentinelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn with_rule<F>(mut self, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str) -> Option<SentinelEvent> + Send + Sync + 'static,
    {
        self.rules.push(SentinelRule {
            pattern: pattern.into(),
            handler: Box::new(handler),
        });
        self
    }

    /// The emissions summary and report file rules.
    pub fn tracker_defaults() -> Self {
        Self::new()
            .with_rule(EMISSIONS_MARKER, |rest| {
                Some(SentinelEvent::Emissions(parse_leading_float(rest)))
            })
            .with_rule(EMISSIONS_FILE_MARKER, |rest| {
                Some(SentinelEvent::EmissionsFile(rest.trim().to_string()))
            })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match one line of output.
    pub fn match_line(&self, line: &str) -> Option<SentinelEvent> {
        let clean = strip_ansi(line);
        let (rule, start) = self.rules.iter().find_map(|rule| {
            clean
                .find(rule.pattern.as_str())
                .map(|pos| (rule, pos + rule.pattern.len()))
        })?;
        (rule.handler)(&clean[start..])
    }
}

impl std::fmt::Debug for SentinelTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| &r.pattern))
            .finish()
    }
}

/// Parse the longest numeric prefix after leading whitespace, ignoring
/// whatever follows (`" 0.5 kg"` is `0.5`).
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(text.len());
    let candidate = &text[..end];

    // Shrink until the prefix parses, so "1.5e" or "2-" still yield a number.
    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f64>().ok())
}
