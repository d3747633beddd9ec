//! Render: raw trace to filtered text, decoration ranges and sections.
//!
//! One [`StyleParser`] runs over the whole trace so styles carry across
//! lines. For every line:
//!
//! 1. The last `\r` before the final byte splits the line into a control
//!    segment (scanned for section markers) and the displayed segment.
//! 2. The displayed segment is parsed into spans. Escape spans are dropped;
//!    every other span contributes its text to the filtered output and one
//!    [`LineRange`] to the decoration group of its style.
//!
//! Columns are counted in characters of the filtered line, so escape bytes
//! never show up in a range.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::logs::section::{apply_markers, Sections};
use crate::parser::{ParserOptions, Style, StyleParser};

/// Decoration group holding the live-job indicator.
pub const RUNNING_KEY: &str = "running";

/// A column range on one line of the filtered document, in `char`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Style key (see [`Style::key`]) or [`RUNNING_KEY`] → ranges.
pub type Decorations = BTreeMap<String, Vec<LineRange>>;

/// Everything a viewer needs to display one trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedLog {
    pub sections: Sections,
    pub decorations: Decorations,
    pub filtered_text: String,
}

impl RenderedLog {
    /// Number of lines of `filtered_text` (a trailing newline ends the last one).
    pub fn line_count(&self) -> usize {
        self.filtered_text.lines().count()
    }

    pub fn is_running(&self) -> bool {
        self.decorations
            .get(RUNNING_KEY)
            .is_some_and(|ranges| !ranges.is_empty())
    }
}

/// One raw line split at its control carriage return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SplitLine<'a> {
    control: Option<&'a str>,
    displayed: &'a str,
}

fn split_line(raw: &str) -> SplitLine<'_> {
    let bytes = raw.as_bytes();
    let last = bytes.len().saturating_sub(1);
    let control_cr = bytes[..last].iter().rposition(|&b| b == b'\r');
    let end = if bytes.last() == Some(&b'\r') { last } else { bytes.len() };

    match control_cr {
        Some(cr) => SplitLine {
            control: Some(&raw[..cr]),
            displayed: &raw[cr + 1..end],
        },
        None => SplitLine {
            control: None,
            displayed: &raw[..end],
        },
    }
}

/// Render `raw` for display.
///
/// `is_running` adds a zero-width [`RUNNING_KEY`] range at the end of the
/// document; otherwise that group is present but empty so a viewer clears a
/// previously shown indicator.
///
/// Columns of every [`LineRange`] count Unicode scalar values (`char`s) of
/// the filtered line, not bytes or UTF-16 units. Escape sequences occupy no
/// columns.
pub fn render(raw: &str, is_running: bool, options: ParserOptions) -> RenderedLog {
    let lines: Vec<&str> = raw.split('\n').collect();
    let line_count = lines.len();

    let mut parser = StyleParser::new(options);
    let mut sections = Sections::new();
    let mut decorations = Decorations::new();
    let mut filtered = String::with_capacity(raw.len());
    let mut keys: HashMap<Style, String> = HashMap::new();

    for (line_number, raw_line) in lines.iter().enumerate() {
        let SplitLine { control, displayed } = split_line(raw_line);
        if let Some(control) = control {
            apply_markers(&mut sections, control, line_number);
        }

        let mut column = 0;
        for span in parser.append_line(displayed) {
            if span.is_escape {
                continue;
            }
            let text = span.text(displayed);
            let width = text.chars().count();
            let key = keys.entry(span.style).or_insert_with(|| span.style.key());

            decorations
                .entry(key.clone())
                .or_default()
                .push(LineRange::new(line_number, column, column + width));
            filtered.push_str(text);
            column += width;
        }

        // A trace ending in '\n' already produced its final empty line.
        if line_number + 1 < line_count || !displayed.is_empty() {
            filtered.push('\n');
        }
    }

    let running = if is_running {
        let line = if lines.last().is_some_and(|l| !l.is_empty()) {
            line_count
        } else {
            line_count - 1
        };
        vec![LineRange::new(line, 0, 0)]
    } else {
        Vec::new()
    };
    decorations.insert(RUNNING_KEY.to_string(), running);

    RenderedLog {
        sections,
        decorations,
        filtered_text: filtered,
    }
}
