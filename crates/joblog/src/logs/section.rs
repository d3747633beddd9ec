//! Section markers: `section_start:<time>:<key>` / `section_end:<time>:<key>`.
//!
//! CI runners hide these markers in the part of a line that a terminal
//! overwrites with a carriage return, e.g.
//! `section_start:1700000000:build_script\r\x1b[0KBuilding...`.
//! Only that control segment is scanned.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, timed region of a trace.
///
/// Open until a matching end marker is seen. Lines are zero-based; the end
/// marker line itself is excluded, so `end_line` is the line before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub start_line: usize,
    /// Unix seconds.
    pub start_time: i64,
    pub end_line: Option<usize>,
    pub end_time: Option<i64>,
}

impl Section {
    pub fn is_closed(&self) -> bool {
        self.end_line.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.start_time, 0)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_time.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| chrono::Duration::seconds(end - self.start_time))
    }
}

/// Sections by key. Last write per key wins, there is no nesting.
pub type Sections = BTreeMap<String, Section>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Start,
    End,
}

impl Directive {
    fn tag(self) -> &'static str {
        match self {
            Directive::Start => "section_start",
            Directive::End => "section_end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker<'a> {
    time: i64,
    key: &'a str,
}

/// Find `directive` in `control` and split out its time and key fields.
///
/// The key runs up to the next `:` or `\r`. A marker with a non-numeric
/// time is ignored.
fn find_marker(control: &str, directive: Directive) -> Option<Marker<'_>> {
    let start = control.find(directive.tag())?;
    let mut fields = control[start..].split(':');
    fields.next()?;
    let time = fields.next()?.trim().parse().ok()?;
    let key = fields.next()?.split('\r').next()?;
    Some(Marker { time, key })
}

/// Record the markers found in one line's control segment.
///
/// A start opens (or reopens) the section at `line`; an end closes the open
/// section with the same key at `line - 1` (never before its start line).
/// Ends without a matching open section are dropped.
pub fn apply_markers(sections: &mut Sections, control: &str, line: usize) {
    if let Some(start) = find_marker(control, Directive::Start) {
        sections.insert(
            start.key.to_string(),
            Section {
                start_line: line,
                start_time: start.time,
                end_line: None,
                end_time: None,
            },
        );
    }

    if let Some(end) = find_marker(control, Directive::End) {
        if let Some(section) = sections.get_mut(end.key).filter(|s| !s.is_closed()) {
            section.end_line = Some(line.saturating_sub(1).max(section.start_line));
            section.end_time = Some(end.time);
        }
    }
}
