//! ANSI/SGR parsing for job traces
//!
//! - `model.rs`: colors, attribute flags, styles and spans
//! - `ansi.rs`: the stateful line parser
//!
//! The parser is total: every input line produces spans covering it,
//! malformed escape sequences degrade to literal text.

pub mod ansi;
pub mod model;

pub use ansi::{convert_8bit_color, ParserOptions, StyleParser};
pub use model::{Attributes, Color, NamedColor, Span, Style};
