use std::ops::Range;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One of the sixteen terminal palette slots, or the terminal default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl NamedColor {
    const BASE: [NamedColor; 8] = [
        NamedColor::Black,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Blue,
        NamedColor::Magenta,
        NamedColor::Cyan,
        NamedColor::White,
    ];

    const BRIGHT: [NamedColor; 8] = [
        NamedColor::BrightBlack,
        NamedColor::BrightRed,
        NamedColor::BrightGreen,
        NamedColor::BrightYellow,
        NamedColor::BrightBlue,
        NamedColor::BrightMagenta,
        NamedColor::BrightCyan,
        NamedColor::BrightWhite,
    ];

    /// Base palette slot `0..=7` (SGR 30–37 / 40–47).
    pub fn base(index: u8) -> Option<Self> {
        Self::BASE.get(usize::from(index)).copied()
    }

    /// Bright palette slot `0..=7` (SGR 90–97 / 100–107).
    pub fn bright(index: u8) -> Option<Self> {
        Self::BRIGHT.get(usize::from(index)).copied()
    }

    pub fn is_bright(&self) -> bool {
        Self::BRIGHT.contains(self)
    }

    /// Editor theme color id for this slot; `None` for the terminal default.
    pub fn theme_name(&self) -> Option<&'static str> {
        let name = match self {
            NamedColor::Default => return None,
            NamedColor::Black => "terminal.ansiBlack",
            NamedColor::Red => "terminal.ansiRed",
            NamedColor::Green => "terminal.ansiGreen",
            NamedColor::Yellow => "terminal.ansiYellow",
            NamedColor::Blue => "terminal.ansiBlue",
            NamedColor::Magenta => "terminal.ansiMagenta",
            NamedColor::Cyan => "terminal.ansiCyan",
            NamedColor::White => "terminal.ansiWhite",
            NamedColor::BrightBlack => "terminal.ansiBrightBlack",
            NamedColor::BrightRed => "terminal.ansiBrightRed",
            NamedColor::BrightGreen => "terminal.ansiBrightGreen",
            NamedColor::BrightYellow => "terminal.ansiBrightYellow",
            NamedColor::BrightBlue => "terminal.ansiBrightBlue",
            NamedColor::BrightMagenta => "terminal.ansiBrightMagenta",
            NamedColor::BrightCyan => "terminal.ansiBrightCyan",
            NamedColor::BrightWhite => "terminal.ansiBrightWhite",
        };
        Some(name)
    }
}

/// A foreground or background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const DEFAULT: Color = Color::Named(NamedColor::Default);

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// `#rrggbb` for true colors, `None` for palette slots.
    pub fn to_hex(&self) -> Option<String> {
        match self {
            Color::Rgb(r, g, b) => Some(format!("#{:02x}{:02x}{:02x}", r, g, b)),
            Color::Named(_) => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT
    }
}

bitflags! {
    /// SGR text attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Attributes: u32 {
        const BOLD             = 1 << 0;
        const FAINT            = 1 << 1;
        const ITALIC           = 1 << 2;
        const UNDERLINE        = 1 << 3;
        const SLOW_BLINK       = 1 << 4;
        const RAPID_BLINK      = 1 << 5;
        const INVERSE          = 1 << 6;
        const CONCEAL          = 1 << 7;
        const CROSSED_OUT      = 1 << 8;
        const FRAKTUR          = 1 << 9;
        const DOUBLE_UNDERLINE = 1 << 10;
        const PROPORTIONAL     = 1 << 11;
        const FRAMED           = 1 << 12;
        const ENCIRCLED        = 1 << 13;
        const OVERLINED        = 1 << 14;
        const SUPERSCRIPT      = 1 << 15;
        const SUBSCRIPT        = 1 << 16;
    }
}

impl Attributes {
    /// Set `flag` and clear its mutually exclusive partner.
    pub(crate) fn set_exclusive(&mut self, flag: Attributes, partner: Attributes) {
        self.insert(flag);
        self.remove(partner);
    }
}

/// Rendering style of a run of text.
///
/// Field order is part of the decoration key format (see [`Style::key`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Style {
    pub background: Color,
    pub foreground: Color,
    pub attributes: Attributes,
    /// Alternative font, `0..=9` (SGR 10–19).
    pub font_index: u8,
}

impl Style {
    /// Stable JSON serialization used to group spans into decorations.
    ///
    /// Structurally identical styles always produce the same key.
    pub fn key(&self) -> String {
        // Plain enums, integers and flag names: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        serde_json::from_str(key).ok()
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A maximal run of one line's raw text sharing one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset into the line handed to the parser.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// Style in effect for this run (for escapes: the style *before* the sequence).
    pub style: Style,
    /// True for recognised `ESC [ ... K|m` sequences, which never reach filtered text.
    pub is_escape: bool,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// The slice of `line` this span covers.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        line.get(self.range()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_is_default_colors_no_attributes() {
        let style = Style::default();
        assert_eq!(style.foreground, Color::DEFAULT);
        assert_eq!(style.background, Color::DEFAULT);
        assert!(style.attributes.is_empty());
        assert_eq!(style.font_index, 0);
    }

    #[test]
    fn test_named_color_slots() {
        assert_eq!(NamedColor::base(1), Some(NamedColor::Red));
        assert_eq!(NamedColor::bright(7), Some(NamedColor::BrightWhite));
        assert_eq!(NamedColor::base(8), None);
        assert!(NamedColor::BrightRed.is_bright());
        assert!(!NamedColor::Red.is_bright());
    }

    #[test]
    fn test_theme_names() {
        assert_eq!(NamedColor::Default.theme_name(), None);
        assert_eq!(NamedColor::Cyan.theme_name(), Some("terminal.ansiCyan"));
        assert_eq!(NamedColor::BrightBlack.theme_name(), Some("terminal.ansiBrightBlack"));
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Color::Rgb(255, 0, 16).to_hex().as_deref(), Some("#ff0010"));
        assert_eq!(Color::Named(NamedColor::Red).to_hex(), None);
    }

    #[test]
    fn test_style_key_merges_identical_styles() {
        let a = Style {
            foreground: Color::Named(NamedColor::Red),
            attributes: Attributes::BOLD | Attributes::UNDERLINE,
            ..Style::default()
        };
        let mut b = Style::default();
        b.attributes.insert(Attributes::UNDERLINE);
        b.attributes.insert(Attributes::BOLD);
        b.foreground = Color::Named(NamedColor::Red);

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Style::default().key());
    }

    #[test]
    fn test_style_key_parses_back() {
        let style = Style {
            background: Color::Rgb(1, 2, 3),
            foreground: Color::Named(NamedColor::BrightGreen),
            attributes: Attributes::ITALIC | Attributes::FAINT,
            font_index: 4,
        };
        assert_eq!(Style::from_key(&style.key()), Some(style));
        assert_eq!(Style::from_key("running"), None);
    }

    #[test]
    fn test_set_exclusive_clears_partner() {
        let mut attrs = Attributes::FAINT;
        attrs.set_exclusive(Attributes::BOLD, Attributes::FAINT);
        assert_eq!(attrs, Attributes::BOLD);
    }

    #[test]
    fn test_span_text() {
        let span = Span { offset: 2, length: 3, style: Style::default(), is_escape: false };
        assert_eq!(span.text("abcdefg"), "cde");
        assert_eq!(span.range(), 2..5);
    }
}
