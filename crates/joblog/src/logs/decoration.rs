//! Decoration: what an editor needs to paint one decoration group.
//!
//! Viewers receive decoration groups keyed by [`Style::key`]. This module
//! turns a key back into display attributes: named colors become theme
//! color ids, true colors become `#rrggbb`.

use serde::Serialize;

use super::render::RUNNING_KEY;
use crate::parser::{Attributes, Color, Style};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum ColorValue {
    /// Theme color id such as `terminal.ansiRed`.
    Theme(&'static str),
    /// `#rrggbb`
    Hex(String),
}

impl ColorValue {
    /// `None` for the terminal default color.
    pub fn from_color(color: Color) -> Option<Self> {
        match color {
            Color::Named(named) => named.theme_name().map(ColorValue::Theme),
            Color::Rgb(..) => color.to_hex().map(ColorValue::Hex),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDecoration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<&'static str>,
}

impl From<&Style> for TextDecoration {
    fn from(style: &Style) -> Self {
        let attrs = style.attributes;
        let flag = |flag: Attributes, value: &'static str| attrs.contains(flag).then_some(value);

        Self {
            background_color: ColorValue::from_color(style.background),
            color: ColorValue::from_color(style.foreground),
            font_weight: flag(Attributes::BOLD, "bold"),
            font_style: flag(Attributes::ITALIC, "italic"),
            text_decoration: flag(Attributes::UNDERLINE, "underline"),
            opacity: flag(Attributes::FAINT, "50%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DecorationOptions {
    /// Animated "job is still running" marker after the last line.
    Running,
    Text(TextDecoration),
}

impl DecorationOptions {
    /// Resolve a decoration group key; `None` if the key is not a style.
    pub fn from_key(key: &str) -> Option<Self> {
        if key == RUNNING_KEY {
            return Some(DecorationOptions::Running);
        }
        Style::from_key(key).map(|style| DecorationOptions::Text(TextDecoration::from(&style)))
    }
}
