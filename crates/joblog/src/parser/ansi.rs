//! Incremental SGR interpreter for CI job traces.
//!
//! A [`StyleParser`] turns one line of raw terminal output at a time into
//! style-tagged [`Span`]s. The current style carries over from one line to
//! the next, so one parser instance corresponds to one continuous document.
//!
//! Only `ESC [ <params> K` (erase in line) and `ESC [ <params> m` (SGR) are
//! recognised. Erase-in-line is reported as an escape span and otherwise
//! ignored. Anything else that starts with ESC is left in place as literal
//! text: the parser never fails and never panics.

use super::model::{Attributes, Color, NamedColor, Span, Style};

const ESC: u8 = 0x1b;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Interpret SGR 21 as double underline instead of "bold off".
    pub double_underline: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StyleParser {
    options: ParserOptions,
    style: Style,
}

impl StyleParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            style: Style::default(),
        }
    }

    /// Snapshot of the style that will apply to the next character.
    pub fn style(&self) -> Style {
        self.style
    }

    /// Split `text` (a single line without its terminator) into spans.
    ///
    /// The returned spans are contiguous, never empty, and cover `text`
    /// completely, escape sequences included.
    pub fn append_line(&mut self, text: &str) -> Vec<Span> {
        let bytes = text.as_bytes();
        let mut spans = Vec::new();

        // Start of the pending plain-text run.
        let mut text_offset = 0;
        let mut index = 0;

        while index < bytes.len() {
            if bytes[index] != ESC {
                index = find_byte(bytes, ESC, index).unwrap_or(bytes.len());
                continue;
            }

            // A lone trailing ESC stays part of the text run.
            if index + 1 == bytes.len() || bytes[index + 1] != b'[' {
                index += 1;
                continue;
            }

            let Some(command) = find_command(bytes, index + 2) else {
                index += 1;
                continue;
            };

            let params = &text[index + 2..command];
            if !params.bytes().all(|b| b.is_ascii_digit() || b == b';') {
                index = command;
                continue;
            }

            self.push_text(&mut spans, text_offset, index);
            spans.push(Span {
                offset: index,
                length: command - index + 1,
                style: self.style,
                is_escape: true,
            });

            if bytes[command] == b'm' {
                self.apply_codes(&parse_params(params));
            }

            text_offset = command + 1;
            index = command + 1;
        }

        self.push_text(&mut spans, text_offset, bytes.len());
        spans
    }

    fn push_text(&self, spans: &mut Vec<Span>, start: usize, end: usize) {
        if end > start {
            spans.push(Span {
                offset: start,
                length: end - start,
                style: self.style,
                is_escape: false,
            });
        }
    }

    fn apply_codes(&mut self, codes: &[u32]) {
        let mut style = self.style;
        let mut i = 0;

        while i < codes.len() {
            let code = codes[i];
            let attrs = &mut style.attributes;
            match code {
                0 => style = Style::default(),
                1 => attrs.set_exclusive(Attributes::BOLD, Attributes::FAINT),
                2 => attrs.set_exclusive(Attributes::FAINT, Attributes::BOLD),
                3 => attrs.set_exclusive(Attributes::ITALIC, Attributes::FRAKTUR),
                4 => attrs.set_exclusive(Attributes::UNDERLINE, Attributes::DOUBLE_UNDERLINE),
                5 => attrs.set_exclusive(Attributes::SLOW_BLINK, Attributes::RAPID_BLINK),
                6 => attrs.set_exclusive(Attributes::RAPID_BLINK, Attributes::SLOW_BLINK),
                7 => attrs.insert(Attributes::INVERSE),
                8 => attrs.insert(Attributes::CONCEAL),
                9 => attrs.insert(Attributes::CROSSED_OUT),
                10..=19 => style.font_index = (code - 10) as u8,
                20 => attrs.set_exclusive(Attributes::FRAKTUR, Attributes::ITALIC),
                21 if self.options.double_underline => {
                    attrs.set_exclusive(Attributes::DOUBLE_UNDERLINE, Attributes::UNDERLINE)
                }
                21 => attrs.remove(Attributes::BOLD),
                22 => attrs.remove(Attributes::BOLD | Attributes::FAINT),
                23 => attrs.remove(Attributes::ITALIC | Attributes::FRAKTUR),
                24 => attrs.remove(Attributes::UNDERLINE | Attributes::DOUBLE_UNDERLINE),
                25 => attrs.remove(Attributes::SLOW_BLINK | Attributes::RAPID_BLINK),
                26 => attrs.insert(Attributes::PROPORTIONAL),
                27 => attrs.remove(Attributes::INVERSE),
                28 => attrs.remove(Attributes::CONCEAL),
                29 => attrs.remove(Attributes::CROSSED_OUT),
                30..=37 => style.foreground = named_base(code - 30),
                38 => {
                    let (color, consumed) = extended_color(&codes[i + 1..]);
                    if let Some(color) = color {
                        style.foreground = color;
                    }
                    i += consumed;
                }
                39 => style.foreground = Color::DEFAULT,
                40..=47 => style.background = named_base(code - 40),
                48 => {
                    let (color, consumed) = extended_color(&codes[i + 1..]);
                    if let Some(color) = color {
                        style.background = color;
                    }
                    i += consumed;
                }
                49 => style.background = Color::DEFAULT,
                50 => attrs.remove(Attributes::PROPORTIONAL),
                51 => attrs.set_exclusive(Attributes::FRAMED, Attributes::ENCIRCLED),
                52 => attrs.set_exclusive(Attributes::ENCIRCLED, Attributes::FRAMED),
                53 => attrs.insert(Attributes::OVERLINED),
                54 => attrs.remove(Attributes::FRAMED | Attributes::ENCIRCLED),
                55 => attrs.remove(Attributes::OVERLINED),
                // Underline colors are not rendered.
                58 | 59 => {}
                73 => attrs.set_exclusive(Attributes::SUPERSCRIPT, Attributes::SUBSCRIPT),
                74 => attrs.set_exclusive(Attributes::SUBSCRIPT, Attributes::SUPERSCRIPT),
                90..=97 => style.foreground = named_bright(code - 90),
                100..=107 => style.background = named_bright(code - 100),
                _ => {}
            }
            i += 1;
        }

        self.style = style;
    }
}

/// Position of the first `K` or `m` at or after `from`.
fn find_command(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == b'K' || b == b'm')
        .map(|pos| from + pos)
}

fn find_byte(bytes: &[u8], needle: u8, from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|pos| from + pos)
}

/// Split `1;;31` into `[1, 31]`; an empty list means reset.
///
/// Values too large for `u32` become `u32::MAX`, which no code matches.
fn parse_params(params: &str) -> Vec<u32> {
    let mut codes: Vec<u32> = params
        .split(';')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse().unwrap_or(u32::MAX))
        .collect();
    if codes.is_empty() {
        codes.push(0);
    }
    codes
}

fn named_base(index: u32) -> Color {
    Color::Named(NamedColor::base(index as u8).unwrap_or(NamedColor::Default))
}

fn named_bright(index: u32) -> Color {
    Color::Named(NamedColor::bright(index as u8).unwrap_or(NamedColor::Default))
}

/// Decode the arguments following a 38/48 code.
///
/// Returns the color (if valid) and how many arguments were consumed.
fn extended_color(args: &[u32]) -> (Option<Color>, usize) {
    match args.first() {
        Some(5) => {
            let color = args
                .get(1)
                .and_then(|&n| u8::try_from(n).ok())
                .map(convert_8bit_color);
            (color, 2)
        }
        Some(2) => {
            let component = |i: usize| args.get(i).and_then(|&n| u8::try_from(n).ok());
            let color = match (component(1), component(2), component(3)) {
                (Some(r), Some(g), Some(b)) => Some(Color::Rgb(r, g, b)),
                _ => None,
            };
            (color, 4)
        }
        _ => (None, 0),
    }
}

/// Map a 256-color palette index onto a [`Color`].
///
/// - `0..=7` base named colors
/// - `8..=15` bright named colors
/// - `16..=231` the 6×6×6 RGB cube
/// - `232..=255` a 24-step grayscale ramp
pub fn convert_8bit_color(index: u8) -> Color {
    match index {
        0..=7 => named_base(u32::from(index)),
        8..=15 => named_bright(u32::from(index - 8)),
        232..=255 => {
            let level = (255 * u32::from(index - 232) / 23) as u8;
            Color::Rgb(level, level, level)
        }
        _ => {
            let cube = index - 16;
            let scale = |c: u8| ((255.0 * f32::from(c) / 5.0).round()) as u8;
            Color::Rgb(scale(cube / 36), scale((cube / 6) % 6), scale(cube % 6))
        }
    }
}
