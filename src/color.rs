//! Color value ADT: `none` / 8-color `basic` / `256` / 24-bit `true` color,
//! with downgrade-to-capability and ANSI SGR emission.
//!
//! Modelled the way `worktrunk::styling` leans on `anstyle::Color` for its
//! own ADT, but widened to the four variants the prompt engine's escape
//! tables need, with an explicit `none` variant (anstyle folds that into
//! `Option<Color>`, but callers here need to carry "no color" through
//! arithmetic like segment-default resolution without an extra `Option`
//! layer).

use std::str::FromStr;
use strum::EnumString;

/// Terminal color capability, as reported by the external terminal-detection
/// collaborator (spec.md §6) and carried on [`crate::context::PromptContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorCapability {
    pub has_256_color: bool,
    pub has_true_color: bool,
}

impl ColorCapability {
    pub const NONE: ColorCapability = ColorCapability { has_256_color: false, has_true_color: false };
    pub const FULL: ColorCapability =
        ColorCapability { has_256_color: true, has_true_color: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ColorKind {
    #[default]
    None,
    Basic(u8),
    Ansi256(u8),
    TrueColor(u8, u8, u8),
}

/// A color value: tagged union of `none` / `basic` (0..=7) / `256` (0..=255)
/// / `true` (r, g, b), each with an optional bold flag. A `none` color never
/// emits bytes — see [`Color::emit_fg`]/[`Color::emit_bg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    kind: ColorKind,
    bold: bool,
}

impl Color {
    pub const NONE: Color = Color { kind: ColorKind::None, bold: false };

    pub fn basic(index: u8) -> Self {
        debug_assert!(index <= 7);
        Self { kind: ColorKind::Basic(index % 8), bold: false }
    }

    pub fn ansi256(index: u8) -> Self {
        Self { kind: ColorKind::Ansi256(index), bold: false }
    }

    pub fn truecolor(r: u8, g: u8, b: u8) -> Self {
        Self { kind: ColorKind::TrueColor(r, g, b), bold: false }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn is_none(self) -> bool {
        matches!(self.kind, ColorKind::None)
    }

    /// Downgrade a color to fit the reported terminal capability: truecolor
    /// collapses to the 256 cube when `!has_true_color`, then 256 collapses
    /// to one of the 8 basic colors when `!has_256_color`. `none` and
    /// `basic` are unaffected.
    pub fn downgrade(self, cap: ColorCapability) -> Color {
        let mut kind = self.kind;
        if let ColorKind::TrueColor(r, g, b) = kind
            && !cap.has_true_color
        {
            kind = ColorKind::Ansi256(rgb_to_ansi256(r, g, b));
        }
        if let ColorKind::Ansi256(idx) = kind
            && !cap.has_256_color
        {
            kind = ColorKind::Basic(ansi256_to_basic(idx));
        }
        Color { kind, bold: self.bold }
    }

    /// Render the foreground SGR sequence, or an empty string for `none`.
    pub fn emit_fg(self) -> String {
        self.emit(30, 38)
    }

    /// Render the background SGR sequence, or an empty string for `none`.
    pub fn emit_bg(self) -> String {
        self.emit(40, 48)
    }

    fn emit(self, basic_base: u8, extended_base: u8) -> String {
        let mut params: Vec<String> = Vec::new();
        if self.bold {
            params.push("1".to_string());
        }
        match self.kind {
            ColorKind::None => return String::new(),
            // idx is already normalised at construction time: `Color::basic`
            // mods by 8, while the named-color `default` variant deliberately
            // carries 9 so this lands on the bare reset codes 39/49.
            ColorKind::Basic(idx) => params.push((basic_base + idx).to_string()),
            ColorKind::Ansi256(idx) => {
                params.push(extended_base.to_string());
                params.push("5".to_string());
                params.push(idx.to_string());
            }
            ColorKind::TrueColor(r, g, b) => {
                params.push(extended_base.to_string());
                params.push("2".to_string());
                params.push(r.to_string());
                params.push(g.to_string());
                params.push(b.to_string());
            }
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", params.join(";"))
        }
    }
}

/// Named basic colors accepted by `%F{name}` / `%K{name}` (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Default,
}

impl NamedColor {
    /// The basic-color index used in both the `30+N` fg and `40+N` bg
    /// formulas; `default` maps to 9, which lands on the bare reset codes
    /// 39/49.
    fn index(self) -> u8 {
        match self {
            NamedColor::Black => 0,
            NamedColor::Red => 1,
            NamedColor::Green => 2,
            NamedColor::Yellow => 3,
            NamedColor::Blue => 4,
            NamedColor::Magenta => 5,
            NamedColor::Cyan => 6,
            NamedColor::White => 7,
            NamedColor::Default => 9,
        }
    }
}

/// Parse a `%F{spec}` / `%K{spec}` color specification (spec.md §4.2).
///
/// Unrecognised specs return `None`, which callers must treat as "drop
/// silently" rather than as an error (spec.md §7).
pub fn parse_color_spec(spec: &str, cap: ColorCapability) -> Option<Color> {
    if let Some(hex) = spec.strip_prefix('#') {
        return parse_hex(hex, cap);
    }
    if let Ok(n) = spec.parse::<u16>()
        && n <= 255
    {
        return Some(parse_indexed(n as u8, cap));
    }
    if let Ok(named) = NamedColor::from_str(spec) {
        return Some(Color { kind: ColorKind::Basic(named.index()), bold: false });
    }
    None
}

fn parse_indexed(n: u8, cap: ColorCapability) -> Color {
    if cap.has_256_color {
        Color::ansi256(n)
    } else {
        // "basic" depth: 30|40 + N % 8, per spec.md §4.2 rule 2.
        Color::basic(n % 8)
    }
}

fn parse_hex(hex: &str, cap: ColorCapability) -> Option<Color> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    if cap.has_true_color {
        Some(Color::truecolor(r, g, b))
    } else if cap.has_256_color {
        Some(Color::ansi256(rgb_to_256_cube(r, g, b)))
    } else {
        // No good 8-color approximation for an arbitrary hex value — drop.
        None
    }
}

/// 6×6×6 color-cube approximation, per spec.md §4.2 rule 1.
fn rgb_to_256_cube(r: u8, g: u8, b: u8) -> u8 {
    let channel = |c: u8| -> u8 {
        if c > 47 {
            ((c as u16 - 35) / 40) as u8
        } else {
            0
        }
    };
    16 + 36 * channel(r) + 6 * channel(g) + channel(b)
}

/// General truecolor -> 256 downgrade used by [`Color::downgrade`]. Unlike
/// [`parse_hex`]'s basic-depth behavior, powerline block backgrounds must
/// always render *something*, so this never drops — it picks the closest
/// cube/grayscale entry.
fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        // Grayscale ramp: 232..=255, step 10, starting at 8.
        if r < 8 {
            return 16;
        }
        if r > 238 {
            return 231;
        }
        return 232 + ((r as u16 - 8) * 24 / 247) as u8;
    }
    rgb_to_256_cube(r, g, b)
}

/// Approximate any 256-index color by its nearest basic (0..=7) color,
/// since §4.2's silent-drop rule only applies when the *source* spec was
/// an arbitrary hex value with no good match — once a value is already an
/// indexed color, clamping to the nearest basic color keeps powerline
/// blocks visible instead of invisible.
fn ansi256_to_basic(idx: u8) -> u8 {
    let (r, g, b) = ansi256_to_rgb(idx);
    let bit = |c: u8| u8::from(c > 127);
    (bit(r) << 2) | (bit(g) << 1) | bit(b)
}

fn ansi256_to_rgb(idx: u8) -> (u8, u8, u8) {
    match idx {
        0..=15 => {
            const SYSTEM: [(u8, u8, u8); 16] = [
                (0, 0, 0),
                (205, 0, 0),
                (0, 205, 0),
                (205, 205, 0),
                (0, 0, 238),
                (205, 0, 205),
                (0, 205, 205),
                (229, 229, 229),
                (127, 127, 127),
                (255, 0, 0),
                (0, 255, 0),
                (255, 255, 0),
                (92, 92, 255),
                (255, 0, 255),
                (0, 255, 255),
                (255, 255, 255),
            ];
            SYSTEM[idx as usize]
        }
        16..=231 => {
            let i = idx - 16;
            let expand = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
            (expand(i / 36), expand((i / 6) % 6), expand(i % 6))
        }
        232..=255 => {
            let v = 8 + (idx - 232) * 10;
            (v, v, v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_emits_nothing() {
        assert_eq!(Color::NONE.emit_fg(), "");
        assert_eq!(Color::NONE.emit_bg(), "");
    }

    #[test]
    fn basic_fg_bg_formula() {
        assert_eq!(Color::basic(2).emit_fg(), "\x1b[32m");
        assert_eq!(Color::basic(2).emit_bg(), "\x1b[42m");
    }

    #[test]
    fn truecolor_emission() {
        assert_eq!(Color::truecolor(255, 0, 0).emit_fg(), "\x1b[38;2;255;0;0m");
        assert_eq!(Color::truecolor(255, 0, 0).emit_bg(), "\x1b[48;2;255;0;0m");
    }

    #[test]
    fn ansi256_emission() {
        assert_eq!(Color::ansi256(200).emit_fg(), "\x1b[38;5;200m");
    }

    #[test]
    fn bold_is_prefixed() {
        assert_eq!(Color::basic(1).bold().emit_fg(), "\x1b[1;31m");
    }

    #[test]
    fn parse_hex_truecolor() {
        let c = parse_color_spec("#FF0000", ColorCapability::FULL).unwrap();
        assert_eq!(c.emit_fg(), "\x1b[38;2;255;0;0m");
    }

    #[test]
    fn parse_hex_downgrades_to_256() {
        let cap = ColorCapability { has_256_color: true, has_true_color: false };
        let c = parse_color_spec("#FF0000", cap).unwrap();
        assert!(c.emit_fg().starts_with("\x1b[38;5;"));
    }

    #[test]
    fn parse_hex_drops_on_basic() {
        assert!(parse_color_spec("#FF0000", ColorCapability::NONE).is_none());
    }

    #[test]
    fn parse_named() {
        let c = parse_color_spec("red", ColorCapability::NONE).unwrap();
        assert_eq!(c.emit_fg(), "\x1b[31m");
    }

    #[test]
    fn parse_named_default_resets() {
        let c = parse_color_spec("default", ColorCapability::NONE).unwrap();
        assert_eq!(c.emit_fg(), "\x1b[39m");
        assert_eq!(c.emit_bg(), "\x1b[49m");
    }

    #[test]
    fn parse_integer_basic() {
        let c = parse_color_spec("9", ColorCapability::NONE).unwrap();
        assert_eq!(c.emit_fg(), "\x1b[31m"); // 9 % 8 == 1 -> red
    }

    #[test]
    fn parse_integer_256() {
        let c = parse_color_spec("200", ColorCapability::FULL).unwrap();
        assert_eq!(c.emit_fg(), "\x1b[38;5;200m");
    }

    #[test]
    fn parse_unrecognised_is_none() {
        assert!(parse_color_spec("not-a-color", ColorCapability::FULL).is_none());
    }

    #[test]
    fn downgrade_truecolor_to_basic_stays_visible() {
        let c = Color::truecolor(10, 10, 200).downgrade(ColorCapability::NONE);
        assert!(!c.emit_fg().is_empty());
    }

    #[test]
    fn downgrade_noop_when_capable() {
        let c = Color::truecolor(1, 2, 3).downgrade(ColorCapability::FULL);
        assert_eq!(c.emit_fg(), "\x1b[38;2;1;2;3m");
    }
}
