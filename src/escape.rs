//! Pass 2 of the expansion engine (spec.md §4.2): one forward scan over
//! Pass 1's output, dispatching ANSI passthrough / bash `\X` / zsh `%X` in
//! that order. The scanner never reorders bytes — it only consumes or
//! inserts — so any CSI sequence Pass 1 emitted survives intact.

use chrono::Local;

use crate::color::parse_color_spec;
use crate::context::PromptContext;

/// Run Pass 2 over `input`, using `ctx` for every context-dependent escape.
pub fn expand_escapes(input: &str, ctx: &PromptContext) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'[') {
            let start = i;
            i += 2;
            while i < bytes.len() && !(0x40..=0x7e).contains(&bytes[i]) {
                i += 1;
            }
            if i < bytes.len() {
                i += 1; // include the final byte
            }
            out.push_str(&input[start..i]);
            continue;
        }
        if bytes[i] == b'\\' {
            let (text, consumed) = expand_bash_escape(&input[i..], ctx);
            out.push_str(&text);
            i += consumed;
            continue;
        }
        if bytes[i] == b'%' {
            let (text, consumed) = expand_zsh_escape(&input[i..], ctx);
            out.push_str(&text);
            i += consumed;
            continue;
        }
        let len = utf8_len(bytes[i]);
        let end = (i + len).min(bytes.len());
        out.push_str(&input[i..end]);
        i = end;
    }
    out
}

fn utf8_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else if first_byte & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

/// `slice` starts with `\`. Returns the replacement text and the number of
/// input bytes consumed (at least 1).
fn expand_bash_escape(slice: &str, ctx: &PromptContext) -> (String, usize) {
    let bytes = slice.as_bytes();
    let Some(&head) = bytes.get(1) else {
        return ("\\".to_string(), 1);
    };
    match head {
        b'u' => (ctx.username.clone(), 2),
        b'h' => (ctx.hostname.split('.').next().unwrap_or("").to_string(), 2),
        b'H' => (ctx.hostname.clone(), 2),
        b'w' => (ctx.cwd_display.clone(), 2),
        b'W' => (basename_of_display(&ctx.cwd_display), 2),
        b'd' => (Local::now().format("%a %b %d").to_string(), 2),
        b't' => (Local::now().format("%H:%M:%S").to_string(), 2),
        b'T' => (Local::now().format("%I:%M:%S").to_string(), 2),
        b'@' => (Local::now().format("%I:%M %p").to_string(), 2),
        b'A' => (Local::now().format("%H:%M").to_string(), 2),
        b'$' => {
            let c = if crate::posix::effective_uid_is_root() { '#' } else { '$' };
            (c.to_string(), 2)
        }
        b'n' => ("\n".to_string(), 2),
        b'r' => ("\r".to_string(), 2),
        b'\\' => ("\\".to_string(), 2),
        b'[' | b']' => (String::new(), 2),
        b'!' => (ctx.history_number.to_string(), 2),
        b'#' => (ctx.command_number.to_string(), 2),
        b'j' => (ctx.background_job_count.to_string(), 2),
        b'l' => (crate::posix::tty_name().unwrap_or_else(|| "?".to_string()), 2),
        b's' => (ctx.shell_name.clone(), 2),
        b'v' => (ctx.shell_version_major_minor.clone(), 2),
        b'V' => (ctx.shell_version_full.clone(), 2),
        b'e' => ("\x1b".to_string(), 2),
        b'a' => ("\x07".to_string(), 2),
        b'0' => parse_octal(slice),
        b'x' => parse_hex_byte(slice),
        _ => (slice[..2.min(slice.len())].to_string(), 2.min(slice.len())),
    }
}

fn basename_of_display(display: &str) -> String {
    if display == "~" || display == "/" {
        return display.to_string();
    }
    display.rsplit('/').next().unwrap_or(display).to_string()
}

/// `\0NNN`: up to three octal digits after the leading `0`. Values outside
/// `0..=255` are silently dropped (spec.md §4.2).
fn parse_octal(slice: &str) -> (String, usize) {
    let digits: &str = &slice[2..];
    let octal_len = digits.bytes().take(3).take_while(|b| (b'0'..=b'7').contains(b)).count();
    let consumed = 2 + octal_len;
    if octal_len == 0 {
        return (String::new(), consumed);
    }
    match u32::from_str_radix(&digits[..octal_len], 8) {
        Ok(n) if n <= 255 => (char::from(n as u8).to_string(), consumed),
        _ => (String::new(), consumed),
    }
}

/// `\xNN`: up to two hex digits.
fn parse_hex_byte(slice: &str) -> (String, usize) {
    let digits: &str = &slice[2..];
    let hex_len = digits.bytes().take(2).take_while(u8::is_ascii_hexdigit).count();
    let consumed = 2 + hex_len;
    if hex_len == 0 {
        return (String::new(), consumed);
    }
    match u8::from_str_radix(&digits[..hex_len], 16) {
        Ok(n) => (char::from(n).to_string(), consumed),
        Err(_) => (String::new(), consumed),
    }
}

/// `slice` starts with `%`. Returns the replacement text and bytes consumed.
fn expand_zsh_escape(slice: &str, ctx: &PromptContext) -> (String, usize) {
    let bytes = slice.as_bytes();
    let Some(&head) = bytes.get(1) else {
        return ("%".to_string(), 1);
    };
    match head {
        b'n' => (ctx.username.clone(), 2),
        b'm' => (ctx.hostname.split('.').next().unwrap_or("").to_string(), 2),
        b'M' => (ctx.hostname.clone(), 2),
        b'd' | b'/' => (ctx.cwd.to_string_lossy().into_owned(), 2),
        b'~' => (ctx.cwd_display.clone(), 2),
        b'c' | b'.' => (basename_of_display(&ctx.cwd_display), 2),
        b'#' => {
            let c = if crate::posix::effective_uid_is_root() { '#' } else { '%' };
            (c.to_string(), 2)
        }
        b'%' => ("%".to_string(), 2),
        b'T' => (Local::now().format("%H:%M").to_string(), 2),
        b't' | b'@' => (Local::now().format("%l:%M %p").to_string(), 2),
        b'*' => (Local::now().format("%H:%M:%S").to_string(), 2),
        b'j' => (ctx.background_job_count.to_string(), 2),
        b'l' => (crate::posix::tty_name().unwrap_or_else(|| "?".to_string()), 2),
        b'?' => (ctx.last_exit_code.to_string(), 2),
        b'D' => expand_zsh_custom_date(slice),
        b'B' | b'b' => ("\x1b[1m".to_string(), 2),
        b'U' | b'u' => ("\x1b[4m".to_string(), 2),
        b'S' | b's' => ("\x1b[7m".to_string(), 2),
        b'F' => expand_zsh_color(slice, ctx, true),
        b'f' => ("\x1b[39m".to_string(), 2),
        b'K' => expand_zsh_color(slice, ctx, false),
        b'k' => ("\x1b[49m".to_string(), 2),
        _ => (slice[..2.min(slice.len())].to_string(), 2.min(slice.len())),
    }
}

/// `%D` (bare) → `%y-%m-%d`; `%D{fmt}` → custom `strftime`.
fn expand_zsh_custom_date(slice: &str) -> (String, usize) {
    let rest = &slice[2..];
    if let Some(body) = rest.strip_prefix('{') {
        if let Some(close) = body.find('}') {
            let fmt = &body[..close];
            let text = Local::now().format(fmt).to_string();
            return (text, 2 + close + 2);
        }
    }
    (Local::now().format("%y-%m-%d").to_string(), 2)
}

/// `%F{spec}` / `%K{spec}`. `is_fg` selects the SGR base used by
/// [`crate::color::Color::emit_fg`]/[`emit_bg`][crate::color::Color::emit_bg].
fn expand_zsh_color(slice: &str, ctx: &PromptContext, is_fg: bool) -> (String, usize) {
    let rest = &slice[2..];
    let Some(body) = rest.strip_prefix('{') else {
        return (slice[..2.min(slice.len())].to_string(), 2.min(slice.len()));
    };
    let Some(close) = body.find('}') else {
        return (slice[..2.min(slice.len())].to_string(), 2.min(slice.len()));
    };
    let spec = &body[..close];
    let consumed = 2 + close + 2;
    match parse_color_spec(spec, ctx.color) {
        Some(c) if is_fg => (c.emit_fg(), consumed),
        Some(c) => (c.emit_bg(), consumed),
        None => (String::new(), consumed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorCapability;
    use rstest::rstest;
    use std::path::PathBuf;

    fn ctx() -> PromptContext {
        PromptContext {
            username: "alice".to_string(),
            hostname: "hq.example".to_string(),
            cwd: PathBuf::from("/home/alice/proj"),
            cwd_display: "~/proj".to_string(),
            last_exit_code: 0,
            background_job_count: 0,
            history_number: 42,
            command_number: 7,
            color: ColorCapability::FULL,
            git_status: None,
            shell_name: "lush".to_string(),
            shell_version_major_minor: "1.0".to_string(),
            shell_version_full: "1.0.0".to_string(),
        }
    }

    #[test]
    fn plain_text_round_trips() {
        assert_eq!(expand_escapes("hello world", &ctx()), "hello world");
    }

    #[test]
    fn bash_octal() {
        assert_eq!(expand_escapes(r"\0101", &ctx()), "A");
    }

    #[test]
    fn bash_dollar_non_root() {
        assert_eq!(expand_escapes(r"\$", &ctx()), "$");
    }

    #[test]
    fn bash_user_host_cwd_mixed() {
        let result = expand_escapes(r"\u@\h:\w\$ ", &ctx());
        assert!(result.starts_with("alice@hq:~/proj"));
        assert!(result.ends_with("$ "));
    }

    #[test]
    fn bash_unknown_escape_passes_through() {
        assert_eq!(expand_escapes(r"\Z", &ctx()), r"\Z");
    }

    #[test]
    fn zsh_unknown_escape_passes_through() {
        assert_eq!(expand_escapes("%Z", &ctx()), "%Z");
    }

    #[test]
    fn literal_backslash_and_percent() {
        assert_eq!(expand_escapes(r"\\", &ctx()), "\\");
        assert_eq!(expand_escapes("%%", &ctx()), "%");
    }

    #[test]
    fn ansi_passthrough_survives_intact() {
        let input = "\x1b[31mx\x1b[0m";
        assert_eq!(expand_escapes(input, &ctx()), input);
    }

    #[test]
    fn ansi_passthrough_around_escape() {
        let input = "\x1b[1;31m\\u\x1b[0m";
        assert_eq!(expand_escapes(input, &ctx()), "\x1b[1;31malice\x1b[0m");
    }

    #[test]
    fn zsh_color_truecolor() {
        let result = expand_escapes("%F{#FF0000}x%f", &ctx());
        assert!(result.contains("\x1b[38;2;255;0;0m"));
        assert!(result.contains('x'));
        assert!(result.contains("\x1b[39m"));
    }

    #[test]
    fn zsh_color_downgraded_to_256() {
        let mut c = ctx();
        c.color = ColorCapability { has_256_color: true, has_true_color: false };
        let result = expand_escapes("%F{#FF0000}x%f", &c);
        assert!(result.contains("\x1b[38;5;"));
        assert!(!result.contains("\x1b[38;2;"));
    }

    #[test]
    fn zsh_custom_date_format() {
        let result = expand_escapes("%D{%Y}", &ctx());
        assert_eq!(result.len(), 4);
        assert!(result.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn non_printing_markers_consumed() {
        assert_eq!(expand_escapes(r"\[\]x", &ctx()), "x");
    }

    #[test]
    fn hex_escape() {
        assert_eq!(expand_escapes(r"\x41", &ctx()), "A");
    }

    #[rstest]
    #[case(r"\n", "\n")]
    #[case(r"\r", "\r")]
    #[case(r"\e", "\x1b")]
    #[case(r"\a", "\x07")]
    #[case("%%", "%")]
    #[case("%n", "alice")]
    #[case("%m", "hq")]
    #[case("%M", "hq.example")]
    #[case("%~", "~/proj")]
    #[case("%?", "0")]
    fn single_char_escape_table(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expand_escapes(input, &ctx()), expected);
    }
}
