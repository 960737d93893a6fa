//! ANSI stripping for the powerline renderer (spec.md §4.3).

use ansi_str::AnsiStr;

/// Strip every ANSI CSI sequence from `s`. Used by the powerline renderer
/// to sanitize segment content before it's placed inside a colored block —
/// a segment's own embedded colors would otherwise clobber the block
/// palette (spec.md §4.3).
pub fn strip_ansi(s: &str) -> String {
    s.ansi_strip().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_csi_sequences() {
        assert_eq!(strip_ansi("\u{1b}[31mhello\u{1b}[0m"), "hello");
    }

    #[test]
    fn leaves_plain_text_unchanged() {
        assert_eq!(strip_ansi("hello world"), "hello world");
    }

    #[test]
    fn strips_multiple_sequences_in_one_string() {
        assert_eq!(strip_ansi("\u{1b}[1m\u{1b}[38;2;1;2;3mx\u{1b}[0m"), "x");
    }
}
