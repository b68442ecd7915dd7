//! Display-width measurement for styled text.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::extract_ansi_code;

const TAB_WIDTH: usize = 3;

/// Cells one grapheme cluster occupies.
pub fn grapheme_width(grapheme: &str) -> usize {
    match grapheme {
        "" => 0,
        "\t" => TAB_WIDTH,
        // RGI emoji render two cells wide even when unicode-width disagrees.
        _ if emoji_get(grapheme).is_some() => 2,
        _ => grapheme
            .chars()
            .map(|ch| match ch {
                '\t' => TAB_WIDTH,
                _ => UnicodeWidthChar::width(ch).unwrap_or(0),
            })
            .sum(),
    }
}

/// Display width of `input`, ignoring ANSI control sequences.
pub fn visible_width(input: &str) -> usize {
    if input.is_empty() {
        return 0;
    }
    strip_ansi(input)
        .graphemes(true)
        .map(grapheme_width)
        .sum()
}

/// Copy of `input` with every recognized ANSI sequence removed and tabs
/// widened, so grapheme segmentation sees only printable text.
fn strip_ansi(input: &str) -> String {
    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(seq) = extract_ansi_code(input, idx) {
            idx += seq.len();
            continue;
        }
        match input[idx..].chars().next() {
            Some('\t') => {
                clean.push_str("   ");
                idx += 1;
            }
            Some(ch) => {
                clean.push(ch);
                idx += ch.len_utf8();
            }
            None => break,
        }
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::{grapheme_width, visible_width};

    #[test]
    fn sgr_sequences_take_no_cells() {
        assert_eq!(visible_width("hi\x1b[31m!!\x1b[0m"), 4);
    }

    #[test]
    fn osc8_hyperlinks_take_no_cells() {
        assert_eq!(
            visible_width("\x1b]8;;https://example.com\x07link\x1b]8;;\x07"),
            4
        );
    }

    #[test]
    fn rgi_emoji_width_is_two() {
        assert_eq!(visible_width("😀"), 2);
    }

    #[test]
    fn tab_counts_as_three_cells() {
        assert_eq!(grapheme_width("\t"), 3);
        assert_eq!(visible_width("a\tb"), 5);
    }

    #[test]
    fn combining_marks_do_not_add_width() {
        assert_eq!(visible_width("e\u{301}"), 1);
    }
}
