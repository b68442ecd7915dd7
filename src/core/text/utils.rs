//! Small text helpers shared by the widgets.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::extract_ansi_code;
use super::width::visible_width;

const ANSI_RESET: &str = "\x1b[0m";

/// Characters that terminate a word for word-wise caret motion.
const WORD_PUNCTUATION: &str = "(){}[]<>.,;:'\"!?+-=*/\\|&%^$#@~`";

pub fn grapheme_segments(text: &str) -> unicode_segmentation::Graphemes<'_> {
    UnicodeSegmentation::graphemes(text, true)
}

pub fn is_whitespace_char(ch: char) -> bool {
    ch.is_whitespace()
}

pub fn is_punctuation_char(ch: char) -> bool {
    ch.is_ascii() && WORD_PUNCTUATION.contains(ch)
}

/// Pad `line` to `width` visible cells, then run it through `bg_fn`.
pub fn apply_background_to_line(
    line: &str,
    width: usize,
    bg_fn: &dyn Fn(&str) -> String,
) -> String {
    let pad = width.saturating_sub(visible_width(line));
    bg_fn(&format!("{line}{:pad$}", ""))
}

/// Truncate `text` to `max_width` visible cells, keeping ANSI codes intact and
/// appending `ellipsis` when anything was cut.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str, pad: bool) -> String {
    if max_width == 0 {
        return String::new();
    }

    let full_width = visible_width(text);
    if full_width <= max_width {
        if pad {
            let fill = max_width - full_width;
            return format!("{text}{:fill$}", "");
        }
        return text.to_string();
    }

    let budget = max_width.saturating_sub(visible_width(ellipsis));
    if budget == 0 {
        return ellipsis.chars().take(max_width).collect();
    }

    let mut kept = String::new();
    let mut used = 0;
    let mut at = 0;
    'scan: while at < text.len() {
        if let Some(seq) = extract_ansi_code(text, at) {
            kept.push_str(seq);
            at += seq.len();
            continue;
        }

        let run_end = printable_run_end(text, at);
        for grapheme in grapheme_segments(&text[at..run_end]) {
            let cells = visible_width(grapheme);
            if used + cells > budget {
                break 'scan;
            }
            kept.push_str(grapheme);
            used += cells;
        }
        at = run_end;
    }

    // Reset before the ellipsis so a cut-off style never bleeds into it.
    let mut out = format!("{kept}{ANSI_RESET}{ellipsis}");
    if pad {
        let fill = max_width.saturating_sub(visible_width(&out));
        out.push_str(&" ".repeat(fill));
    }
    out
}

/// Word-wrap plain text to `max_width` visible cells. Words longer than the
/// width are split mid-word.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for word in raw_line.split(' ') {
            let word_width = visible_width(word);

            if word_width > max_width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                (line, line_width) = split_long_word(word, max_width, &mut lines);
                continue;
            }

            let gap = usize::from(!line.is_empty());
            if line_width + gap + word_width > max_width {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            if !line.is_empty() {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(word);
            line_width += word_width;
        }

        lines.push(line);
    }

    lines
}

/// Break one overlong word into full lines, returning the unfinished tail.
fn split_long_word(word: &str, max_width: usize, lines: &mut Vec<String>) -> (String, usize) {
    let mut fragment = String::new();
    let mut fragment_width = 0;
    for grapheme in grapheme_segments(word) {
        let cells = visible_width(grapheme);
        if fragment_width + cells > max_width && !fragment.is_empty() {
            lines.push(std::mem::take(&mut fragment));
            fragment_width = 0;
        }
        fragment.push_str(grapheme);
        fragment_width += cells;
    }
    (fragment, fragment_width)
}

fn printable_run_end(input: &str, mut idx: usize) -> usize {
    while idx < input.len() {
        if extract_ansi_code(input, idx).is_some() {
            break;
        }
        match input[idx..].chars().next() {
            Some(ch) => idx += ch.len_utf8(),
            None => break,
        }
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::{
        apply_background_to_line, grapheme_segments, is_punctuation_char, is_whitespace_char,
        truncate_to_width, wrap_text,
    };
    use crate::core::text::width::visible_width;

    #[test]
    fn truncate_returns_original_when_shorter() {
        assert_eq!(truncate_to_width("hello", 6, "...", false), "hello");
    }

    #[test]
    fn truncate_adds_ellipsis_and_reset() {
        let truncated = truncate_to_width("hello", 4, "...", false);
        assert_eq!(truncated, "h\x1b[0m...");
        assert_eq!(visible_width(&truncated), 4);
    }

    #[test]
    fn truncate_preserves_ansi_prefix() {
        let truncated = truncate_to_width("\x1b[31mhello", 4, "...", false);
        assert_eq!(truncated, "\x1b[31mh\x1b[0m...");
        assert_eq!(visible_width(&truncated), 4);
    }

    #[test]
    fn truncate_pads_when_requested() {
        let padded = truncate_to_width("hi", 4, "...", true);
        assert_eq!(padded, "hi  ");
        assert_eq!(visible_width(&padded), 4);
    }

    #[test]
    fn apply_background_pads_to_width() {
        let result = apply_background_to_line("hi", 4, &|text| format!("<{text}>"));
        assert_eq!(result, "<hi  >");
    }

    #[test]
    fn whitespace_and_punctuation_classification() {
        assert!(is_whitespace_char(' '));
        assert!(is_whitespace_char('\n'));
        assert!(!is_whitespace_char('a'));
        assert!(is_punctuation_char('.'));
        assert!(is_punctuation_char('-'));
        assert!(!is_punctuation_char('_'));
    }

    #[test]
    fn grapheme_segments_splits_clusters() {
        let clusters: Vec<&str> = grapheme_segments("a🇺🇸").collect();
        assert_eq!(clusters, vec!["a", "🇺🇸"]);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_text("the quick brown fox", 9);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap_text("abcdefgh", 3);
        assert_eq!(lines, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn wrap_preserves_blank_lines() {
        let lines = wrap_text("a\n\nb", 10);
        assert_eq!(lines, vec!["a", "", "b"]);
    }
}
