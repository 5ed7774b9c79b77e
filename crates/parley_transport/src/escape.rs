//! MarkdownV2 escaping for model output.
//!
//! Model replies use loose markdown. Telegram's MarkdownV2 rejects any bare
//! reserved character, so everything is escaped except the delimiters of
//! well-formed single-line spans. Code fences are passed through with only
//! backslashes and backticks escaped inside them.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::chunk::FENCE;

/// Single-line spans whose delimiters are kept.
static SPANS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\*(.+?)\*$",
        r"^_(.+?)_$",
        r"^__(.+?)__$",
        r"^~(.+?)~$",
        r"^\|\|(.+?)\|\|$",
        r"^`(.+?)`$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("span pattern is valid"))
    .collect()
});

/// A candidate span or a single reserved character.
static CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(`.+?`|\*.+?\*|_.+?_|__.+?__|~.+?~|\|\|.+?\|\||[_*\[\]()~`>#+\-=|{}.!])")
        .expect("candidate pattern is valid")
});

static RESERVED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([_*\[\]()~`>#+\-=|{}.!])").expect("reserved pattern is valid"));

/// Characters that are never valid bare, even inside a span.
const ALWAYS_ESCAPED: &str = "!(){}[].>#=+-";

pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut inside_code = false;
    let mut parts = 0;
    for (i, part) in text.split(FENCE).enumerate() {
        if i > 0 {
            out.push_str(FENCE);
        }
        if inside_code {
            out.push_str(&part.replace('\\', "\\\\").replace('`', "\\`"));
        } else {
            out.push_str(&escape_outside(part));
        }
        inside_code = !inside_code;
        parts += 1;
    }
    // An even number of parts means the last fence was never closed.
    if parts % 2 == 0 {
        out.push_str(FENCE);
    }
    out
}

fn escape_outside(text: &str) -> String {
    let first = CANDIDATE.replace_all(text, |caps: &Captures| {
        let m = &caps[0];
        if SPANS.iter().any(|span| span.is_match(m)) {
            m.to_string()
        } else {
            RESERVED.replace_all(m, r"\$1").into_owned()
        }
    });

    let mut out = String::with_capacity(first.len());
    let mut prev = None;
    for c in first.chars() {
        if ALWAYS_ESCAPED.contains(c) && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_span_is_unchanged() {
        assert_eq!(escape_markdown("*hello world*"), "*hello world*");
    }

    #[test]
    fn test_plain_words_are_unchanged() {
        assert_eq!(escape_markdown("just some words"), "just some words");
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        assert_eq!(escape_markdown("1 + 1 = 2."), r"1 \+ 1 \= 2\.");
        assert_eq!(escape_markdown("(see #3)!"), r"\(see \#3\)\!");
    }

    #[test]
    fn test_lone_delimiters_are_escaped() {
        assert_eq!(escape_markdown("a * b"), r"a \* b");
        assert_eq!(escape_markdown("snake_case"), r"snake\_case");
    }

    #[test]
    fn test_spans_keep_delimiters_but_escape_punctuation() {
        assert_eq!(escape_markdown("_hi there._"), r"_hi there\._");
        assert_eq!(escape_markdown("`a.b`"), r"`a\.b`");
        assert_eq!(escape_markdown("||secret||"), "||secret||");
    }

    #[test]
    fn test_spans_do_not_cross_lines() {
        assert_eq!(escape_markdown("*a\nb*"), "\\*a\nb\\*");
    }

    #[test]
    fn test_code_fence_content() {
        let input = "look:\n```\nlet s = \"\\n\";\n```\ndone.";
        let expected = "look:\n```\nlet s = \"\\\\n\";\n```\ndone\\.";
        assert_eq!(escape_markdown(input), expected);
    }

    #[test]
    fn test_unclosed_fence_is_closed() {
        let out = escape_markdown("start\n```\ncode(x)");
        assert_eq!(out, "start\n```\ncode(x)```");
        assert_eq!(out.matches(FENCE).count() % 2, 0);
    }
}
