//! Splitting oversized text into transport-sized slices.
//!
//! Slices are fixed windows of `limit - 7` characters, leaving room for a
//! reopening fence with its line break and a closing fence. A window never
//! ends inside a triple-backtick marker. When the text contains code fences,
//! fence state is carried across slices so every rendered slice has balanced
//! fences.
//!
//! [`split_fitting`] measures the rendered slice instead of counting its
//! characters, so callers that transform slices before sending (escaping)
//! can size windows by the transformed length.

pub const FENCE: &str = "```";

/// Prefix of a slice continuing a code block. The line break keeps the first
/// code line from being read as a language tag.
const REOPEN: &str = "```\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The slice of the original text.
    pub body: String,
    /// A fence left open by the previous slice is reopened in front.
    pub reopen: bool,
    /// A fence opened in this slice is closed at the end.
    pub close: bool,
}

impl Chunk {
    fn plain(body: &str) -> Self {
        Self {
            body: body.to_string(),
            reopen: false,
            close: false,
        }
    }

    fn fenced(body: &str, open: bool) -> Self {
        let fences = if open {
            format!("{FENCE}{body}").matches(FENCE).count()
        } else {
            body.matches(FENCE).count()
        };
        Self {
            body: body.to_string(),
            reopen: open,
            close: fences % 2 == 1,
        }
    }

    /// Text actually sent: the body plus any injected fences.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + REOPEN.len() + FENCE.len());
        if self.reopen {
            out.push_str(REOPEN);
        }
        out.push_str(&self.body);
        if self.close {
            out.push_str(FENCE);
        }
        out
    }
}

/// Split `text` into slices whose rendering fits in `limit` characters.
/// Text within the limit comes back as a single untouched slice.
pub fn split(text: &str, limit: usize) -> Vec<Chunk> {
    split_fitting(text, limit, |s| s.chars().count())
}

/// Split `text` so that `measure(chunk.render())` is at most `limit` for
/// every chunk. A window whose measure overflows is shrunk in proportion
/// to the overflow and measured again. A single character is always accepted.
pub fn split_fitting(text: &str, limit: usize, measure: impl Fn(&str) -> usize) -> Vec<Chunk> {
    if measure(text) <= limit {
        return vec![Chunk::plain(text)];
    }

    let window = limit.saturating_sub(REOPEN.len() + FENCE.len()).max(FENCE.len());
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = bounds.len() - 1;
    let track_fences = text.contains(FENCE);

    let mut chunks = Vec::new();
    let mut open = false;
    let mut start = 0;
    while start < total {
        let mut end = (start + window).min(total);
        let chunk = loop {
            if end < total {
                if let Some(cut) = marker_across(text, &bounds, start, end) {
                    end = cut;
                }
            }

            let body = &text[bounds[start]..bounds[end]];
            let chunk = if track_fences {
                Chunk::fenced(body, open)
            } else {
                Chunk::plain(body)
            };
            let size = measure(&chunk.render());
            if size <= limit || end <= start + 1 {
                break chunk;
            }
            let len = end - start;
            end = start + (len * limit / size).clamp(1, len - 1);
        };
        open = chunk.close;
        chunks.push(chunk);
        start = end;
    }
    chunks
}

/// Start of a fence marker that would be cut by a window ending at `end`.
fn marker_across(text: &str, bounds: &[usize], start: usize, end: usize) -> Option<usize> {
    (end.saturating_sub(FENCE.len() - 1)..end)
        .filter(|&k| k > start)
        .find(|&k| text[bounds[k]..].starts_with(FENCE))
}
