//! Text helpers for logs and Telegram-sized replies.

/// First `max_chars` characters of `s`, with `...` appended when cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Cuts on `char` boundaries and prefers the last newline inside each window
/// so paragraphs stay intact. Chunks that are only whitespace are dropped:
/// Telegram rejects blank message text. Empty input yields no chunks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut out = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past the `limit`-th char, or the whole remainder.
        let window_end = rest
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        if window_end == rest.len() {
            push_visible(&mut out, rest);
            break;
        }

        let window = &rest[..window_end];
        let cut = match window.rfind('\n') {
            Some(nl) if nl > 0 => nl + 1,
            _ => window_end,
        };

        push_visible(&mut out, &rest[..cut]);
        rest = &rest[cut..];
    }

    out
}

fn push_visible(out: &mut Vec<String>, chunk: &str) {
    if !chunk.trim().is_empty() {
        out.push(chunk.to_string());
    }
}
