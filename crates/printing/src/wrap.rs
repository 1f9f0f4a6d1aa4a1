//! Turns raw text into the line buffer consumed by the paginator.

/// Inserts a space after each line feed that is directly followed by another line break,
/// so that blank lines survive `split_lines`.
pub fn protect_blank_lines(text: &str) -> String {
    let mut output = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        output.push(ch);
        if ch == '\n' && matches!(chars.peek(), Some('\r' | '\n')) {
            output.push(' ');
        }
    }
    output
}

/// Splits on `\n` / `\r\n` and drops empty entries.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Injects line feeds so that no line exceeds `width` characters where a
/// boundary allows it.
pub fn wrap_text(text: &str, width: usize) -> String {
    if width < 2 {
        return text.to_string();
    }
    let mut output = String::with_capacity(text.len() + text.len() / width);
    for segment in text.split_inclusive('\n') {
        let (body, ending) = split_line_ending(segment);
        for (index, piece) in wrap_line(body, width).into_iter().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            output.push_str(piece);
        }
        output.push_str(ending);
    }
    output
}

/// Full preparation pipeline: blank-line protection, optional wrapping, splitting.
pub fn prepare_lines(text: &str, wrap_width: Option<usize>) -> Vec<String> {
    let protected = protect_blank_lines(text);
    match wrap_width {
        Some(width) => split_lines(&wrap_text(&protected, width)),
        None => split_lines(&protected),
    }
}

fn split_line_ending(segment: &str) -> (&str, &str) {
    if let Some(body) = segment.strip_suffix("\r\n") {
        (body, &segment[body.len()..])
    } else if let Some(body) = segment.strip_suffix('\n') {
        (body, &segment[body.len()..])
    } else {
        (segment, "")
    }
}

fn wrap_line(line: &str, width: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    loop {
        let chars: Vec<(usize, char)> = rest.char_indices().collect();
        if chars.len() <= width {
            break;
        }
        let Some(split) = break_point(&chars, width) else {
            break;
        };
        let byte = chars[split].0;
        pieces.push(&rest[..byte]);
        rest = &rest[byte..];
    }
    pieces.push(rest);
    pieces
}

/// Index of the first character of the next line, if the line can be broken.
fn break_point(chars: &[(usize, char)], width: usize) -> Option<usize> {
    let len = chars.len();
    let boundary_end = |start: usize| -> Option<usize> {
        if !is_break(chars[start].1) {
            return None;
        }
        let mut end = start;
        while end < len && is_break(chars[end].1) {
            end += 1;
        }
        (end < len && is_word(chars[end].1)).then_some(end)
    };

    let last_start = (width - 1).min(len - 1);
    (1..=last_start)
        .rev()
        .find_map(boundary_end)
        .or_else(|| (last_start + 1..len).find_map(boundary_end))
}

fn is_break(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ':' | ';' | ',' | '.' | '-' | '?' | '!' | '…')
}

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_protected_from_splitting() {
        assert_eq!(protect_blank_lines("a\n\nb"), "a\n \nb");
        assert_eq!(protect_blank_lines("a\r\n\r\nb"), "a\r\n \r\nb");
        assert_eq!(protect_blank_lines("a\n"), "a\n");
        assert_eq!(
            prepare_lines("first\n\n\nsecond\r\n", None),
            vec!["first", " ", " ", "second"]
        );
    }

    #[test]
    fn split_lines_handles_both_line_endings() {
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert!(split_lines("\n\n").is_empty());
    }

    #[test]
    fn wraps_at_last_boundary_within_width() {
        let text = "the quick brown fox jumps over the lazy dog";
        let lines = prepare_lines(text, Some(16));
        assert_eq!(lines, vec!["the quick brown ", "fox jumps over ", "the lazy dog"]);
        assert!(lines.iter().all(|line| line.trim_end().chars().count() <= 16));
    }

    #[test]
    fn punctuation_is_a_boundary() {
        let lines = prepare_lines("alpha,beta;gamma", Some(8));
        assert_eq!(lines, vec!["alpha,", "beta;", "gamma"]);
    }

    #[test]
    fn long_words_overflow_to_next_boundary() {
        let lines = prepare_lines("abcdefghijklmnop qrs", Some(5));
        assert_eq!(lines, vec!["abcdefghijklmnop ", "qrs"]);
    }

    #[test]
    fn short_lines_and_blank_lines_are_untouched() {
        let lines = prepare_lines("short\n\nline two is long enough", Some(12));
        assert_eq!(lines, vec!["short", " ", "line two is ", "long enough"]);
    }

    #[test]
    fn wrap_is_disabled_for_degenerate_width() {
        assert_eq!(wrap_text("a b c", 1), "a b c");
    }
}
