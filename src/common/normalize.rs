/// Canonicalizes message text before it is hashed or displayed.
///
/// CRLF becomes LF and trailing whitespace is stripped. Leading and interior
/// whitespace is kept as-is.
///
/// A run of carriage returns directly before a line feed collapses into the
/// line feed, which is the fixed point of repeated CRLF replacement. A single
/// replacement pass would turn `"\r\r\n"` into a fresh CRLF and break
/// idempotence.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_cr = 0usize;

    for c in raw.chars() {
        match c {
            '\r' => pending_cr += 1,
            '\n' => {
                pending_cr = 0;
                out.push('\n');
            }
            other => {
                out.extend(std::iter::repeat('\r').take(pending_cr));
                pending_cr = 0;
                out.push(other);
            }
        }
    }
    // trailing carriage returns are whitespace and get trimmed below

    out.truncate(out.trim_end_matches(is_trimmable).len());
    out
}

/// ECMAScript WhiteSpace and LineTerminator, the set `String.prototype.trimEnd`
/// strips. Unlike `char::is_whitespace` this keeps U+0085 and strips U+FEFF.
fn is_trimmable(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message_unchanged() {
        assert_eq!(normalize("hello"), "hello");
    }

    #[test]
    fn test_trailing_crlf_stripped() {
        assert_eq!(normalize("hello\r\n\r\n"), "hello");
    }

    #[test]
    fn test_interior_and_leading_whitespace_kept() {
        assert_eq!(
            normalize("  line one\r\n\r\n  line two \t\n"),
            "  line one\n\n  line two"
        );
    }

    #[test]
    fn test_lone_carriage_return_kept_inside() {
        assert_eq!(normalize("a\rb"), "a\rb");
    }

    #[test]
    fn test_carriage_return_run_before_newline_collapses() {
        assert_eq!(normalize("a\r\r\nb"), "a\nb");
    }

    #[test]
    fn test_next_line_is_not_trimmed() {
        assert_eq!(normalize("hello\u{85}"), "hello\u{85}");
    }

    #[test]
    fn test_byte_order_mark_is_trimmed() {
        assert_eq!(normalize("hello\u{feff}"), "hello");
        assert_eq!(normalize("hello\u{2028}\u{3000}\u{a0}"), "hello");
    }

    #[test]
    fn test_whitespace_only_becomes_empty() {
        assert_eq!(normalize(" \r\n\t\n"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "hello",
            "hello\r\n",
            "mixed\r\nline\nendings\r\n\n\r\n",
            "\r\n\r\nleading",
            "trailing cr\r",
            "a\r\r\nb",
            "a\r\rb\r",
            "unicode \u{3000}",
            "next line\u{85}",
            "bom\u{feff}\r\n",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
