//! Draining a transport stream into lines.

use std::io::{BufRead, BufReader, Read};

/// Reads `reader` to end of stream and returns its lines.
///
/// A non-zero `buffer_size` reads line by line through a buffer of that
/// capacity; zero accumulates everything and splits at the end. Both modes
/// trim every line and yield the same sequence for the same input. A single
/// trailing empty line (left by a terminal line break) is dropped.
///
/// A read error, typically the read timeout expiring, ends collection and
/// keeps whatever was received.
pub fn collect_lines<R: Read>(reader: R, buffer_size: usize) -> Vec<String> {
    let mut lines = if buffer_size > 0 {
        read_buffered(reader, buffer_size)
    } else {
        read_unbuffered(reader)
    };

    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

fn read_buffered<R: Read>(reader: R, buffer_size: usize) -> Vec<String> {
    let mut reader = BufReader::with_capacity(buffer_size, reader);
    let mut lines = Vec::new();
    let mut buf = Vec::with_capacity(buffer_size);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                // The remainder after the last line break, as split yields it.
                lines.push(String::new());
                break;
            }
            Ok(_) => {
                lines.push(decode_line(&buf));
                if buf.last() != Some(&b'\n') {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, lines = lines.len(), "Read interrupted, keeping partial response");
                if !buf.is_empty() {
                    lines.push(decode_line(&buf));
                }
                break;
            }
        }
    }
    lines
}

fn read_unbuffered<R: Read>(mut reader: R) -> Vec<String> {
    let mut raw = Vec::new();
    if let Err(e) = reader.read_to_end(&mut raw) {
        tracing::warn!(error = %e, bytes = raw.len(), "Read interrupted, keeping partial response");
    }
    raw.split(|b| *b == b'\n').map(decode_line).collect()
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both(input: &str) -> (Vec<String>, Vec<String>) {
        (
            collect_lines(input.as_bytes(), 255),
            collect_lines(input.as_bytes(), 0),
        )
    }

    #[test]
    fn drops_single_trailing_blank() {
        let (buffered, unbuffered) = both("Domain: example.com\r\nStatus: ok\r\n");
        assert_eq!(buffered, vec!["Domain: example.com", "Status: ok"]);
        assert_eq!(buffered, unbuffered);
    }

    #[test]
    fn keeps_unterminated_last_line() {
        let (buffered, unbuffered) = both("a\nb");
        assert_eq!(buffered, vec!["a", "b"]);
        assert_eq!(buffered, unbuffered);
    }

    #[test]
    fn only_one_blank_is_dropped() {
        let (buffered, unbuffered) = both("a\n\n");
        assert_eq!(buffered, vec!["a", ""]);
        assert_eq!(buffered, unbuffered);
    }

    #[test]
    fn interior_blank_lines_are_kept() {
        let (buffered, unbuffered) = both("a\n\n  b  \n");
        assert_eq!(buffered, vec!["a", "", "b"]);
        assert_eq!(buffered, unbuffered);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let (buffered, unbuffered) = both("");
        assert!(buffered.is_empty());
        assert!(unbuffered.is_empty());
    }

    #[test]
    fn lines_longer_than_buffer_are_not_split() {
        let long = "x".repeat(600);
        let input = format!("{long}\nshort\n");
        let lines = collect_lines(input.as_bytes(), 16);
        assert_eq!(lines, vec![long.as_str(), "short"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let lines = collect_lines(&b"caf\xe9\n"[..], 255);
        assert_eq!(lines, vec!["caf\u{fffd}"]);
    }
}
