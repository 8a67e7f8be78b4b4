//! Conversion of HTML gateway pages to plain text lines.

use regex::Regex;
use std::sync::LazyLock;

const PRE_OPEN: &str = "<pre>";
const PRE_CLOSE: &str = "</pre>";

static LINE_BREAK_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|<p(\s[^>]*)?>|</title>|</h[1-3]>")
        .expect("Failed to compile line break pattern - this is a bug")
});

static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<tr").expect("Failed to compile table row pattern - this is a bug")
});

static TABLE_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<td").expect("Failed to compile table cell pattern - this is a bug")
});

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]*>").expect("Failed to compile tag pattern - this is a bug")
});

/// Converts an HTML page into pseudo-plain-text lines.
///
/// Text inside `<pre>` keeps its line structure. Outside it, source lines
/// are joined and only block-level tags (`<br>`, `<p>`, heading and title
/// closers, table rows) start new lines. All other tags are stripped.
/// Lines are trimmed, leading and trailing blank lines are dropped and
/// runs of blank lines are collapsed to two.
///
/// ```
/// use whois_client::html_to_lines;
///
/// let lines = html_to_lines("<p>A</p><pre>B\nC</pre>D");
/// assert_eq!(lines, vec!["A", "B", "C", "D"]);
/// ```
#[must_use]
pub fn html_to_lines(body: &str) -> Vec<String> {
    let text = flatten_preformatted(body);

    let text = LINE_BREAK_TAGS.replace_all(&text, "\n");
    let text = TABLE_ROW.replace_all(&text, "\n<tr");
    let text = TABLE_CELL.replace_all(&text, " <td");
    let text = text.replace("&nbsp;", " ");
    let text = ANY_TAG.replace_all(&text, "");

    collapse_blank_lines(text.split('\n'))
}

/// Joins source lines, keeping line breaks only inside `<pre>` blocks.
fn flatten_preformatted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_pre = false;

    for line in body.lines() {
        let mut rest = line.trim();
        if !in_pre && !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }

        loop {
            let marker = if in_pre { PRE_CLOSE } else { PRE_OPEN };
            match find_ignore_case(rest, marker) {
                Some(pos) => {
                    out.push_str(&rest[..pos]);
                    out.push('\n');
                    rest = &rest[pos + marker.len()..];
                    in_pre = !in_pre;
                }
                None => break,
            }
        }

        out.push_str(rest);
        if in_pre {
            out.push('\n');
        }
    }
    out
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(needle)
}

fn collapse_blank_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut blanks = 0;

    for line in lines.map(str::trim) {
        if line.is_empty() {
            blanks += 1;
            if out.is_empty() || blanks > 2 {
                continue;
            }
        } else {
            blanks = 0;
        }
        out.push(line.to_string());
    }

    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out
}
