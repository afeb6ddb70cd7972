//! Content sanitizer for recovered message text.
//!
//! Chat UIs scatter button labels and paginators through the same subtree
//! that holds the message body. Sanitization strips those incidental lines
//! and normalizes whitespace while leaving conversational content alone.
//! The whole pass is idempotent: sanitizing sanitized text is a no-op.

use regex::Regex;
use std::sync::LazyLock;

/// Lines matching one of these exactly (case-insensitive, trimmed) are
/// UI chrome, not content. Includes the localized variants seen on the
/// supported platforms.
static CHROME_TOKENS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "copy",
        "copy code",
        "copied",
        "copy link",
        "regenerate",
        "regenerate response",
        "share",
        "edit",
        "read aloud",
        "good response",
        "bad response",
        // Chinese UI variants
        "复制",
        "复制代码",
        "重新生成",
        "分享",
        "编辑",
    ]
});

/// Pure pagination lines like "2/4" (response-variant pagers).
static PAGINATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s*/\s*\d+$").unwrap());

/// True if a trimmed line is a known UI-chrome token.
fn is_chrome_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    CHROME_TOKENS.iter().any(|token| lower == *token)
}

/// Clean raw recovered text: trim lines, drop chrome and pagination
/// lines, collapse blank-line runs. Returns an empty string when
/// nothing substantive remains — the caller drops the message then.
pub fn sanitize_content(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_pending = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_pending = !lines.is_empty();
            continue;
        }
        if is_chrome_line(trimmed) || PAGINATION_RE.is_match(trimmed) {
            continue;
        }
        if blank_pending {
            lines.push("");
            blank_pending = false;
        }
        lines.push(trimmed);
    }

    lines.join("\n")
}
