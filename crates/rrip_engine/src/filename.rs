use rrip_core::FilenamePolicy;

use crate::unescape_html;

const MAX_TITLE_BYTES: usize = 194;
const TRUNCATED_TITLE_BYTES: usize = 192;
const TRUNCATED_MARKER: &str = "..";

/// `<title> [<id>]<ext>`, sanitized per `policy`.
pub fn derive_filename(title: &str, id: &str, extension: &str, policy: FilenamePolicy) -> String {
    let title = unescape_html(title.replace('/', "|").trim());
    let title = truncate_title(&title);
    sanitize_filename(&format!("{title} [{id}]{extension}"), policy)
}

fn truncate_title(title: &str) -> String {
    if title.len() <= MAX_TITLE_BYTES {
        return title.to_string();
    }
    let mut end = TRUNCATED_TITLE_BYTES;
    while end > 0 && !title.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATED_MARKER}", &title[..end])
}

/// Apply `policy` to a whole filename. Under both policies characters that
/// do not print become `-`.
pub fn sanitize_filename(name: &str, policy: FilenamePolicy) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for c in name.chars() {
        match (policy, c) {
            (_, '/' | '\\') => {}
            (FilenamePolicy::Strict, '<') => cleaned.push_str("&lt;"),
            (FilenamePolicy::Strict, '>') => cleaned.push_str("&gt;"),
            (FilenamePolicy::Strict, '"') => cleaned.push_str("&quot;"),
            (FilenamePolicy::Strict, ':') => cleaned.push('-'),
            (FilenamePolicy::Strict, '|' | '?' | '*') => {}
            (_, c) if !is_printable(c) => cleaned.push('-'),
            (_, c) => cleaned.push(c),
        }
    }
    match policy {
        FilenamePolicy::Minimal => cleaned,
        FilenamePolicy::Strict => guard_windows_name(&cleaned),
    }
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space.
/// Controls, format characters, other separators, private use and
/// noncharacters do not print.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        '\u{AD}'
            | '\u{600}'..='\u{605}'
            | '\u{61C}'
            | '\u{6DD}'
            | '\u{70F}'
            | '\u{890}'..='\u{891}'
            | '\u{8E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{E000}'..='\u{F8FF}'
            | '\u{FDD0}'..='\u{FDEF}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{FFFE}'..='\u{FFFF}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
            | '\u{F0000}'..='\u{10FFFF}'
    )
}

fn guard_windows_name(cleaned: &str) -> String {
    let trimmed = cleaned.trim_matches(&[' ', '.'][..]);
    if trimmed.is_empty() {
        return "__Blank__".to_string();
    }
    let stem = trimmed.split('.').next().unwrap_or(trimmed);
    if is_reserved_windows_name(stem) {
        return format!("__{trimmed}");
    }
    trimmed.to_string()
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
