/// Normalizes a distribution, extra, or group name (PEP 503): lowercase, with
/// every run of `-`, `_`, and `.` collapsed to a single `-`.
pub fn canonicalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_separator = true;
            continue;
        }
        if pending_separator && !normalized.is_empty() {
            normalized.push('-');
        }
        pending_separator = false;
        normalized.push(ch.to_ascii_lowercase());
    }
    normalized
}

pub(crate) fn strip_wrapping_quotes(input: &str) -> &str {
    if input.len() >= 2 {
        let bytes = input.as_bytes();
        let first = bytes[0];
        let last = bytes[input.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &input[1..input.len() - 1];
        }
    }
    input
}

/// Splits a comma or whitespace separated list of names, canonicalizing each.
pub fn split_name_list<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut names = Vec::new();
    for value in values {
        for part in value.split(|ch: char| ch == ',' || ch.is_ascii_whitespace()) {
            let part = part.trim();
            if !part.is_empty() {
                names.push(canonicalize_name(part));
            }
        }
    }
    names
}
