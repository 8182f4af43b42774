const OPEN_MARKER: &str = "<think>";
const CLOSE_MARKER: &str = "</think>";

/// Remove every `<think>...</think>` span from a raw model answer, matching
/// each opening marker with the nearest closing marker across the whole
/// string, then trim surrounding whitespace. Unmatched markers are left
/// as-is; sanitization never fails.
pub fn strip_reasoning(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find(OPEN_MARKER) {
        let after_open = open + OPEN_MARKER.len();
        match rest[after_open..].find(CLOSE_MARKER) {
            Some(close) => {
                cleaned.push_str(&rest[..open]);
                rest = &rest[after_open + close + CLOSE_MARKER.len()..];
            }
            None => break,
        }
    }

    cleaned.push_str(rest);
    cleaned.trim().to_string()
}
