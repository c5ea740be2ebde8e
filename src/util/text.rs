#[cfg(feature = "client")]
/// Cuts `body` to at most `max_len` bytes on a char boundary, marking the cut.
pub(crate) fn truncate_snippet(body: &str, max_len: usize) -> String {
    if body.len() <= max_len {
        return body.to_string();
    }

    let cut = (0..=max_len)
        .rev()
        .find(|idx| body.is_char_boundary(*idx))
        .unwrap_or(0);

    let mut out = body[..cut].to_string();
    out.push_str("...");
    out
}

/// Keeps the first and last four chars of a secret-ish value.
pub(crate) fn redact_value(value: &str) -> String {
    const KEEP: usize = 4;
    const REDACTED: &str = "<redacted>";

    let chars = value.trim().chars().collect::<Vec<_>>();
    if chars.len() <= KEEP * 2 {
        return REDACTED.to_string();
    }

    let head = chars[..KEEP].iter().collect::<String>();
    let tail = chars[chars.len() - KEEP..].iter().collect::<String>();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "client")]
    #[test]
    fn truncates_ascii_without_panic() {
        let body = "a".repeat(10);
        assert_eq!(truncate_snippet(&body, 10), body);
        assert_eq!(truncate_snippet(&body, 5), "aaaaa...");
    }

    #[cfg(feature = "client")]
    #[test]
    fn truncates_utf8_on_char_boundary() {
        let body = "日本語テキスト".repeat(4);
        let out = truncate_snippet(&body, 4);
        assert_eq!(out, "日...");
    }

    #[test]
    fn redacts_short_and_long_values() {
        assert_eq!(redact_value(""), "<redacted>");
        assert_eq!(redact_value("   "), "<redacted>");
        assert_eq!(redact_value("12345678"), "<redacted>");
        assert_eq!(redact_value("123456789"), "1234...6789");
        assert_eq!(redact_value(" AKIDEXAMPLE123 "), "AKID...E123");
    }
}
