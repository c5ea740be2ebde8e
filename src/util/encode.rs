use std::fmt::Write as _;

/// RFC 3986 unreserved set; everything else is percent-encoded for SigV4.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

fn encode_into(out: &mut String, input: &str, keep_slash: bool) {
    for &b in input.as_bytes() {
        if is_unreserved(b) || (keep_slash && b == b'/') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
}

pub(crate) fn aws_percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    encode_into(&mut out, input, false);
    out
}

pub(crate) fn aws_percent_encode_path(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    encode_into(&mut out, input, true);
    out
}

/// Sorted, encoded `k=v&...` string used both on the wire and in the
/// canonical request.
pub(crate) fn canonical_query_string(params: &[(String, String)]) -> String {
    let mut pairs = params
        .iter()
        .map(|(k, v)| (aws_percent_encode(k), aws_percent_encode(v)))
        .collect::<Vec<_>>();
    pairs.sort();
    join_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

/// `application/x-www-form-urlencoded` body in the order given.
pub(crate) fn form_body(params: &[(&str, &str)]) -> String {
    let encoded = params
        .iter()
        .map(|(k, v)| (aws_percent_encode(k), aws_percent_encode(v)))
        .collect::<Vec<_>>();
    join_pairs(encoded.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn join_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (k, v) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_encoding_escapes_reserved_chars() {
        assert_eq!(aws_percent_encode("a+b c"), "a%2Bb%20c");
        assert_eq!(aws_percent_encode("~_-."), "~_-.");
        assert_eq!(aws_percent_encode("/"), "%2F");
        assert_eq!(aws_percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn path_encoding_keeps_slashes() {
        assert_eq!(aws_percent_encode_path("/2015-03-31/functions/a b"), "/2015-03-31/functions/a%20b");
    }

    #[test]
    fn canonical_query_is_sorted_by_key_then_value() {
        let params = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
            ("a".to_string(), "0".to_string()),
            ("space".to_string(), "a b".to_string()),
        ];
        assert_eq!(canonical_query_string(&params), "a=0&a=1&b=2&space=a%20b");
    }

    #[test]
    fn form_body_keeps_order() {
        assert_eq!(
            form_body(&[("Action", "AssumeRole"), ("RoleArn", "arn:aws:iam::1:role/x")]),
            "Action=AssumeRole&RoleArn=arn%3Aaws%3Aiam%3A%3A1%3Arole%2Fx"
        );
    }
}
