// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `application/x-www-form-urlencoded` bodies for Bot API calls.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters is escaped, which covers
/// the form delimiters `&`, `=`, `+` and `#`.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encode `pairs` as a form body.
pub fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, FORM_VALUE),
                utf8_percent_encode(value, FORM_VALUE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiters_are_escaped() {
        assert_eq!(
            encode_form(&[("text", "a&b+c#d=e")]),
            "text=a%26b%2Bc%23d%3De"
        );
    }

    #[test]
    fn pairs_are_joined_in_order() {
        assert_eq!(
            encode_form(&[("chat_id", "-100"), ("parse_mode", "Markdown")]),
            "chat_id=-100&parse_mode=Markdown"
        );
    }

    #[test]
    fn whitespace_and_unicode_are_escaped() {
        assert_eq!(encode_form(&[("t", "ok ✅\n")]), "t=ok%20%E2%9C%85%0A");
    }
}
