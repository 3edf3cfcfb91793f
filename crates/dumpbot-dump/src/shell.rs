// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! POSIX shell quoting and dump pipeline assembly.

use std::borrow::Cow;

/// Returns true for characters that never need quoting in a POSIX shell word.
fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Quote `value` so a POSIX shell reads it back as exactly one word.
///
/// Values made only of safe characters pass through untouched. Anything
/// else, including the empty string, is wrapped in single quotes with every
/// embedded `'` written as `'\''`.
pub fn sh_escape(value: &str) -> Cow<'_, str> {
    if !value.is_empty() && value.chars().all(is_safe) {
        return Cow::Borrowed(value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}

/// Inputs for one dump pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSpec<'a> {
    pub program: &'a str,
    pub host: &'a str,
    pub port: &'a str,
    pub user: &'a str,
    pub extra_args: &'a [String],
    pub database: &'a str,
    pub tables: &'a [String],
    /// Operator-supplied shell fragment, inserted verbatim.
    pub compress_command: &'a str,
}

/// Build the `sh -c` line: dump utility piped into the compressor.
///
/// `pipefail` makes a failing dump fail the whole line even when the
/// compressor exits cleanly.
pub fn build_pipeline(spec: &PipelineSpec<'_>) -> String {
    let mut line = String::from("set -o pipefail; ");
    line.push_str(&sh_escape(spec.program));
    for (flag, value) in [("-h", spec.host), ("-P", spec.port), ("-u", spec.user)] {
        line.push(' ');
        line.push_str(flag);
        line.push(' ');
        line.push_str(&sh_escape(value));
    }
    let words = spec
        .extra_args
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(spec.database))
        .chain(spec.tables.iter().map(String::as_str));
    for word in words {
        line.push(' ');
        line.push_str(&sh_escape(word));
    }
    line.push_str(" | ");
    line.push_str(spec.compress_command);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn safe_values_pass_through() {
        assert_eq!(sh_escape("shop_db"), "shop_db");
        assert_eq!(sh_escape("--set-gtid-purged=OFF"), "--set-gtid-purged=OFF");
        assert_eq!(sh_escape("10.0.0.5"), "10.0.0.5");
    }

    #[test]
    fn empty_value_is_quoted() {
        assert_eq!(sh_escape(""), "''");
    }

    #[test]
    fn whitespace_and_quotes_are_quoted() {
        assert_eq!(sh_escape("my db"), "'my db'");
        assert_eq!(sh_escape("it's"), "'it'\\''s'");
        assert_eq!(sh_escape("$(reboot)"), "'$(reboot)'");
    }

    #[test]
    fn pipeline_quotes_every_value_but_not_the_compressor() {
        let extra = vec!["--quick".to_string()];
        let tables = vec!["orders".to_string(), "line items".to_string()];
        let line = build_pipeline(&PipelineSpec {
            program: "mysqldump",
            host: "db host",
            port: "3306",
            user: "root",
            extra_args: &extra,
            database: "shop",
            tables: &tables,
            compress_command: "gzip -c",
        });
        assert_eq!(
            line,
            "set -o pipefail; mysqldump -h 'db host' -P 3306 -u root --quick shop orders 'line items' | gzip -c"
        );
    }

    fn shell_echo(word: &str) -> String {
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("printf '%s' {word}"))
            .output()
            .expect("sh should run");
        String::from_utf8(output.stdout).expect("utf-8 output")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn escaped_values_round_trip_through_the_shell(value in "[^\u{0}]{0,24}") {
            prop_assert_eq!(shell_echo(&sh_escape(&value)), value);
        }
    }
}
