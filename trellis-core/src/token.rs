//! Token-level predicates shared across the engine.
//!
//! Command resolution, option parsing and the run-level help/version guards
//! all need the same answers about a raw token: is it dashed, does it carry an
//! inline `=value`, does it swallow the token after it. Keeping the predicates
//! in one place keeps those layers from drifting apart.

/// Tokens that request help regardless of declared options.
pub(crate) const HELP_FLAGS: [&str; 2] = ["--help", "-h"];

/// Tokens that request the version string regardless of declared options.
pub(crate) const VERSION_FLAGS: [&str; 2] = ["--version", "-v"];

/// True for any dashed token, including a bare `-` or `--`.
pub(crate) fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

/// Splits a token on its first `=` into name part and inline value.
///
/// Later `=` characters stay inside the value: `-ds=a=b` splits into
/// `("-ds", Some("a=b"))`.
pub(crate) fn split_eq(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((name, data)) => (name, Some(data)),
        None => (token, None),
    }
}

/// True for the boolean value words `true`, `false`, `0`, `1` in any case.
pub(crate) fn is_bool_word(token: &str) -> bool {
    matches!(token.to_lowercase().as_str(), "0" | "1" | "true" | "false")
}

pub(crate) fn is_help_flag(token: &str) -> bool {
    HELP_FLAGS.contains(&token)
}

pub(crate) fn is_version_flag(token: &str) -> bool {
    VERSION_FLAGS.contains(&token)
}

pub(crate) fn is_reserved_flag(token: &str) -> bool {
    is_help_flag(token) || is_version_flag(token)
}

/// True when a flag token consumes the token after it as its value: dashed
/// and without an inline `=`.
pub(crate) fn consumes_next(token: &str) -> bool {
    is_flag(token) && !token.contains('=')
}

/// Splits a command string into tokens the way a shell would.
///
/// Whitespace separates tokens; single or double quotes group characters
/// (including newlines) into one token and are stripped from the output.
/// Used by [`test_command`](crate::test_command) to accept readable one-line
/// invocations in tests.
pub fn shell_split(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    in_token = true;
                } else if ch.is_whitespace() {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(ch);
                    in_token = true;
                }
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_and_eq_predicates() {
        assert!(is_flag("--name"));
        assert!(is_flag("-n"));
        assert!(is_flag("-"));
        assert!(!is_flag("name"));
        assert!(!is_flag(""));

        assert_eq!(split_eq("--name=value"), ("--name", Some("value")));
        assert_eq!(split_eq("-ds=Not=Default=Value"), ("-ds", Some("Not=Default=Value")));
        assert_eq!(split_eq("--flag="), ("--flag", Some("")));
        assert_eq!(split_eq("--flag"), ("--flag", None));
    }

    #[test]
    fn bool_words_are_case_insensitive() {
        for word in ["true", "TRUE", "False", "0", "1"] {
            assert!(is_bool_word(word), "{word}");
        }
        assert!(!is_bool_word("yes"));
        assert!(!is_bool_word(""));
    }

    #[test]
    fn consumes_next_requires_dash_without_eq() {
        assert!(consumes_next("--name"));
        assert!(consumes_next("-n"));
        assert!(!consumes_next("--name=value"));
        assert!(!consumes_next("plain"));
    }

    #[test]
    fn reserved_flags_are_exact_tokens() {
        assert!(is_help_flag("--help"));
        assert!(is_help_flag("-h"));
        assert!(is_version_flag("--version"));
        assert!(is_version_flag("-v"));
        assert!(!is_reserved_flag("--Help"));
        assert!(!is_reserved_flag("--help=x"));
    }

    #[test]
    fn splits_plain_words() {
        assert_eq!(shell_split("generate --dialect pg"), vec![
            "generate",
            "--dialect",
            "pg"
        ]);
    }

    #[test]
    fn quotes_group_spaces_and_newlines() {
        let tokens = shell_split("generate --name=\"Example migration\" 'second\nline'");
        assert_eq!(tokens, vec![
            "generate",
            "--name=Example migration",
            "second\nline"
        ]);
    }

    #[test]
    fn empty_and_blank_inputs_yield_no_tokens() {
        assert!(shell_split("").is_empty());
        assert!(shell_split("   \n\t  \n").is_empty());
    }

    #[test]
    fn quoted_empty_string_is_a_token() {
        assert_eq!(shell_split("--tag \"\""), vec!["--tag", ""]);
    }

    #[test]
    fn inline_eq_values_stay_one_token() {
        assert_eq!(shell_split("-ds=Not=Default=Value"), vec!["-ds=Not=Default=Value"]);
    }
}
