//! Option parsing and value coercion.
//!
//! Walks the tokens left over after command resolution, classifying each as
//! an inline `name=value` pair, a `name value` pair, a lone flag, or a
//! positional. Value violations fail fast with a validation event; missing
//! required options and unrecognized flags are aggregated over the full walk
//! and reported together.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use crate::event::{Event, Offender, Violation};
use crate::option::{OptionConfig, OptionKind};
use crate::token;
use crate::tree::{CommandId, CommandTree};
use crate::value::{OptionValue, ParsedArgs};

/// Outcome of parsing a command's leftover tokens.
pub(crate) enum ParseOutcome {
    /// The final option bag, in declaration order.
    Args(ParsedArgs),
    /// A help token short-circuited parsing.
    Help,
    /// A version token short-circuited parsing.
    Version,
}

/// Classification of a single token.
enum TokenOutcome {
    Help,
    Version,
    /// The token produced a value for the option declared under `key`.
    Value {
        key: String,
        value: OptionValue,
        skip_next: bool,
    },
    /// A dashed token matching no declared option.
    Unrecognized {
        name_part: String,
        skip_next: bool,
    },
    /// A positional token with no positional slot left to fill.
    Ignored,
}

/// Parses `args` against the options of `command`.
pub(crate) fn parse_options(
    tree: &Arc<CommandTree>,
    command: CommandId,
    args: &[String],
    omit_undefined: bool,
) -> Result<ParseOutcome, Event> {
    let node = tree.get(command);
    trace!(command = %node.name, tokens = args.len(), "parsing options");

    let flags: Vec<&(String, OptionConfig)> = node
        .options
        .iter()
        .filter(|(_, c)| c.kind != OptionKind::Positional)
        .collect();
    let mut positionals: VecDeque<&(String, OptionConfig)> = node
        .options
        .iter()
        .filter(|(_, c)| c.kind == OptionKind::Positional)
        .collect();

    let mut parsed: Vec<(String, OptionValue)> = Vec::new();
    let mut unrecognized: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        let next = args.get(i + 1).map(String::as_str);

        match parse_arg(tree, command, &flags, &mut positionals, arg, next)? {
            TokenOutcome::Help => return Ok(ParseOutcome::Help),
            TokenOutcome::Version => return Ok(ParseOutcome::Version),
            TokenOutcome::Value {
                key,
                value,
                skip_next,
            } => {
                upsert(&mut parsed, key, value);
                if skip_next {
                    i += 1;
                }
            }
            TokenOutcome::Unrecognized {
                name_part,
                skip_next,
            } => {
                unrecognized.push(name_part);
                if skip_next {
                    i += 1;
                }
            }
            TokenOutcome::Ignored => {}
        }

        i += 1;
    }

    // Assemble in declaration order, substituting defaults for untouched
    // options and collecting required ones that stayed undefined.
    let mut result = ParsedArgs::new();
    let mut missing: Vec<Vec<String>> = Vec::new();

    for (key, config) in &node.options {
        let value = take(&mut parsed, key).unwrap_or_else(|| config.default.clone());

        if config.required && value.is_undefined() {
            missing.push(config.all_names().map(str::to_string).collect());
        }

        result.push(key.clone(), value);
    }

    if omit_undefined {
        result.drop_undefined();
    }

    if !missing.is_empty() {
        return Err(Event::MissingArgs {
            tree: Arc::clone(tree),
            command,
            missing,
        });
    }

    if !unrecognized.is_empty() {
        return Err(Event::UnrecognizedArgs {
            tree: Arc::clone(tree),
            command,
            unrecognized,
        });
    }

    Ok(ParseOutcome::Args(result))
}

/// Classifies one token, consulting `next` for space-separated values.
fn parse_arg(
    tree: &Arc<CommandTree>,
    command: CommandId,
    flags: &[&(String, OptionConfig)],
    positionals: &mut VecDeque<&(String, OptionConfig)>,
    arg: &str,
    next: Option<&str>,
) -> Result<TokenOutcome, Event> {
    let (name_part, eq_data) = token::split_eq(arg);
    let has_eq = eq_data.is_some();

    if token::is_help_flag(name_part) {
        return Ok(TokenOutcome::Help);
    }
    if token::is_version_flag(name_part) {
        return Ok(TokenOutcome::Version);
    }

    if !token::is_flag(arg) {
        let Some((key, config)) = positionals.pop_front() else {
            return Ok(TokenOutcome::Ignored);
        };

        if let Some(choices) = &config.choices {
            if !choices.iter().any(|c| c == arg) {
                return Err(validation_error(
                    tree,
                    command,
                    config,
                    Violation::EnumViolation,
                    Offender {
                        name_part: None,
                        data_part: Some(arg.to_string()),
                    },
                ));
            }
        }

        return Ok(TokenOutcome::Value {
            key: key.clone(),
            value: OptionValue::Str(arg.to_string()),
            skip_next: false,
        });
    }

    let data_part = eq_data.or(next);

    let Some((key, config)) = flags
        .iter()
        .find(|entry| entry.1.matches_token(name_part))
        .map(|entry| (&entry.0, &entry.1))
    else {
        return Ok(TokenOutcome::Unrecognized {
            name_part: name_part.to_string(),
            skip_next: !has_eq,
        });
    };

    match config.kind {
        OptionKind::Boolean => {
            // A following flag token never serves as this flag's value.
            if !has_eq && next.is_some_and(token::is_flag) {
                return Ok(TokenOutcome::Value {
                    key: key.clone(),
                    value: OptionValue::Bool(true),
                    skip_next: false,
                });
            }

            let mut skip_next = !has_eq;
            let value = match data_part.map(str::to_lowercase) {
                None => Some(true),
                Some(d) if d.is_empty() || d == "true" || d == "1" => Some(true),
                Some(d) if d == "false" || d == "0" => Some(false),
                Some(_) if !has_eq => {
                    // Bare flag followed by an unrelated word.
                    skip_next = false;
                    Some(true)
                }
                Some(_) => None,
            };

            match value {
                Some(b) => Ok(TokenOutcome::Value {
                    key: key.clone(),
                    value: OptionValue::Bool(b),
                    skip_next,
                }),
                None => Err(validation_error(
                    tree,
                    command,
                    config,
                    Violation::InvalidBooleanSyntax,
                    flag_offender(name_part, data_part),
                )),
            }
        }

        OptionKind::String => {
            let Some(data) = data_part else {
                return Err(validation_error(
                    tree,
                    command,
                    config,
                    Violation::InvalidStringSyntax,
                    flag_offender(name_part, None),
                ));
            };

            if let Some(choices) = &config.choices {
                if !choices.iter().any(|c| c == data) {
                    return Err(validation_error(
                        tree,
                        command,
                        config,
                        Violation::EnumViolation,
                        flag_offender(name_part, Some(data)),
                    ));
                }
            }

            Ok(TokenOutcome::Value {
                key: key.clone(),
                value: OptionValue::Str(data.to_string()),
                skip_next: !has_eq,
            })
        }

        OptionKind::Number => {
            let Some(data) = data_part else {
                return Err(validation_error(
                    tree,
                    command,
                    config,
                    Violation::InvalidNumberSyntax,
                    flag_offender(name_part, None),
                ));
            };

            let parsed = match data.parse::<f64>() {
                Ok(n) if !n.is_nan() => n,
                _ => {
                    return Err(validation_error(
                        tree,
                        command,
                        config,
                        Violation::InvalidNumberValue,
                        flag_offender(name_part, Some(data)),
                    ));
                }
            };

            if config.int && parsed.floor() != parsed {
                return Err(validation_error(
                    tree,
                    command,
                    config,
                    Violation::ExpectedInt,
                    flag_offender(name_part, Some(data)),
                ));
            }

            if let Some(min) = config.min {
                if parsed < min {
                    return Err(validation_error(
                        tree,
                        command,
                        config,
                        Violation::BelowMin,
                        flag_offender(name_part, Some(data)),
                    ));
                }
            }

            if let Some(max) = config.max {
                if parsed > max {
                    return Err(validation_error(
                        tree,
                        command,
                        config,
                        Violation::AboveMax,
                        flag_offender(name_part, Some(data)),
                    ));
                }
            }

            Ok(TokenOutcome::Value {
                key: key.clone(),
                value: OptionValue::Num(parsed),
                skip_next: !has_eq,
            })
        }

        // The flag table is pre-filtered; positionals never land here.
        OptionKind::Positional => Ok(TokenOutcome::Unrecognized {
            name_part: name_part.to_string(),
            skip_next: !has_eq,
        }),
    }
}

fn validation_error(
    tree: &Arc<CommandTree>,
    command: CommandId,
    option: &OptionConfig,
    violation: Violation,
    offender: Offender,
) -> Event {
    Event::ValidationError {
        tree: Arc::clone(tree),
        command,
        option: option.clone(),
        violation,
        offender,
    }
}

fn flag_offender(name_part: &str, data_part: Option<&str>) -> Offender {
    Offender {
        name_part: Some(name_part.to_string()),
        data_part: data_part.map(str::to_string),
    }
}

/// Later assignments to the same key overwrite earlier ones.
fn upsert(entries: &mut Vec<(String, OptionValue)>, key: String, value: OptionValue) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

fn take(entries: &mut Vec<(String, OptionValue)>, key: &str) -> Option<OptionValue> {
    entries
        .iter()
        .position(|(k, _)| k == key)
        .map(|idx| entries.remove(idx).1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::command;
    use crate::option::{boolean, number, string, OptionSet};

    fn noop() -> impl Fn(ParsedArgs) -> std::future::Ready<anyhow::Result<()>> + Send + Sync {
        |_| std::future::ready(Ok(()))
    }

    fn tree_with(options: OptionSet) -> (Arc<CommandTree>, CommandId) {
        let cmd = command("probe").options(options).handler(noop()).build().unwrap();
        let tree = Arc::new(CommandTree::build(vec![cmd]).unwrap());
        let id = tree.roots()[0];
        (tree, id)
    }

    fn parse(options: OptionSet, args: &[&str]) -> Result<ParseOutcome, Event> {
        let (tree, id) = tree_with(options);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_options(&tree, id, &args, false)
    }

    fn bag(outcome: Result<ParseOutcome, Event>) -> ParsedArgs {
        match outcome {
            Ok(ParseOutcome::Args(args)) => args,
            Ok(_) => panic!("expected args outcome"),
            Err(e) => panic!("expected args outcome, got event {}", e.kind()),
        }
    }

    #[test]
    fn boolean_lookahead_consumes_only_value_words() {
        let opts = || OptionSet::new().add("flag", boolean().alias("f")).add("tail", string());

        let args = bag(parse(opts(), &["--flag", "true", "--tail", "x"]));
        assert_eq!(args.bool("flag"), Some(true));

        let args = bag(parse(opts(), &["--flag", "FALSE", "--tail", "x"]));
        assert_eq!(args.bool("flag"), Some(false));

        // A following flag is left alone.
        let args = bag(parse(opts(), &["--flag", "--tail", "x"]));
        assert_eq!(args.bool("flag"), Some(true));
        assert_eq!(args.str("tail"), Some("x"));
    }

    #[test]
    fn boolean_with_eq_and_garbage_is_a_syntax_error() {
        let opts = OptionSet::new().add("flag", boolean());
        let err = parse(opts, &["--flag=yes"]).err().unwrap();
        match err {
            Event::ValidationError {
                violation,
                offender,
                ..
            } => {
                assert_eq!(violation, Violation::InvalidBooleanSyntax);
                assert_eq!(offender.name_part.as_deref(), Some("--flag"));
                assert_eq!(offender.data_part.as_deref(), Some("yes"));
            }
            other => panic!("expected validation error, got {}", other.kind()),
        }
    }

    #[test]
    fn string_without_value_is_a_syntax_error() {
        let opts = OptionSet::new().add("name", string());
        let err = parse(opts, &["--name"]).err().unwrap();
        match err {
            Event::ValidationError { violation, .. } => {
                assert_eq!(violation, Violation::InvalidStringSyntax)
            }
            other => panic!("expected validation error, got {}", other.kind()),
        }
    }

    #[test]
    fn string_greedily_takes_the_next_token_even_if_dashed() {
        let opts = OptionSet::new().add("name", string());
        let args = bag(parse(opts, &["--name", "--weird"]));
        assert_eq!(args.str("name"), Some("--weird"));
    }

    #[test]
    fn number_violations_fail_fast_in_order() {
        let opts = || OptionSet::new().add("n", number().min(2.0).max(10.0).int());

        for (input, expected) in [
            (vec!["-n"], Violation::InvalidNumberSyntax),
            (vec!["-n", "abc"], Violation::InvalidNumberValue),
            (vec!["-n", "NaN"], Violation::InvalidNumberValue),
            (vec!["-n", "2.5"], Violation::ExpectedInt),
            (vec!["-n", "1"], Violation::BelowMin),
            (vec!["-n", "11"], Violation::AboveMax),
        ] {
            let err = parse(opts(), &input).err().unwrap();
            match err {
                Event::ValidationError { violation, .. } => assert_eq!(violation, expected),
                other => panic!("expected validation error, got {}", other.kind()),
            }
        }

        let args = bag(parse(opts(), &["-n", "7"]));
        assert_eq!(args.num("n"), Some(7.0));
    }

    #[test]
    fn repeated_assignment_keeps_the_last_value() {
        let opts = OptionSet::new().add("dialect", string());
        let args = bag(parse(opts, &["--dialect", "pg", "--dialect=mysql"]));
        assert_eq!(args.str("dialect"), Some("mysql"));
    }

    #[test]
    fn missing_required_lists_name_then_aliases() {
        let opts = OptionSet::new()
            .add("dialect", string().alias("d").alias("dlc").required())
            .add("extra", string());
        let err = parse(opts, &[]).err().unwrap();
        match err {
            Event::MissingArgs { missing, .. } => {
                assert_eq!(missing, vec![vec![
                    "--dialect".to_string(),
                    "-d".to_string(),
                    "--dlc".to_string(),
                ]]);
            }
            other => panic!("expected missing args, got {}", other.kind()),
        }
    }

    #[test]
    fn unrecognized_flags_report_name_part_and_swallow_values() {
        let opts = OptionSet::new().add("known", string());
        let err = parse(opts, &["--known", "v", "--unknown-one=x", "--unknown-two", "val"])
            .err()
            .unwrap();
        match err {
            Event::UnrecognizedArgs { unrecognized, .. } => {
                assert_eq!(unrecognized, vec!["--unknown-one", "--unknown-two"]);
            }
            other => panic!("expected unrecognized args, got {}", other.kind()),
        }
    }

    #[test]
    fn overflow_positionals_are_ignored() {
        let opts = OptionSet::new().add("only", crate::option::positional());
        let args = bag(parse(opts, &["first", "second", "third"]));
        assert_eq!(args.str("only"), Some("first"));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn help_and_version_short_circuit_on_name_part() {
        let opts = || OptionSet::new().add("name", string().required());

        assert!(matches!(parse(opts(), &["--help"]), Ok(ParseOutcome::Help)));
        assert!(matches!(parse(opts(), &["-h"]), Ok(ParseOutcome::Help)));
        assert!(matches!(parse(opts(), &["--help=x"]), Ok(ParseOutcome::Help)));
        assert!(matches!(parse(opts(), &["-v"]), Ok(ParseOutcome::Version)));
    }

    #[test]
    fn undefined_options_can_be_omitted() {
        let opts = OptionSet::new().add("a", string()).add("b", string());
        let (tree, id) = tree_with(opts);
        let args = vec!["--a".to_string(), "x".to_string()];

        match parse_options(&tree, id, &args, true) {
            Ok(ParseOutcome::Args(bag)) => {
                assert_eq!(bag.len(), 1);
                assert_eq!(bag.str("a"), Some("x"));
            }
            _ => panic!("expected args outcome"),
        }
    }
}
