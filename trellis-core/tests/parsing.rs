//! Behavioral tests for option parsing through the dry-run facility.
//!
//! Each test feeds a shell-style input line to a single command and checks
//! the option bag or event that comes back, covering value syntax forms,
//! defaults, aliases, aggregation of failures, and positional handling.

use trellis_core::{
    boolean, command, positional, string, test_command, Command, Event, OptionSet, OptionValue,
    TestRun, TrellisError, Violation,
};

/// Migration-generator command with one of everything except positionals.
fn generate() -> Command {
    command("generate")
        .alias("g")
        .desc("Generate migrations")
        .options(
            OptionSet::new()
                .add("dialect", string().alias("d").alias("dlc").desc("Database dialect").required())
                .add("schema", string().alias("s").desc("Schema file path"))
                .add("out", string().alias("o"))
                .add("config", string().default_value("./cfg.ts"))
                .add("flag", boolean().alias("f"))
                .add("def_flag", boolean().name("defFlag").default_value(true))
                .add("def_string", string().name("default-string").alias("-ds").default_value("Default value")),
        )
        .handler(|_| async { Ok(()) })
        .build()
        .unwrap()
}

/// Same shape but with the dialect restricted to known values.
fn generate_strict() -> Command {
    command("generate")
        .options(
            OptionSet::new()
                .add("dialect", string().alias("d").choices(["pg", "mysql", "sqlite"]).required())
                .add("flag", boolean().alias("f"))
                .add("config", string().default_value("./cfg.ts")),
        )
        .handler(|_| async { Ok(()) })
        .build()
        .unwrap()
}

/// Archive command driven by positionals.
fn pack() -> Command {
    command("pack")
        .options(
            OptionSet::new()
                .add("source", positional().required())
                .add("dest", positional())
                .add("force", boolean().alias("f")),
        )
        .handler(|_| async { Ok(()) })
        .build()
        .unwrap()
}

async fn options_of(cmd: &Command, input: &str) -> trellis_core::ParsedArgs {
    match test_command(cmd, input).await.unwrap() {
        TestRun::Options(bag) => bag,
        other => panic!("expected options for '{}', got {:?}", input, other),
    }
}

async fn event_of(cmd: &Command, input: &str) -> Event {
    match test_command(cmd, input).await.unwrap() {
        TestRun::Event(event) => event,
        other => panic!("expected event for '{}', got {:?}", input, other),
    }
}

#[tokio::test]
async fn defaults_fill_options_that_were_never_assigned() {
    let cmd = generate();
    let bag = options_of(&cmd, "--dialect pg").await;

    assert_eq!(bag.str("dialect"), Some("pg"));
    assert_eq!(bag.get("schema"), Some(&OptionValue::Undefined));
    assert_eq!(bag.get("out"), Some(&OptionValue::Undefined));
    assert_eq!(bag.str("config"), Some("./cfg.ts"));
    assert_eq!(bag.get("flag"), Some(&OptionValue::Undefined));
    assert_eq!(bag.bool("def_flag"), Some(true));
    assert_eq!(bag.str("def_string"), Some("Default value"));
}

#[tokio::test]
async fn eq_and_space_separated_values_parse_identically() {
    let cmd = generate();
    let with_eq = options_of(&cmd, "--dialect=pg --schema=./schema.ts").await;
    let with_space = options_of(&cmd, "--dialect pg --schema ./schema.ts").await;
    assert_eq!(with_eq, with_space);
}

#[tokio::test]
async fn aliases_assign_the_declared_keys() {
    let cmd = generate();
    let bag = options_of(&cmd, "-d pg -s ./schema.ts -f").await;

    assert_eq!(bag.str("dialect"), Some("pg"));
    assert_eq!(bag.str("schema"), Some("./schema.ts"));
    assert_eq!(bag.bool("flag"), Some(true));
}

#[tokio::test]
async fn inline_values_keep_every_later_equals_sign() {
    let cmd = generate();
    let bag = options_of(&cmd, "--dialect pg -ds=Not=Default=Value").await;
    assert_eq!(bag.str("def_string"), Some("Not=Default=Value"));
}

#[tokio::test]
async fn quoted_values_keep_their_spaces() {
    let cmd = generate();
    let bag = options_of(&cmd, "--dialect pg --schema \"my schema.ts\"").await;
    assert_eq!(bag.str("schema"), Some("my schema.ts"));
}

#[tokio::test]
async fn missing_required_options_are_aggregated_with_aliases() {
    let cmd = generate();
    let event = event_of(&cmd, "").await;

    match event {
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

#[tokio::test]
async fn unrecognized_flags_are_reported_and_swallow_their_values() {
    let cmd = generate();
    let event = event_of(&cmd, "--dialect pg --unknown-one -m").await;

    match event {
        Event::UnrecognizedArgs { unrecognized, .. } => {
            // `-m` sat in value position of the unknown flag.
            assert_eq!(unrecognized, vec!["--unknown-one"]);
        }
        other => panic!("expected unrecognized args, got {}", other.kind()),
    }
}

#[tokio::test]
async fn value_outside_choices_is_an_enum_violation() {
    let cmd = generate_strict();
    let event = event_of(&cmd, "--dialect=oracle").await;

    match event {
        Event::ValidationError {
            violation,
            option,
            offender,
            ..
        } => {
            assert_eq!(violation, Violation::EnumViolation);
            assert_eq!(option.name, "--dialect");
            assert_eq!(offender.name_part.as_deref(), Some("--dialect"));
            assert_eq!(offender.data_part.as_deref(), Some("oracle"));
        }
        other => panic!("expected validation error, got {}", other.kind()),
    }
}

#[tokio::test]
async fn minimal_invocation_serializes_to_the_expected_bag() {
    let cmd = generate_strict();
    let bag = options_of(&cmd, "--dialect=pg").await;

    let json = serde_json::to_value(&bag).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "dialect": "pg",
            "flag": null,
            "config": "./cfg.ts",
        })
    );
}

#[tokio::test]
async fn boolean_flags_consume_only_value_words() {
    let cmd = generate();

    let bag = options_of(&cmd, "--dialect pg --flag true").await;
    assert_eq!(bag.bool("flag"), Some(true));

    let bag = options_of(&cmd, "--dialect pg --flag FALSE").await;
    assert_eq!(bag.bool("flag"), Some(false));

    let bag = options_of(&cmd, "--dialect pg --flag=0").await;
    assert_eq!(bag.bool("flag"), Some(false));

    // An unrelated word after a bare flag stays unconsumed; with no
    // positional slot declared it is simply ignored.
    let bag = options_of(&cmd, "--dialect pg --flag xyz").await;
    assert_eq!(bag.bool("flag"), Some(true));

    // A following flag token is never taken as the value.
    let bag = options_of(&cmd, "--flag --dialect pg").await;
    assert_eq!(bag.bool("flag"), Some(true));
    assert_eq!(bag.str("dialect"), Some("pg"));
}

#[tokio::test]
async fn boolean_with_inline_garbage_is_a_syntax_error() {
    let cmd = generate();
    let event = event_of(&cmd, "--dialect pg --flag=yes").await;

    match event {
        Event::ValidationError { violation, .. } => {
            assert_eq!(violation, Violation::InvalidBooleanSyntax)
        }
        other => panic!("expected validation error, got {}", other.kind()),
    }
}

#[tokio::test]
async fn help_and_version_short_circuit_even_with_missing_required() {
    let cmd = generate();

    assert!(matches!(test_command(&cmd, "--help").await.unwrap(), TestRun::Help));
    assert!(matches!(test_command(&cmd, "-h").await.unwrap(), TestRun::Help));
    assert!(matches!(test_command(&cmd, "--dialect pg -h").await.unwrap(), TestRun::Help));
    assert!(matches!(test_command(&cmd, "--version").await.unwrap(), TestRun::Version));
    assert!(matches!(test_command(&cmd, "-v").await.unwrap(), TestRun::Version));
}

#[tokio::test]
async fn positionals_fill_in_declaration_order() {
    let cmd = pack();
    let bag = options_of(&cmd, "input.tar output.tar").await;

    assert_eq!(bag.str("source"), Some("input.tar"));
    assert_eq!(bag.str("dest"), Some("output.tar"));
}

#[tokio::test]
async fn positionals_keep_order_across_interleaved_flags() {
    let cmd = pack();
    let bag = options_of(&cmd, "input.tar --force output.tar").await;

    assert_eq!(bag.str("source"), Some("input.tar"));
    assert_eq!(bag.bool("force"), Some(true));
    assert_eq!(bag.str("dest"), Some("output.tar"));
}

#[tokio::test]
async fn overflow_positionals_are_ignored() {
    let cmd = pack();
    let bag = options_of(&cmd, "a b c d").await;

    assert_eq!(bag.str("source"), Some("a"));
    assert_eq!(bag.str("dest"), Some("b"));
    assert_eq!(bag.len(), 3);
}

#[tokio::test]
async fn missing_required_positional_is_reported_by_label() {
    let cmd = pack();
    let event = event_of(&cmd, "--force").await;

    match event {
        Event::MissingArgs { missing, .. } => {
            assert_eq!(missing, vec![vec!["source".to_string()]]);
        }
        other => panic!("expected missing args, got {}", other.kind()),
    }
}

#[tokio::test]
async fn positional_choices_are_enforced() {
    let cmd = command("set-level")
        .options(OptionSet::new().add("level", positional().choices(["debug", "info", "warn"])))
        .handler(|_| async { Ok(()) })
        .build()
        .unwrap();

    let event = event_of(&cmd, "loud").await;
    match event {
        Event::ValidationError {
            violation,
            offender,
            ..
        } => {
            assert_eq!(violation, Violation::EnumViolation);
            assert_eq!(offender.name_part, None);
            assert_eq!(offender.data_part.as_deref(), Some("loud"));
        }
        other => panic!("expected validation error, got {}", other.kind()),
    }
}

#[tokio::test]
async fn transform_reshapes_the_bag_before_return() {
    let cmd = command("stamp")
        .options(OptionSet::new().add("name", string()))
        .transform(|mut args| async move {
            args.set("stamped", true);
            Ok(args)
        })
        .handler(|_| async { Ok(()) })
        .build()
        .unwrap();

    let bag = options_of(&cmd, "--name x").await;
    assert_eq!(bag.str("name"), Some("x"));
    assert_eq!(bag.bool("stamped"), Some(true));
}

#[tokio::test]
async fn transform_failure_is_a_host_error() {
    let cmd = command("stamp")
        .options(OptionSet::new().add("name", string()))
        .transform(|_| async { Err(anyhow::anyhow!("reshape failed")) })
        .handler(|_| async { Ok(()) })
        .build()
        .unwrap();

    let err = test_command(&cmd, "--name x").await.unwrap_err();
    match err {
        TrellisError::Host(e) => assert_eq!(e.to_string(), "reshape failed"),
        other => panic!("expected host error, got {other}"),
    }
}

#[tokio::test]
async fn parsing_is_idempotent_for_identical_input() {
    let cmd = generate();
    let first = options_of(&cmd, "--dialect pg -ds custom --flag").await;
    let second = options_of(&cmd, "--dialect pg -ds custom --flag").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn later_assignments_override_earlier_ones() {
    let cmd = generate();
    let bag = options_of(&cmd, "--dialect pg --dialect=mysql").await;
    assert_eq!(bag.str("dialect"), Some("mysql"));
}
