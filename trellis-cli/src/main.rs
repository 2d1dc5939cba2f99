//! Demonstration host for the trellis engine.
//!
//! A small "workbench" project tool wiring a command forest into `run`.
//! Output policy, exit codes, and logging all live on this side of the
//! library boundary; the engine only hands back outcomes and events.

use std::process::ExitCode;

use tracing::debug;
use trellis_core::{
    boolean, command, number, positional, run, string, Command, DefaultEventHandler, Event,
    EventHandler, OptionSet, ParsedArgs, RunConfig, RunOutcome,
};

const CLI_NAME: &str = "workbench";

/// Builds the workbench command forest.
fn forest() -> trellis_core::Result<Vec<Command>> {
    let init = command("init")
        .desc("Scaffold a new workbench project")
        .options(
            OptionSet::new()
                .add("name", positional().desc("Project name").required())
                .add(
                    "template",
                    string()
                        .alias("t")
                        .choices(["lib", "bin", "workspace"])
                        .default_value("bin")
                        .desc("Project template"),
                ),
        )
        .handler(|args| async move { show("init", &args) })
        .build()?;

    let build = command("build")
        .alias("b")
        .desc("Build the current project")
        .options(
            OptionSet::new()
                .add(
                    "profile",
                    string()
                        .alias("p")
                        .choices(["debug", "release"])
                        .default_value("debug")
                        .desc("Build profile"),
                )
                .add("jobs", number().alias("j").int().min(1.0).desc("Parallel compile jobs"))
                .add("verbose", boolean().desc("Print each build step"))
                .add("trace_plan", boolean().name("trace-plan").hidden()),
        )
        .handler(|args| async move { show("build", &args) })
        .build()?;

    let cache = command("cache")
        .desc("Inspect or reset the build cache")
        .short_desc("Build cache maintenance")
        .subcommand(
            command("clear")
                .desc("Drop all cached artifacts")
                .options(
                    OptionSet::new()
                        .add("dry_run", boolean().name("dry-run").desc("Report what would be removed")),
                )
                .handler(|args| async move { show("cache clear", &args) })
                .build()?,
        )
        .subcommand(
            command("stat")
                .desc("Show cache size and hit rate")
                .handler(|args| async move { show("cache stat", &args) })
                .build()?,
        )
        .build()?;

    Ok(vec![init, build, cache])
}

/// Prints the handler input the way a real tool would consume it.
fn show(command: &'static str, args: &ParsedArgs) -> anyhow::Result<()> {
    debug!(command, "handler invoked");
    println!("{} received:", command);
    println!("{}", serde_json::to_string_pretty(args)?);
    Ok(())
}

/// Help and version requests are successful runs; every other event means
/// the invocation did not reach a handler.
fn exit_for(event: &Event) -> ExitCode {
    match event {
        Event::GlobalHelp { .. } | Event::CommandHelp { .. } | Event::Version => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let commands = match forest() {
        Ok(commands) => commands,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = RunConfig {
        cli_name: Some(CLI_NAME.to_string()),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        ..RunConfig::default()
    };

    match run(commands, config).await {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(RunOutcome::Event(event)) => exit_for(&event),
        Err(err) => {
            // Handler and hook failures surface through the same renderer
            // as engine events before the process reports failure.
            let renderer = DefaultEventHandler::new(Some(CLI_NAME.to_string()), None);
            renderer
                .handle(&Event::UnknownError { message: err.to_string() })
                .await;
            ExitCode::FAILURE
        }
    }
}
