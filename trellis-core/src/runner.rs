//! Run orchestration.
//!
//! [`run`] ties the stages together: forest validation, the run-level help
//! and version guards, command resolution, option parsing, and finally the
//! transform, hooks and handler of the resolved command. Every non-handler
//! conclusion is dispatched through the event chain before being returned to
//! the caller; failures raised by caller-supplied callbacks propagate as
//! [`TrellisError::Host`] untouched.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::command::Command;
use crate::error::{Result, TrellisError};
use crate::event::{dispatch, DefaultEventHandler, Event, EventHandler};
use crate::parser::{parse_options, ParseOutcome};
use crate::resolver::{resolve, Resolution};
use crate::token::{self, shell_split};
use crate::tree::{CommandId, CommandTree};
use crate::value::ParsedArgs;

/// Where a hook fires relative to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Before,
    After,
}

/// Boxed future returned by a stored hook.
pub type HookFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Fires before and after every handler invocation.
pub type Hook = Arc<dyn Fn(HookStage, Arc<CommandTree>, CommandId) -> HookFuture + Send + Sync>;

/// Wraps an async closure into a storable [`Hook`].
pub fn hook<F, Fut>(f: F) -> Hook
where
    F: Fn(HookStage, Arc<CommandTree>, CommandId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |stage, tree, id| Box::pin(f(stage, tree, id)))
}

/// Settings for one engine run.
#[derive(Clone, Default)]
pub struct RunConfig {
    /// Display name used in rendered messages.
    pub cli_name: Option<String>,
    /// Token list; defaults to the process arguments without the binary name.
    pub arg_source: Option<Vec<String>>,
    /// Version string rendered for version requests.
    pub version: Option<String>,
    /// Drop entries that stayed `Undefined` before the handler runs.
    pub omit_undefined: bool,
    /// Consulted before the default renderer; return `true` to swallow the
    /// event.
    pub event_handler: Option<Arc<dyn EventHandler>>,
    /// Fires around every handler invocation.
    pub hook: Option<Hook>,
}

/// How a run concluded.
#[derive(Debug)]
pub enum RunOutcome {
    /// The resolved command's handler ran to completion.
    Completed,
    /// The run concluded with an event, already dispatched to the handler
    /// chain.
    Event(Event),
}

async fn conclude(
    custom: Option<&Arc<dyn EventHandler>>,
    fallback: &DefaultEventHandler,
    event: Event,
) -> Result<RunOutcome> {
    debug!(event = event.kind(), "run concluded with event");
    dispatch(custom, fallback, &event).await;
    Ok(RunOutcome::Event(event))
}

/// Validates the forest and executes one invocation against it.
pub async fn run(commands: Vec<Command>, config: RunConfig) -> Result<RunOutcome> {
    let fallback = DefaultEventHandler::new(config.cli_name.clone(), config.version.clone());
    let custom = config.event_handler.clone();

    let tree = match CommandTree::build(commands) {
        Ok(tree) => Arc::new(tree),
        Err(TrellisError::Composition(message)) => {
            return conclude(custom.as_ref(), &fallback, Event::CompositionError { message }).await;
        }
        Err(other) => return Err(other),
    };

    let args: Vec<String> = match config.arg_source {
        Some(args) => args,
        None => std::env::args().skip(1).collect(),
    };
    debug!(tokens = args.len(), "starting run");

    if args.is_empty() {
        return conclude(custom.as_ref(), &fallback, Event::GlobalHelp { tree }).await;
    }

    // A help token applies unless it sits in value position of the flag
    // before it.
    if let Some(idx) = args.iter().position(|a| token::is_help_flag(a)) {
        let in_value_position = idx > 0 && token::consumes_next(&args[idx - 1]);
        if !in_value_position {
            return match resolve(&tree, &args) {
                Ok((Resolution::Command(id), _)) => {
                    conclude(custom.as_ref(), &fallback, Event::CommandHelp {
                        tree: Arc::clone(&tree),
                        command: id,
                    })
                    .await
                }
                Ok(_) => {
                    conclude(custom.as_ref(), &fallback, Event::GlobalHelp {
                        tree: Arc::clone(&tree),
                    })
                    .await
                }
                Err(event) => conclude(custom.as_ref(), &fallback, event).await,
            };
        }
    }

    // Same value-position rule for version tokens.
    if let Some(idx) = args.iter().position(|a| token::is_version_flag(a)) {
        let in_value_position = idx > 0 && token::consumes_next(&args[idx - 1]);
        if !in_value_position {
            return conclude(custom.as_ref(), &fallback, Event::Version).await;
        }
    }

    let (resolution, remaining) = match resolve(&tree, &args) {
        Ok(res) => res,
        Err(event) => return conclude(custom.as_ref(), &fallback, event).await,
    };

    let command = match resolution {
        Resolution::None => {
            return conclude(custom.as_ref(), &fallback, Event::GlobalHelp { tree }).await;
        }
        Resolution::Help => {
            // The `help` pseudo-command targets whatever the remaining tokens
            // resolve to, unwrapping any nested `help` tokens on the way.
            let mut current = remaining;
            loop {
                match resolve(&tree, &current) {
                    Ok((Resolution::Help, rest)) => current = rest,
                    Ok((Resolution::Command(id), _)) => {
                        return conclude(custom.as_ref(), &fallback, Event::CommandHelp {
                            tree: Arc::clone(&tree),
                            command: id,
                        })
                        .await;
                    }
                    Ok((Resolution::None, _)) => {
                        return conclude(custom.as_ref(), &fallback, Event::GlobalHelp { tree })
                            .await;
                    }
                    Err(event) => return conclude(custom.as_ref(), &fallback, event).await,
                }
            }
        }
        Resolution::Command(id) => id,
    };

    let parsed = match parse_options(&tree, command, &remaining, config.omit_undefined) {
        Ok(ParseOutcome::Args(parsed)) => parsed,
        Ok(ParseOutcome::Help) => {
            return conclude(custom.as_ref(), &fallback, Event::CommandHelp {
                tree: Arc::clone(&tree),
                command,
            })
            .await;
        }
        Ok(ParseOutcome::Version) => {
            return conclude(custom.as_ref(), &fallback, Event::Version).await;
        }
        Err(event) => return conclude(custom.as_ref(), &fallback, event).await,
    };

    let node = tree.get(command);
    let Some(handler) = node.handler.clone() else {
        // A group command invoked directly shows its own help.
        return conclude(custom.as_ref(), &fallback, Event::CommandHelp {
            tree: Arc::clone(&tree),
            command,
        })
        .await;
    };
    let transform = node.transform.clone();

    if let Some(hook) = &config.hook {
        hook(HookStage::Before, Arc::clone(&tree), command).await?;
    }

    let input = match transform {
        Some(transform) => transform(parsed).await?,
        None => parsed,
    };

    handler(input).await?;

    if let Some(hook) = &config.hook {
        hook(HookStage::After, Arc::clone(&tree), command).await?;
    }

    debug!(command = %tree.name_path(command), "handler completed");
    Ok(RunOutcome::Completed)
}

/// Outcome of a dry run against a single command.
#[derive(Debug)]
pub enum TestRun {
    /// The bag the handler would receive, transform applied.
    Options(ParsedArgs),
    Help,
    Version,
    /// Parsing or validation concluded with an event (not dispatched).
    Event(Event),
}

/// Parses a shell-style input string against one command without running its
/// handler or dispatching events.
///
/// The input holds only the command's own tokens; command resolution is
/// skipped entirely.
pub async fn test_command(command: &Command, input: &str) -> Result<TestRun> {
    let tree = Arc::new(CommandTree::build(vec![command.clone()])?);
    let id = tree.roots()[0];
    let args = shell_split(input);

    match parse_options(&tree, id, &args, false) {
        Ok(ParseOutcome::Args(parsed)) => {
            let node = tree.get(id);
            let options = match &node.transform {
                Some(transform) => transform(parsed).await?,
                None => parsed,
            };
            Ok(TestRun::Options(options))
        }
        Ok(ParseOutcome::Help) => Ok(TestRun::Help),
        Ok(ParseOutcome::Version) => Ok(TestRun::Version),
        Err(event) => Ok(TestRun::Event(event)),
    }
}
