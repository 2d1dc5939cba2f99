//! Engine outcome events and the pluggable handler chain.
//!
//! Every run outcome that is not a completed handler invocation is expressed
//! as one [`Event`] from a closed set: help and version requests, resolution
//! failures, option validation failures, and composition errors surfaced at
//! run time. Events are dispatched to an optional caller-supplied
//! [`EventHandler`] first; unhandled events fall through to the
//! [`DefaultEventHandler`], which renders deterministic text.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::option::OptionConfig;
use crate::render;
use crate::tree::{CommandId, CommandTree};

/// The rule a supplied value broke during coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Violation {
    AboveMax,
    BelowMin,
    ExpectedInt,
    InvalidBooleanSyntax,
    InvalidStringSyntax,
    InvalidNumberSyntax,
    InvalidNumberValue,
    EnumViolation,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Violation::AboveMax => "Above max",
            Violation::BelowMin => "Below min",
            Violation::ExpectedInt => "Expected int",
            Violation::InvalidBooleanSyntax => "Invalid boolean syntax",
            Violation::InvalidStringSyntax => "Invalid string syntax",
            Violation::InvalidNumberSyntax => "Invalid number syntax",
            Violation::InvalidNumberValue => "Invalid number value",
            Violation::EnumViolation => "Enum violation",
        };
        write!(f, "{}", text)
    }
}

/// The offending token of a validation error, split at its first `=`.
///
/// `name_part` is absent for positional tokens; `data_part` is absent when
/// the value was missing altogether.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offender {
    pub name_part: Option<String>,
    pub data_part: Option<String>,
}

/// Externally visible run outcomes.
///
/// Command-scoped events carry the shared [`CommandTree`] and the id of the
/// command they concern, so handlers can render paths, usage and option
/// tables without holding separate state.
#[derive(Debug, Clone)]
pub enum Event {
    /// Help was requested outside the scope of any single command.
    GlobalHelp { tree: Arc<CommandTree> },
    /// Help was requested for one resolved command.
    CommandHelp {
        tree: Arc<CommandTree>,
        command: CommandId,
    },
    /// The version string was requested.
    Version,
    /// The first command-position token matched no root command.
    UnknownCommand { offender: String },
    /// A nested command-position token matched no subcommand of `command`.
    UnknownSubcommand {
        tree: Arc<CommandTree>,
        command: CommandId,
        offender: String,
    },
    /// Required options were never assigned a value; one entry per option,
    /// listing its name followed by its aliases.
    MissingArgs {
        tree: Arc<CommandTree>,
        command: CommandId,
        missing: Vec<Vec<String>>,
    },
    /// Dashed tokens that matched no declared option, by their name part.
    UnrecognizedArgs {
        tree: Arc<CommandTree>,
        command: CommandId,
        unrecognized: Vec<String>,
    },
    /// A supplied value failed coercion or validation.
    ValidationError {
        tree: Arc<CommandTree>,
        command: CommandId,
        option: OptionConfig,
        violation: Violation,
        offender: Offender,
    },
    /// A definition-time rule was violated and surfaced at run time.
    CompositionError { message: String },
    /// A failure outside the engine's taxonomy, routed by the host.
    UnknownError { message: String },
}

impl Event {
    /// Stable lowercase tag for logging and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::GlobalHelp { .. } => "global_help",
            Event::CommandHelp { .. } => "command_help",
            Event::Version => "version",
            Event::UnknownCommand { .. } => "unknown_command",
            Event::UnknownSubcommand { .. } => "unknown_subcommand",
            Event::MissingArgs { .. } => "missing_args",
            Event::UnrecognizedArgs { .. } => "unrecognized_args",
            Event::ValidationError { .. } => "validation_error",
            Event::CompositionError { .. } => "composition_error",
            Event::UnknownError { .. } => "unknown_error",
        }
    }
}

/// Receives events before the default renderer.
///
/// Return `true` to mark the event handled and suppress the default
/// rendering, `false` to fall through.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> bool;
}

/// Renders every event as deterministic text.
///
/// Help and version output goes to stdout, everything else to stderr. The
/// handler owns the display context (cli name and version string) so events
/// themselves stay free of presentation state.
#[derive(Debug, Clone, Default)]
pub struct DefaultEventHandler {
    cli_name: Option<String>,
    version: Option<String>,
}

impl DefaultEventHandler {
    pub fn new(cli_name: Option<String>, version: Option<String>) -> Self {
        DefaultEventHandler { cli_name, version }
    }

    /// The text this handler would print for `event`.
    pub fn render(&self, event: &Event) -> String {
        render::render_event(event, self.cli_name.as_deref(), self.version.as_deref())
    }
}

#[async_trait]
impl EventHandler for DefaultEventHandler {
    async fn handle(&self, event: &Event) -> bool {
        let text = self.render(event);
        match event {
            Event::GlobalHelp { .. } | Event::CommandHelp { .. } | Event::Version => {
                println!("{}", text)
            }
            _ => eprintln!("{}", text),
        }
        true
    }
}

/// Runs the handler chain: the custom handler first, then the default one
/// for anything left unhandled.
pub(crate) async fn dispatch(
    custom: Option<&Arc<dyn EventHandler>>,
    fallback: &DefaultEventHandler,
    event: &Event,
) {
    if let Some(handler) = custom {
        if handler.handle(event).await {
            return;
        }
    }
    fallback.handle(event).await;
}
