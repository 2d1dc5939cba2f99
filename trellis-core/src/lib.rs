//! Core engine of the Trellis command framework.
//!
//! This crate provides the declarative command and option schema types, the
//! token-level resolver and parser that turn an argument list into a typed
//! option bag, and the event taxonomy through which every non-handler
//! outcome is reported.

mod command;
mod error;
mod event;
mod option;
mod parser;
mod render;
mod resolver;
mod runner;
mod token;
mod tree;
mod value;

// Re-export the public surface
pub use command::{command, Command, CommandBuilder, Handler, HandlerFuture, Transform, TransformFuture};
pub use error::{Result, TrellisError};
pub use event::{DefaultEventHandler, Event, EventHandler, Offender, Violation};
pub use option::{
    boolean, number, positional, string, BoolOpt, NumberOpt, OptionConfig, OptionDecl, OptionKind,
    OptionSet, PositionalOpt, StringOpt,
};
pub use render::{render_command_help, render_event, render_global_help};
pub use runner::{hook, run, test_command, Hook, HookFuture, HookStage, RunConfig, RunOutcome, TestRun};
pub use token::shell_split;
pub use tree::{CommandId, CommandInfo, CommandNode, CommandTree, OptionInfo};
pub use value::{OptionValue, ParsedArgs};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
