//! Command declaration and definition-time validation.
//!
//! Commands are declared through [`command`] and finished with
//! [`CommandBuilder::build`], which runs every structural rule eagerly so a
//! malformed definition fails where it is written, not when the forest is
//! first run.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{Result, TrellisError};
use crate::option::{validate_options, OptionConfig, OptionKind, OptionSet};
use crate::token;
use crate::value::ParsedArgs;

/// Boxed future returned by a stored handler.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Boxed future returned by a stored transform.
pub type TransformFuture = BoxFuture<'static, anyhow::Result<ParsedArgs>>;

/// A command's handler: receives the final parsed option bag.
pub type Handler = Arc<dyn Fn(ParsedArgs) -> HandlerFuture + Send + Sync>;

/// Reshapes the parsed option bag before the handler sees it.
pub type Transform = Arc<dyn Fn(ParsedArgs) -> TransformFuture + Send + Sync>;

/// A validated command definition, ready to join a forest.
#[derive(Clone)]
pub struct Command {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) short_description: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) options: Vec<(String, OptionConfig)>,
    pub(crate) handler: Option<Handler>,
    pub(crate) transform: Option<Transform>,
    pub(crate) subcommands: Vec<Command>,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .field("options", &self.options)
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .field("subcommands", &self.subcommands)
            .finish()
    }
}

/// Starts a command declaration with the given name.
pub fn command(name: impl Into<String>) -> CommandBuilder {
    CommandBuilder {
        name: name.into(),
        aliases: Vec::new(),
        description: None,
        short_description: None,
        hidden: false,
        options: OptionSet::new(),
        handler: None,
        transform: None,
        subcommands: Vec::new(),
    }
}

/// Accumulates a command definition; [`build`](CommandBuilder::build)
/// validates and seals it.
#[derive(Clone)]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    short_description: Option<String>,
    hidden: bool,
    options: OptionSet,
    handler: Option<Handler>,
    transform: Option<Transform>,
    subcommands: Vec<Command>,
}

impl CommandBuilder {
    /// Adds an alias; may be called once per alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn desc(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// One-line description used by the global command list.
    pub fn short_desc(mut self, description: impl Into<String>) -> Self {
        self.short_description = Some(description.into());
        self
    }

    /// Hides the command from help output; it stays invocable.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ParsedArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |args| Box::pin(f(args))));
        self
    }

    pub fn transform<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ParsedArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ParsedArgs>> + Send + 'static,
    {
        self.transform = Some(Arc::new(move |args| Box::pin(f(args))));
        self
    }

    pub fn subcommand(mut self, subcommand: Command) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Validates the declaration and produces the immutable command.
    pub fn build(self) -> Result<Command> {
        let has_positional = self
            .options
            .entries
            .iter()
            .any(|(_, raw)| raw.kind == OptionKind::Positional);

        if !self.subcommands.is_empty() && has_positional {
            return Err(TrellisError::command(
                &self.name,
                "command can't have subcommands and positional args at the same time",
            ));
        }

        if self.handler.is_none() && self.subcommands.is_empty() {
            return Err(TrellisError::command(
                &self.name,
                "command without subcommands must have a handler present",
            ));
        }

        let options = validate_options(&self.options)?;

        if self.name.starts_with('-') {
            return Err(TrellisError::command(
                &self.name,
                "command name can't start with '-'",
            ));
        }
        for alias in &self.aliases {
            if alias.starts_with('-') {
                return Err(TrellisError::command(
                    &self.name,
                    "command aliases can't start with '-'",
                ));
            }
        }

        let all_names: Vec<&str> = std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect();

        for (idx, n) in all_names.iter().enumerate() {
            if n.eq_ignore_ascii_case("help") {
                return Err(TrellisError::command(&self.name, "'help' is a reserved name"));
            }

            if token::is_bool_word(n) {
                return Err(TrellisError::command(
                    &self.name,
                    format!("'{}' is a name reserved for boolean values", n),
                ));
            }

            if all_names.iter().position(|e| e == n) != Some(idx) {
                return Err(TrellisError::command(
                    &self.name,
                    format!("duplicate alias '{}'", n),
                ));
            }
        }

        Ok(Command {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            short_description: self.short_description,
            hidden: self.hidden,
            options,
            handler: self.handler,
            transform: self.transform,
            subcommands: self.subcommands,
        })
    }
}
