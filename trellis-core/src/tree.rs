//! Command forest storage.
//!
//! Validated commands are flattened into an arena of nodes indexed by
//! [`CommandId`]; parent and subcommand links are ids into the same arena, so
//! the whole forest is one immutable allocation that events can share.

use std::fmt;

use serde::Serialize;

use crate::command::{Command, Handler, Transform};
use crate::error::{Result, TrellisError};
use crate::option::OptionConfig;

/// Index of a command inside its [`CommandTree`].
///
/// Ids are only minted by the owning tree and stay valid for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub(crate) usize);

/// A stored command with its forest links.
pub struct CommandNode {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub hidden: bool,
    pub options: Vec<(String, OptionConfig)>,
    pub(crate) handler: Option<Handler>,
    pub(crate) transform: Option<Transform>,
    pub parent: Option<CommandId>,
    pub subcommands: Vec<CommandId>,
}

impl CommandNode {
    /// True when `token` equals this command's name or one of its aliases.
    pub(crate) fn matches_token(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|a| a == token)
    }

    pub fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .field("options", &self.options)
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .field("parent", &self.parent)
            .field("subcommands", &self.subcommands)
            .finish()
    }
}

/// An immutable arena of validated commands.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    roots: Vec<CommandId>,
}

impl CommandTree {
    /// Flattens a command forest into an arena, rejecting name or alias
    /// collisions between siblings.
    ///
    /// Per-command structure was already validated when each command was
    /// built; this is the first point where sibling groups exist, so
    /// cross-command collisions are checked here.
    pub fn build(commands: Vec<Command>) -> Result<CommandTree> {
        let mut tree = CommandTree {
            nodes: Vec::new(),
            roots: Vec::new(),
        };
        tree.roots = tree.insert_group(commands, None)?;
        Ok(tree)
    }

    fn insert_group(
        &mut self,
        commands: Vec<Command>,
        parent: Option<CommandId>,
    ) -> Result<Vec<CommandId>> {
        let parent_prefix = match parent {
            Some(id) => format!("{} ", self.name_path(id)),
            None => String::new(),
        };

        let mut stored_names: Vec<Vec<String>> = Vec::new();
        let mut ids = Vec::new();

        for cmd in commands {
            for storage in &stored_names {
                if storage.iter().any(|e| *e == cmd.name) {
                    return Err(TrellisError::command(
                        &format!("{}{}", parent_prefix, cmd.name),
                        format!(
                            "name is already in use by command '{}{}'",
                            parent_prefix, storage[0]
                        ),
                    ));
                }
            }
            for alias in &cmd.aliases {
                for storage in &stored_names {
                    if storage.iter().any(|e| e == alias) {
                        return Err(TrellisError::command(
                            &format!("{}{}", parent_prefix, cmd.name),
                            format!(
                                "alias '{}' is already in use by command '{}{}'",
                                alias, parent_prefix, storage[0]
                            ),
                        ));
                    }
                }
            }

            let mut names = vec![cmd.name.clone()];
            names.extend(cmd.aliases.iter().cloned());
            stored_names.push(names);

            let id = CommandId(self.nodes.len());
            self.nodes.push(CommandNode {
                name: cmd.name,
                aliases: cmd.aliases,
                description: cmd.description,
                short_description: cmd.short_description,
                hidden: cmd.hidden,
                options: cmd.options,
                handler: cmd.handler,
                transform: cmd.transform,
                parent,
                subcommands: Vec::new(),
            });

            let subcommands = self.insert_group(cmd.subcommands, Some(id))?;
            self.nodes[id.0].subcommands = subcommands;
            ids.push(id);
        }

        Ok(ids)
    }

    pub fn get(&self, id: CommandId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[CommandId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Space-joined names from the root down to `id`.
    pub fn name_path(&self, id: CommandId) -> String {
        let node = self.get(id);
        match node.parent {
            Some(parent) => format!("{} {}", self.name_path(parent), node.name),
            None => node.name.clone(),
        }
    }

    /// Finds the command in `group` whose name or alias equals `token`.
    pub(crate) fn find_in(&self, group: &[CommandId], token: &str) -> Option<CommandId> {
        group.iter().copied().find(|id| self.get(*id).matches_token(token))
    }

    /// Serializable snapshot of the whole forest for documentation tooling.
    pub fn info(&self) -> Vec<CommandInfo> {
        self.roots.iter().map(|id| self.info_node(*id)).collect()
    }

    fn info_node(&self, id: CommandId) -> CommandInfo {
        let node = self.get(id);
        CommandInfo {
            name: node.name.clone(),
            aliases: node.aliases.clone(),
            description: node.description.clone(),
            short_description: node.short_description.clone(),
            hidden: node.hidden,
            options: node
                .options
                .iter()
                .map(|(key, config)| OptionInfo {
                    key: key.clone(),
                    config: config.clone(),
                })
                .collect(),
            subcommands: node
                .subcommands
                .iter()
                .map(|sub| self.info_node(*sub))
                .collect(),
        }
    }
}

/// Introspection snapshot of one command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub hidden: bool,
    pub options: Vec<OptionInfo>,
    pub subcommands: Vec<CommandInfo>,
}

/// Introspection snapshot of one option, keyed by its declaration key.
#[derive(Debug, Clone, Serialize)]
pub struct OptionInfo {
    pub key: String,
    #[serde(flatten)]
    pub config: OptionConfig,
}
