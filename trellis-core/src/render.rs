//! Deterministic text rendering for events.
//!
//! One fixed output shape per event kind: help and version requests render
//! usage text, everything else renders a single diagnostic line or a short
//! list. Hosts that want different presentation intercept events with their
//! own handler and may still call into these functions for the parts they
//! keep.

use crate::event::{Event, Offender, Violation};
use crate::option::{OptionConfig, OptionKind};
use crate::tree::{CommandId, CommandNode, CommandTree};

/// Renders `event` as the default handler would print it.
pub fn render_event(event: &Event, cli_name: Option<&str>, version: Option<&str>) -> String {
    let prefix = cli_name.map(|n| format!("{} ", n)).unwrap_or_default();

    match event {
        Event::GlobalHelp { tree } => render_global_help(tree),
        Event::CommandHelp { tree, command } => render_command_help(tree, *command),
        Event::Version => match (cli_name, version) {
            (Some(name), Some(v)) => format!("{} {}", name, v),
            (None, Some(v)) => v.to_string(),
            _ => "version is not set".to_string(),
        },
        Event::UnknownCommand { offender } => format!(
            "Unknown command: '{}'.\nType '{}--help' to see the list of available commands.",
            offender, prefix
        ),
        Event::UnknownSubcommand {
            tree,
            command,
            offender,
        } => {
            let path = tree.name_path(*command);
            format!(
                "Unknown subcommand '{}' of command '{}'.\nType '{}{} --help' to see its subcommands.",
                offender, path, prefix, path
            )
        }
        Event::MissingArgs {
            tree,
            command,
            missing,
        } => {
            let mut out = format!(
                "Command '{}' is missing the following required options:",
                tree.name_path(*command)
            );
            for entry in missing {
                if let Some((name, aliases)) = entry.split_first() {
                    if aliases.is_empty() {
                        out.push_str(&format!("\n  {}", name));
                    } else {
                        out.push_str(&format!("\n  {} [{}]", name, aliases.join(", ")));
                    }
                }
            }
            out
        }
        Event::UnrecognizedArgs {
            tree,
            command,
            unrecognized,
        } => format!(
            "Unrecognized options for command '{}': {}",
            tree.name_path(*command),
            unrecognized.join(", ")
        ),
        Event::ValidationError {
            option,
            violation,
            offender,
            ..
        } => render_violation(option, *violation, offender),
        Event::CompositionError { message } => message.clone(),
        Event::UnknownError { message } => format!("Error: {}", message),
    }
}

fn render_violation(option: &OptionConfig, violation: Violation, offender: &Offender) -> String {
    let data = offender.data_part.as_deref().unwrap_or("");
    let min = option.min.map(|m| m.to_string()).unwrap_or_default();
    let max = option.max.map(|m| m.to_string()).unwrap_or_default();

    match violation {
        Violation::InvalidBooleanSyntax => format!(
            "Invalid value for boolean option '{}': '{}' is not a boolean.",
            option.name, data
        ),
        Violation::InvalidStringSyntax => {
            format!("String option '{}' requires a value.", option.name)
        }
        Violation::InvalidNumberSyntax => {
            format!("Number option '{}' requires a value.", option.name)
        }
        Violation::InvalidNumberValue => format!(
            "Invalid value for number option '{}': '{}' is not a number.",
            option.name, data
        ),
        Violation::ExpectedInt => format!(
            "Invalid value for number option '{}': expected an integer, got '{}'.",
            option.name, data
        ),
        Violation::BelowMin => format!(
            "Invalid value for number option '{}': {} is below the minimum of {}.",
            option.name, data, min
        ),
        Violation::AboveMax => format!(
            "Invalid value for number option '{}': {} is above the maximum of {}.",
            option.name, data, max
        ),
        Violation::EnumViolation => {
            let choices = option.choices.as_deref().unwrap_or(&[]);
            format!(
                "Invalid value for option '{}': expected one of [ {} ], got '{}'.",
                option.name,
                choices.join(" | "),
                data
            )
        }
    }
}

/// The command list shown when help is requested outside any command.
pub fn render_global_help(tree: &CommandTree) -> String {
    let visible: Vec<&CommandNode> = tree
        .roots()
        .iter()
        .map(|id| tree.get(*id))
        .filter(|n| !n.hidden)
        .collect();

    let mut out = String::from("Here's the list of all available commands:");

    if visible.is_empty() {
        out.push_str("\n  (no commands defined)");
    } else {
        out.push('\n');
        out.push_str(&command_table(&visible));
    }

    out.push_str("\nTo read the details about any particular command type: [commandName] --help");
    out
}

/// Usage text for one resolved command.
pub fn render_command_help(tree: &CommandTree, id: CommandId) -> String {
    let node = tree.get(id);
    let path = tree.name_path(id);

    let mut header = format!("Command: {}", path);
    if !node.aliases.is_empty() {
        header.push_str(&format!(" [{}]", node.aliases.join(", ")));
    }
    if let Some(desc) = &node.description {
        header.push_str(&format!(" - {}", desc));
    }

    let mut blocks = vec![header];

    let positionals: Vec<&OptionConfig> = node
        .options
        .iter()
        .map(|(_, c)| c)
        .filter(|c| c.kind == OptionKind::Positional && !c.hidden)
        .collect();
    let flags: Vec<&OptionConfig> = node
        .options
        .iter()
        .map(|(_, c)| c)
        .filter(|c| c.kind != OptionKind::Positional && !c.hidden)
        .collect();

    let mut usage = format!("  {}", path);
    if node.has_subcommands() {
        usage.push_str(" <subcommand>");
    }
    for pos in &positionals {
        if pos.required {
            usage.push_str(&format!(" <{}>", pos.name));
        } else {
            usage.push_str(&format!(" [{}]", pos.name));
        }
    }
    if !flags.is_empty() {
        usage.push_str(" [options]");
    }
    blocks.push(format!("Usage:\n{}", usage));

    if !flags.is_empty() {
        let labels: Vec<String> = flags.iter().map(|c| option_label(c)).collect();
        let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let mut lines = vec!["Options:".to_string()];
        for (cfg, label) in flags.iter().zip(&labels) {
            let marker = if cfg.required { '!' } else { ' ' };
            let mut line = format!("  {} {}", marker, pad(label, width));

            let mut tail = String::new();
            if let Some(desc) = &cfg.description {
                tail.push_str(desc);
            }
            if !cfg.default.is_undefined() {
                if !tail.is_empty() {
                    tail.push(' ');
                }
                tail.push_str(&format!("(default: {})", cfg.default));
            }
            if !tail.is_empty() {
                line.push_str("  ");
                line.push_str(&tail);
            }

            lines.push(line.trim_end().to_string());
        }
        blocks.push(lines.join("\n"));
    }

    if node.has_subcommands() {
        let subs: Vec<&CommandNode> = node
            .subcommands
            .iter()
            .map(|s| tree.get(*s))
            .filter(|n| !n.hidden)
            .collect();
        if !subs.is_empty() {
            blocks.push(format!("Subcommands:\n{}", command_table(&subs)));
        }
    }

    blocks.join("\n\n")
}

/// Aligned rows of name, aliases and one-line description.
fn command_table(nodes: &[&CommandNode]) -> String {
    let name_width = nodes.iter().map(|n| n.name.chars().count()).max().unwrap_or(0);
    let alias_strings: Vec<String> = nodes
        .iter()
        .map(|n| {
            if n.aliases.is_empty() {
                "-".to_string()
            } else {
                n.aliases.join(", ")
            }
        })
        .collect();
    let alias_width = alias_strings.iter().map(|a| a.chars().count()).max().unwrap_or(0);

    let mut lines = Vec::new();
    for (node, aliases) in nodes.iter().zip(&alias_strings) {
        let desc = node
            .short_description
            .as_deref()
            .or(node.description.as_deref())
            .unwrap_or("-");
        let line = format!(
            "  {}  {}  {}",
            pad(&node.name, name_width),
            pad(aliases, alias_width),
            desc
        );
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// `-d, --dialect [ pg | mysql ]` style label for the options table.
fn option_label(cfg: &OptionConfig) -> String {
    let mut label = String::new();
    for alias in &cfg.aliases {
        label.push_str(alias);
        label.push_str(", ");
    }
    label.push_str(&cfg.name);

    let annotation = option_annotation(cfg);
    if !annotation.is_empty() {
        label.push(' ');
        label.push_str(&annotation);
    }
    label
}

/// Allowed-values or numeric-range suffix, empty when unconstrained.
fn option_annotation(cfg: &OptionConfig) -> String {
    if let Some(choices) = &cfg.choices {
        return format!("[ {} ]", choices.join(" | "));
    }

    if cfg.min.is_some() || cfg.max.is_some() {
        let low = match cfg.min {
            Some(min) => format!("[ {}", min),
            None => "( ∞".to_string(),
        };
        let high = match cfg.max {
            Some(max) => format!("{} ]", max),
            None => "∞ )".to_string(),
        };
        return format!("{} ; {}", low, high);
    }

    String::new()
}

fn pad(input: &str, width: usize) -> String {
    let len = input.chars().count();
    if len >= width {
        input.to_string()
    } else {
        format!("{}{}", input, " ".repeat(width - len))
    }
}
