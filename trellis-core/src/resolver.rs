//! Command resolution.
//!
//! Resolution runs in two phases. A pre-scan walks the token list and
//! collects command-position candidates, skipping flag tokens and the values
//! they consume. Descent then matches one candidate per forest level,
//! removing each matched token from the list by index so the surviving
//! tokens reach the option parser exactly as written.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::event::Event;
use crate::token;
use crate::tree::{CommandId, CommandTree};

/// A token eligible to name a command, with its index in the original list.
#[derive(Debug, Clone)]
struct Candidate {
    text: String,
    index: usize,
}

/// Outcome of command resolution.
#[derive(Debug)]
pub(crate) enum Resolution {
    /// One command matched; the returned tokens belong to its options.
    Command(CommandId),
    /// The first candidate was the `help` pseudo-command.
    Help,
    /// No candidate tokens were present.
    None,
}

/// Resolves `args` against the forest.
///
/// On success returns the resolution and the surviving tokens; on failure
/// returns the resolution event describing the first unmatched candidate.
pub(crate) fn resolve(
    tree: &Arc<CommandTree>,
    args: &[String],
) -> Result<(Resolution, Vec<String>), Event> {
    let candidates = scan_candidates(args);
    trace!(candidates = candidates.len(), "scanned command candidates");

    let Some(first) = candidates.first() else {
        return Ok((Resolution::None, args.to_vec()));
    };

    if first.text == "help" {
        let remaining = remove_index(args, first.index);
        return Ok((Resolution::Help, remaining));
    }

    let first_text = first.text.clone();
    match descend(tree, tree.roots(), &candidates, args)? {
        Some((id, remaining)) => {
            debug!(command = %tree.name_path(id), "resolved command");
            Ok((Resolution::Command(id), remaining))
        }
        None => Err(Event::UnknownCommand {
            offender: first_text,
        }),
    }
}

/// Matches the first candidate against `group`, recursing into subcommands
/// while candidates remain.
///
/// `Ok(None)` means the candidate matched nothing at this level; the root
/// caller turns that into `UnknownCommand`, while a recursing caller reports
/// `UnknownSubcommand` against the command it had already matched.
fn descend(
    tree: &Arc<CommandTree>,
    group: &[CommandId],
    candidates: &[Candidate],
    args: &[String],
) -> Result<Option<(CommandId, Vec<String>)>, Event> {
    let Some((candidate, rest)) = candidates.split_first() else {
        return Ok(None);
    };

    let Some(id) = tree.find_in(group, &candidate.text) else {
        return Ok(None);
    };

    let remaining = remove_index(args, candidate.index);
    let node = tree.get(id);

    if rest.is_empty() || !node.has_subcommands() {
        return Ok(Some((id, remaining)));
    }

    // Removing the matched token shifts every later candidate left by one.
    let rebased: Vec<Candidate> = rest
        .iter()
        .map(|c| Candidate {
            text: c.text.clone(),
            index: c.index - 1,
        })
        .collect();

    match descend(tree, &node.subcommands, &rebased, &remaining)? {
        Some(found) => Ok(Some(found)),
        None => {
            let offender = rebased.first().map(|c| c.text.clone()).unwrap_or_default();
            Err(Event::UnknownSubcommand {
                tree: Arc::clone(tree),
                command: id,
                offender,
            })
        }
    }
}

/// Collects command-position candidates.
///
/// Reserved help/version tokens are skipped along with a trailing boolean
/// word; other flags skip the token they would consume as a value.
fn scan_candidates(args: &[String]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if token::is_reserved_flag(arg) {
            if args.get(i + 1).is_some_and(|next| token::is_bool_word(next)) {
                i += 1;
            }
            i += 1;
            continue;
        }

        if token::is_flag(arg) {
            if token::consumes_next(arg) {
                i += 1;
            }
            i += 1;
            continue;
        }

        candidates.push(Candidate {
            text: arg.clone(),
            index: i,
        });
        i += 1;
    }

    candidates
}

fn remove_index(args: &[String], index: usize) -> Vec<String> {
    let mut out = args.to_vec();
    out.remove(index);
    out
}
