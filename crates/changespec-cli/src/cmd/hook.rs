use crate::output::{print_json, print_table};
use anyhow::Context;
use changespec_core::{
    changespec::ChangeSpec,
    entry::CommitEntryRef,
    hook::{self, HookEntry, HookStatus},
    project::ProjectFile,
    suffix::StatusSuffix,
};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum HookSubcommand {
    /// Attach a hook command to a ChangeSpec (`!` and `$` prefixes allowed)
    Add { name: String, command: String },
    /// Record a hook result for a commit entry
    Record {
        name: String,
        command: String,
        entry: String,
        /// RUNNING, PASSED or FAILED
        status: String,
        /// Run time in seconds
        #[arg(long)]
        duration: Option<u64>,
        /// Suffix text; a leading `!:` marks an error
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Claim an unclaimed failure with a PID, agent timestamp or proposal reference
    Claim {
        name: String,
        command: String,
        entry: String,
        marker: String,
    },
    /// Show commit entries each hook should be started for
    Due {
        /// Only this ChangeSpec
        name: Option<String>,
    },
    /// List hooks that are running or being worked by an agent
    Running,
    /// List hooks whose latest regular-entry failure needs a fix
    Fixable,
    /// List hooks whose latest proposal failure needs a summary
    Summarizable,
}

pub fn run(root: &Path, subcmd: HookSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        HookSubcommand::Add { name, command } => add(root, &name, &command, json),
        HookSubcommand::Record {
            name,
            command,
            entry,
            status,
            duration,
            suffix,
        } => record(
            root,
            &name,
            &command,
            &entry,
            &status,
            duration,
            suffix.as_deref(),
            json,
        ),
        HookSubcommand::Claim {
            name,
            command,
            entry,
            marker,
        } => claim(root, &name, &command, &entry, &marker, json),
        HookSubcommand::Due { name } => due(root, name.as_deref(), json),
        HookSubcommand::Running => running(root, json),
        HookSubcommand::Fixable => failing(root, false, json),
        HookSubcommand::Summarizable => failing(root, true, json),
    }
}

fn load(root: &Path) -> anyhow::Result<ProjectFile> {
    let (_, store) = super::open(root)?;
    store.load().context("failed to load project file")
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

fn add(root: &Path, name: &str, command: &str, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    store
        .update(|p| p.get_mut(name)?.add_hook(command))
        .with_context(|| format!("failed to add hook to '{name}'"))?;

    if json {
        print_json(&serde_json::json!({ "name": name, "command": command }))?;
    } else {
        println!("Added hook to '{name}': {command}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn record(
    root: &Path,
    name: &str,
    command: &str,
    entry: &str,
    status: &str,
    duration: Option<u64>,
    suffix: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let entry: CommitEntryRef = entry.parse()?;
    let status: HookStatus = status.parse()?;
    let suffix = suffix.map(StatusSuffix::parse);

    let (_, store) = super::open(root)?;
    let stored_suffix = store
        .update(|p| {
            let hook = p.get_mut(name)?.hook_mut(command)?;
            hook.record_status(entry, status, duration, suffix);
            Ok(hook
                .latest_status_for(entry)
                .and_then(|l| l.suffix.as_ref())
                .map(ToString::to_string))
        })
        .with_context(|| format!("failed to record hook result on '{name}'"))?;
    tracing::debug!(name, command, entry = %entry, status = %status, "recorded hook status");

    if json {
        print_json(&serde_json::json!({
            "name": name,
            "command": command,
            "entry": entry.to_string(),
            "status": status,
            "suffix": stored_suffix,
        }))?;
    } else {
        let suffix = stored_suffix.map(|s| format!(" ({s})")).unwrap_or_default();
        println!("Recorded ({entry}) {status}{suffix} for '{command}' on '{name}'");
    }
    Ok(())
}

fn claim(
    root: &Path,
    name: &str,
    command: &str,
    entry: &str,
    marker: &str,
    json: bool,
) -> anyhow::Result<()> {
    let entry: CommitEntryRef = entry.parse()?;
    let (_, store) = super::open(root)?;
    let claimed = store
        .update(|p| Ok(p.get_mut(name)?.hook_mut(command)?.claim_failure(entry, marker)))
        .with_context(|| format!("failed to claim hook failure on '{name}'"))?;
    if !claimed {
        anyhow::bail!("no unclaimed failure for ({entry}) on '{command}'");
    }

    if json {
        print_json(&serde_json::json!({
            "name": name,
            "command": command,
            "entry": entry.to_string(),
            "marker": marker,
        }))?;
    } else {
        println!("Claimed ({entry}) failure of '{command}' with {marker}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

fn due(root: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let project = load(root)?;
    let specs: Vec<&ChangeSpec> = match name {
        Some(n) => vec![project
            .get(n)
            .with_context(|| format!("changespec '{n}' not found"))?],
        // Terminal records never run hooks again.
        None => project
            .changespecs
            .iter()
            .filter(|cs| !cs.status.base.is_terminal())
            .collect(),
    };

    let mut items = Vec::new();
    for cs in specs {
        for (hook, entries) in cs.hooks_due() {
            let entries: Vec<String> = entries.iter().map(ToString::to_string).collect();
            items.push((cs.name.as_str(), hook.command.as_str(), entries));
        }
    }

    if json {
        let out: Vec<_> = items
            .iter()
            .map(|(name, command, entries)| {
                serde_json::json!({ "name": name, "command": command, "entries": entries })
            })
            .collect();
        return print_json(&out);
    }

    let rows = items
        .into_iter()
        .map(|(name, command, entries)| {
            vec![name.to_string(), command.to_string(), entries.join(",")]
        })
        .collect();
    print_table(&["NAME", "HOOK", "ENTRIES"], rows, "No hooks due.");
    Ok(())
}

fn running(root: &Path, json: bool) -> anyhow::Result<()> {
    let project = load(root)?;
    let items: Vec<(&str, &HookEntry)> = project
        .changespecs
        .iter()
        .flat_map(|cs| {
            cs.hooks
                .iter()
                .filter(|h| hook::hook_has_any_running_status(h))
                .map(move |h| (cs.name.as_str(), h))
        })
        .collect();
    report(items, "No running hooks.", json)
}

fn failing(root: &Path, proposals: bool, json: bool) -> anyhow::Result<()> {
    let project = load(root)?;
    let items: Vec<(&str, &HookEntry)> = project
        .changespecs
        .iter()
        .flat_map(|cs| {
            let hooks = if proposals {
                hook::failing_hooks_for_summarize(&cs.hooks)
            } else {
                hook::failing_hooks_for_fix(&cs.hooks)
            };
            hooks.into_iter().map(move |h| (cs.name.as_str(), h))
        })
        .collect();
    let empty = if proposals {
        "No failures to summarize."
    } else {
        "No failures to fix."
    };
    report(items, empty, json)
}

fn report(items: Vec<(&str, &HookEntry)>, empty: &str, json: bool) -> anyhow::Result<()> {
    let latest = |h: &HookEntry| {
        h.most_recent()
            .map(|l| (l.entry.to_string(), l.status.to_string()))
            .unwrap_or_default()
    };

    if json {
        let out: Vec<_> = items
            .iter()
            .map(|(name, h)| {
                let (entry, status) = latest(*h);
                serde_json::json!({
                    "name": name,
                    "command": h.command,
                    "entry": entry,
                    "status": status,
                })
            })
            .collect();
        return print_json(&out);
    }

    let rows = items
        .iter()
        .map(|(name, h)| {
            let (entry, status) = latest(*h);
            vec![name.to_string(), h.command.clone(), entry, status]
        })
        .collect();
    print_table(&["NAME", "HOOK", "ENTRY", "STATUS"], rows, empty);
    Ok(())
}
