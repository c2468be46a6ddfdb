use crate::output::{print_json, print_table};
use anyhow::Context;
use changespec_core::{
    changespec::ChangeSpec,
    config::WarnLevel,
    project::StatusChange,
    status::BaseStatus,
    suffix::StatusSuffix,
};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ChangeSpecSubcommand {
    /// Create a new ChangeSpec in WIP
    Create {
        name: String,
        /// Free-text description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Name of the ChangeSpec this one is stacked on
        #[arg(long)]
        parent: Option<String>,
        /// Do not attach the hooks listed in hooks.defaults
        #[arg(long)]
        no_default_hooks: bool,
    },
    /// List ChangeSpecs
    List {
        /// Only show ChangeSpecs with this base status
        #[arg(long)]
        status: Option<String>,
    },
    /// Show full details for a single ChangeSpec
    Show { name: String },
    /// Move a ChangeSpec to another status and/or change its decorations
    Status {
        name: String,
        /// Target base status (omit to only change decorations)
        status: Option<String>,
        /// Set the workspace label shown as `Status (<label>)`
        #[arg(long, conflicts_with = "clear_workspace")]
        workspace: Option<String>,
        /// Remove the workspace label
        #[arg(long)]
        clear_workspace: bool,
        /// Mark a Drafted ChangeSpec ready to mail
        #[arg(long, conflicts_with = "not_ready")]
        ready_to_mail: bool,
        /// Remove the ready-to-mail marker
        #[arg(long)]
        not_ready: bool,
    },
    /// Mark a ChangeSpec Reverted and rename it to the next free `name__N`
    Revert { name: String },
    /// Check the project file and config for problems
    Validate,
}

pub fn run(root: &Path, subcmd: ChangeSpecSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ChangeSpecSubcommand::Create {
            name,
            description,
            parent,
            no_default_hooks,
        } => create(root, &name, &description, parent, no_default_hooks, json),
        ChangeSpecSubcommand::List { status } => list(root, status.as_deref(), json),
        ChangeSpecSubcommand::Show { name } => show(root, &name, json),
        ChangeSpecSubcommand::Status {
            name,
            status,
            workspace,
            clear_workspace,
            ready_to_mail,
            not_ready,
        } => {
            let change = StatusChange {
                target: status.as_deref().map(str::parse).transpose()?,
                workspace: if clear_workspace {
                    Some(None)
                } else {
                    workspace.map(Some)
                },
                ready_to_mail: match (ready_to_mail, not_ready) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            set_status(root, &name, change, json)
        }
        ChangeSpecSubcommand::Revert { name } => revert(root, &name, json),
        ChangeSpecSubcommand::Validate => validate(root, json),
    }
}

fn create(
    root: &Path,
    name: &str,
    description: &str,
    parent: Option<String>,
    no_default_hooks: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (config, store) = super::open(root)?;

    let mut cs = ChangeSpec::new(name, description);
    cs.parent = parent;
    if !no_default_hooks {
        for command in config.hooks.defaults.iter().filter(|c| !c.trim().is_empty()) {
            if cs.hook(command).is_none() {
                cs.add_hook(command.as_str())?;
            }
        }
    }
    let hooks = cs.hooks.len();

    store
        .update(|p| p.create(cs))
        .with_context(|| format!("failed to create '{name}'"))?;
    tracing::debug!(name, hooks, "created changespec");

    if json {
        print_json(&serde_json::json!({ "name": name, "status": "WIP", "hooks": hooks }))?;
    } else {
        println!("Created ChangeSpec '{name}' (WIP, {hooks} hooks)");
    }
    Ok(())
}

fn list(root: &Path, status: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    let project = store.load().context("failed to load project file")?;
    let wanted: Option<BaseStatus> = status.map(str::parse).transpose()?;

    let specs: Vec<&ChangeSpec> = project
        .changespecs
        .iter()
        .filter(|cs| wanted.is_none_or(|s| cs.status.base == s))
        .collect();

    if json {
        return print_json(&specs);
    }

    let rows = specs
        .iter()
        .map(|cs| {
            vec![
                cs.name.clone(),
                cs.status.to_string(),
                cs.parent.clone().unwrap_or_else(|| "-".to_string()),
                cs.commits.len().to_string(),
                cs.hooks.len().to_string(),
            ]
        })
        .collect();
    print_table(
        &["NAME", "STATUS", "PARENT", "COMMITS", "HOOKS"],
        rows,
        "No ChangeSpecs.",
    );
    Ok(())
}

fn suffix_label(suffix: Option<&StatusSuffix>) -> String {
    suffix.map(|s| format!(" ({s})")).unwrap_or_default()
}

fn show(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    let project = store.load().context("failed to load project file")?;
    let cs = project
        .get(name)
        .with_context(|| format!("changespec '{name}' not found"))?;

    if json {
        return print_json(cs);
    }

    println!("Name:        {}", cs.name);
    println!("Status:      {}", cs.status);
    if let Some(parent) = &cs.parent {
        let satisfied = if project.parent_satisfied(cs) {
            ""
        } else {
            " (not mailed yet)"
        };
        println!("Parent:      {parent}{satisfied}");
    }
    if !cs.description.is_empty() {
        println!("Description: {}", cs.description);
    }

    if !cs.commits.is_empty() {
        println!("\nCommits:");
        for c in &cs.commits {
            println!("  ({}) {}{}", c.entry, c.note, suffix_label(c.suffix.as_ref()));
        }
    }

    if !cs.hooks.is_empty() {
        println!("\nHooks:");
        for h in &cs.hooks {
            println!("  {}", h.command);
            for l in &h.status_lines {
                let duration = l
                    .duration_secs
                    .map(|d| format!(" {d}s"))
                    .unwrap_or_default();
                println!(
                    "    ({}) {} {}{}{}",
                    l.entry,
                    l.status,
                    l.timestamp.format("%y%m%d_%H%M%S"),
                    duration,
                    suffix_label(l.suffix.as_ref())
                );
            }
        }
    }

    if !cs.comments.is_empty() {
        println!("\nComments:");
        for c in &cs.comments {
            println!(
                "  [{}] {}{}",
                c.reviewer,
                c.file_path,
                suffix_label(c.suffix.as_ref())
            );
        }
    }
    Ok(())
}

fn set_status(root: &Path, name: &str, change: StatusChange, json: bool) -> anyhow::Result<()> {
    if change.is_empty() {
        anyhow::bail!("nothing to change: give a status or a decoration flag");
    }
    let action = match change.target {
        Some(target) => format!("move '{name}' to {target}"),
        None => format!("update status of '{name}'"),
    };
    let (_, store) = super::open(root)?;
    let new_status = store
        .update(|p| p.apply_status_change(name, change).map(ToString::to_string))
        .with_context(|| format!("failed to {action}"))?;
    tracing::debug!(name, status = %new_status, "status changed");

    if json {
        print_json(&serde_json::json!({ "name": name, "status": new_status }))?;
    } else {
        println!("'{name}' is now {new_status}");
    }
    Ok(())
}

fn revert(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    let new_name = store
        .update(|p| p.revert(name))
        .with_context(|| format!("failed to revert '{name}'"))?;

    if json {
        print_json(&serde_json::json!({
            "name": name,
            "renamed_to": new_name,
            "status": "Reverted",
        }))?;
    } else {
        println!("Reverted '{name}' as '{new_name}'");
    }
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let (config, store) = super::open(root)?;
    let project = store.load().context("failed to load project file")?;
    let warnings = config.validate();
    let result = project.validate();
    let config_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);

    if json {
        print_json(&serde_json::json!({
            "changespecs": project.changespecs.len(),
            "config_warnings": warnings,
            "error": result.as_ref().err().map(ToString::to_string),
        }))?;
    } else {
        for w in &warnings {
            println!("config: {}", w.message);
        }
    }

    result.context("project file is invalid")?;
    if config_errors {
        anyhow::bail!("config has errors");
    }
    if !json {
        println!("OK: {} ChangeSpecs", project.changespecs.len());
    }
    Ok(())
}
