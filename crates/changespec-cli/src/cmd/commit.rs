use crate::output::print_json;
use anyhow::Context;
use changespec_core::entry::{add_commit, add_proposal};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum CommitSubcommand {
    /// Add a commit entry, or a proposal against an existing entry
    Add {
        name: String,
        #[arg(required = true)]
        note: Vec<String>,
        /// Regular entry number to propose against (creates e.g. `2a`)
        #[arg(long)]
        proposal: Option<u32>,
    },
}

pub fn run(root: &Path, subcmd: CommitSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CommitSubcommand::Add {
            name,
            note,
            proposal,
        } => add(root, &name, &note.join(" "), proposal, json),
    }
}

fn add(root: &Path, name: &str, note: &str, proposal: Option<u32>, json: bool) -> anyhow::Result<()> {
    let (_, store) = super::open(root)?;
    let entry = store
        .update(|p| {
            let cs = p.get_mut(name)?;
            match proposal {
                Some(number) => add_proposal(&mut cs.commits, number, note),
                None => Ok(add_commit(&mut cs.commits, note)),
            }
        })
        .with_context(|| format!("failed to add entry to '{name}'"))?;
    tracing::debug!(name, entry = %entry, "added commit entry");

    if json {
        print_json(&serde_json::json!({
            "name": name,
            "entry": entry.to_string(),
            "proposal": entry.is_proposal(),
            "note": note,
        }))?;
    } else {
        println!("Added ({entry}) to '{name}': {note}");
    }
    Ok(())
}
