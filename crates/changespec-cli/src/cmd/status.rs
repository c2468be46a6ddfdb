use crate::output::{print_json, print_table};
use changespec_core::status::{self, BaseStatus};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum StatusSubcommand {
    /// Check whether moving between two statuses is allowed
    ///
    /// Decorations such as a workspace label or the ready-to-mail marker are
    /// ignored. Unknown statuses are never valid.
    Check { from: String, to: String },
    /// Print the transition table
    Table,
}

pub fn run(subcmd: StatusSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StatusSubcommand::Check { from, to } => check(&from, &to, json),
        StatusSubcommand::Table => table(json),
    }
}

fn check(from: &str, to: &str, json: bool) -> anyhow::Result<()> {
    let valid = status::is_valid_transition(from, to);
    if json {
        print_json(&serde_json::json!({ "from": from, "to": to, "valid": valid }))?;
    } else if valid {
        println!("allowed: {from} -> {to}");
    } else {
        println!("not allowed: {from} -> {to}");
    }
    Ok(())
}

fn table(json: bool) -> anyhow::Result<()> {
    let edges: Vec<(BaseStatus, Vec<&str>)> = BaseStatus::all()
        .iter()
        .map(|s| (*s, s.successors().iter().map(|t| t.as_str()).collect()))
        .collect();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = edges
            .iter()
            .map(|(s, next)| (s.to_string(), serde_json::json!(next)))
            .collect();
        return print_json(&map);
    }

    let rows = edges
        .into_iter()
        .map(|(s, next)| {
            let next = if next.is_empty() {
                "(terminal)".to_string()
            } else {
                next.join(", ")
            };
            vec![s.to_string(), next]
        })
        .collect();
    print_table(&["FROM", "TO"], rows, "");
    Ok(())
}
