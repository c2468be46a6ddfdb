use crate::output::{print_json, print_table};
use anyhow::Context;
use changespec_core::{
    changespec::ChangeSpec,
    query::{self, Expr},
};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum QuerySubcommand {
    /// Show ChangeSpecs matching a query
    ///
    /// Bare words and "quoted strings" match name, description, status and
    /// parent case-insensitively; c"..." matches case-sensitively. Combine
    /// with AND/OR/NOT (or `!`) and parentheses; juxtaposition means AND.
    /// Shorthands: !!! (error suffix), !! (no error suffix), @@@ (agent
    /// running), $$$ (hook running), !@$ (any of those).
    Run {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Print the canonical form of a query
    Canonical {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Run a query saved in config.yaml (omit the name to list them)
    Saved { name: Option<String> },
}

pub fn run(root: &Path, subcmd: QuerySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        QuerySubcommand::Run { query } => run_query(root, &query.join(" "), json),
        QuerySubcommand::Canonical { query } => canonical(&query.join(" "), json),
        QuerySubcommand::Saved { name } => saved(root, name.as_deref(), json),
    }
}

fn parse(text: &str) -> anyhow::Result<Expr> {
    query::parse(text).with_context(|| format!("invalid query: {text}"))
}

fn run_query(root: &Path, text: &str, json: bool) -> anyhow::Result<()> {
    let expr = parse(text)?;
    tracing::debug!(query = %query::to_canonical_string(&expr), "running query");
    let (_, store) = super::open(root)?;
    let project = store.load().context("failed to load project file")?;
    print_matches(&project.filter(&expr), json)
}

fn canonical(text: &str, json: bool) -> anyhow::Result<()> {
    let canonical = query::to_canonical_string(&parse(text)?);
    if json {
        print_json(&serde_json::json!({ "query": text, "canonical": canonical }))?;
    } else {
        println!("{canonical}");
    }
    Ok(())
}

fn saved(root: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (config, store) = super::open(root)?;

    let Some(name) = name else {
        if json {
            return print_json(&config.queries);
        }
        let rows = config
            .queries
            .iter()
            .map(|(name, text)| vec![name.clone(), text.clone()])
            .collect();
        print_table(&["NAME", "QUERY"], rows, "No saved queries.");
        return Ok(());
    };

    let expr = config
        .saved_query(name)
        .with_context(|| format!("failed to load saved query '{name}'"))?;
    let project = store.load().context("failed to load project file")?;
    print_matches(&project.filter(&expr), json)
}

fn print_matches(matches: &[&ChangeSpec], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&matches);
    }
    let rows = matches
        .iter()
        .map(|cs| {
            vec![
                cs.name.clone(),
                cs.status.to_string(),
                cs.description.lines().next().unwrap_or_default().to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "STATUS", "DESCRIPTION"], rows, "No matches.");
    Ok(())
}
