use crate::output::print_json;
use anyhow::Context;
use changespec_core::{config::Config, io, paths};
use std::path::Path;

const EMPTY_PROJECT: &[u8] = b"changespecs: []\n";

pub fn run(root: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let project_name = match name {
        Some(n) => n.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string()),
    };

    let dir = paths::changespec_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_created = if paths::config_path(root).exists() {
        false
    } else {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
        true
    };

    // An existing config may point at a different project file.
    let config = Config::load(root).context("failed to load config")?;
    let project_path = config.project_path(root);
    let project_created = io::write_if_missing(&project_path, EMPTY_PROJECT)
        .with_context(|| format!("failed to write {}", project_path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "project": config.project.name,
            "config_created": config_created,
            "project_file": project_path.display().to_string(),
            "project_file_created": project_created,
        }))?;
    } else {
        println!("Initialized changespec tracking in: {}", root.display());
        let label = |created: bool| if created { "created:" } else { "exists: " };
        println!("  {} {}", label(config_created), paths::CONFIG_FILE);
        println!(
            "  {} {}/{}",
            label(project_created),
            paths::CHANGESPEC_DIR,
            config.project.file
        );
    }
    Ok(())
}
