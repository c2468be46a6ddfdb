use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CHANGESPEC_DIR: &str = ".changespec";
pub const CONFIG_FILE: &str = ".changespec/config.yaml";
pub const DEFAULT_PROJECT_FILE: &str = "changespecs.yaml";
pub const LOCK_EXTENSION: &str = "lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn changespec_dir(root: &Path) -> PathBuf {
    root.join(CHANGESPEC_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn project_path(root: &Path, file: &str) -> PathBuf {
    changespec_dir(root).join(file)
}

/// `<project file>.lock`, next to the project file.
pub fn lock_path(project: &Path) -> PathBuf {
    let mut name = project.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(LOCK_EXTENSION);
    project.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.changespec/config.yaml")
        );
        assert_eq!(
            project_path(root, DEFAULT_PROJECT_FILE),
            PathBuf::from("/tmp/proj/.changespec/changespecs.yaml")
        );
        assert_eq!(
            lock_path(&project_path(root, "work.yaml")),
            PathBuf::from("/tmp/proj/.changespec/work.yaml.lock")
        );
    }
}
