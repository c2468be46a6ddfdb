use changespec_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `CHANGESPEC_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.changespec/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_marker_upward(&cwd, paths::CHANGESPEC_DIR)
        .or_else(|| find_marker_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_marker_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_changespec_dir_above() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".changespec")).unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(
            find_marker_upward(&subdir, paths::CHANGESPEC_DIR).as_deref(),
            Some(dir.path())
        );
    }

    #[test]
    fn changespec_dir_beats_git_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".changespec")).unwrap();
        let nested = dir.path().join("repo");
        std::fs::create_dir_all(nested.join(".git")).unwrap();
        assert_eq!(
            find_marker_upward(&nested, paths::CHANGESPEC_DIR).as_deref(),
            Some(dir.path())
        );
        assert_eq!(
            find_marker_upward(&nested, ".git").as_deref(),
            Some(nested.as_path())
        );
    }
}
