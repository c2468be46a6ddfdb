use crate::changespec::ChangeSpec;
use crate::config::Config;
use crate::error::{ChangeSpecError, Result};
use crate::paths;
use crate::query::{self, Expr};
use crate::status::{BaseStatus, Status};
use crate::suffix;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// StatusChange
// ---------------------------------------------------------------------------

/// A requested change to a record's status and its decorations. The
/// transition, if any, is applied before the decorations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusChange {
    pub target: Option<BaseStatus>,
    /// `Some(None)` clears the workspace label.
    pub workspace: Option<Option<String>>,
    pub ready_to_mail: Option<bool>,
}

impl StatusChange {
    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.workspace.is_none() && self.ready_to_mail.is_none()
    }
}

// ---------------------------------------------------------------------------
// ProjectFile
// ---------------------------------------------------------------------------

/// Every ChangeSpec of one project, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub changespecs: Vec<ChangeSpec>,
}

impl ProjectFile {
    /// A missing file is an empty project.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let project: ProjectFile = serde_yaml::from_str(&data)?;
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn get(&self, name: &str) -> Option<&ChangeSpec> {
        self.changespecs.iter().find(|cs| cs.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut ChangeSpec> {
        self.changespecs
            .iter_mut()
            .find(|cs| cs.name == name)
            .ok_or_else(|| ChangeSpecError::NotFound(name.to_string()))
    }

    fn require(&self, name: &str) -> Result<&ChangeSpec> {
        self.get(name)
            .ok_or_else(|| ChangeSpecError::NotFound(name.to_string()))
    }

    pub fn filter(&self, expr: &Expr) -> Vec<&ChangeSpec> {
        query::filter(expr, &self.changespecs)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append a new record. Its parent, if any, must already exist.
    pub fn create(&mut self, cs: ChangeSpec) -> Result<()> {
        ChangeSpec::validate_name(&cs.name)?;
        if self.get(&cs.name).is_some() {
            return Err(ChangeSpecError::AlreadyExists(cs.name));
        }
        if let Some(parent) = cs.parent.as_deref() {
            if parent == cs.name {
                return Err(ChangeSpecError::ParentCycle(format!("{parent} -> {parent}")));
            }
            self.require(parent)?;
        }
        self.changespecs.push(cs);
        Ok(())
    }

    /// A missing parent counts as satisfied.
    pub fn parent_satisfied(&self, cs: &ChangeSpec) -> bool {
        match cs.parent.as_deref().and_then(|p| self.get(p)) {
            Some(parent) => matches!(
                parent.status.base,
                BaseStatus::Mailed | BaseStatus::Submitted
            ),
            None => true,
        }
    }

    /// Move `name` to `target`. Mailing additionally requires the parent to
    /// be mailed or submitted.
    pub fn transition(&mut self, name: &str, target: BaseStatus) -> Result<()> {
        let cs = self.require(name)?;
        cs.status.check_transition(target)?;
        if target == BaseStatus::Mailed && !self.parent_satisfied(cs) {
            return Err(ChangeSpecError::InvalidTransition {
                from: cs.status.base.to_string(),
                to: target.to_string(),
                reason: format!(
                    "parent '{}' is not Mailed or Submitted",
                    cs.parent.as_deref().unwrap_or_default()
                ),
            });
        }
        self.get_mut(name)?.transition(target)
    }

    pub fn apply_status_change(&mut self, name: &str, change: StatusChange) -> Result<&Status> {
        if let Some(target) = change.target {
            self.transition(name, target)?;
        }
        let cs = self.get_mut(name)?;
        if let Some(label) = change.workspace {
            cs.status.set_workspace(label);
        }
        if let Some(ready) = change.ready_to_mail {
            cs.status.set_ready_to_mail(ready)?;
        }
        Ok(&cs.status)
    }

    /// Smallest `base__N` (N >= 1) not used by any record.
    pub fn next_revision_name(&self, base: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = suffix::revision_name(base, n);
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Mark `name` Reverted and rename it to the next free revision name,
    /// freeing the base name for a fresh attempt. Returns the new name.
    pub fn revert(&mut self, name: &str) -> Result<String> {
        let cs = self.require(name)?;
        if cs.status.base == BaseStatus::Reverted {
            return Err(ChangeSpecError::InvalidTransition {
                from: cs.status.base.to_string(),
                to: BaseStatus::Reverted.to_string(),
                reason: "already reverted".to_string(),
            });
        }
        let new_name = self.next_revision_name(cs.base_name());
        let cs = self.get_mut(name)?;
        cs.status = Status::new(BaseStatus::Reverted);
        cs.name = new_name.clone();
        Ok(new_name)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for cs in &self.changespecs {
            ChangeSpec::validate_name(&cs.name)?;
            if !seen.insert(cs.name.as_str()) {
                return Err(ChangeSpecError::AlreadyExists(cs.name.clone()));
            }
        }
        if let Some(cycle) = self.find_parent_cycle() {
            return Err(ChangeSpecError::ParentCycle(cycle.join(" -> ")));
        }
        Ok(())
    }

    fn find_parent_cycle(&self) -> Option<Vec<&str>> {
        for start in &self.changespecs {
            let mut chain = vec![start.name.as_str()];
            let mut current = start;
            while let Some(parent) = current.parent.as_deref() {
                if let Some(i) = chain.iter().position(|n| *n == parent) {
                    let mut cycle = chain[i..].to_vec();
                    cycle.push(parent);
                    return Some(cycle);
                }
                match self.get(parent) {
                    Some(next) => {
                        chain.push(parent);
                        current = next;
                    }
                    None => break,
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The on-disk project file plus its lock.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    lock: PathBuf,
}

impl Store {
    pub fn new(path: PathBuf) -> Self {
        let lock = paths::lock_path(&path);
        Self { path, lock }
    }

    pub fn open(root: &Path, config: &Config) -> Self {
        Self::new(config.project_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlocked snapshot for read-only commands.
    pub fn load(&self) -> Result<ProjectFile> {
        ProjectFile::load(&self.path)
    }

    /// Re-read the file under the exclusive lock, apply `f`, validate, and
    /// write it back. Nothing is written if `f` or validation fails.
    pub fn update<T>(&self, f: impl FnOnce(&mut ProjectFile) -> Result<T>) -> Result<T> {
        crate::io::with_exclusive_lock(&self.lock, || {
            let mut project = ProjectFile::load(&self.path)?;
            let out = f(&mut project)?;
            project.validate()?;
            project.save(&self.path)?;
            Ok(out)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
