use crate::entry::{CommitEntry, CommitEntryRef};
use crate::error::{ChangeSpecError, Result};
use crate::hook::{self, HookEntry, HookStatus};
use crate::status::{BaseStatus, Status};
use crate::suffix::{self, StatusSuffix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// CommentEntry
// ---------------------------------------------------------------------------

/// A batch of reviewer comments waiting to be addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentEntry {
    pub reviewer: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<StatusSuffix>,
}

// ---------------------------------------------------------------------------
// ChangeSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<CommitEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<HookEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CommentEntry>,
}

impl ChangeSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parent: None,
            status: Status::default(),
            commits: Vec::new(),
            hooks: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ChangeSpecError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// The canonical sibling name, without any `__<N>` revision suffix.
    pub fn base_name(&self) -> &str {
        suffix::strip_revision_suffix(&self.name)
    }

    pub fn is_revision(&self) -> bool {
        suffix::has_revision_suffix(&self.name)
    }

    /// Text matched by query terms.
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}\n{}", self.name, self.description, self.status)
    }

    // -----------------------------------------------------------------------
    // Special markers
    // -----------------------------------------------------------------------

    fn all_suffixes(&self) -> impl Iterator<Item = &StatusSuffix> {
        let hook_suffixes = self
            .hooks
            .iter()
            .flat_map(|h| h.status_lines.iter())
            .filter_map(|l| l.suffix.as_ref());
        let commit_suffixes = self.commits.iter().filter_map(|c| c.suffix.as_ref());
        let comment_suffixes = self.comments.iter().filter_map(|c| c.suffix.as_ref());
        hook_suffixes.chain(commit_suffixes).chain(comment_suffixes)
    }

    /// Some entry carries an unresolved `!:` error suffix.
    pub fn has_error_suffix(&self) -> bool {
        self.all_suffixes().any(StatusSuffix::is_error)
    }

    /// A background agent is working a hook failure or a comment batch.
    pub fn has_running_agent(&self) -> bool {
        let on_hooks = self.hooks.iter().flat_map(|h| h.status_lines.iter()).any(|l| {
            l.status == HookStatus::Failed
                && l.suffix.as_ref().is_some_and(StatusSuffix::is_running_process)
        });
        let on_comments = self
            .comments
            .iter()
            .any(|c| c.suffix.as_ref().is_some_and(StatusSuffix::is_running_process));
        on_hooks || on_comments
    }

    pub fn has_running_hook(&self) -> bool {
        self.hooks
            .iter()
            .flat_map(|h| h.status_lines.iter())
            .any(|l| l.status == HookStatus::Running)
    }

    // -----------------------------------------------------------------------
    // Commits and hooks
    // -----------------------------------------------------------------------

    pub fn entry_refs(&self) -> Vec<CommitEntryRef> {
        self.commits.iter().map(|c| c.entry).collect()
    }

    pub fn hook(&self, command: &str) -> Option<&HookEntry> {
        self.hooks.iter().find(|h| h.command == command)
    }

    pub fn hook_mut(&mut self, command: &str) -> Result<&mut HookEntry> {
        let name = self.name.clone();
        self.hooks
            .iter_mut()
            .find(|h| h.command == command)
            .ok_or_else(|| ChangeSpecError::HookNotFound {
                name,
                command: command.to_string(),
            })
    }

    pub fn add_hook(&mut self, command: impl Into<String>) -> Result<()> {
        let command = command.into();
        if self.hook(&command).is_some() {
            return Err(ChangeSpecError::HookExists {
                name: self.name.clone(),
                command,
            });
        }
        self.hooks.push(HookEntry::new(command));
        Ok(())
    }

    /// Per hook, the commit entries it should be started for now.
    pub fn hooks_due(&self) -> Vec<(&HookEntry, BTreeSet<CommitEntryRef>)> {
        let refs = self.entry_refs();
        self.hooks
            .iter()
            .map(|h| (h, hook::entries_needing_hook_run(h, &refs)))
            .filter(|(_, due)| !due.is_empty())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn transition(&mut self, target: BaseStatus) -> Result<()> {
        self.status = self.status.transitioned(target)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{add_commit, add_proposal};

    #[test]
    fn name_validation() {
        ChangeSpec::validate_name("feature_a").unwrap();
        ChangeSpec::validate_name("feature_a__2").unwrap();
        assert!(ChangeSpec::validate_name("").is_err());
        assert!(ChangeSpec::validate_name("has space").is_err());
    }

    #[test]
    fn base_name_strips_revision() {
        let cs = ChangeSpec::new("feature_a__3", "");
        assert_eq!(cs.base_name(), "feature_a");
        assert!(cs.is_revision());
        assert!(!ChangeSpec::new("feature_a", "").is_revision());
    }

    #[test]
    fn searchable_text_covers_own_fields() {
        let mut cs = ChangeSpec::new("feature_a", "Adds the thing");
        cs.parent = Some("base_cl".to_string());
        cs.transition(BaseStatus::Drafted).unwrap();
        let text = cs.searchable_text();
        assert!(text.contains("feature_a"));
        assert!(text.contains("Adds the thing"));
        assert!(text.contains("Drafted"));
        assert!(!text.contains("base_cl"));
    }

    #[test]
    fn special_markers() {
        let mut cs = ChangeSpec::new("x", "");
        assert!(!cs.has_error_suffix());
        assert!(!cs.has_running_agent());
        assert!(!cs.has_running_hook());

        add_commit(&mut cs.commits, "first");
        cs.add_hook("make test").unwrap();
        let entry = CommitEntryRef::regular(1);
        cs.hook_mut("make test")
            .unwrap()
            .record_status(entry, HookStatus::Running, None, None);
        assert!(cs.has_running_hook());

        cs.hook_mut("make test")
            .unwrap()
            .record_status(entry, HookStatus::Failed, None, None);
        assert!(!cs.has_running_hook());
        cs.hook_mut("make test").unwrap().claim_failure(entry, "31337");
        assert!(cs.has_running_agent());

        cs.comments.push(CommentEntry {
            reviewer: "alice".to_string(),
            file_path: "comments/alice.json".to_string(),
            suffix: Some(StatusSuffix::error("unresolved")),
        });
        assert!(cs.has_error_suffix());
    }

    #[test]
    fn duplicate_hook_rejected() {
        let mut cs = ChangeSpec::new("x", "");
        cs.add_hook("make lint").unwrap();
        assert!(cs.add_hook("make lint").is_err());
        assert!(cs.hook_mut("make test").is_err());
    }

    #[test]
    fn hooks_due_reports_gated_entries() {
        let mut cs = ChangeSpec::new("x", "");
        add_commit(&mut cs.commits, "first");
        add_proposal(&mut cs.commits, 1, "ai tweak").unwrap();
        cs.add_hook("make test").unwrap();

        let due = cs.hooks_due();
        assert_eq!(due.len(), 1);
        let refs: Vec<String> = due[0].1.iter().map(ToString::to_string).collect();
        assert_eq!(refs, ["1"]);

        cs.hook_mut("make test").unwrap().record_status(
            CommitEntryRef::regular(1),
            HookStatus::Passed,
            None,
            None,
        );
        let due = cs.hooks_due();
        let refs: Vec<String> = due[0].1.iter().map(ToString::to_string).collect();
        assert_eq!(refs, ["1a"]);
    }

    #[test]
    fn yaml_roundtrip_skips_empty_collections() {
        let cs = ChangeSpec::new("feature_a", "desc");
        let yaml = serde_yaml::to_string(&cs).unwrap();
        assert!(!yaml.contains("hooks"));
        assert!(yaml.contains("status: WIP"));
        let parsed: ChangeSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cs);
    }
}
