use crate::entry::CommitEntryRef;
use crate::error::ChangeSpecError;
use crate::suffix::StatusSuffix;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Command prefix: append an error suffix when the hook fails.
pub const AUTO_ERROR_PREFIX: char = '!';
/// Command prefix: never run this hook for proposal entries.
pub const SKIP_PROPOSALS_PREFIX: char = '$';

// ---------------------------------------------------------------------------
// HookStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookStatus {
    Running,
    Passed,
    Failed,
}

impl HookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HookStatus::Running => "RUNNING",
            HookStatus::Passed => "PASSED",
            HookStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HookStatus {
    type Err = ChangeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(HookStatus::Running),
            "PASSED" => Ok(HookStatus::Passed),
            "FAILED" => Ok(HookStatus::Failed),
            _ => Err(ChangeSpecError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// HookStatusLine / HookEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookStatusLine {
    pub entry: CommitEntryRef,
    pub status: HookStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<StatusSuffix>,
}

impl HookStatusLine {
    /// No remediation has claimed this line and nothing has annotated it.
    pub fn is_unclaimed(&self) -> bool {
        self.suffix
            .as_ref()
            .is_none_or(|s| !s.is_error() && s.text().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEntry {
    pub command: String,
    #[serde(default)]
    pub status_lines: Vec<HookStatusLine>,
}

impl HookEntry {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            status_lines: Vec::new(),
        }
    }

    fn prefixes(&self) -> &str {
        let trimmed = self.command.trim_start();
        let end = trimmed
            .find(|c| c != AUTO_ERROR_PREFIX && c != SKIP_PROPOSALS_PREFIX)
            .unwrap_or(trimmed.len());
        &trimmed[..end]
    }

    /// The command with its `!`/`$` prefixes removed.
    pub fn display_command(&self) -> &str {
        let trimmed = self.command.trim_start();
        trimmed[self.prefixes().len()..].trim_start()
    }

    pub fn auto_error_suffix(&self) -> bool {
        self.prefixes().contains(AUTO_ERROR_PREFIX)
    }

    pub fn skips_proposals(&self) -> bool {
        self.prefixes().contains(SKIP_PROPOSALS_PREFIX)
    }

    pub fn latest_status_for(&self, entry: CommitEntryRef) -> Option<&HookStatusLine> {
        self.status_lines.iter().rev().find(|l| l.entry == entry)
    }

    pub fn most_recent(&self) -> Option<&HookStatusLine> {
        self.status_lines.last()
    }

    /// Record a run result. A RUNNING line for the same entry is replaced in
    /// place; anything else is appended. Failures of `!` hooks with no suffix
    /// get an error suffix.
    pub fn record_status(
        &mut self,
        entry: CommitEntryRef,
        status: HookStatus,
        duration_secs: Option<u64>,
        suffix: Option<StatusSuffix>,
    ) {
        let suffix = match suffix {
            None if status == HookStatus::Failed && self.auto_error_suffix() => Some(
                StatusSuffix::error(format!("{} failed", self.display_command())),
            ),
            other => other,
        };
        let line = HookStatusLine {
            entry,
            status,
            timestamp: Utc::now(),
            duration_secs,
            suffix,
        };
        match self
            .status_lines
            .iter_mut()
            .rev()
            .find(|l| l.entry == entry && l.status == HookStatus::Running)
        {
            Some(existing) => *existing = line,
            None => self.status_lines.push(line),
        }
    }

    /// Mark the latest unclaimed FAILED line for `entry` with `marker`
    /// (a PID, agent timestamp, or proposal reference). Returns false when
    /// there is nothing to claim.
    pub fn claim_failure(&mut self, entry: CommitEntryRef, marker: &str) -> bool {
        match self.status_lines.iter_mut().rev().find(|l| l.entry == entry) {
            Some(line) if line.status == HookStatus::Failed && line.is_unclaimed() => {
                line.suffix = Some(StatusSuffix::parse(marker));
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Run eligibility
// ---------------------------------------------------------------------------

/// A hook is busy if any line is RUNNING or a background agent is working a failure.
pub fn hook_has_any_running_status(hook: &HookEntry) -> bool {
    hook.status_lines.iter().any(|l| match l.status {
        HookStatus::Running => true,
        HookStatus::Failed => l.suffix.as_ref().is_some_and(StatusSuffix::is_running_process),
        HookStatus::Passed => false,
    })
}

pub fn hook_needs_run(hook: &HookEntry, entry: CommitEntryRef) -> bool {
    if hook.latest_status_for(entry).is_some() {
        return false;
    }
    if !entry.is_proposal() {
        return true;
    }
    if hook.skips_proposals() {
        return false;
    }

    let Some(parent) = hook.latest_status_for(entry.parent()) else {
        return false;
    };
    match parent.status {
        HookStatus::Running => false,
        HookStatus::Passed => true,
        // Fix-hook exception: the failure spawned this very proposal.
        HookStatus::Failed => parent
            .suffix
            .as_ref()
            .is_some_and(|s| !s.is_error() && s.text() == entry.to_string()),
    }
}

pub fn entries_needing_hook_run(
    hook: &HookEntry,
    candidates: &[CommitEntryRef],
) -> BTreeSet<CommitEntryRef> {
    candidates
        .iter()
        .copied()
        .filter(|&entry| hook_needs_run(hook, entry))
        .collect()
}

fn failing_unclaimed(hook: &HookEntry, proposal: bool) -> bool {
    hook.most_recent().is_some_and(|l| {
        l.status == HookStatus::Failed && l.entry.is_proposal() == proposal && l.is_unclaimed()
    })
}

/// Hooks whose latest run failed on a regular entry and that no agent has claimed.
pub fn failing_hooks_for_fix(hooks: &[HookEntry]) -> Vec<&HookEntry> {
    hooks.iter().filter(|h| failing_unclaimed(h, false)).collect()
}

/// Same as [`failing_hooks_for_fix`] but for proposal entries, which are
/// summarized rather than fixed.
pub fn failing_hooks_for_summarize(hooks: &[HookEntry]) -> Vec<&HookEntry> {
    hooks.iter().filter(|h| failing_unclaimed(h, true)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
