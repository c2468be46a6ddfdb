use crate::error::{ChangeSpecError, Result};
use crate::suffix::{split_status, strip_base_status, READY_TO_MAIL_MARKER};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// BaseStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseStatus {
    #[serde(rename = "WIP")]
    Wip,
    Drafted,
    Mailed,
    Submitted,
    Reverted,
}

impl BaseStatus {
    pub fn all() -> &'static [BaseStatus] {
        &[
            BaseStatus::Wip,
            BaseStatus::Drafted,
            BaseStatus::Mailed,
            BaseStatus::Submitted,
            BaseStatus::Reverted,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BaseStatus::Wip => "WIP",
            BaseStatus::Drafted => "Drafted",
            BaseStatus::Mailed => "Mailed",
            BaseStatus::Submitted => "Submitted",
            BaseStatus::Reverted => "Reverted",
        }
    }

    /// Directed edges of the transition table. Self-edges are not listed.
    pub fn successors(self) -> &'static [BaseStatus] {
        match self {
            BaseStatus::Wip => &[BaseStatus::Drafted],
            BaseStatus::Drafted => &[BaseStatus::Mailed, BaseStatus::Wip],
            BaseStatus::Mailed => &[BaseStatus::Submitted],
            BaseStatus::Submitted | BaseStatus::Reverted => &[],
        }
    }

    pub fn can_transition_to(self, target: BaseStatus) -> bool {
        self.successors().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

impl fmt::Display for BaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BaseStatus {
    type Err = ChangeSpecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "WIP" => Ok(BaseStatus::Wip),
            "Drafted" => Ok(BaseStatus::Drafted),
            "Mailed" => Ok(BaseStatus::Mailed),
            "Submitted" => Ok(BaseStatus::Submitted),
            "Reverted" => Ok(BaseStatus::Reverted),
            _ => Err(ChangeSpecError::InvalidStatus(s.to_string())),
        }
    }
}

/// Table lookup on the base statuses of two decorated status strings.
/// Unrecognised names on either side are never valid.
pub fn is_valid_transition(from: &str, to: &str) -> bool {
    match (
        strip_base_status(from).parse::<BaseStatus>(),
        strip_base_status(to).parse::<BaseStatus>(),
    ) {
        (Ok(from), Ok(to)) => from.can_transition_to(to),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// A base status plus its display decorations, decoded once from text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Status {
    pub base: BaseStatus,
    pub workspace: Option<String>,
    pub ready_to_mail: bool,
}

impl Status {
    pub fn new(base: BaseStatus) -> Self {
        Self {
            base,
            workspace: None,
            ready_to_mail: false,
        }
    }

    pub fn with_workspace(mut self, label: impl Into<String>) -> Self {
        self.workspace = Some(label.into());
        self
    }

    pub fn check_transition(&self, target: BaseStatus) -> Result<()> {
        if self.base.can_transition_to(target) {
            return Ok(());
        }
        let reason = if self.base == target {
            "already in this status".to_string()
        } else if self.base.is_terminal() {
            format!("'{}' is terminal", self.base)
        } else {
            let allowed: Vec<&str> = self.base.successors().iter().map(|s| s.as_str()).collect();
            format!("allowed: {}", allowed.join(", "))
        };
        Err(ChangeSpecError::InvalidTransition {
            from: self.base.to_string(),
            to: target.to_string(),
            reason,
        })
    }

    /// The status after moving to `target`. The ready-to-mail flag never
    /// survives a transition; the workspace label stays until cleared.
    pub fn transitioned(&self, target: BaseStatus) -> Result<Status> {
        self.check_transition(target)?;
        Ok(Status {
            base: target,
            workspace: self.workspace.clone(),
            ready_to_mail: false,
        })
    }

    /// Replace or clear (`None`) the workspace label.
    pub fn set_workspace(&mut self, label: Option<String>) {
        self.workspace = label.filter(|l| !l.trim().is_empty());
    }

    pub fn set_ready_to_mail(&mut self, ready: bool) -> Result<()> {
        if ready && self.base != BaseStatus::Drafted {
            return Err(ChangeSpecError::InvalidTransition {
                from: self.base.to_string(),
                to: format!("{}{READY_TO_MAIL_MARKER}", self.base),
                reason: "only Drafted changespecs can be ready to mail".to_string(),
            });
        }
        self.ready_to_mail = ready;
        Ok(())
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new(BaseStatus::Wip)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str())?;
        if let Some(ws) = &self.workspace {
            write!(f, " ({ws})")?;
        }
        if self.ready_to_mail {
            f.write_str(READY_TO_MAIL_MARKER)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Status {
    type Err = ChangeSpecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (base, workspace, ready_to_mail) = split_status(s);
        Ok(Status {
            base: base.parse()?,
            workspace: workspace.map(str::to_string),
            ready_to_mail,
        })
    }
}

impl TryFrom<String> for Status {
    type Error = ChangeSpecError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn expected_edge(from: BaseStatus, to: BaseStatus) -> bool {
        use BaseStatus::*;
        matches!(
            (from, to),
            (Wip, Drafted) | (Drafted, Mailed) | (Drafted, Wip) | (Mailed, Submitted)
        )
    }

    #[test]
    fn transition_table_closure() {
        for &from in BaseStatus::all() {
            for &to in BaseStatus::all() {
                assert_eq!(
                    is_valid_transition(from.as_str(), to.as_str()),
                    expected_edge(from, to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn unknown_status_never_valid() {
        for &s in BaseStatus::all() {
            assert!(!is_valid_transition("Pending", s.as_str()));
            assert!(!is_valid_transition(s.as_str(), "Pending"));
        }
        assert!(!is_valid_transition("drafted", "Mailed"));
        assert!(!is_valid_transition("", ""));
    }

    #[test]
    fn self_transitions_rejected() {
        for &s in BaseStatus::all() {
            assert!(!is_valid_transition(s.as_str(), s.as_str()));
        }
    }

    #[test]
    fn decorations_transparent_to_transitions() {
        assert!(is_valid_transition(
            "Drafted (fig_2) - (!: READY TO MAIL)",
            "Mailed"
        ));
        assert!(is_valid_transition("WIP (ws_1)", "Drafted (ws_1)"));
        assert!(!is_valid_transition("Mailed (ws_1)", "Drafted"));
    }

    #[test]
    fn status_roundtrip() {
        for text in [
            "WIP",
            "Drafted (fig_3)",
            "Drafted - (!: READY TO MAIL)",
            "Drafted (fig_3) - (!: READY TO MAIL)",
            "Submitted",
        ] {
            let status = Status::from_str(text).unwrap();
            assert_eq!(status.to_string(), text);
        }
    }

    #[test]
    fn status_parse_rejects_unknown_base() {
        assert!(Status::from_str("Abandoned (ws)").is_err());
    }

    #[test]
    fn transitioned_keeps_workspace_and_clears_ready() {
        let mut s = Status::new(BaseStatus::Drafted).with_workspace("fig_1");
        s.set_ready_to_mail(true).unwrap();
        let mailed = s.transitioned(BaseStatus::Mailed).unwrap();
        assert_eq!(mailed.to_string(), "Mailed (fig_1)");
        let mut submitted = mailed.transitioned(BaseStatus::Submitted).unwrap();
        assert_eq!(submitted.to_string(), "Submitted (fig_1)");
        submitted.set_workspace(None);
        assert_eq!(submitted.to_string(), "Submitted");
    }

    #[test]
    fn ready_to_mail_never_survives_transition() {
        let mut s = Status::new(BaseStatus::Drafted);
        s.set_ready_to_mail(true).unwrap();
        assert!(!s.transitioned(BaseStatus::Wip).unwrap().ready_to_mail);
        assert!(!s.transitioned(BaseStatus::Mailed).unwrap().ready_to_mail);
    }

    #[test]
    fn blank_workspace_label_clears() {
        let mut s = Status::new(BaseStatus::Wip).with_workspace("ws_1");
        s.set_workspace(Some("  ".to_string()));
        assert_eq!(s.workspace, None);
        s.set_workspace(Some("ws_2".to_string()));
        assert_eq!(s.to_string(), "WIP (ws_2)");
    }

    #[test]
    fn transition_error_reasons() {
        let s = Status::new(BaseStatus::Submitted);
        let err = s.transitioned(BaseStatus::Wip).unwrap_err();
        assert!(err.to_string().contains("terminal"));

        let s = Status::new(BaseStatus::Mailed);
        let err = s.transitioned(BaseStatus::Mailed).unwrap_err();
        assert!(err.to_string().contains("already"));
    }

    #[test]
    fn ready_to_mail_only_on_drafted() {
        let mut s = Status::new(BaseStatus::Wip);
        assert!(s.set_ready_to_mail(true).is_err());
        let mut s = Status::new(BaseStatus::Drafted);
        s.set_ready_to_mail(true).unwrap();
        assert!(s.ready_to_mail);
    }

    #[test]
    fn status_yaml_roundtrip() {
        let s = Status::new(BaseStatus::Mailed).with_workspace("ws_4");
        let yaml = serde_yaml::to_string(&s).unwrap();
        let parsed: Status = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, s);
    }
}
