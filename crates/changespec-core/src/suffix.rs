use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

pub const READY_TO_MAIL_MARKER: &str = " - (!: READY TO MAIL)";

/// Leading marker of an error suffix, e.g. `!: tests failed`.
pub const ERROR_PREFIX: &str = "!:";

static REVISION_RE: OnceLock<Regex> = OnceLock::new();
static PLAIN_REF_RE: OnceLock<Regex> = OnceLock::new();
static PID_RE: OnceLock<Regex> = OnceLock::new();
static AGENT_TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();
static WORKSPACE_RE: OnceLock<Regex> = OnceLock::new();

fn revision_re() -> &'static Regex {
    REVISION_RE.get_or_init(|| Regex::new(r"^(.+)__(\d+)$").unwrap())
}

fn plain_ref_re() -> &'static Regex {
    PLAIN_REF_RE.get_or_init(|| Regex::new(r"^(\d{1,3}[a-z]?)?$").unwrap())
}

fn pid_re() -> &'static Regex {
    PID_RE.get_or_init(|| Regex::new(r"^\d{4,}$").unwrap())
}

fn agent_timestamp_re() -> &'static Regex {
    AGENT_TIMESTAMP_RE.get_or_init(|| Regex::new(r"^\d{6}_\d{6}$").unwrap())
}

fn workspace_re() -> &'static Regex {
    WORKSPACE_RE.get_or_init(|| Regex::new(r"^(.*?)\s*\(([^()]*)\)$").unwrap())
}

// ---------------------------------------------------------------------------
// Revision suffix (`name__N`)
// ---------------------------------------------------------------------------

pub fn strip_revision_suffix(name: &str) -> &str {
    match revision_re().captures(name) {
        Some(caps) => caps.get(1).map_or(name, |m| m.as_str()),
        None => name,
    }
}

pub fn has_revision_suffix(name: &str) -> bool {
    revision_re().is_match(name)
}

pub fn revision_name(base: &str, n: u32) -> String {
    format!("{base}__{n}")
}

// ---------------------------------------------------------------------------
// Status decorations
// ---------------------------------------------------------------------------

pub fn has_ready_to_mail_suffix(status: &str) -> bool {
    status.trim_end().ends_with(READY_TO_MAIL_MARKER.trim_start())
}

/// Split a decorated status into `(base, workspace_label, ready_to_mail)`.
pub fn split_status(status: &str) -> (&str, Option<&str>, bool) {
    let mut rest = status.trim();
    let ready = has_ready_to_mail_suffix(rest);
    if ready {
        let marker = READY_TO_MAIL_MARKER.trim_start();
        rest = rest[..rest.len() - marker.len()].trim_end();
    }

    let mut workspace = None;
    if let Some(caps) = workspace_re().captures(rest) {
        if let (Some(base), Some(label)) = (caps.get(1), caps.get(2)) {
            workspace = Some(label.as_str());
            rest = base.as_str();
        }
    }
    (rest, workspace, ready)
}

pub fn strip_base_status(status: &str) -> &str {
    split_status(status).0
}

// ---------------------------------------------------------------------------
// Suffix classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuffixKind {
    /// Absent, or free text that names neither an entry nor a process.
    None,
    /// Empty, or a commit-entry-like token such as `3` or `7d`.
    PlainCommitRef,
    /// A PID (4+ digits) or agent start timestamp of a background workflow.
    RunningProcess,
}

pub fn classify_suffix(suffix: Option<&str>) -> SuffixKind {
    let Some(s) = suffix else {
        return SuffixKind::None;
    };
    let s = s.trim();
    if plain_ref_re().is_match(s) {
        SuffixKind::PlainCommitRef
    } else if pid_re().is_match(s) || agent_timestamp_re().is_match(s) {
        SuffixKind::RunningProcess
    } else {
        SuffixKind::None
    }
}

// ---------------------------------------------------------------------------
// StatusSuffix
// ---------------------------------------------------------------------------

/// A suffix attached to a hook status line, commit entry, or comment.
///
/// Stored on disk as plain text; `!: <text>` marks an error. The
/// classification is computed once here and never re-derived by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StatusSuffix {
    text: String,
    error: bool,
    kind: SuffixKind,
}

impl StatusSuffix {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = classify_suffix(Some(&text));
        Self {
            text,
            error: false,
            kind,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: true,
            kind: SuffixKind::None,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().strip_prefix(ERROR_PREFIX) {
            Some(msg) => Self::error(msg.trim_start()),
            None => Self::new(raw.trim()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn kind(&self) -> SuffixKind {
        self.kind
    }

    pub fn is_running_process(&self) -> bool {
        self.kind == SuffixKind::RunningProcess
    }
}

impl fmt::Display for StatusSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.error {
            write!(f, "{ERROR_PREFIX} {}", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

impl From<String> for StatusSuffix {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<StatusSuffix> for String {
    fn from(suffix: StatusSuffix) -> Self {
        suffix.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_suffix_stripped() {
        assert_eq!(strip_revision_suffix("feature_a__2"), "feature_a");
        assert_eq!(strip_revision_suffix("feature_a"), "feature_a");
        assert_eq!(strip_revision_suffix("a__b__12"), "a__b");
        assert_eq!(strip_revision_suffix("__3"), "__3");
        assert_eq!(strip_revision_suffix("name__x"), "name__x");
    }

    #[test]
    fn revision_suffix_symmetry() {
        for base in ["foo", "foo_bar", "a__b", "x1"] {
            for k in [1u32, 2, 10, 999] {
                let named = revision_name(base, k);
                assert_eq!(strip_revision_suffix(&named), base);
                assert!(has_revision_suffix(&named));
            }
            assert!(!has_revision_suffix(base));
        }
    }

    #[test]
    fn classify_pid_boundary() {
        assert_ne!(classify_suffix(Some("999")), SuffixKind::RunningProcess);
        assert_eq!(classify_suffix(Some("999")), SuffixKind::PlainCommitRef);
        assert_eq!(classify_suffix(Some("1000")), SuffixKind::RunningProcess);
        assert_eq!(classify_suffix(Some("48213")), SuffixKind::RunningProcess);
    }

    #[test]
    fn classify_plain_refs_and_text() {
        assert_eq!(classify_suffix(None), SuffixKind::None);
        assert_eq!(classify_suffix(Some("")), SuffixKind::PlainCommitRef);
        assert_eq!(classify_suffix(Some("3")), SuffixKind::PlainCommitRef);
        assert_eq!(classify_suffix(Some("7d")), SuffixKind::PlainCommitRef);
        assert_eq!(classify_suffix(Some("1234a")), SuffixKind::None);
        assert_eq!(classify_suffix(Some("7D")), SuffixKind::None);
        assert_eq!(classify_suffix(Some("flaky test")), SuffixKind::None);
        assert_eq!(
            classify_suffix(Some("251018_142233")),
            SuffixKind::RunningProcess
        );
    }

    #[test]
    fn strip_status_decorations() {
        assert_eq!(strip_base_status("Drafted"), "Drafted");
        assert_eq!(strip_base_status("Drafted (fig_3)"), "Drafted");
        assert_eq!(strip_base_status("Drafted - (!: READY TO MAIL)"), "Drafted");
        assert_eq!(
            strip_base_status("Drafted (fig_3) - (!: READY TO MAIL)"),
            "Drafted"
        );
        assert_eq!(strip_base_status("  Mailed  "), "Mailed");
    }

    #[test]
    fn split_status_parts() {
        assert_eq!(
            split_status("Mailed (ws 2) - (!: READY TO MAIL)"),
            ("Mailed", Some("ws 2"), true)
        );
        assert_eq!(split_status("WIP"), ("WIP", None, false));
    }

    #[test]
    fn ready_to_mail_detection() {
        assert!(has_ready_to_mail_suffix("Drafted - (!: READY TO MAIL)"));
        assert!(!has_ready_to_mail_suffix("Drafted"));
        assert!(!has_ready_to_mail_suffix("Drafted (READY TO MAIL)"));
    }

    #[test]
    fn status_suffix_parse_error_marker() {
        let s = StatusSuffix::parse("!: lint failed");
        assert!(s.is_error());
        assert_eq!(s.text(), "lint failed");
        assert_eq!(s.kind(), SuffixKind::None);
        assert_eq!(s.to_string(), "!: lint failed");

        let pid = StatusSuffix::parse("4242");
        assert!(!pid.is_error());
        assert!(pid.is_running_process());
    }

    #[test]
    fn status_suffix_yaml_is_plain_string() {
        let s = StatusSuffix::error("boom");
        let yaml = serde_yaml::to_string(&s).unwrap();
        assert!(yaml.contains("!: boom"));
        let parsed: StatusSuffix = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, s);
    }
}
