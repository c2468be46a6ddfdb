use crate::error::{ChangeSpecError, Result};
use crate::suffix::StatusSuffix;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CommitEntryRef
// ---------------------------------------------------------------------------

/// Reference to a commit entry: `2` (regular) or `2a` (proposal against 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitEntryRef {
    number: u32,
    proposal: Option<char>,
}

impl CommitEntryRef {
    pub fn regular(number: u32) -> Self {
        Self {
            number,
            proposal: None,
        }
    }

    pub fn proposal(number: u32, letter: char) -> Self {
        Self {
            number,
            proposal: Some(letter),
        }
    }

    pub fn number(self) -> u32 {
        self.number
    }

    pub fn letter(self) -> Option<char> {
        self.proposal
    }

    pub fn is_proposal(self) -> bool {
        self.proposal.is_some()
    }

    /// The regular entry a proposal amends; a regular entry is its own parent.
    pub fn parent(self) -> Self {
        Self::regular(self.number)
    }
}

impl fmt::Display for CommitEntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.proposal {
            Some(letter) => write!(f, "{}{}", self.number, letter),
            None => write!(f, "{}", self.number),
        }
    }
}

impl std::str::FromStr for CommitEntryRef {
    type Err = ChangeSpecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ChangeSpecError::InvalidEntryRef(s.to_string());

        let (digits, letter) = match s.char_indices().last() {
            Some((i, c)) if c.is_ascii_lowercase() => (&s[..i], Some(c)),
            _ => (s, None),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u32 = digits.parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }
        Ok(Self {
            number,
            proposal: letter,
        })
    }
}

impl TryFrom<String> for CommitEntryRef {
    type Error = ChangeSpecError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CommitEntryRef> for String {
    fn from(r: CommitEntryRef) -> Self {
        r.to_string()
    }
}

// ---------------------------------------------------------------------------
// CommitEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub entry: CommitEntryRef,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<StatusSuffix>,
}

// ---------------------------------------------------------------------------
// Commit list operations
// ---------------------------------------------------------------------------

/// Append a regular entry numbered one past the highest existing number.
pub fn add_commit(commits: &mut Vec<CommitEntry>, note: impl Into<String>) -> CommitEntryRef {
    let next = commits.iter().map(|c| c.entry.number()).max().unwrap_or(0) + 1;
    let entry = CommitEntryRef::regular(next);
    commits.push(CommitEntry {
        entry,
        note: note.into(),
        suffix: None,
    });
    entry
}

/// Append a proposal against regular entry `number`, taking the next free letter.
pub fn add_proposal(
    commits: &mut Vec<CommitEntry>,
    number: u32,
    note: impl Into<String>,
) -> Result<CommitEntryRef> {
    let parent = CommitEntryRef::regular(number);
    if !commits.iter().any(|c| c.entry == parent) {
        return Err(ChangeSpecError::InvalidEntryRef(parent.to_string()));
    }
    let letter = ('a'..='z')
        .find(|&l| !commits.iter().any(|c| c.entry == CommitEntryRef::proposal(number, l)))
        .ok_or(ChangeSpecError::ProposalsExhausted(number))?;
    let entry = CommitEntryRef::proposal(number, letter);
    commits.push(CommitEntry {
        entry,
        note: note.into(),
        suffix: None,
    });
    Ok(entry)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_regular_and_proposal() {
        let r: CommitEntryRef = "2".parse().unwrap();
        assert_eq!(r, CommitEntryRef::regular(2));
        assert!(!r.is_proposal());

        let p: CommitEntryRef = "2a".parse().unwrap();
        assert_eq!(p, CommitEntryRef::proposal(2, 'a'));
        assert!(p.is_proposal());
        assert_eq!(p.parent(), r);
        assert_eq!(p.to_string(), "2a");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "a", "0", "2A", "2ab", "-1", "1.5", "x2"] {
            assert!(bad.parse::<CommitEntryRef>().is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn ordering_groups_proposals_after_parent() {
        let mut refs: Vec<CommitEntryRef> = ["2a", "1", "2", "10", "1b"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        refs.sort();
        let rendered: Vec<String> = refs.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["1", "1b", "2", "2a", "10"]);
    }

    #[test]
    fn add_commit_and_proposals() {
        let mut commits = Vec::new();
        assert_eq!(add_commit(&mut commits, "initial"), CommitEntryRef::regular(1));
        assert_eq!(add_commit(&mut commits, "second"), CommitEntryRef::regular(2));

        let a = add_proposal(&mut commits, 2, "ai fix").unwrap();
        let b = add_proposal(&mut commits, 2, "another").unwrap();
        assert_eq!(a.to_string(), "2a");
        assert_eq!(b.to_string(), "2b");
        assert_eq!(add_commit(&mut commits, "third"), CommitEntryRef::regular(3));
    }

    #[test]
    fn proposal_requires_existing_parent() {
        let mut commits = Vec::new();
        assert!(add_proposal(&mut commits, 1, "orphan").is_err());
    }
}
