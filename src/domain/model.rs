use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub const DEFAULT_CAPACITY: u32 = 1;
pub const DEFAULT_ROLE: &str = "unknown";

/// Member identifier. Derived from the member's email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for MemberId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One roster entry as it arrives from JSON or CSV. Every field is optional
/// on the wire; defaults are applied by the accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "match")]
    pub current_match: Option<String>,
    #[serde(default)]
    pub prev_match: Option<String>,
}

impl MemberRecord {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_prev_match(mut self, prev_match: impl Into<String>) -> Self {
        self.prev_match = Some(prev_match.into());
        self
    }

    pub fn capacity(&self) -> u32 {
        self.capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    pub fn role(&self) -> &str {
        self.role
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ROLE)
    }

    /// name 與 email 都必須非空白
    pub fn identity(&self) -> Option<(&str, &str)> {
        let name = self.name.as_deref().filter(|n| !n.trim().is_empty())?;
        let email = self.email.as_deref().filter(|e| !e.trim().is_empty())?;
        Some((name, email))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    /// 0 means the member sits out of the buddy program.
    pub capacity: u32,
    pub role: String,
    #[serde(rename = "match")]
    pub current_match: Option<MemberId>,
    pub prev_match: Option<MemberId>,
    pub unmatched: bool,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.capacity > 0
    }

    /// `"<name> (<email>)"`, the key used in rendered match output.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.email)
    }
}

/// A position in one of the two pools.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Member(MemberId),
    /// Parity placeholder. Never a registered member.
    Bye,
}

impl Slot {
    pub fn member_id(&self) -> Option<&MemberId> {
        match self {
            Slot::Member(id) => Some(id),
            Slot::Bye => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }
}

impl From<MemberId> for Slot {
    fn from(id: MemberId) -> Self {
        Slot::Member(id)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Member(id) => write!(f, "{}", id),
            Slot::Bye => f.write_str("<bye>"),
        }
    }
}

/// One pairing produced by a round. `second == None` means `first` drew the bye.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pair {
    pub first: MemberId,
    pub second: Option<MemberId>,
}

impl Pair {
    pub fn from_slots(a: &Slot, b: &Slot) -> Option<Self> {
        match (a, b) {
            (Slot::Member(x), Slot::Member(y)) => Some(Self {
                first: x.clone(),
                second: Some(y.clone()),
            }),
            (Slot::Member(x), Slot::Bye) | (Slot::Bye, Slot::Member(x)) => Some(Self {
                first: x.clone(),
                second: None,
            }),
            (Slot::Bye, Slot::Bye) => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.second.is_none()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.first.as_str() == id || self.second.as_ref().is_some_and(|s| s.as_str() == id)
    }
}

/// Result of one pairing round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundOutcome {
    pub round: u64,
    pub pairs: Vec<Pair>,
    pub bye_member: Option<MemberId>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchEntry {
    pub member: String,
    pub partner: Option<String>,
}

/// Ordered `member label -> partner label` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub entries: Vec<MatchEntry>,
}

impl MatchReport {
    pub fn partner_of(&self, member_label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.member == member_label)
            .and_then(|e| e.partner.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Full member state, written so the next run can carry `prev_match` forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub group_name: String,
    pub rounds_completed: u64,
    pub last_shuffled: Option<DateTime<Utc>>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct RoundReport {
    pub report: MatchReport,
    pub snapshot: GroupSnapshot,
    pub rounds: Vec<RoundOutcome>,
}
