use crate::core::parity::{ParityAction, ParityStabilizer};
use crate::core::partition::GroupPartition;
use crate::domain::model::{
    GroupSnapshot, MatchEntry, MatchReport, Member, MemberId, MemberRecord, Slot,
};
use crate::domain::ports::RandomSource;
use crate::utils::error::{BuddyError, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingIdentity,
    AlreadyExists,
    UnknownMember,
}

/// Outcome of a membership edit. Skips are not errors; they are reported
/// and the registry is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipChange {
    Added(MemberId),
    Removed(MemberId),
    CapacityUpdated { id: MemberId, capacity: u32 },
    RoleUpdated { id: MemberId, role: String },
    Skipped { email: String, reason: SkipReason },
}

impl MembershipChange {
    pub fn is_applied(&self) -> bool {
        !matches!(self, MembershipChange::Skipped { .. })
    }

    fn skipped(email: &str, reason: SkipReason) -> Self {
        MembershipChange::Skipped {
            email: email.to_string(),
            reason,
        }
    }
}

impl fmt::Display for MembershipChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipChange::Added(id) => write!(f, "member {} added", id),
            MembershipChange::Removed(id) => write!(f, "member {} removed", id),
            MembershipChange::CapacityUpdated { id, capacity } => {
                write!(f, "member {}'s capacity updated to {}", id, capacity)
            }
            MembershipChange::RoleUpdated { id, role } => {
                write!(f, "member {}'s role updated to {}", id, role)
            }
            MembershipChange::Skipped { email, reason } => match reason {
                SkipReason::MissingIdentity => f.write_str("name or email can't be empty"),
                SkipReason::AlreadyExists => {
                    write!(f, "member {} already exists, skipping", email)
                }
                SkipReason::UnknownMember => {
                    write!(f, "member {} doesn't exist, skipping", email)
                }
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub added: Vec<MemberId>,
    pub skipped: Vec<MembershipChange>,
    pub parity: ParityAction,
}

/// Owns every member and the pool partition built over the active ones.
#[derive(Debug, Clone)]
pub struct MemberRegistry {
    members: HashMap<MemberId, Member>,
    // 保留匯入順序，輸出時照這個順序
    order: Vec<MemberId>,
    partition: GroupPartition,
    stale: bool,
}

impl Default for MemberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
            order: Vec::new(),
            partition: GroupPartition::new(),
            stale: true,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    /// Members in insertion order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.order.iter().filter_map(|id| self.members.get(id))
    }

    pub fn total_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn real_active_count(&self) -> usize {
        self.members.values().filter(|m| m.is_active()).count()
    }

    /// Active members plus the bye when it is in play.
    pub fn active_count(&self) -> usize {
        self.real_active_count() + usize::from(self.partition.has_bye())
    }

    pub fn partition(&self) -> &GroupPartition {
        &self.partition
    }

    pub(crate) fn partition_mut(&mut self) -> &mut GroupPartition {
        &mut self.partition
    }

    /// True when membership changed since the last completed round.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn mark_fresh(&mut self) {
        self.stale = false;
    }

    pub fn add(&mut self, record: MemberRecord) -> MembershipChange {
        let Some(member) = Self::build_member(&record) else {
            let change =
                MembershipChange::skipped(record.email.as_deref().unwrap_or(""), SkipReason::MissingIdentity);
            tracing::warn!("{}", change);
            return change;
        };

        if self.members.contains_key(&member.id) {
            let change = MembershipChange::skipped(&member.email, SkipReason::AlreadyExists);
            tracing::debug!("{}", change);
            return change;
        }

        let id = member.id.clone();
        let active = member.is_active();
        let ordinal = self.active_count();

        self.members.insert(id.clone(), member);
        self.order.push(id.clone());
        self.stale = true;

        if active {
            // 新增的成員不重新洗牌，直接排進較短的 pool
            self.partition.insert(Slot::Member(id.clone()), ordinal);
        }
        self.stabilize_parity();

        let change = MembershipChange::Added(id);
        tracing::info!("{}", change);
        change
    }

    pub fn remove(&mut self, email: &str) -> MembershipChange {
        let Some(member) = self.members.remove(email) else {
            let change = MembershipChange::skipped(email, SkipReason::UnknownMember);
            tracing::debug!("{}", change);
            return change;
        };

        self.order.retain(|id| id != &member.id);
        self.partition.remove(&Slot::Member(member.id.clone()));

        // 清掉指向已刪除成員的配對
        for other in self.members.values_mut() {
            if other.current_match.as_ref() == Some(&member.id) {
                other.current_match = None;
                other.unmatched = true;
            }
        }

        self.stale = true;
        self.stabilize_parity();

        let change = MembershipChange::Removed(member.id);
        tracing::info!("{}", change);
        change
    }

    pub fn update_capacity(&mut self, email: &str, new_capacity: u32) -> MembershipChange {
        let (id, was_active) = match self.members.get_mut(email) {
            Some(member) => {
                let was_active = member.is_active();
                member.capacity = new_capacity;
                (member.id.clone(), was_active)
            }
            None => {
                let change = MembershipChange::skipped(email, SkipReason::UnknownMember);
                tracing::debug!("{}", change);
                return change;
            }
        };

        match (was_active, new_capacity > 0) {
            (true, false) => {
                self.partition.remove(&Slot::Member(id.clone()));
                self.stale = true;
            }
            (false, true) => {
                let ordinal = self.partition.len();
                self.partition.insert(Slot::Member(id.clone()), ordinal);
                self.stale = true;
            }
            _ => {}
        }
        self.stabilize_parity();

        let change = MembershipChange::CapacityUpdated {
            id,
            capacity: new_capacity,
        };
        tracing::info!("{}", change);
        change
    }

    pub fn update_role(&mut self, email: &str, new_role: &str) -> MembershipChange {
        match self.members.get_mut(email) {
            Some(member) => {
                member.role = new_role.to_string();
                MembershipChange::RoleUpdated {
                    id: member.id.clone(),
                    role: new_role.to_string(),
                }
            }
            None => MembershipChange::skipped(email, SkipReason::UnknownMember),
        }
    }

    /// Moves every current match into `prev_match` and marks all members unmatched.
    pub fn unmatch_all(&mut self) {
        for member in self.members.values_mut() {
            member.prev_match = member.current_match.take();
            member.unmatched = true;
        }
    }

    pub fn commit_match(&mut self, first: &MemberId, second: &MemberId) -> Result<()> {
        for id in [first, second] {
            if !self.members.contains_key(id) {
                return Err(BuddyError::MemberNotFound { id: id.to_string() });
            }
        }
        if first == second {
            return Err(BuddyError::invariant(format!(
                "member {} cannot be matched with itself",
                first
            )));
        }

        for (id, partner) in [(first, second), (second, first)] {
            if let Some(member) = self.members.get_mut(id) {
                member.current_match = Some(partner.clone());
                member.unmatched = false;
            }
        }
        Ok(())
    }

    /// Loads roster records.
    ///
    /// An empty registry is built from scratch and its active members are
    /// shuffled before being split across the pools. A populated registry
    /// takes each record as an incremental [`MemberRegistry::add`].
    pub fn import<R>(&mut self, records: Vec<MemberRecord>, random: &mut R) -> ImportSummary
    where
        R: RandomSource + ?Sized,
    {
        let mut added = Vec::new();
        let mut skipped = Vec::new();

        if self.members.is_empty() {
            for record in records {
                let Some(member) = Self::build_member(&record) else {
                    skipped.push(MembershipChange::skipped(
                        record.email.as_deref().unwrap_or(""),
                        SkipReason::MissingIdentity,
                    ));
                    continue;
                };
                if self.members.contains_key(&member.id) {
                    skipped.push(MembershipChange::skipped(&member.email, SkipReason::AlreadyExists));
                    continue;
                }
                added.push(member.id.clone());
                self.order.push(member.id.clone());
                self.members.insert(member.id.clone(), member);
            }

            let mut active: Vec<MemberId> = self
                .order
                .iter()
                .filter(|id| self.members.get(*id).is_some_and(Member::is_active))
                .cloned()
                .collect();
            random.shuffle(&mut active);
            for (index, id) in active.into_iter().enumerate() {
                self.partition.insert(Slot::Member(id), index);
            }
            self.stale = true;
        } else {
            for record in records {
                match self.add(record) {
                    MembershipChange::Added(id) => added.push(id),
                    other => skipped.push(other),
                }
            }
        }

        for change in &skipped {
            tracing::warn!("{}", change);
        }

        let parity = self.stabilize_parity();
        tracing::info!(
            "Imported {} members ({} skipped), {} active",
            added.len(),
            skipped.len(),
            self.active_count()
        );

        ImportSummary {
            added,
            skipped,
            parity,
        }
    }

    pub fn stabilize_parity(&mut self) -> ParityAction {
        ParityStabilizer::stabilize(&mut self.partition)
    }

    /// Verifies that the pools hold exactly the active members, once each.
    pub fn check_consistency(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for id in self.partition.member_ids() {
            if !seen.insert(id) {
                return Err(BuddyError::invariant(format!(
                    "member {} appears more than once in the pools",
                    id
                )));
            }
            match self.members.get(id) {
                None => {
                    return Err(BuddyError::invariant(format!(
                        "pooled member {} is not registered",
                        id
                    )))
                }
                Some(member) if !member.is_active() => {
                    return Err(BuddyError::invariant(format!(
                        "inactive member {} is still pooled",
                        id
                    )))
                }
                Some(_) => {}
            }
        }

        let real_active = self.real_active_count();
        if seen.len() != real_active {
            return Err(BuddyError::invariant(format!(
                "{} active members but {} pooled",
                real_active,
                seen.len()
            )));
        }
        Ok(())
    }

    pub fn match_report(&self) -> MatchReport {
        let entries = self
            .members()
            .map(|member| {
                let partner = if member.unmatched {
                    None
                } else {
                    member
                        .current_match
                        .as_ref()
                        .and_then(|id| self.members.get(id))
                        .map(Member::label)
                };
                MatchEntry {
                    member: member.label(),
                    partner,
                }
            })
            .collect();
        MatchReport { entries }
    }

    pub fn snapshot(
        &self,
        group_name: &str,
        rounds_completed: u64,
        last_shuffled: Option<DateTime<Utc>>,
    ) -> GroupSnapshot {
        GroupSnapshot {
            group_name: group_name.to_string(),
            rounds_completed,
            last_shuffled,
            members: self.members().cloned().collect(),
        }
    }

    fn build_member(record: &MemberRecord) -> Option<Member> {
        let (name, email) = record.identity()?;
        Some(Member {
            id: MemberId::from(email),
            name: name.to_string(),
            email: email.to_string(),
            capacity: record.capacity(),
            role: record.role().to_string(),
            current_match: record.current_match.clone().map(MemberId::from),
            prev_match: record.prev_match.clone().map(MemberId::from),
            unmatched: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::random::RngSource;

    fn record(name: &str, email: &str) -> MemberRecord {
        MemberRecord::new(name, email)
    }

    fn registry_with(names: &[&str]) -> MemberRegistry {
        let mut registry = MemberRegistry::new();
        for name in names {
            registry.add(record(name, &format!("{}@lab.org", name.to_lowercase())));
        }
        registry
    }

    fn assert_balanced(registry: &MemberRegistry) {
        let partition = registry.partition();
        assert_eq!(registry.active_count() % 2, 0);
        assert_eq!(partition.pool_a().len(), partition.pool_b().len());
        assert_eq!(partition.pool_a().len(), registry.active_count() / 2);
        registry.check_consistency().unwrap();
    }

    #[test]
    fn test_add_rejects_missing_identity() {
        let mut registry = MemberRegistry::new();
        let change = registry.add(MemberRecord::new("", "amy@lab.org"));
        assert!(!change.is_applied());
        assert_eq!(change.to_string(), "name or email can't be empty");

        let change = registry.add(MemberRecord {
            name: Some("Amy".into()),
            ..Default::default()
        });
        assert!(!change.is_applied());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut registry = registry_with(&["Amy"]);
        let change = registry.add(record("Amy Again", "amy@lab.org"));
        assert_eq!(change.to_string(), "member amy@lab.org already exists, skipping");
        assert_eq!(registry.total_count(), 1);
        assert_eq!(registry.get("amy@lab.org").unwrap().name, "Amy");
    }

    #[test]
    fn test_fifth_member_activates_bye() {
        let mut registry = registry_with(&["Amy", "Bo", "Cal", "Di"]);
        assert!(!registry.partition().has_bye());
        assert_balanced(&registry);

        registry.add(record("Eve", "eve@lab.org"));
        assert!(registry.partition().has_bye());
        assert_eq!(registry.active_count(), 6);
        assert_balanced(&registry);

        registry.remove("cal@lab.org");
        assert!(!registry.partition().has_bye());
        assert_eq!(registry.active_count(), 4);
        assert_balanced(&registry);
    }

    #[test]
    fn test_inactive_member_is_not_pooled() {
        let mut registry = MemberRegistry::new();
        registry.add(record("Amy", "amy@lab.org").with_capacity(0));
        assert_eq!(registry.total_count(), 1);
        assert_eq!(registry.active_count(), 0);
        assert!(registry.partition().is_empty());
    }

    #[test]
    fn test_update_capacity_transitions() {
        let mut registry = registry_with(&["Amy", "Bo", "Cal", "Di"]);

        registry.update_capacity("bo@lab.org", 0);
        assert!(!registry
            .partition()
            .contains(&Slot::Member(MemberId::from("bo@lab.org"))));
        assert!(registry.partition().has_bye());
        assert_balanced(&registry);

        registry.update_capacity("bo@lab.org", 3);
        assert!(registry
            .partition()
            .contains(&Slot::Member(MemberId::from("bo@lab.org"))));
        assert!(!registry.partition().has_bye());
        assert_balanced(&registry);

        // 只改數值，不動 pool
        let before = registry.partition().pool_a().to_vec();
        registry.update_capacity("bo@lab.org", 1);
        assert_eq!(registry.partition().pool_a(), before.as_slice());
        assert_eq!(registry.get("bo@lab.org").unwrap().capacity, 1);

        let change = registry.update_capacity("ghost@lab.org", 1);
        assert_eq!(change.to_string(), "member ghost@lab.org doesn't exist, skipping");
    }

    #[test]
    fn test_update_role_leaves_partition_alone() {
        let mut registry = registry_with(&["Amy", "Bo"]);
        let before = registry.partition().clone();
        let change = registry.update_role("amy@lab.org", "postdoc");
        assert!(change.is_applied());
        assert_eq!(registry.get("amy@lab.org").unwrap().role, "postdoc");
        assert_eq!(registry.partition().pool_a(), before.pool_a());
        assert_eq!(registry.partition().pool_b(), before.pool_b());
    }

    #[test]
    fn test_remove_unknown_is_skipped() {
        let mut registry = registry_with(&["Amy", "Bo"]);
        let change = registry.remove("ghost@lab.org");
        assert!(!change.is_applied());
        assert_eq!(registry.total_count(), 2);
    }

    #[test]
    fn test_remove_clears_dangling_match() {
        let mut registry = registry_with(&["Amy", "Bo"]);
        registry
            .commit_match(&MemberId::from("amy@lab.org"), &MemberId::from("bo@lab.org"))
            .unwrap();
        registry.remove("bo@lab.org");

        let amy = registry.get("amy@lab.org").unwrap();
        assert!(amy.current_match.is_none());
        assert!(amy.unmatched);
    }

    #[test]
    fn test_commit_match_and_unmatch_all() {
        let mut registry = registry_with(&["Amy", "Bo"]);
        let amy = MemberId::from("amy@lab.org");
        let bo = MemberId::from("bo@lab.org");

        registry.commit_match(&amy, &bo).unwrap();
        assert_eq!(registry.get("amy@lab.org").unwrap().current_match, Some(bo.clone()));
        assert_eq!(registry.get("bo@lab.org").unwrap().current_match, Some(amy.clone()));
        assert!(!registry.get("bo@lab.org").unwrap().unmatched);

        registry.unmatch_all();
        let member = registry.get("amy@lab.org").unwrap();
        assert_eq!(member.prev_match, Some(bo));
        assert!(member.current_match.is_none());
        assert!(member.unmatched);
    }

    #[test]
    fn test_commit_match_unknown_member_fails() {
        let mut registry = registry_with(&["Amy"]);
        let err = registry
            .commit_match(&MemberId::from("amy@lab.org"), &MemberId::from("ghost@lab.org"))
            .unwrap_err();
        assert!(matches!(err, BuddyError::MemberNotFound { ref id } if id == "ghost@lab.org"));
        // 失敗時不做部分更新
        assert!(registry.get("amy@lab.org").unwrap().current_match.is_none());

        let amy = MemberId::from("amy@lab.org");
        assert!(matches!(
            registry.commit_match(&amy, &amy),
            Err(BuddyError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_import_builds_from_scratch() {
        let mut registry = MemberRegistry::new();
        let mut random = RngSource::seeded(11);
        let summary = registry.import(
            vec![
                record("Amy", "amy@lab.org"),
                record("Bo", "bo@lab.org"),
                record("Cal", "cal@lab.org"),
                record("Bo Twin", "bo@lab.org"),
                MemberRecord::new("Nobody", ""),
                record("Di", "di@lab.org").with_capacity(0),
            ],
            &mut random,
        );

        assert_eq!(summary.added.len(), 4);
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(summary.parity, ParityAction::ByeActivated);
        assert_eq!(registry.real_active_count(), 3);
        assert_balanced(&registry);

        let names: Vec<&str> = registry.members().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Bo", "Cal", "Di"]);
    }

    #[test]
    fn test_import_into_existing_registry_is_incremental() {
        let mut registry = registry_with(&["Amy", "Bo"]);
        let mut random = RngSource::seeded(3);
        let summary = registry.import(
            vec![record("Amy Dup", "amy@lab.org"), record("Cal", "cal@lab.org")],
            &mut random,
        );

        assert_eq!(summary.added, vec![MemberId::from("cal@lab.org")]);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(registry.get("amy@lab.org").unwrap().name, "Amy");
        assert!(registry.partition().has_bye());
        assert_balanced(&registry);
    }

    #[test]
    fn test_match_report_hides_unmatched_partners() {
        let mut registry = registry_with(&["Amy", "Bo", "Cal"]);
        registry
            .commit_match(&MemberId::from("amy@lab.org"), &MemberId::from("cal@lab.org"))
            .unwrap();

        let report = registry.match_report();
        assert_eq!(report.len(), 3);
        assert_eq!(report.partner_of("Amy (amy@lab.org)"), Some("Cal (cal@lab.org)"));
        assert_eq!(report.partner_of("Bo (bo@lab.org)"), None);
        assert!(report.entries.iter().all(|e| !e.member.contains("bye")));
    }

    #[test]
    fn test_check_consistency_detects_missing_member() {
        let mut registry = registry_with(&["Amy", "Bo"]);
        registry
            .partition_mut()
            .remove(&Slot::Member(MemberId::from("amy@lab.org")));
        assert!(registry.check_consistency().is_err());
    }
}
