use crate::core::registry::{ImportSummary, MemberRegistry, MembershipChange};
use crate::core::rotation::RotationEngine;
use crate::domain::model::{GroupSnapshot, MatchReport, MemberRecord, RoundOutcome};
use crate::domain::ports::RandomSource;
use crate::utils::error::Result;

/// A named buddy group: its member registry plus the rotation state.
pub struct BuddyGroup<R: RandomSource> {
    name: String,
    registry: MemberRegistry,
    rotation: RotationEngine,
    random: R,
}

impl<R: RandomSource> BuddyGroup<R> {
    pub fn new(name: impl Into<String>, random: R) -> Self {
        Self {
            name: name.into(),
            registry: MemberRegistry::new(),
            rotation: RotationEngine::new(),
            random,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &MemberRegistry {
        &self.registry
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rotation.rounds_completed()
    }

    pub fn import(&mut self, records: Vec<MemberRecord>) -> ImportSummary {
        self.registry.import(records, &mut self.random)
    }

    pub fn add_member(&mut self, record: MemberRecord) -> MembershipChange {
        self.registry.add(record)
    }

    pub fn remove_member(&mut self, email: &str) -> MembershipChange {
        self.registry.remove(email)
    }

    pub fn update_capacity(&mut self, email: &str, capacity: u32) -> MembershipChange {
        self.registry.update_capacity(email, capacity)
    }

    pub fn update_role(&mut self, email: &str, role: &str) -> MembershipChange {
        self.registry.update_role(email, role)
    }

    pub fn run_round(&mut self) -> Result<RoundOutcome> {
        self.rotation.run_round(&mut self.registry, &mut self.random)
    }

    pub fn rematch_if_stale(&mut self) -> Result<Option<RoundOutcome>> {
        self.rotation
            .rematch_if_stale(&mut self.registry, &mut self.random)
    }

    pub fn match_report(&self) -> MatchReport {
        self.registry.match_report()
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        self.registry.snapshot(
            &self.name,
            self.rotation.rounds_completed(),
            self.rotation.last_run(),
        )
    }
}
