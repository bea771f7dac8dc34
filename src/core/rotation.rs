//! Pairing rounds.
//!
//! Round 0 pairs the shuffled split as-is. Every later round rotates pool B
//! by one position before pairing, then swaps one random index between the
//! pools so the rotation does not cycle through the same offsets forever.

use crate::core::registry::MemberRegistry;
use crate::domain::model::RoundOutcome;
use crate::domain::ports::RandomSource;
use crate::utils::error::{BuddyError, Result};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct RotationEngine {
    round: u64,
    last_run: Option<DateTime<Utc>>,
}

impl RotationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rounds_completed(&self) -> u64 {
        self.round
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    pub fn run_round<R>(&mut self, registry: &mut MemberRegistry, random: &mut R) -> Result<RoundOutcome>
    where
        R: RandomSource + ?Sized,
    {
        registry.unmatch_all();
        registry.stabilize_parity();
        Self::check_pools(registry)?;

        let rotating = self.round > 0;
        if rotating {
            registry.partition_mut().rotate_b();
        }

        let pairs = registry.partition().pairs();
        let mut bye_member = None;
        for pair in &pairs {
            match &pair.second {
                Some(partner) => {
                    tracing::debug!("Round {}: {} <--> {}", self.round, pair.first, partner);
                    registry.commit_match(&pair.first, partner)?;
                }
                None => {
                    tracing::debug!("Round {}: {} sits out", self.round, pair.first);
                    bye_member = Some(pair.first.clone());
                }
            }
        }

        // 配對已寫入，之後才擾動 pool，影響的是下一輪
        let half = registry.active_count() / 2;
        if rotating && half > 0 {
            let index = random.uniform_index(half);
            registry.partition_mut().swap_at(index);
            tracing::debug!("Round {}: swapped pool slots at index {}", self.round, index);
        }

        let completed_at = Utc::now();
        let outcome = RoundOutcome {
            round: self.round,
            pairs,
            bye_member,
            completed_at,
        };

        tracing::info!(
            "🔄 Round {} complete: {} pairs from {} active slots",
            self.round,
            outcome.pairs.iter().filter(|p| !p.is_bye()).count(),
            registry.active_count()
        );

        self.round += 1;
        self.last_run = Some(completed_at);
        registry.mark_fresh();

        Ok(outcome)
    }

    /// Runs a round only when membership changed since the previous one.
    pub fn rematch_if_stale<R>(
        &mut self,
        registry: &mut MemberRegistry,
        random: &mut R,
    ) -> Result<Option<RoundOutcome>>
    where
        R: RandomSource + ?Sized,
    {
        if !registry.is_stale() {
            tracing::debug!("Membership unchanged since round {}, keeping pairs", self.round);
            return Ok(None);
        }
        self.run_round(registry, random).map(Some)
    }

    fn check_pools(registry: &MemberRegistry) -> Result<()> {
        let active_count = registry.active_count();
        let partition = registry.partition();
        let (a, b) = (partition.pool_a().len(), partition.pool_b().len());

        if active_count % 2 != 0 || a != b || a != active_count / 2 {
            return Err(BuddyError::invariant(format!(
                "pools must hold equal halves of the active members (A = {}, B = {}, active = {})",
                a, b, active_count
            )));
        }
        registry.check_consistency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MemberId, MemberRecord, Pair, Slot};
    use crate::utils::random::RngSource;
    use std::collections::VecDeque;

    /// Keeps the given order and replays scripted indices.
    struct ScriptedRandom {
        indices: VecDeque<usize>,
    }

    impl ScriptedRandom {
        fn new(indices: &[usize]) -> Self {
            Self {
                indices: indices.iter().copied().collect(),
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn shuffle(&mut self, _ids: &mut [MemberId]) {}

        fn uniform_index(&mut self, upper: usize) -> usize {
            self.indices.pop_front().unwrap_or(0) % upper
        }
    }

    fn pair(a: &str, b: &str) -> Pair {
        Pair {
            first: MemberId::from(a),
            second: Some(MemberId::from(b)),
        }
    }

    fn four_members() -> MemberRegistry {
        let mut registry = MemberRegistry::new();
        let mut random = ScriptedRandom::new(&[]);
        registry.import(
            vec![
                MemberRecord::new("Amy", "amy"),
                MemberRecord::new("Bo", "bo"),
                MemberRecord::new("Cal", "cal"),
                MemberRecord::new("Di", "di"),
            ],
            &mut random,
        );
        registry
    }

    #[test]
    fn test_first_round_pairs_split_without_rotation() {
        let mut registry = four_members();
        let mut engine = RotationEngine::new();
        let mut random = ScriptedRandom::new(&[]);

        let outcome = engine.run_round(&mut registry, &mut random).unwrap();
        assert_eq!(outcome.round, 0);
        assert_eq!(outcome.pairs, vec![pair("amy", "bo"), pair("cal", "di")]);
        assert_eq!(
            registry.get("amy").unwrap().current_match,
            Some(MemberId::from("bo"))
        );
        assert_eq!(engine.rounds_completed(), 1);
        assert!(engine.last_run().is_some());
    }

    #[test]
    fn test_later_rounds_rotate_then_swap() {
        let mut registry = four_members();
        let mut engine = RotationEngine::new();
        let mut random = ScriptedRandom::new(&[0]);

        engine.run_round(&mut registry, &mut random).unwrap();
        let outcome = engine.run_round(&mut registry, &mut random).unwrap();
        assert_eq!(outcome.round, 1);
        assert_eq!(outcome.pairs, vec![pair("amy", "di"), pair("cal", "bo")]);

        // index 0 互換之後: A = [di, cal], B = [amy, bo]
        let partition = registry.partition();
        assert_eq!(partition.pool_a()[0], Slot::Member(MemberId::from("di")));
        assert_eq!(partition.pool_b()[0], Slot::Member(MemberId::from("amy")));
        // swap does not touch the committed pairing
        assert_eq!(registry.get("amy").unwrap().current_match, Some(MemberId::from("di")));

        let outcome = engine.run_round(&mut registry, &mut random).unwrap();
        assert_eq!(outcome.pairs, vec![pair("di", "bo"), pair("cal", "amy")]);
        assert_eq!(registry.get("amy").unwrap().prev_match, Some(MemberId::from("di")));
    }

    #[test]
    fn test_odd_group_leaves_one_member_out() {
        let mut registry = four_members();
        registry.add(MemberRecord::new("Eve", "eve"));
        let mut engine = RotationEngine::new();
        let mut random = RngSource::seeded(5);

        for _ in 0..6 {
            let outcome = engine.run_round(&mut registry, &mut random).unwrap();
            let bye = outcome.bye_member.expect("odd group always has a bye");
            let member = registry.get(bye.as_str()).unwrap();
            assert!(member.current_match.is_none());
            assert!(member.unmatched);
            assert_eq!(outcome.pairs.len(), 3);
        }
    }

    #[test]
    fn test_matches_are_symmetric() {
        let mut registry = MemberRegistry::new();
        let mut random = RngSource::seeded(99);
        let records = (0..10)
            .map(|i| MemberRecord::new(format!("M{}", i), format!("m{}@lab.org", i)))
            .collect();
        registry.import(records, &mut random);

        let mut engine = RotationEngine::new();
        for _ in 0..12 {
            engine.run_round(&mut registry, &mut random).unwrap();
            for member in registry.members() {
                let partner_id = member.current_match.as_ref().unwrap();
                assert_ne!(partner_id, &member.id);
                let partner = registry.get(partner_id.as_str()).unwrap();
                assert_eq!(partner.current_match.as_ref(), Some(&member.id));
            }
        }
    }

    #[test]
    fn test_empty_registry_round_is_noop() {
        let mut registry = MemberRegistry::new();
        let mut engine = RotationEngine::new();
        let mut random = RngSource::seeded(1);
        engine.run_round(&mut registry, &mut random).unwrap();
        let outcome = engine.run_round(&mut registry, &mut random).unwrap();
        assert!(outcome.pairs.is_empty());
        assert!(outcome.bye_member.is_none());
    }

    #[test]
    fn test_desynchronized_pools_are_fatal() {
        let mut registry = four_members();
        registry
            .partition_mut()
            .remove(&Slot::Member(MemberId::from("amy")));

        let mut engine = RotationEngine::new();
        let mut random = ScriptedRandom::new(&[]);
        let err = engine.run_round(&mut registry, &mut random).unwrap_err();
        assert!(matches!(err, BuddyError::InvariantViolation { .. }));
        assert_eq!(engine.rounds_completed(), 0);
    }

    #[test]
    fn test_rematch_if_stale() {
        let mut registry = four_members();
        let mut engine = RotationEngine::new();
        let mut random = RngSource::seeded(2);

        assert!(engine.rematch_if_stale(&mut registry, &mut random).unwrap().is_some());
        assert!(engine.rematch_if_stale(&mut registry, &mut random).unwrap().is_none());

        registry.add(MemberRecord::new("Eve", "eve"));
        assert!(engine.rematch_if_stale(&mut registry, &mut random).unwrap().is_some());

        // 只改角色不算成員變動
        registry.update_role("eve", "mentor");
        assert!(engine.rematch_if_stale(&mut registry, &mut random).unwrap().is_none());
    }
}
