//! Two ordered pools of active slots. Index `i` of pool A is paired with
//! index `i` of pool B.

use crate::domain::model::{MemberId, Pair, Slot};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    A,
    B,
}

impl Pool {
    pub fn other(self) -> Self {
        match self {
            Pool::A => Pool::B,
            Pool::B => Pool::A,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupPartition {
    pool_a: Vec<Slot>,
    pool_b: Vec<Slot>,
}

impl GroupPartition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool_a(&self) -> &[Slot] {
        &self.pool_a
    }

    pub fn pool_b(&self) -> &[Slot] {
        &self.pool_b
    }

    /// Total number of occupied slots, bye included.
    pub fn len(&self) -> usize {
        self.pool_a.len() + self.pool_b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool_a.is_empty() && self.pool_b.is_empty()
    }

    pub fn is_balanced(&self) -> bool {
        self.pool_a.len() == self.pool_b.len()
    }

    pub fn has_bye(&self) -> bool {
        self.locate(&Slot::Bye).is_some()
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.locate(slot).is_some()
    }

    pub fn locate(&self, slot: &Slot) -> Option<(Pool, usize)> {
        if let Some(index) = self.pool_a.iter().position(|s| s == slot) {
            return Some((Pool::A, index));
        }
        self.pool_b
            .iter()
            .position(|s| s == slot)
            .map(|index| (Pool::B, index))
    }

    pub fn same_pool(&self, first: &Slot, second: &Slot) -> bool {
        match (self.locate(first), self.locate(second)) {
            (Some((p1, _)), Some((p2, _))) => p1 == p2,
            _ => false,
        }
    }

    /// Appends `slot` following the balancing rule:
    /// 1. shorter pool wins;
    /// 2. on a tie, the pool currently holding the bye;
    /// 3. otherwise A for an even `ordinal`, B for an odd one.
    ///
    /// Returns the chosen pool, or `None` when the slot is already placed.
    pub fn insert(&mut self, slot: Slot, ordinal: usize) -> Option<Pool> {
        if self.contains(&slot) {
            return None;
        }

        let target = match self.pool_a.len().cmp(&self.pool_b.len()) {
            Ordering::Less => Pool::A,
            Ordering::Greater => Pool::B,
            Ordering::Equal => match self.locate(&Slot::Bye) {
                Some((pool, _)) => pool,
                None if ordinal % 2 == 0 => Pool::A,
                None => Pool::B,
            },
        };

        tracing::debug!("Placing {} into pool {:?} (ordinal {})", slot, target, ordinal);
        self.pool_mut(target).push(slot);
        Some(target)
    }

    /// Removes `slot` from whichever pool holds it.
    ///
    /// A member sharing a pool with the bye first trades places with its
    /// counterpart in the other pool, so withdrawing the bye afterwards
    /// leaves both pools the same length.
    pub fn remove(&mut self, slot: &Slot) -> bool {
        let Some((mut pool, index)) = self.locate(slot) else {
            return false;
        };

        if !slot.is_bye() && self.same_pool(slot, &Slot::Bye) && index < self.pool(pool.other()).len()
        {
            self.swap_at(index);
            pool = pool.other();
            tracing::debug!("Swapped {} across pools at index {} before removal", slot, index);
        }

        self.pool_mut(pool).remove(index);
        true
    }

    /// Cyclic shift of pool B by one position; the last slot moves to the front.
    pub fn rotate_b(&mut self) {
        if !self.pool_b.is_empty() {
            self.pool_b.rotate_right(1);
        }
    }

    /// Exchanges `A[index]` and `B[index]`.
    pub fn swap_at(&mut self, index: usize) -> bool {
        if index >= self.pool_a.len() || index >= self.pool_b.len() {
            return false;
        }
        std::mem::swap(&mut self.pool_a[index], &mut self.pool_b[index]);
        true
    }

    /// Index-aligned pairs `A[i] <-> B[i]`.
    pub fn pairs(&self) -> Vec<Pair> {
        self.pool_a
            .iter()
            .zip(self.pool_b.iter())
            .filter_map(|(a, b)| Pair::from_slots(a, b))
            .collect()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &MemberId> {
        self.pool_a
            .iter()
            .chain(self.pool_b.iter())
            .filter_map(Slot::member_id)
    }

    fn pool(&self, pool: Pool) -> &Vec<Slot> {
        match pool {
            Pool::A => &self.pool_a,
            Pool::B => &self.pool_b,
        }
    }

    fn pool_mut(&mut self, pool: Pool) -> &mut Vec<Slot> {
        match pool {
            Pool::A => &mut self.pool_a,
            Pool::B => &mut self.pool_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str) -> Slot {
        Slot::Member(MemberId::from(id))
    }

    fn ids(pool: &[Slot]) -> Vec<String> {
        pool.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_alternates_by_ordinal_when_balanced() {
        let mut partition = GroupPartition::new();
        for (i, id) in ["amy", "bo", "cal", "di"].iter().enumerate() {
            partition.insert(slot(id), i);
        }

        assert_eq!(ids(partition.pool_a()), vec!["amy", "cal"]);
        assert_eq!(ids(partition.pool_b()), vec!["bo", "di"]);
        assert!(partition.is_balanced());
    }

    #[test]
    fn test_insert_prefers_shorter_pool() {
        let mut partition = GroupPartition::new();
        partition.insert(slot("amy"), 0);
        // ordinal 2 would pick A on a tie, but B is shorter
        assert_eq!(partition.insert(slot("bo"), 2), Some(Pool::B));
    }

    #[test]
    fn test_insert_ties_go_to_bye_pool() {
        let mut partition = GroupPartition::new();
        partition.insert(slot("amy"), 0);
        partition.insert(Slot::Bye, 1);
        assert_eq!(ids(partition.pool_b()), vec!["<bye>"]);

        // 平手時跟著 bye 所在的 pool，odd ordinal 本來會選 B
        assert_eq!(partition.insert(slot("bo"), 3), Some(Pool::B));
        // ordinal 1 would pick B, but A is now shorter
        assert_eq!(partition.insert(slot("cal"), 1), Some(Pool::A));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut partition = GroupPartition::new();
        assert!(partition.insert(slot("amy"), 0).is_some());
        assert!(partition.insert(slot("amy"), 1).is_none());
        assert_eq!(partition.len(), 1);
    }

    #[test]
    fn test_remove_member_sharing_pool_with_bye_swaps_first() {
        let mut partition = GroupPartition::new();
        // A = [x, bye], B = [y, z]
        partition.insert(slot("x"), 0);
        partition.insert(slot("y"), 1);
        partition.insert(slot("z"), 3);
        partition.insert(Slot::Bye, 3);
        assert_eq!(ids(partition.pool_a()), vec!["x", "<bye>"]);
        assert_eq!(ids(partition.pool_b()), vec!["y", "z"]);

        assert!(partition.remove(&slot("x")));
        assert_eq!(ids(partition.pool_a()), vec!["y", "<bye>"]);
        assert_eq!(ids(partition.pool_b()), vec!["z"]);

        // withdrawing the bye now leaves the pools balanced
        assert!(partition.remove(&Slot::Bye));
        assert!(partition.is_balanced());
        assert_eq!(ids(partition.pool_a()), vec!["y"]);
        assert_eq!(ids(partition.pool_b()), vec!["z"]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut partition = GroupPartition::new();
        partition.insert(slot("amy"), 0);
        assert!(!partition.remove(&slot("ghost")));
        assert!(!partition.remove(&Slot::Bye));
        assert_eq!(partition.len(), 1);
    }

    #[test]
    fn test_same_pool() {
        let mut partition = GroupPartition::new();
        partition.insert(slot("amy"), 0);
        partition.insert(slot("bo"), 1);
        partition.insert(slot("cal"), 2);
        assert!(partition.same_pool(&slot("amy"), &slot("cal")));
        assert!(!partition.same_pool(&slot("amy"), &slot("bo")));
        assert!(!partition.same_pool(&slot("amy"), &slot("ghost")));
    }

    #[test]
    fn test_rotate_b_moves_last_to_front() {
        let mut partition = GroupPartition::new();
        for (i, id) in ["a1", "b1", "a2", "b2", "a3", "b3"].iter().enumerate() {
            partition.insert(slot(id), i);
        }
        partition.rotate_b();
        assert_eq!(ids(partition.pool_b()), vec!["b3", "b1", "b2"]);

        let pairs = partition.pairs();
        assert_eq!(pairs[0].first.as_str(), "a1");
        assert_eq!(pairs[0].second.as_ref().map(|s| s.as_str()), Some("b3"));
    }

    #[test]
    fn test_rotate_empty_partition() {
        let mut partition = GroupPartition::new();
        partition.rotate_b();
        assert!(partition.is_empty());
        assert!(!partition.swap_at(0));
    }

    #[test]
    fn test_pairs_with_bye_leave_member_unpaired() {
        let mut partition = GroupPartition::new();
        partition.insert(slot("amy"), 0);
        partition.insert(Slot::Bye, 1);
        let pairs = partition.pairs();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].is_bye());
        assert_eq!(partition.member_ids().count(), 1);
    }
}
