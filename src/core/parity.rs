use crate::core::partition::GroupPartition;
use crate::domain::model::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityAction {
    Unchanged,
    ByeActivated,
    ByeDeactivated,
}

/// Keeps the number of occupied slots even by toggling the bye.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParityStabilizer;

impl ParityStabilizer {
    /// An odd number of real active members needs a bye.
    pub fn needs_bye(real_active_count: usize) -> bool {
        real_active_count % 2 == 1
    }

    pub fn stabilize(partition: &mut GroupPartition) -> ParityAction {
        let active_count = partition.len();
        if active_count % 2 == 0 {
            return ParityAction::Unchanged;
        }

        if partition.has_bye() {
            partition.remove(&Slot::Bye);
            tracing::debug!("Active count {} is odd, bye withdrawn", active_count);
            ParityAction::ByeDeactivated
        } else {
            partition.insert(Slot::Bye, active_count);
            tracing::debug!("Active count {} is odd, bye added", active_count);
            ParityAction::ByeActivated
        }
    }
}
