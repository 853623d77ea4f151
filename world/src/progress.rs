use std::collections::BTreeSet;

use sundial_core::{CellCoord, DoorType, InteractionRejection};

use crate::entities::DoorState;

/// Win-condition flags for a single level attempt. Every transition is latched so that
/// repeated evaluation settles instead of re-firing.
#[derive(Clone, Debug, Default)]
pub(crate) struct Progress {
    has_scroll: bool,
    powered_doors: BTreeSet<CellCoord>,
    completed: bool,
    true_ending: bool,
}

impl Progress {
    pub(crate) fn has_scroll(&self) -> bool {
        self.has_scroll
    }

    pub(crate) fn powered_doors(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.powered_doors.iter().copied()
    }

    /// Returns `true` only for the first collection.
    pub(crate) fn collect_scroll(&mut self) -> bool {
        !std::mem::replace(&mut self.has_scroll, true)
    }

    /// Returns `true` only when the door was not powered before.
    pub(crate) fn power_door(&mut self, at: CellCoord) -> bool {
        self.powered_doors.insert(at)
    }

    /// Returns `true` only for the first completion.
    pub(crate) fn complete(&mut self) -> bool {
        !std::mem::replace(&mut self.completed, true)
    }

    /// Returns `true` only for the first unlock.
    pub(crate) fn unlock_true_ending(&mut self) -> bool {
        !std::mem::replace(&mut self.true_ending, true)
    }

    /// Whether a chant of `power` unlocks the door right now.
    pub(crate) fn chant_unlocks(&self, door: &DoorState, power: u32) -> bool {
        door.door_type == DoorType::EndDoor && self.has_scroll && power >= door.required_power
    }

    /// Decides whether interacting with `door` wins the level.
    pub(crate) fn check_interaction(&self, door: &DoorState) -> Result<(), InteractionRejection> {
        if door.door_type == DoorType::BeginDoor {
            return Err(InteractionRejection::BeginDoor);
        }
        if self.completed {
            return Err(InteractionRejection::AlreadyComplete);
        }
        if !self.has_scroll {
            return Err(InteractionRejection::MissingScroll);
        }
        if !door.powered {
            return Err(InteractionRejection::DoorUnpowered);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_door(required_power: u32, powered: bool) -> DoorState {
        DoorState {
            required_power,
            door_type: DoorType::EndDoor,
            powered,
        }
    }

    #[test]
    fn latches_fire_once() {
        let mut progress = Progress::default();
        assert!(progress.collect_scroll());
        assert!(!progress.collect_scroll());
        assert!(progress.has_scroll());

        let door = CellCoord::new(5, 5);
        assert!(progress.power_door(door));
        assert!(!progress.power_door(door));
        assert_eq!(progress.powered_doors().collect::<Vec<_>>(), vec![door]);

        assert!(progress.complete());
        assert!(!progress.complete());
        assert!(progress.unlock_true_ending());
        assert!(!progress.unlock_true_ending());
    }

    #[test]
    fn chant_unlock_needs_scroll_and_power() {
        let mut progress = Progress::default();
        let door = end_door(3, false);
        assert!(!progress.chant_unlocks(&door, 3));

        let _ = progress.collect_scroll();
        assert!(!progress.chant_unlocks(&door, 2));
        assert!(progress.chant_unlocks(&door, 3));
        assert!(progress.chant_unlocks(&door, 4));

        let begin = DoorState {
            door_type: DoorType::BeginDoor,
            ..door
        };
        assert!(!progress.chant_unlocks(&begin, 9));
    }

    #[test]
    fn interaction_reports_first_missing_condition() {
        let mut progress = Progress::default();
        assert_eq!(
            progress.check_interaction(&end_door(3, false)),
            Err(InteractionRejection::MissingScroll)
        );

        let _ = progress.collect_scroll();
        assert_eq!(
            progress.check_interaction(&end_door(3, false)),
            Err(InteractionRejection::DoorUnpowered)
        );
        assert_eq!(progress.check_interaction(&end_door(3, true)), Ok(()));

        let _ = progress.complete();
        assert_eq!(
            progress.check_interaction(&end_door(3, true)),
            Err(InteractionRejection::AlreadyComplete)
        );
    }
}
