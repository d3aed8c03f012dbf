//! Risk events: a stranger's wager. Walking away is always safe.

use super::{ChoiceEncounter, EncounterKind, PathChoice, RawRewards};
use crate::failure::FailureKind;

#[must_use]
pub fn risk_event(depth: u32) -> ChoiceEncounter {
    let paths = vec![
        // Modifier offsets the maximum depth pressure so this never fails.
        PathChoice::new("walk_away", "Walk away", 1.0, FailureKind::GambleLost)
            .modifiers(0.3, 0.0),
        PathChoice::new("wager", "Place a wager", 0.55, FailureKind::GambleLost)
            .modifiers(-0.05, 2.0)
            .reward(RawRewards {
                treasure: 40,
                items: 1,
                ..RawRewards::default()
            })
            .failure_loss(50),
        PathChoice::new("all_in", "Go all in", 0.35, FailureKind::GambleLost)
            .modifiers(-0.1, 4.0)
            .reward(RawRewards {
                treasure: 60,
                items: 2,
                ..RawRewards::default()
            })
            .failure_loss(120),
    ];
    ChoiceEncounter::pressured(EncounterKind::RiskEvent, depth, paths)
}
