//! Hazards: a collapsing bridge, a flooded tunnel. Faster routes pay more and
//! fail more, and every route gets worse with depth.

use super::{ChoiceEncounter, EncounterKind, PathChoice, RawRewards};
use crate::failure::FailureKind;

#[must_use]
pub fn hazard(depth: u32) -> ChoiceEncounter {
    let paths = vec![
        PathChoice::new(
            "tread_carefully",
            "Tread carefully",
            0.85,
            FailureKind::HazardInjury,
        )
        .modifiers(0.0, 0.8)
        .reward(RawRewards {
            treasure: 20,
            ..RawRewards::default()
        })
        .failure_loss(20),
        PathChoice::new(
            "sprint_across",
            "Sprint across",
            0.75,
            FailureKind::HazardInjury,
        )
        .modifiers(-0.15, 1.5)
        .reward(RawRewards {
            treasure: 35,
            items: 1,
            ..RawRewards::default()
        })
        .failure_loss(40),
        PathChoice::new(
            "push_through",
            "Push straight through",
            0.7,
            FailureKind::HazardInjury,
        )
        .modifiers(-0.3, 2.2)
        .reward(RawRewards {
            treasure: 45,
            items: 1,
            ..RawRewards::default()
        })
        .failure_loss(60),
    ];
    ChoiceEncounter::pressured(EncounterKind::Hazard, depth, paths)
}
