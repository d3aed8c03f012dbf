//! Failure consequence calculation.
//!
//! Pure transforms from "the encounter went badly" into energy loss, an
//! item-loss probability and an optional lockout on the node. Applying them
//! to a run is the session's job.

use serde::{Deserialize, Serialize};

use crate::constants::{
    FAILURE_BASE_PENALTY, ITEM_LOSS_CAP, ITEM_LOSS_PER_DEPTH, LOCKOUT_BASE_TURNS, LOCKOUT_DEPTH,
    LOCKOUT_SEVERITY, REWARD_DEPTH_SCALE,
};
use crate::numbers::round_f64_to_u32;

/// How an encounter was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PuzzleExhausted,
    CaveIn,
    HazardInjury,
    GambleLost,
    RestDisturbed,
    CombatDefeat,
    Fled,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PuzzleExhausted => "puzzle_exhausted",
            Self::CaveIn => "cave_in",
            Self::HazardInjury => "hazard_injury",
            Self::GambleLost => "gamble_lost",
            Self::RestDisturbed => "rest_disturbed",
            Self::CombatDefeat => "combat_defeat",
            Self::Fled => "fled",
        }
    }

    const fn severity(self) -> f64 {
        match self {
            Self::RestDisturbed => 0.8,
            Self::PuzzleExhausted | Self::Fled => 1.0,
            Self::CaveIn => 1.1,
            Self::GambleLost => 1.2,
            Self::HazardInjury => 1.4,
            Self::CombatDefeat => 1.5,
        }
    }

    const fn base_item_loss(self) -> f64 {
        match self {
            Self::Fled => 0.0,
            Self::PuzzleExhausted | Self::RestDisturbed => 0.05,
            Self::CaveIn => 0.1,
            Self::HazardInjury => 0.15,
            Self::CombatDefeat => 0.2,
            Self::GambleLost => 0.25,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temporary ban on re-entering a node after a bad failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterLockout {
    pub node_id: String,
    pub turns_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureConsequence {
    pub node_id: String,
    pub failure: FailureKind,
    /// Always at least the node's energy cost.
    pub energy_loss: u32,
    /// Probability that one carried item is lost; not a guaranteed loss.
    pub item_loss_chance: f64,
    pub lockout: Option<EncounterLockout>,
    pub message: String,
}

/// Compute what a failure costs at `depth` on a node with `energy_cost`.
#[must_use]
pub fn process_failure_consequences(
    failure: FailureKind,
    depth: u32,
    node_id: &str,
    energy_cost: u32,
) -> FailureConsequence {
    let depth_factor = REWARD_DEPTH_SCALE.mul_add(f64::from(depth.saturating_sub(1)), 1.0);
    let penalty = round_f64_to_u32(FAILURE_BASE_PENALTY * failure.severity() * depth_factor);
    let energy_loss = energy_cost.saturating_add(penalty);

    let item_loss_chance = ITEM_LOSS_PER_DEPTH
        .mul_add(f64::from(depth), failure.base_item_loss())
        .clamp(0.0, ITEM_LOSS_CAP);
    let item_loss_chance = if matches!(failure, FailureKind::Fled) {
        0.0
    } else {
        item_loss_chance
    };

    let lockout = (failure.severity() >= LOCKOUT_SEVERITY || depth >= LOCKOUT_DEPTH).then(|| {
        EncounterLockout {
            node_id: node_id.to_string(),
            turns_remaining: LOCKOUT_BASE_TURNS + depth / 5,
        }
    });

    FailureConsequence {
        node_id: node_id.to_string(),
        failure,
        energy_loss,
        item_loss_chance,
        lockout,
        message: format!("failure.{}", failure.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_loss_covers_node_cost() {
        let consequence = process_failure_consequences(FailureKind::PuzzleExhausted, 1, "n", 120);
        assert_eq!(consequence.energy_loss, 145);
        assert_eq!(consequence.message, "failure.puzzle_exhausted");
        assert!(consequence.lockout.is_none());

        let free_node = process_failure_consequences(FailureKind::GambleLost, 1, "n", 0);
        assert!(free_node.energy_loss > 0);
    }

    #[test]
    fn deeper_failures_hurt_more() {
        let shallow = process_failure_consequences(FailureKind::CaveIn, 1, "n", 100);
        let deep = process_failure_consequences(FailureKind::CaveIn, 12, "n", 100);
        assert!(deep.energy_loss > shallow.energy_loss);
        assert!(deep.item_loss_chance > shallow.item_loss_chance);
    }

    #[test]
    fn item_loss_is_a_bounded_probability() {
        for failure in [
            FailureKind::PuzzleExhausted,
            FailureKind::CaveIn,
            FailureKind::HazardInjury,
            FailureKind::GambleLost,
            FailureKind::RestDisturbed,
            FailureKind::CombatDefeat,
        ] {
            let c = process_failure_consequences(failure, 90, "n", 10);
            assert!((0.0..=ITEM_LOSS_CAP).contains(&c.item_loss_chance));
        }
        let fled = process_failure_consequences(FailureKind::Fled, 30, "n", 10);
        assert!(fled.item_loss_chance.abs() < f64::EPSILON);
    }

    #[test]
    fn severe_or_deep_failures_lock_the_node() {
        let combat = process_failure_consequences(FailureKind::CombatDefeat, 2, "node-2-1", 50);
        let lockout = combat.lockout.expect("combat defeat locks");
        assert_eq!(lockout.node_id, "node-2-1");
        assert_eq!(lockout.turns_remaining, LOCKOUT_BASE_TURNS);

        let deep_rest = process_failure_consequences(FailureKind::RestDisturbed, 10, "x", 50);
        assert_eq!(deep_rest.lockout.map(|l| l.turns_remaining), Some(4));
    }
}
