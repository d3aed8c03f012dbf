//! Energy economy math: run budgets, return costs and advisory risk.
//!
//! Every function here is total. Depth 0 is the surface. Callers are expected
//! to pass depths the map can actually produce; very large depths are
//! defined (the curve saturates at `u32::MAX`) but meaningless for play.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SAFETY_BUFFER, MSG_CONTINUE_SAFE, MSG_REST_RECOVER, MSG_RETURN_HIGH_RISK,
    MSG_RETURN_PAST_NO_RETURN, MSG_RETURN_UNAFFORDABLE, NODE_COST_BASE, NODE_COST_PER_DEPTH,
    OPTIMAL_DEPTH_SEARCH_LIMIT, REST_ADVICE_MIN_DEPTH, RETURN_COST_BASE, RETURN_COST_EXPONENT,
    RISK_CAUTION, RISK_DANGER, STREAK_BONUS_RATIO, STREAK_STEP_THRESHOLD,
};
use crate::encounters::EncounterKind;
use crate::numbers::{floor_f64_to_u32, i64_to_f64, round_f64_to_u32};

/// A discovered passage that makes returning from deep levels cheaper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub id: String,
    pub from_depth: u32,
    pub to_depth: u32,
    pub energy_reduction: u32,
    #[serde(default = "default_permanent")]
    pub is_permanent: bool,
}

const fn default_permanent() -> bool {
    true
}

impl Shortcut {
    /// Whether this shortcut lies on the way back up from `depth`.
    #[must_use]
    pub const fn applies_from(&self, depth: u32) -> bool {
        self.to_depth < self.from_depth && self.from_depth <= depth
    }
}

/// Advisory action for the player at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Continue,
    Return,
    Rest,
}

impl RecommendedAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Return => "return",
            Self::Rest => "rest",
        }
    }
}

impl std::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub action: RecommendedAction,
    /// Message key describing why the action was chosen.
    pub reason: &'static str,
    pub risk_level: f64,
}

/// Whether a day's step count earns the streak bonus.
#[must_use]
pub const fn qualifies_for_streak(steps: u32) -> bool {
    steps >= STREAK_STEP_THRESHOLD
}

/// Bonus energy granted on top of the base step budget.
#[must_use]
pub fn calculate_streak_bonus(steps: u32) -> u32 {
    if qualifies_for_streak(steps) {
        floor_f64_to_u32(f64::from(steps) * STREAK_BONUS_RATIO)
    } else {
        0
    }
}

/// Total energy for a run funded by `steps`.
#[must_use]
pub fn calculate_run_energy(steps: u32, has_streak_bonus: bool) -> u32 {
    if has_streak_bonus {
        steps.saturating_add(floor_f64_to_u32(f64::from(steps) * STREAK_BONUS_RATIO))
    } else {
        steps
    }
}

fn raw_return_cost(depth: u32) -> u32 {
    if depth == 0 {
        return 0;
    }
    round_f64_to_u32(RETURN_COST_BASE * f64::from(depth).powf(RETURN_COST_EXPONENT))
}

fn shortcut_reduction(depth: u32, shortcuts: &[Shortcut]) -> u32 {
    shortcuts
        .iter()
        .filter(|shortcut| shortcut.applies_from(depth))
        .fold(0u32, |acc, shortcut| {
            acc.saturating_add(shortcut.energy_reduction)
        })
}

/// Raw curve difference between two depths, used to value shortcuts.
#[must_use]
pub fn raw_cost_between(from_depth: u32, to_depth: u32) -> u32 {
    raw_return_cost(from_depth).saturating_sub(raw_return_cost(to_depth))
}

/// Energy required to climb back to the surface from `depth`.
///
/// The curve escalates super-linearly. Shortcuts whose span lies on the way
/// up subtract their reduction, floored at zero, and the running maximum
/// over shallower depths keeps the cost monotonic.
#[must_use]
pub fn calculate_return_cost(depth: u32, shortcuts: &[Shortcut]) -> u32 {
    (1..=depth)
        .map(|d| raw_return_cost(d).saturating_sub(shortcut_reduction(d, shortcuts)))
        .max()
        .unwrap_or(0)
}

/// Signed headroom left after paying the return cost.
#[must_use]
pub fn calculate_safety_margin(energy: u32, return_cost: u32) -> i64 {
    i64::from(energy) - i64::from(return_cost)
}

#[must_use]
pub fn can_afford_return(energy: u32, return_cost: u32) -> bool {
    calculate_safety_margin(energy, return_cost) >= 0
}

/// Advisory risk in `[0, 1]`, rising as the safety margin shrinks relative
/// to remaining energy.
#[must_use]
pub fn calculate_risk_level(energy: u32, return_cost: u32) -> f64 {
    if energy == 0 {
        return 1.0;
    }
    let margin = i64_to_f64(calculate_safety_margin(energy, return_cost));
    (1.0 - margin / f64::from(energy)).clamp(0.0, 1.0)
}

/// Energy floor below which continuing deeper is classified dangerous.
#[must_use]
pub const fn calculate_point_of_no_return(return_cost: u32, safety_buffer: u32) -> u32 {
    return_cost.saturating_add(safety_buffer)
}

/// Point of no return with the default ten-point buffer.
#[must_use]
pub const fn default_point_of_no_return(return_cost: u32) -> u32 {
    calculate_point_of_no_return(return_cost, DEFAULT_SAFETY_BUFFER)
}

/// Deterministic advisory for the current position. Never blocks actions.
#[must_use]
pub fn get_recommended_action(energy: u32, return_cost: u32, depth: u32) -> Recommendation {
    get_recommended_action_with_buffer(energy, return_cost, depth, DEFAULT_SAFETY_BUFFER)
}

/// [`get_recommended_action`] with a caller-chosen safety buffer.
#[must_use]
pub fn get_recommended_action_with_buffer(
    energy: u32,
    return_cost: u32,
    depth: u32,
    safety_buffer: u32,
) -> Recommendation {
    let risk_level = calculate_risk_level(energy, return_cost);
    let (action, reason) = if !can_afford_return(energy, return_cost) {
        (RecommendedAction::Return, MSG_RETURN_UNAFFORDABLE)
    } else if energy < calculate_point_of_no_return(return_cost, safety_buffer) {
        (RecommendedAction::Return, MSG_RETURN_PAST_NO_RETURN)
    } else if risk_level >= RISK_DANGER {
        (RecommendedAction::Return, MSG_RETURN_HIGH_RISK)
    } else if risk_level >= RISK_CAUTION && depth >= REST_ADVICE_MIN_DEPTH {
        (RecommendedAction::Rest, MSG_REST_RECOVER)
    } else {
        (RecommendedAction::Continue, MSG_CONTINUE_SAFE)
    };
    Recommendation {
        action,
        reason,
        risk_level,
    }
}

/// Deepest depth whose return cost is still affordable with `energy`.
#[must_use]
pub fn calculate_optimal_depth(energy: u32, shortcuts: &[Shortcut]) -> u32 {
    let mut running_cost = 0u32;
    let mut deepest = 0u32;
    for depth in 1..=OPTIMAL_DEPTH_SEARCH_LIMIT {
        let cost = raw_return_cost(depth).saturating_sub(shortcut_reduction(depth, shortcuts));
        running_cost = running_cost.max(cost);
        if running_cost > energy {
            break;
        }
        deepest = depth;
    }
    deepest
}

/// Energy spent entering a node of `kind` at `depth`.
#[must_use]
pub fn calculate_node_energy_cost(depth: u32, kind: EncounterKind) -> u32 {
    let base = NODE_COST_PER_DEPTH.mul_add(f64::from(depth), NODE_COST_BASE);
    round_f64_to_u32(base * kind.traversal_weight())
}
