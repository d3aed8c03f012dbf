use std::fmt;

use delve_game::{
    ActiveEncounter, ChoiceEncounter, DepthFeedback, DungeonNode, EncounterAction, EncounterKind,
    PuzzleChamber, RecommendedAction, RiskBand, Scoundrel, ScoundrelMove, TradeOpportunity,
    TradeOptionId,
};
use clap::ValueEnum;
use serde::Serialize;

/// What a policy wants to do with the live encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterDecision {
    Act(EncounterAction),
    Flee,
}

/// Policy interface for automated delving.
pub trait DelvePolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Whether to take another step down from the current position.
    fn keep_descending(&mut self, feedback: &DepthFeedback) -> bool;

    /// Index into `moves` of the node to enter. `moves` is never empty.
    fn choose_move(&mut self, moves: &[&DungeonNode]) -> usize;

    fn decide(&mut self, encounter: &ActiveEncounter) -> EncounterDecision;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DelveStrategy {
    /// Stay in the safe band and take the likeliest paths
    Cautious,
    /// Descend to the optimal depth, weighing odds against reward
    Balanced,
    /// Push while the return is affordable and chase the biggest rewards
    Greedy,
}

impl DelveStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Balanced => "Balanced",
            Self::Greedy => "Greedy",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn DelvePolicy> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Greedy => Box::new(GreedyPolicy),
        }
    }
}

impl fmt::Display for DelveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct BalancedPolicy;
struct GreedyPolicy;

impl DelvePolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn keep_descending(&mut self, feedback: &DepthFeedback) -> bool {
        feedback.band == RiskBand::Safe
            && feedback.recommendation.action == RecommendedAction::Continue
    }

    fn choose_move(&mut self, moves: &[&DungeonNode]) -> usize {
        cheapest(moves, |node| (kind_danger(node.kind), node.energy_cost))
    }

    fn decide(&mut self, encounter: &ActiveEncounter) -> EncounterDecision {
        match encounter {
            ActiveEncounter::Scoundrel(game) => {
                let state = game.state();
                let smallest = state
                    .room
                    .iter()
                    .filter(|card| card.is_monster())
                    .map(|card| card.value)
                    .min();
                let only_monsters = state.room.iter().all(|card| card.is_monster());
                if only_monsters && smallest.is_some_and(|value| value >= state.life) {
                    return EncounterDecision::Flee;
                }
                scoundrel_move(game, state.can_skip && only_monsters)
            }
            ActiveEncounter::TradeOpportunity(trade) => trade_move(trade, &[TradeOptionId::A]),
            other => generic_move(other, |choice| best_path(choice, |odds, _| odds)),
        }
    }
}

impl DelvePolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn keep_descending(&mut self, feedback: &DepthFeedback) -> bool {
        feedback.recommendation.action != RecommendedAction::Return
            && feedback.depth < feedback.optimal_depth
    }

    fn choose_move(&mut self, moves: &[&DungeonNode]) -> usize {
        cheapest(moves, |node| (node.energy_cost, kind_danger(node.kind)))
    }

    fn decide(&mut self, encounter: &ActiveEncounter) -> EncounterDecision {
        match encounter {
            ActiveEncounter::Scoundrel(game) => scoundrel_move(game, false),
            ActiveEncounter::TradeOpportunity(trade) => {
                trade_move(trade, &[TradeOptionId::B, TradeOptionId::A])
            }
            other => generic_move(other, |choice| {
                best_path(choice, |odds, reward| odds * reward.max(1.0))
            }),
        }
    }
}

impl DelvePolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn keep_descending(&mut self, feedback: &DepthFeedback) -> bool {
        feedback.safety_margin > 0 && feedback.band != RiskBand::Critical
    }

    fn choose_move(&mut self, moves: &[&DungeonNode]) -> usize {
        cheapest(moves, |node| std::cmp::Reverse(kind_danger(node.kind)))
    }

    fn decide(&mut self, encounter: &ActiveEncounter) -> EncounterDecision {
        match encounter {
            ActiveEncounter::Scoundrel(game) => scoundrel_move(game, false),
            ActiveEncounter::TradeOpportunity(trade) => {
                trade_move(trade, &[TradeOptionId::C, TradeOptionId::B])
            }
            other => generic_move(other, |choice| best_path(choice, |_, reward| reward)),
        }
    }
}

/// Rough ordering of how punishing a node kind is to enter.
const fn kind_danger(kind: EncounterKind) -> u8 {
    match kind {
        EncounterKind::SafePassage => 0,
        EncounterKind::RestSite => 1,
        EncounterKind::TradeOpportunity => 2,
        EncounterKind::DiscoverySite | EncounterKind::PuzzleChamber => 3,
        EncounterKind::RiskEvent => 4,
        EncounterKind::Hazard => 5,
        EncounterKind::Scoundrel => 6,
    }
}

fn cheapest<K: Ord>(moves: &[&DungeonNode], key: impl Fn(&DungeonNode) -> K) -> usize {
    moves
        .iter()
        .enumerate()
        .min_by_key(|(_, node)| key(node))
        .map_or(0, |(idx, _)| idx)
}

/// Path id maximizing `score(success_chance, reward_modifier)`.
fn best_path(choice: &ChoiceEncounter, score: impl Fn(f64, f64) -> f64) -> Option<String> {
    choice
        .state()
        .paths
        .into_iter()
        .max_by(|a, b| {
            score(a.success_chance, a.reward_modifier)
                .total_cmp(&score(b.success_chance, b.reward_modifier))
        })
        .map(|path| path.id)
}

fn generic_move(
    encounter: &ActiveEncounter,
    pick: impl Fn(&ChoiceEncounter) -> Option<String>,
) -> EncounterDecision {
    match encounter {
        ActiveEncounter::PuzzleChamber(puzzle) => puzzle_move(puzzle),
        ActiveEncounter::DiscoverySite(choice)
        | ActiveEncounter::Hazard(choice)
        | ActiveEncounter::RiskEvent(choice)
        | ActiveEncounter::RestSite(choice) => {
            if choice.state().selected.is_some() {
                return EncounterDecision::Act(EncounterAction::Resolve);
            }
            pick(choice).map_or(EncounterDecision::Flee, |path| {
                EncounterDecision::Act(EncounterAction::SelectPath { path })
            })
        }
        ActiveEncounter::SafePassage(_) => EncounterDecision::Act(EncounterAction::Pass),
        ActiveEncounter::TradeOpportunity(trade) => trade_move(trade, &[TradeOptionId::A]),
        ActiveEncounter::Scoundrel(game) => scoundrel_move(game, false),
    }
}

/// Reveal hidden tiles from the centre outwards.
fn puzzle_move(puzzle: &PuzzleChamber) -> EncounterDecision {
    let state = puzzle.state();
    let centre = (state.rows / 2, state.cols / 2);
    let target = state
        .tiles
        .iter()
        .enumerate()
        .filter(|(_, tile)| tile.is_none())
        .map(|(idx, _)| (idx / state.cols, idx % state.cols))
        .min_by_key(|&(row, col)| row.abs_diff(centre.0) + col.abs_diff(centre.1));
    target.map_or(EncounterDecision::Flee, |(row, col)| {
        EncounterDecision::Act(EncounterAction::RevealTile { row, col })
    })
}

/// Take the first unused option from `wanted`, walking away once none is left.
fn trade_move(trade: &TradeOpportunity, wanted: &[TradeOptionId]) -> EncounterDecision {
    let state = trade.state();
    let next = wanted.iter().copied().find(|option| {
        state
            .offers
            .iter()
            .any(|offer| offer.id == *option && !offer.used)
    });
    EncounterDecision::Act(next.map_or(EncounterAction::WalkAway, |option| {
        EncounterAction::SelectTrade { option }
    }))
}

/// Heal when hurt, upgrade weapons, then fight the weakest monster.
fn scoundrel_move(game: &Scoundrel, skip: bool) -> EncounterDecision {
    let state = game.state();
    if skip {
        return EncounterDecision::Act(EncounterAction::Scoundrel {
            step: ScoundrelMove::SkipRoom,
        });
    }
    let play = |index: usize, use_weapon: bool| {
        EncounterDecision::Act(EncounterAction::Scoundrel {
            step: ScoundrelMove::Play { index, use_weapon },
        })
    };

    if state.life < state.max_life
        && let Some(idx) = state.room.iter().position(|card| card.is_potion())
    {
        return play(idx, false);
    }
    if let Some((idx, _)) = state
        .room
        .iter()
        .enumerate()
        .filter(|(_, card)| card.is_weapon() && state.weapon.is_none_or(|w| card.value > w))
        .max_by_key(|(_, card)| card.value)
    {
        return play(idx, false);
    }
    if let Some((idx, card)) = state
        .room
        .iter()
        .enumerate()
        .filter(|(_, card)| card.is_monster())
        .min_by_key(|(_, card)| card.value)
    {
        let can_strike = state.weapon.is_some()
            && state
                .weapon_last_slain
                .is_none_or(|last| card.value <= last);
        return play(idx, can_strike);
    }
    play(0, false)
}
