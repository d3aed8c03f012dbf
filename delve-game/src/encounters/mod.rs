//! Encounter variants and the tagged union that dispatches between them.
//!
//! Each variant is an owned state machine. `ActiveEncounter::spawn` is the
//! single place a kind is mapped to its constructor, so adding a kind is a
//! compile-checked change.

pub mod choices;
pub mod discovery;
pub mod hazard;
pub mod kind;
pub mod puzzle;
pub mod rest_site;
pub mod risk_event;
pub mod safe_passage;
pub mod scoundrel;
pub mod trade;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DelveError;
use crate::failure::FailureKind;

pub use choices::{ChoiceEncounter, ChoiceState, PathChoice};
pub use kind::EncounterKind;
pub use puzzle::{PuzzleChamber, PuzzleState, TileKind};
pub use safe_passage::SafePassage;
pub use scoundrel::{Card, Scoundrel, ScoundrelMove, ScoundrelState, Suit};
pub use trade::{TradeOpportunity, TradeOptionId, TradeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Unscaled gains produced by a variant. Scaling happens in `rewards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawRewards {
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub treasure: u32,
    #[serde(default)]
    pub items: u32,
    /// Levels a discovered shortcut spans, zero when none was found.
    #[serde(default)]
    pub shortcut_levels: u32,
}

impl RawRewards {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.energy == 0 && self.treasure == 0 && self.items == 0 && self.shortcut_levels == 0
    }

    pub fn absorb(&mut self, other: Self) {
        self.energy = self.energy.saturating_add(other.energy);
        self.treasure = self.treasure.saturating_add(other.treasure);
        self.items = self.items.saturating_add(other.items);
        self.shortcut_levels = self.shortcut_levels.max(other.shortcut_levels);
    }
}

/// Unscaled cost attached to an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawConsequence {
    /// Energy paid on top of whatever the failure calculator charges.
    #[serde(default)]
    pub energy_loss: u32,
    #[serde(default)]
    pub failure: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(default)]
    pub reward: Option<RawRewards>,
    #[serde(default)]
    pub consequence: Option<RawConsequence>,
}

impl EncounterOutcome {
    #[must_use]
    pub fn success(message: impl Into<String>, reward: RawRewards) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: message.into(),
            reward: (!reward.is_empty()).then_some(reward),
            consequence: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>, failure: FailureKind, energy_loss: u32) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            message: message.into(),
            reward: None,
            consequence: Some(RawConsequence {
                energy_loss,
                failure: Some(failure),
            }),
        }
    }

    /// Attach an energy price paid even though the encounter succeeded.
    #[must_use]
    pub fn with_cost(mut self, energy_loss: u32) -> Self {
        if energy_loss > 0 {
            self.consequence = Some(RawConsequence {
                energy_loss,
                failure: None,
            });
        }
        self
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }

    /// The failure kind for failed outcomes.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.consequence.and_then(|c| c.failure)
    }
}

/// Player input routed to the active encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EncounterAction {
    RevealTile { row: usize, col: usize },
    SelectTrade { option: TradeOptionId },
    WalkAway,
    SelectPath { path: String },
    Resolve,
    Pass,
    Scoundrel { step: ScoundrelMove },
}

impl EncounterAction {
    const fn name(&self) -> &'static str {
        match self {
            Self::RevealTile { .. } => "reveal_tile",
            Self::SelectTrade { .. } => "select_trade",
            Self::WalkAway => "walk_away",
            Self::SelectPath { .. } => "select_path",
            Self::Resolve => "resolve",
            Self::Pass => "pass",
            Self::Scoundrel { .. } => "scoundrel",
        }
    }
}

/// Whether an action left the encounter open or ended it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Ongoing,
    Finished(OutcomeStatus),
}

impl Progress {
    #[must_use]
    pub fn from_outcome(outcome: Option<&EncounterOutcome>) -> Self {
        outcome.map_or(Self::Ongoing, |o| Self::Finished(o.status))
    }
}

/// One live encounter instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum ActiveEncounter {
    PuzzleChamber(PuzzleChamber),
    TradeOpportunity(TradeOpportunity),
    DiscoverySite(ChoiceEncounter),
    Hazard(ChoiceEncounter),
    RiskEvent(ChoiceEncounter),
    RestSite(ChoiceEncounter),
    SafePassage(SafePassage),
    Scoundrel(Scoundrel),
}

impl ActiveEncounter {
    /// Build the state machine for `kind` at `depth`.
    pub fn spawn<R: Rng>(kind: EncounterKind, depth: u32, rng: &mut R) -> Self {
        match kind {
            EncounterKind::PuzzleChamber => {
                Self::PuzzleChamber(PuzzleChamber::generate(depth, rng))
            }
            EncounterKind::TradeOpportunity => Self::TradeOpportunity(TradeOpportunity::new(depth)),
            EncounterKind::DiscoverySite => Self::DiscoverySite(discovery::discovery_site(depth)),
            EncounterKind::Hazard => Self::Hazard(hazard::hazard(depth)),
            EncounterKind::RiskEvent => Self::RiskEvent(risk_event::risk_event(depth)),
            EncounterKind::RestSite => Self::RestSite(rest_site::rest_site(depth)),
            EncounterKind::SafePassage => Self::SafePassage(SafePassage::new(depth)),
            EncounterKind::Scoundrel => Self::Scoundrel(Scoundrel::shuffled(depth, rng)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EncounterKind {
        match self {
            Self::PuzzleChamber(_) => EncounterKind::PuzzleChamber,
            Self::TradeOpportunity(_) => EncounterKind::TradeOpportunity,
            Self::DiscoverySite(_) => EncounterKind::DiscoverySite,
            Self::Hazard(_) => EncounterKind::Hazard,
            Self::RiskEvent(_) => EncounterKind::RiskEvent,
            Self::RestSite(_) => EncounterKind::RestSite,
            Self::SafePassage(_) => EncounterKind::SafePassage,
            Self::Scoundrel(_) => EncounterKind::Scoundrel,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&EncounterOutcome> {
        match self {
            Self::PuzzleChamber(puzzle) => puzzle.outcome(),
            Self::TradeOpportunity(trade) => trade.outcome(),
            Self::DiscoverySite(choice)
            | Self::Hazard(choice)
            | Self::RiskEvent(choice)
            | Self::RestSite(choice) => choice.outcome(),
            Self::SafePassage(passage) => passage.outcome(),
            Self::Scoundrel(game) => game.outcome(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome().is_some()
    }

    /// Route an action to the variant it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ActionMismatch` when the action targets another variant, and
    /// whatever rule violation the variant reports otherwise.
    pub fn apply<R: Rng>(
        &mut self,
        action: EncounterAction,
        rng: &mut R,
    ) -> Result<Progress, DelveError> {
        let kind = self.kind().as_str();
        match (self, action) {
            (Self::PuzzleChamber(puzzle), EncounterAction::RevealTile { row, col }) => {
                puzzle.reveal(row, col, rng)
            }
            (Self::TradeOpportunity(trade), EncounterAction::SelectTrade { option }) => {
                trade.select_option(option)
            }
            (Self::TradeOpportunity(trade), EncounterAction::WalkAway) => trade.walk_away(),
            (
                Self::DiscoverySite(choice)
                | Self::Hazard(choice)
                | Self::RiskEvent(choice)
                | Self::RestSite(choice),
                EncounterAction::SelectPath { path },
            ) => choice.select_path(&path).map(|()| Progress::Ongoing),
            (
                Self::DiscoverySite(choice)
                | Self::Hazard(choice)
                | Self::RiskEvent(choice)
                | Self::RestSite(choice),
                EncounterAction::Resolve,
            ) => choice.resolve(rng),
            (Self::SafePassage(passage), EncounterAction::Pass | EncounterAction::Resolve) => {
                passage.pass()
            }
            (Self::Scoundrel(game), EncounterAction::Scoundrel { step }) => game.play(step),
            (_, action) => Err(DelveError::ActionMismatch {
                action: action.name(),
                kind,
            }),
        }
    }
}
