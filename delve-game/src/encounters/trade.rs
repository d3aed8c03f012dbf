//! Trade opportunity: a wandering merchant with three one-shot offers.

use serde::{Deserialize, Serialize};

use super::{EncounterOutcome, OutcomeStatus, Progress, RawRewards};
use crate::constants::{TRADE_DEPTH_SCALE, TRADE_SELECTIONS_TO_COMPLETE};
use crate::error::DelveError;
use crate::numbers::scale_u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeOptionId {
    A,
    B,
    C,
}

impl TradeOptionId {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::A => "buy",
            Self::B => "sell",
            Self::C => "exchange",
        }
    }

    /// Unscaled `(reward, energy cost)` for this offer.
    const fn terms(self) -> (RawRewards, u32) {
        match self {
            Self::A => (
                RawRewards {
                    energy: 0,
                    treasure: 10,
                    items: 1,
                    shortcut_levels: 0,
                },
                40,
            ),
            Self::B => (
                RawRewards {
                    energy: 0,
                    treasure: 45,
                    items: 0,
                    shortcut_levels: 0,
                },
                20,
            ),
            Self::C => (
                RawRewards {
                    energy: 60,
                    treasure: 0,
                    items: 0,
                    shortcut_levels: 0,
                },
                25,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeOfferView {
    pub id: TradeOptionId,
    pub label: &'static str,
    pub reward: RawRewards,
    pub energy_cost: u32,
    pub used: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeState {
    pub depth: u32,
    pub offers: Vec<TradeOfferView>,
    pub selections: usize,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOpportunity {
    depth: u32,
    used: Vec<TradeOptionId>,
    reward: RawRewards,
    energy_cost: u32,
    outcome: Option<EncounterOutcome>,
}

impl TradeOpportunity {
    #[must_use]
    pub const fn new(depth: u32) -> Self {
        Self {
            depth,
            used: Vec::new(),
            reward: RawRewards {
                energy: 0,
                treasure: 0,
                items: 0,
                shortcut_levels: 0,
            },
            energy_cost: 0,
            outcome: None,
        }
    }

    fn depth_multiplier(&self) -> f64 {
        TRADE_DEPTH_SCALE.mul_add(f64::from(self.depth), 1.0)
    }

    fn scaled_terms(&self, option: TradeOptionId) -> (RawRewards, u32) {
        let (reward, cost) = option.terms();
        let mult = self.depth_multiplier();
        (
            RawRewards {
                energy: scale_u32(reward.energy, mult),
                treasure: scale_u32(reward.treasure, mult),
                ..reward
            },
            scale_u32(cost, mult),
        )
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&EncounterOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> TradeState {
        TradeState {
            depth: self.depth,
            offers: TradeOptionId::ALL
                .into_iter()
                .map(|id| {
                    let (reward, energy_cost) = self.scaled_terms(id);
                    TradeOfferView {
                        id,
                        label: id.label(),
                        reward,
                        energy_cost,
                        used: self.used.contains(&id),
                    }
                })
                .collect(),
            selections: self.used.len(),
            complete: self.outcome.is_some(),
        }
    }

    /// Take an offer. The trade closes after the second deal.
    ///
    /// # Errors
    ///
    /// `EncounterAlreadyComplete` once closed, `TradeOptionUsed` when the
    /// offer was already taken.
    pub fn select_option(&mut self, option: TradeOptionId) -> Result<Progress, DelveError> {
        if self.outcome.is_some() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        if self.used.contains(&option) {
            return Err(DelveError::TradeOptionUsed {
                option: option.as_char(),
            });
        }
        let (reward, cost) = self.scaled_terms(option);
        self.reward.absorb(reward);
        self.energy_cost = self.energy_cost.saturating_add(cost);
        self.used.push(option);
        log::debug!("trade option {} taken at depth {}", option.as_char(), self.depth);

        if self.used.len() >= TRADE_SELECTIONS_TO_COMPLETE
            || self.used.len() == TradeOptionId::ALL.len()
        {
            self.close("trade_opportunity.completed");
            return Ok(Progress::Finished(OutcomeStatus::Success));
        }
        Ok(Progress::Ongoing)
    }

    /// Leave with whatever has been traded so far.
    ///
    /// # Errors
    ///
    /// `EncounterAlreadyComplete` once closed.
    pub fn walk_away(&mut self) -> Result<Progress, DelveError> {
        if self.outcome.is_some() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        self.close("trade_opportunity.walked_away");
        Ok(Progress::Finished(OutcomeStatus::Success))
    }

    fn close(&mut self, message: &str) {
        self.outcome =
            Some(EncounterOutcome::success(message, self.reward).with_cost(self.energy_cost));
    }
}
