//! Menu-style encounters: pick one named path, then roll against its odds.
//!
//! Discovery sites, hazards, risk events and rest sites all share this
//! machine and differ only in their path tables and depth pressure.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{EncounterKind, EncounterOutcome, Progress, RawRewards};
use crate::constants::{
    CHOICE_MAX_SUCCESS, CHOICE_MIN_SUCCESS, DEPTH_PRESSURE_CAP, DEPTH_PRESSURE_PER_LEVEL,
};
use crate::error::DelveError;
use crate::failure::FailureKind;
use crate::numbers::scale_u32;

/// One selectable path and its odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathChoice {
    pub id: String,
    pub label: String,
    pub base_success: f64,
    pub success_rate_modifier: f64,
    pub reward_modifier: f64,
    pub reward: RawRewards,
    pub failure: FailureKind,
    /// Extra energy lost on failure, before the failure calculator runs.
    pub failure_energy_loss: u32,
}

impl PathChoice {
    #[must_use]
    pub fn new(id: &str, label: &str, base_success: f64, failure: FailureKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            base_success,
            success_rate_modifier: 0.0,
            reward_modifier: 1.0,
            reward: RawRewards::default(),
            failure,
            failure_energy_loss: 0,
        }
    }

    #[must_use]
    pub fn modifiers(mut self, success_rate_modifier: f64, reward_modifier: f64) -> Self {
        self.success_rate_modifier = success_rate_modifier;
        self.reward_modifier = reward_modifier;
        self
    }

    #[must_use]
    pub fn reward(mut self, reward: RawRewards) -> Self {
        self.reward = reward;
        self
    }

    #[must_use]
    pub fn failure_loss(mut self, energy: u32) -> Self {
        self.failure_energy_loss = energy;
        self
    }

    fn scaled_reward(&self) -> RawRewards {
        RawRewards {
            energy: scale_u32(self.reward.energy, self.reward_modifier),
            treasure: scale_u32(self.reward.treasure, self.reward_modifier),
            items: self.reward.items,
            shortcut_levels: self.reward.shortcut_levels,
        }
    }
}

/// Read-only snapshot of a path for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathView {
    pub id: String,
    pub label: String,
    pub success_chance: f64,
    pub reward_modifier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceState {
    pub kind: EncounterKind,
    pub depth: u32,
    pub paths: Vec<PathView>,
    pub selected: Option<String>,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceEncounter {
    kind: EncounterKind,
    depth: u32,
    depth_pressure: f64,
    paths: Vec<PathChoice>,
    selected: Option<usize>,
    outcome: Option<EncounterOutcome>,
}

impl ChoiceEncounter {
    /// Menu encounter with no depth pressure.
    #[must_use]
    pub const fn new(kind: EncounterKind, depth: u32, paths: Vec<PathChoice>) -> Self {
        Self {
            kind,
            depth,
            depth_pressure: 0.0,
            paths,
            selected: None,
            outcome: None,
        }
    }

    /// Menu encounter whose odds worsen the deeper it sits.
    #[must_use]
    pub fn pressured(kind: EncounterKind, depth: u32, paths: Vec<PathChoice>) -> Self {
        let mut encounter = Self::new(kind, depth, paths);
        encounter.depth_pressure =
            (DEPTH_PRESSURE_PER_LEVEL * f64::from(depth)).min(DEPTH_PRESSURE_CAP);
        encounter
    }

    #[must_use]
    pub const fn kind(&self) -> EncounterKind {
        self.kind
    }

    #[must_use]
    pub fn paths(&self) -> &[PathChoice] {
        &self.paths
    }

    /// Odds of `path` succeeding after modifiers and depth pressure.
    #[must_use]
    pub fn success_chance(&self, path: &PathChoice) -> f64 {
        (path.base_success + path.success_rate_modifier - self.depth_pressure)
            .clamp(CHOICE_MIN_SUCCESS, CHOICE_MAX_SUCCESS)
    }

    #[must_use]
    pub fn state(&self) -> ChoiceState {
        ChoiceState {
            kind: self.kind,
            depth: self.depth,
            paths: self
                .paths
                .iter()
                .map(|path| PathView {
                    id: path.id.clone(),
                    label: path.label.clone(),
                    success_chance: self.success_chance(path),
                    reward_modifier: path.reward_modifier,
                })
                .collect(),
            selected: self
                .selected
                .and_then(|idx| self.paths.get(idx))
                .map(|path| path.id.clone()),
            complete: self.outcome.is_some(),
        }
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&EncounterOutcome> {
        self.outcome.as_ref()
    }

    /// Choose a path. Re-selecting before resolution replaces the choice.
    ///
    /// # Errors
    ///
    /// `EncounterAlreadyComplete` after resolution, `InvalidSelection` for an
    /// unknown path id.
    pub fn select_path(&mut self, path_id: &str) -> Result<(), DelveError> {
        if self.outcome.is_some() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        let idx = self
            .paths
            .iter()
            .position(|path| path.id == path_id)
            .ok_or_else(|| DelveError::InvalidSelection(path_id.to_string()))?;
        self.selected = Some(idx);
        Ok(())
    }

    /// Roll the selected path.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_with_roll`].
    pub fn resolve<R: Rng>(&mut self, rng: &mut R) -> Result<Progress, DelveError> {
        let roll = rng.r#gen::<f64>();
        self.resolve_with_roll(roll)
    }

    /// Resolve the selected path against a roll in `[0, 1)`.
    ///
    /// # Errors
    ///
    /// `EncounterAlreadyComplete` when resolved twice, `InvalidSelection` when
    /// no path was selected.
    pub fn resolve_with_roll(&mut self, roll: f64) -> Result<Progress, DelveError> {
        if self.outcome.is_some() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        let path = self
            .selected
            .and_then(|idx| self.paths.get(idx))
            .ok_or_else(|| DelveError::InvalidSelection(String::from("no path selected")))?;

        let outcome = if roll < self.success_chance(path) {
            EncounterOutcome::success(
                format!("{}.{}.success", self.kind, path.id),
                path.scaled_reward(),
            )
        } else {
            EncounterOutcome::failure(
                format!("{}.{}.failure", self.kind, path.id),
                path.failure,
                path.failure_energy_loss,
            )
        };
        log::debug!(
            "{} path {} resolved {:?} (roll {roll:.3})",
            self.kind,
            path.id,
            outcome.status
        );
        let progress = Progress::Finished(outcome.status);
        self.outcome = Some(outcome);
        Ok(progress)
    }
}
