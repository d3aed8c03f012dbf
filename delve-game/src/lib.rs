//! Stepdelve Game Engine
//!
//! Platform-agnostic core for a push-your-luck dungeon delve funded by daily
//! step counts. The host supplies step records and a key-value store; this
//! crate owns the economy, map generation, encounters and progression.

pub mod collections;
pub mod config;
pub mod constants;
pub mod encounters;
pub mod energy;
pub mod error;
pub mod failure;
pub mod feedback;
pub mod map;
pub mod numbers;
pub mod progression;
pub mod queue;
pub mod resolver;
pub mod rewards;
pub mod run;
pub mod run_state;
pub mod seed;
pub mod session;
pub mod storage;

use std::collections::BTreeSet;

use serde::Serialize;

use progression::ProgressionCheckpoint;

// Re-export commonly used types
pub use collections::{CollectedItem, CollectionCatalog, CollectionSet, ItemDef, catalog};
pub use config::{ConfigError, EngineConfig, StorageKeys};
pub use encounters::{
    ActiveEncounter, Card, ChoiceEncounter, ChoiceState, EncounterAction, EncounterKind,
    EncounterOutcome, OutcomeStatus, PathChoice, Progress, PuzzleChamber, PuzzleState,
    RawConsequence, RawRewards, SafePassage, Scoundrel, ScoundrelMove, ScoundrelState, Suit,
    TileKind, TradeOpportunity, TradeOptionId, TradeState,
};
pub use energy::{
    Recommendation, RecommendedAction, Shortcut, calculate_node_energy_cost,
    calculate_optimal_depth, calculate_point_of_no_return, calculate_return_cost,
    calculate_risk_level, calculate_run_energy, calculate_safety_margin, can_afford_return,
    get_recommended_action,
};
pub use error::DelveError;
pub use failure::{EncounterLockout, FailureConsequence, FailureKind, process_failure_consequences};
pub use feedback::{CollectionLedger, CollectionProgress, DepthFeedback, RiskBand};
pub use map::{DungeonMap, DungeonMapGenerator, DungeonNode, MapValidationError, validate_map};
pub use progression::{ProgressionData, ProgressionManager};
pub use queue::{RunQueueManager, RunStatistics};
pub use resolver::{CompletedEncounter, EncounterRequest, EncounterResolver};
pub use rewards::{ProcessedRewards, build_shortcut, process_encounter_rewards};
pub use run::{Run, RunStatus, StepRecord, generate_run_from_steps};
pub use run_state::RunState;
pub use session::{DelveSession, EncounterReport, MoveReport, RunConclusion};
pub use storage::{KeyValueStore, MemoryStore, MemoryStoreError};

/// What recording a finished run changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConclusionSummary {
    pub run: Run,
    pub progression: ProgressionData,
    /// Collection sets completed by the items this run banked.
    pub completed_sets: Vec<String>,
}

/// Composition root: every persistent manager over one shared store.
pub struct DelveEngine<S>
where
    S: KeyValueStore + Clone,
{
    config: EngineConfig,
    queue: RunQueueManager<S>,
    progression: ProgressionManager<S>,
    collections: CollectionLedger<S>,
}

impl<S> DelveEngine<S>
where
    S: KeyValueStore + Clone,
{
    /// Wire the managers to `store` using the configured keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration is invalid.
    pub fn new(store: S, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let keys = &config.storage_keys;
        Ok(Self {
            queue: RunQueueManager::new(store.clone(), keys.run_queue.clone()),
            progression: ProgressionManager::new(store.clone(), keys.progression.clone()),
            collections: CollectionLedger::new(store, keys.collections.clone()),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn queue(&mut self) -> &mut RunQueueManager<S> {
        &mut self.queue
    }

    pub const fn progression(&mut self) -> &mut ProgressionManager<S> {
        &mut self.progression
    }

    pub const fn collections(&mut self) -> &mut CollectionLedger<S> {
        &mut self.collections
    }

    /// Queue runs for every new day in `records`.
    ///
    /// # Errors
    ///
    /// Propagates queue validation and persistence errors.
    pub fn import_step_history(&mut self, records: &[StepRecord]) -> Result<Vec<Run>, DelveError> {
        self.queue.generate_runs_from_step_history(records)
    }

    /// Activate a queued run and open a session on it.
    ///
    /// # Errors
    ///
    /// `RunNotFound`, `InvalidStatusTransition`, or `Persistence`.
    pub fn start_run(&mut self, run_id: &str) -> Result<DelveSession, DelveError> {
        let run = self.queue.update_run_status(run_id, RunStatus::Active)?;
        DelveSession::begin(run, self.config.clone())
    }

    /// Record a concluded session: update lifetime stats, bank carried items
    /// and retire the run. The run leaves the queue only after the other
    /// writes succeed; a failed write rolls the earlier ones back so the
    /// same conclusion can be retried.
    ///
    /// # Errors
    ///
    /// `InvalidStatusTransition` for a non-terminal conclusion, `RunNotFound`,
    /// or `Persistence`.
    pub fn conclude_run(
        &mut self,
        conclusion: &RunConclusion,
    ) -> Result<ConclusionSummary, DelveError> {
        if !conclusion.status.is_terminal() {
            return Err(DelveError::InvalidStatusTransition {
                id: conclusion.run_id.clone(),
                from: RunStatus::Active,
                to: conclusion.status,
            });
        }
        self.queue.check_status_update(&conclusion.run_id, conclusion.status)?;

        let progression_before = self.progression.checkpoint();
        let progression = if conclusion.status == RunStatus::Completed {
            self.progression
                .process_run_completion(conclusion.deepest_depth)?
        } else {
            self.progression.process_run_bust(conclusion.deepest_depth)?
        };

        let owned_before = self.collections.owned().clone();
        let completed_sets = if conclusion.banked_items.is_empty() {
            Vec::new()
        } else {
            match self.collections.record_items(&conclusion.banked_items) {
                Ok(sets) => sets,
                Err(err) => {
                    self.roll_back(progression_before, None);
                    return Err(err);
                }
            }
        };

        let run = match self.queue.update_run_status(&conclusion.run_id, conclusion.status) {
            Ok(run) => run,
            Err(err) => {
                self.roll_back(progression_before, Some(owned_before));
                return Err(err);
            }
        };
        Ok(ConclusionSummary {
            run,
            progression,
            completed_sets,
        })
    }

    fn roll_back(&mut self, progression: ProgressionCheckpoint, owned: Option<BTreeSet<String>>) {
        if let Some(owned) = owned
            && let Err(err) = self.collections.restore(owned)
        {
            log::error!("could not roll back collections: {err}");
        }
        if let Err(err) = self.progression.restore(progression) {
            log::error!("could not roll back progression: {err}");
        }
    }

    pub fn statistics(&mut self) -> RunStatistics {
        self.queue.get_run_statistics(&mut self.progression)
    }
}
