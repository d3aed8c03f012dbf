//! One run in progress: map, position, energy and the live encounter.
//!
//! The session is where pure calculators meet mutable state. Every outcome
//! is applied here: rewards through [`crate::rewards`], failures through
//! [`crate::failure`]. A failed encounter pushes the delver back to the node
//! they came from and may lock the failed node for a few moves.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::collections::CollectedItem;
use crate::config::EngineConfig;
use crate::encounters::{ActiveEncounter, EncounterAction, EncounterKind, OutcomeStatus, Progress};
use crate::error::DelveError;
use crate::failure::{FailureKind, process_failure_consequences};
use crate::feedback::DepthFeedback;
use crate::map::{DungeonMap, DungeonMapGenerator, DungeonNode};
use crate::resolver::{CompletedEncounter, EncounterRequest, EncounterResolver};
use crate::rewards::{build_shortcut, process_encounter_rewards};
use crate::run::{Run, RunStatus};
use crate::run_state::RunState;
use crate::seed::run_seed;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConclusion {
    pub run_id: String,
    pub status: RunStatus,
    pub deepest_depth: u32,
    pub energy_remaining: u32,
    /// Items carried home. Always empty for a bust.
    pub banked_items: Vec<CollectedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub node_id: String,
    pub kind: EncounterKind,
    pub depth: u32,
    pub energy_spent: u32,
    pub busted: bool,
}

/// Net effect of one finished encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterReport {
    pub node_id: String,
    pub kind: EncounterKind,
    pub depth: u32,
    pub status: OutcomeStatus,
    pub message: String,
    pub energy_gained: u32,
    pub energy_lost: u32,
    pub treasure: u32,
    pub items_gained: Vec<CollectedItem>,
    pub item_lost: Option<CollectedItem>,
    pub shortcut: Option<String>,
    pub lockout_turns: Option<u32>,
    pub busted: bool,
}

#[derive(Debug, Clone)]
pub struct DelveSession {
    run: Run,
    config: EngineConfig,
    map: DungeonMap,
    state: RunState,
    resolver: EncounterResolver,
    rng: ChaCha20Rng,
    /// Nodes entered on the way down, used to retreat after a failure.
    trail: Vec<String>,
    /// Node whose encounter has already been played since it was entered.
    resolved_at: Option<String>,
    treasure: u32,
    history: Vec<EncounterReport>,
    conclusion: Option<RunConclusion>,
}

impl DelveSession {
    /// Start playing an active run, seeded from the run itself.
    ///
    /// # Errors
    ///
    /// `RunNotActive` unless the run's status is `active`.
    pub fn begin(run: Run, config: EngineConfig) -> Result<Self, DelveError> {
        let seed = run_seed(&run.id, &run.date, run.steps);
        Self::begin_with_seed(run, config, seed)
    }

    /// # Errors
    ///
    /// `RunNotActive` unless the run's status is `active`.
    pub fn begin_with_seed(run: Run, config: EngineConfig, seed: u64) -> Result<Self, DelveError> {
        if run.status != RunStatus::Active {
            return Err(DelveError::RunNotActive { id: run.id });
        }
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let map = DungeonMapGenerator::new(config.nodes_per_depth).generate_full_map(
            &run.id,
            config.max_depth,
            &mut rng,
        );
        let state = RunState::new(&run);
        log::debug!(
            "session for {} begins with {} energy",
            run.id,
            state.energy_remaining
        );
        Ok(Self {
            run,
            config,
            map,
            state,
            resolver: EncounterResolver::new(),
            rng,
            trail: Vec::new(),
            resolved_at: None,
            treasure: 0,
            history: Vec::new(),
            conclusion: None,
        })
    }

    #[must_use]
    pub const fn run(&self) -> &Run {
        &self.run
    }

    #[must_use]
    pub const fn map(&self) -> &DungeonMap {
        &self.map
    }

    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub fn history(&self) -> &[EncounterReport] {
        &self.history
    }

    #[must_use]
    pub const fn treasure(&self) -> u32 {
        self.treasure
    }

    #[must_use]
    pub const fn conclusion(&self) -> Option<&RunConclusion> {
        self.conclusion.as_ref()
    }

    #[must_use]
    pub const fn is_concluded(&self) -> bool {
        self.conclusion.is_some()
    }

    #[must_use]
    pub fn active_encounter(&self) -> Option<&ActiveEncounter> {
        self.resolver.active()
    }

    /// Whether the current node's encounter is still waiting to be played.
    #[must_use]
    pub fn encounter_pending(&self) -> bool {
        self.state.current_node.is_some()
            && self.resolver.active().is_none()
            && self.resolved_at != self.state.current_node
    }

    fn ensure_open(&self) -> Result<(), DelveError> {
        if self.conclusion.is_some() {
            return Err(DelveError::RunNotActive {
                id: self.run.id.clone(),
            });
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), DelveError> {
        self.ensure_open()?;
        if let Some(node_id) = self.resolver.active_node() {
            return Err(DelveError::EncounterInProgress {
                node_id: node_id.to_string(),
            });
        }
        Ok(())
    }

    fn current_node(&self) -> Option<&DungeonNode> {
        self.state
            .current_node
            .as_deref()
            .and_then(|id| self.map.node(id))
    }

    fn reachable(&self) -> Vec<&DungeonNode> {
        match self.current_node() {
            None => self.map.nodes_at_depth(1).collect(),
            Some(node) => node
                .connections
                .iter()
                .filter_map(|id| self.map.node(id))
                .collect(),
        }
    }

    /// Nodes one move away that are not locked out.
    #[must_use]
    pub fn available_moves(&self) -> Vec<&DungeonNode> {
        self.reachable()
            .into_iter()
            .filter(|node| self.state.lockout_for(&node.id).is_none())
            .collect()
    }

    /// Walk into `node_id`, paying its energy cost.
    ///
    /// # Errors
    ///
    /// `RunNotActive`, `EncounterInProgress`, `EncounterNotFinished` while
    /// the current node is unplayed, `NodeNotFound`, `InvalidMove` for a node
    /// that is not one step away, `NodeLockedOut`.
    pub fn move_to_node(&mut self, node_id: &str) -> Result<MoveReport, DelveError> {
        self.ensure_idle()?;
        if self.encounter_pending() {
            return Err(DelveError::EncounterNotFinished);
        }
        let node = self
            .map
            .node(node_id)
            .cloned()
            .ok_or_else(|| DelveError::NodeNotFound {
                id: node_id.to_string(),
            })?;
        if !self.reachable().iter().any(|n| n.id == node.id) {
            return Err(DelveError::InvalidMove {
                id: node_id.to_string(),
            });
        }
        if let Some(turns_remaining) = self.state.lockout_for(node_id) {
            return Err(DelveError::NodeLockedOut {
                id: node_id.to_string(),
                turns_remaining,
            });
        }

        let energy_spent = self.state.spend_energy(node.energy_cost);
        self.state.tick_lockouts();
        self.state.enter_node(&node.id, node.depth);
        self.trail.push(node.id.clone());
        self.resolved_at = None;
        self.map.reveal(&node.id)?;
        for next in &node.connections {
            self.map.reveal(next)?;
        }
        log::debug!(
            "{} entered {} ({}) for {energy_spent} energy",
            self.run.id,
            node.id,
            node.kind
        );

        let busted = self.state.energy_remaining == 0;
        if busted {
            self.conclude(RunStatus::Busted);
        }
        Ok(MoveReport {
            node_id: node.id,
            kind: node.kind,
            depth: node.depth,
            energy_spent,
            busted,
        })
    }

    /// Open the encounter at the current node.
    ///
    /// # Errors
    ///
    /// `RunNotActive`, `EncounterInProgress`, `NodeNotFound` at the surface,
    /// `EncounterAlreadyComplete` when this node was already played.
    pub fn start_encounter(&mut self) -> Result<&ActiveEncounter, DelveError> {
        self.ensure_idle()?;
        let node = self
            .current_node()
            .cloned()
            .ok_or_else(|| DelveError::NodeNotFound {
                id: String::from("surface"),
            })?;
        if self.resolved_at.as_deref() == Some(node.id.as_str()) {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        let request = EncounterRequest {
            kind: node.kind.as_str().to_string(),
            node_id: node.id,
            depth: node.depth,
            energy_cost: node.energy_cost,
        };
        self.resolver.start_encounter(request, &mut self.rng)
    }

    /// Forward a player action to the live encounter.
    ///
    /// # Errors
    ///
    /// `RunNotActive`, `NoActiveEncounter`, or the variant's own rejection.
    pub fn act(&mut self, action: EncounterAction) -> Result<Progress, DelveError> {
        self.ensure_open()?;
        self.resolver.apply(action, &mut self.rng)
    }

    /// Apply the finished encounter's outcome to the run.
    ///
    /// # Errors
    ///
    /// `RunNotActive`, `NoActiveEncounter`, `EncounterNotFinished`.
    pub fn finish_encounter(&mut self) -> Result<EncounterReport, DelveError> {
        self.ensure_open()?;
        let completed = self.resolver.complete_encounter()?;
        Ok(self.apply_outcome(completed))
    }

    /// Flee the live encounter. Treated as a failure.
    ///
    /// # Errors
    ///
    /// `RunNotActive`, `NoActiveEncounter`, `EncounterAlreadyComplete`.
    pub fn flee_encounter(&mut self) -> Result<EncounterReport, DelveError> {
        self.ensure_open()?;
        let completed = self.resolver.abandon()?;
        Ok(self.apply_outcome(completed))
    }

    fn apply_outcome(&mut self, completed: CompletedEncounter) -> EncounterReport {
        let CompletedEncounter {
            node_id,
            kind,
            depth,
            energy_cost,
            outcome,
        } = completed;
        let mut report = EncounterReport {
            node_id: node_id.clone(),
            kind,
            depth,
            status: outcome.status,
            message: outcome.message.clone(),
            energy_gained: 0,
            energy_lost: 0,
            treasure: 0,
            items_gained: Vec::new(),
            item_lost: None,
            shortcut: None,
            lockout_turns: None,
            busted: false,
        };
        self.resolved_at = Some(node_id.clone());

        if outcome.is_success() {
            if let Some(raw) = outcome.reward {
                let processed = process_encounter_rewards(&raw, kind, depth);
                self.state.gain_energy(processed.energy);
                report.energy_gained = processed.energy;
                report.treasure = processed.treasure;
                self.treasure = self.treasure.saturating_add(processed.treasure);
                self.state.inventory.extend(processed.items.iter().cloned());
                report.items_gained = processed.items;
                if let Some(shortcut) = build_shortcut(depth, processed.shortcut_levels) {
                    report.shortcut = Some(shortcut.id.clone());
                    self.state.add_shortcut(shortcut);
                }
            }
            if let Some(cost) = outcome.consequence {
                report.energy_lost = self.state.spend_energy(cost.energy_loss);
            }
        } else {
            let failure = outcome
                .failure_kind()
                .unwrap_or(FailureKind::Fled);
            let extra = outcome.consequence.map_or(0, |c| c.energy_loss);
            let consequence = process_failure_consequences(failure, depth, &node_id, energy_cost);
            report.energy_lost = self
                .state
                .spend_energy(consequence.energy_loss.saturating_add(extra));
            if !self.state.inventory.is_empty() && self.rng.gen_bool(consequence.item_loss_chance)
            {
                let idx = self.rng.gen_range(0..self.state.inventory.len());
                report.item_lost = self.state.lose_item(idx);
            }
            if let Some(lockout) = consequence.lockout {
                report.lockout_turns = Some(lockout.turns_remaining);
                self.state.add_lockout(lockout);
            }
            self.retreat();
            log::debug!("{}: {} at {node_id}", self.run.id, consequence.message);
        }

        if self.state.energy_remaining == 0 {
            report.busted = true;
            self.conclude(RunStatus::Busted);
        }
        self.history.push(report.clone());
        report
    }

    /// Step back to the previous node on the trail, or the surface.
    fn retreat(&mut self) {
        self.trail.pop();
        match self.trail.last().and_then(|id| self.map.node(id)) {
            Some(node) => {
                self.state.current_depth = node.depth;
                self.state.current_node = Some(node.id.clone());
                self.resolved_at = Some(node.id.clone());
            }
            None => {
                self.state.current_depth = 0;
                self.state.current_node = None;
                self.resolved_at = None;
            }
        }
    }

    #[must_use]
    pub fn feedback(&self) -> DepthFeedback {
        DepthFeedback::evaluate(&self.state, self.config.safety_buffer)
    }

    /// Climb out. Completes the run if the return is affordable, busts it
    /// otherwise.
    ///
    /// # Errors
    ///
    /// `RunNotActive`, `EncounterInProgress`.
    pub fn return_to_surface(&mut self) -> Result<RunConclusion, DelveError> {
        self.ensure_idle()?;
        let cost = self.state.return_cost();
        if cost <= self.state.energy_remaining {
            self.state.spend_energy(cost);
            self.state.current_depth = 0;
            self.state.current_node = None;
            Ok(self.conclude(RunStatus::Completed))
        } else {
            Ok(self.conclude(RunStatus::Busted))
        }
    }

    /// Give up below ground.
    ///
    /// # Errors
    ///
    /// `RunNotActive` once concluded.
    pub fn bust(&mut self) -> Result<RunConclusion, DelveError> {
        self.ensure_open()?;
        Ok(self.conclude(RunStatus::Busted))
    }

    fn conclude(&mut self, status: RunStatus) -> RunConclusion {
        let banked_items = if status == RunStatus::Completed {
            self.state.inventory.clone()
        } else {
            Vec::new()
        };
        let conclusion = RunConclusion {
            run_id: self.run.id.clone(),
            status,
            deepest_depth: self.state.deepest_depth,
            energy_remaining: self.state.energy_remaining,
            banked_items,
        };
        log::info!(
            "{} concluded {status} at deepest depth {} with {} energy left",
            conclusion.run_id,
            conclusion.deepest_depth,
            conclusion.energy_remaining
        );
        self.conclusion = Some(conclusion.clone());
        conclusion
    }
}
