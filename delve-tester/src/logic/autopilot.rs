use anyhow::{Context, Result, bail};
use serde::Serialize;

use delve_game::{
    DelveEngine, DelveSession, EncounterKind, KeyValueStore, OutcomeStatus, Progress, RunStatus,
};

use super::policy::{DelvePolicy, EncounterDecision};

/// Upper bound on player actions in one run before the autopilot gives up.
const MAX_ACTIONS_PER_RUN: usize = 5_000;

#[derive(Debug, Clone, Serialize)]
pub struct EncounterLine {
    pub node_id: String,
    pub kind: EncounterKind,
    pub depth: u32,
    pub status: OutcomeStatus,
    pub message: String,
}

/// Result of one automated run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub date: String,
    pub steps: u32,
    pub starting_energy: u32,
    pub status: RunStatus,
    pub deepest_depth: u32,
    pub energy_remaining: u32,
    pub treasure: u32,
    pub items_banked: usize,
    pub completed_sets: Vec<String>,
    pub encounters: Vec<EncounterLine>,
}

impl RunReport {
    #[must_use]
    pub fn failures(&self) -> usize {
        self.encounters
            .iter()
            .filter(|line| line.status == OutcomeStatus::Failure)
            .count()
    }
}

/// Plays queued runs to their conclusion with one policy.
pub struct Autopilot {
    policy: Box<dyn DelvePolicy>,
    verbose: bool,
}

impl Autopilot {
    #[must_use]
    pub fn new(policy: Box<dyn DelvePolicy>, verbose: bool) -> Self {
        Self { policy, verbose }
    }

    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Play every queued run, oldest first.
    ///
    /// # Errors
    ///
    /// Fails on the first run the engine refuses to start or record.
    pub fn play_queue<S>(&mut self, engine: &mut DelveEngine<S>) -> Result<Vec<RunReport>>
    where
        S: KeyValueStore + Clone,
    {
        let mut reports = Vec::new();
        while let Some(run_id) = engine.queue().next_queued_run().map(|run| run.id.clone()) {
            reports.push(self.play_run(engine, &run_id)?);
        }
        Ok(reports)
    }

    /// # Errors
    ///
    /// Engine errors while starting, playing or concluding `run_id`.
    pub fn play_run<S>(&mut self, engine: &mut DelveEngine<S>, run_id: &str) -> Result<RunReport>
    where
        S: KeyValueStore + Clone,
    {
        let mut session = engine
            .start_run(run_id)
            .with_context(|| format!("failed to start {run_id}"))?;
        let mut actions = 0usize;

        while !session.is_concluded() {
            let feedback = session.feedback();
            let at_surface = session.state().is_at_surface();
            let moves = session.available_moves();
            if moves.is_empty() || !(at_surface || self.policy.keep_descending(&feedback)) {
                session.return_to_surface()?;
                break;
            }
            let idx = self.policy.choose_move(&moves).min(moves.len() - 1);
            let node_id = moves[idx].id.clone();
            if session.move_to_node(&node_id)?.busted {
                break;
            }
            self.play_encounter(&mut session, &mut actions)?;
        }

        let conclusion = session
            .conclusion()
            .cloned()
            .context("session ended without a conclusion")?;
        let summary = engine
            .conclude_run(&conclusion)
            .with_context(|| format!("failed to record {run_id}"))?;
        let run = session.run();
        if self.verbose {
            println!(
                "  {} {} at depth {} ({} encounters)",
                run.id,
                conclusion.status,
                conclusion.deepest_depth,
                session.history().len()
            );
        }

        Ok(RunReport {
            run_id: run.id.clone(),
            date: run.date.clone(),
            steps: run.steps,
            starting_energy: run.total_energy,
            status: conclusion.status,
            deepest_depth: conclusion.deepest_depth,
            energy_remaining: conclusion.energy_remaining,
            treasure: session.treasure(),
            items_banked: conclusion.banked_items.len(),
            completed_sets: summary.completed_sets,
            encounters: session
                .history()
                .iter()
                .map(|report| EncounterLine {
                    node_id: report.node_id.clone(),
                    kind: report.kind,
                    depth: report.depth,
                    status: report.status,
                    message: report.message.clone(),
                })
                .collect(),
        })
    }

    fn play_encounter(&mut self, session: &mut DelveSession, actions: &mut usize) -> Result<()> {
        session.start_encounter()?;
        loop {
            *actions += 1;
            if *actions > MAX_ACTIONS_PER_RUN {
                bail!("{} exceeded {MAX_ACTIONS_PER_RUN} actions", session.run().id);
            }
            let encounter = session
                .active_encounter()
                .context("encounter vanished mid-play")?;
            match self.policy.decide(encounter) {
                EncounterDecision::Flee => {
                    session.flee_encounter()?;
                    return Ok(());
                }
                EncounterDecision::Act(action) => match session.act(action) {
                    Ok(Progress::Ongoing) => {}
                    Ok(Progress::Finished(_)) => {
                        session.finish_encounter()?;
                        return Ok(());
                    }
                    Err(err) => {
                        log::warn!("{} rejected a move: {err}; fleeing", self.policy.name());
                        session.flee_encounter()?;
                        return Ok(());
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::DelveStrategy;
    use delve_game::{EngineConfig, MemoryStore, StepRecord};

    fn engine_with(days: &[(&str, u32)]) -> DelveEngine<MemoryStore> {
        let mut engine = DelveEngine::new(MemoryStore::new(), EngineConfig::default()).unwrap();
        let records: Vec<StepRecord> = days
            .iter()
            .map(|(date, steps)| StepRecord::new(*date, *steps))
            .collect();
        engine.import_step_history(&records).unwrap();
        engine
    }

    #[test]
    fn every_strategy_drains_the_queue() {
        for strategy in [
            DelveStrategy::Cautious,
            DelveStrategy::Balanced,
            DelveStrategy::Greedy,
        ] {
            let mut engine = engine_with(&[("2024-02-01", 6_000), ("2024-02-02", 14_000)]);
            let mut autopilot = Autopilot::new(strategy.create_policy(), false);
            let reports = autopilot.play_queue(&mut engine).unwrap();
            assert_eq!(reports.len(), 2);
            for report in &reports {
                assert!(report.status.is_terminal());
                if report.status == RunStatus::Busted {
                    assert_eq!(report.items_banked, 0);
                }
            }
            let stats = engine.statistics();
            assert_eq!(stats.queued, 0);
            assert_eq!(stats.attempted, 2);
        }
    }

    #[test]
    fn reports_are_reproducible() {
        let play = || {
            let mut engine = engine_with(&[("2024-02-03", 12_000)]);
            let mut autopilot = Autopilot::new(DelveStrategy::Balanced.create_policy(), false);
            let report = autopilot.play_run(&mut engine, "run-2024-02-03").unwrap();
            serde_json::to_string(&report).unwrap()
        };
        assert_eq!(play(), play());
    }
}
