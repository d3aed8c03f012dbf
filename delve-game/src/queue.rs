//! Durable collection of not-yet-finished runs.
//!
//! Every mutation is staged on a copy, written to storage, and only then
//! committed, so a failed write leaves the in-memory queue as it was.

use serde::{Deserialize, Serialize};

use crate::error::DelveError;
use crate::progression::ProgressionManager;
use crate::run::{Run, RunStatus, StepRecord, generate_run_from_steps, parse_run_date};
use crate::storage::{KeyValueStore, load_json, save_json};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct QueueDocument {
    #[serde(default)]
    runs: Vec<Run>,
    /// Dates whose runs already concluded; they can never be queued again.
    /// One entry per played day, kept for the life of the save so a
    /// re-imported history cannot replay an old day.
    #[serde(default)]
    concluded_dates: Vec<String>,
}

impl QueueDocument {
    fn has_date(&self, date: &str) -> bool {
        self.runs.iter().any(|run| run.date == date)
            || self.concluded_dates.iter().any(|d| d == date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunStatistics {
    pub queued: u32,
    pub active: u32,
    pub completed: u32,
    pub busted: u32,
    pub attempted: u32,
}

#[derive(Debug, Clone)]
pub struct RunQueueManager<S: KeyValueStore> {
    store: S,
    key: String,
    doc: Option<QueueDocument>,
}

impl<S: KeyValueStore> RunQueueManager<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            doc: None,
        }
    }

    fn loaded(&mut self) -> &QueueDocument {
        if self.doc.is_none() {
            let doc = load_json::<_, QueueDocument>(&self.store, &self.key).unwrap_or_default();
            log::debug!("loaded {} queued runs from {}", doc.runs.len(), self.key);
            self.doc = Some(doc);
        }
        self.doc.get_or_insert_with(QueueDocument::default)
    }

    fn commit(&mut self, next: QueueDocument) -> Result<(), DelveError> {
        save_json(&self.store, &self.key, &next)?;
        self.doc = Some(next);
        Ok(())
    }

    pub fn runs(&mut self) -> &[Run] {
        &self.loaded().runs
    }

    pub fn get_run(&mut self, id: &str) -> Option<&Run> {
        self.loaded().runs.iter().find(|run| run.id == id)
    }

    /// Oldest run still waiting to be played.
    pub fn next_queued_run(&mut self) -> Option<&Run> {
        self.loaded()
            .runs
            .iter()
            .find(|run| run.status == RunStatus::Queued)
    }

    pub fn active_run(&mut self) -> Option<&Run> {
        self.loaded()
            .runs
            .iter()
            .find(|run| run.status == RunStatus::Active)
    }

    /// # Errors
    ///
    /// `DuplicateRunDate` when the date is already queued or played,
    /// `Persistence` when the write fails.
    pub fn add_run_to_queue(&mut self, run: Run) -> Result<(), DelveError> {
        let mut next = self.loaded().clone();
        if next.has_date(&run.date) {
            return Err(DelveError::DuplicateRunDate { date: run.date });
        }
        log::debug!("queueing {} with {} energy", run.id, run.total_energy);
        next.runs.push(run);
        next.runs.sort_by(|a, b| a.date.cmp(&b.date));
        self.commit(next)
    }

    fn staged_status(
        &mut self,
        id: &str,
        status: RunStatus,
    ) -> Result<(QueueDocument, Run, RunStatus), DelveError> {
        let mut next = self.loaded().clone();
        let idx = next
            .runs
            .iter()
            .position(|run| run.id == id)
            .ok_or_else(|| DelveError::RunNotFound { id: id.to_string() })?;
        let current = next.runs[idx].status;
        if !current.can_transition_to(status) {
            return Err(DelveError::InvalidStatusTransition {
                id: id.to_string(),
                from: current,
                to: status,
            });
        }

        let mut updated = next.runs[idx].clone();
        updated.status = status;
        if status.is_terminal() {
            next.runs.remove(idx);
            if !next.concluded_dates.contains(&updated.date) {
                next.concluded_dates.push(updated.date.clone());
            }
        } else {
            next.runs[idx].status = status;
        }
        Ok((next, updated, current))
    }

    /// Check that `id` may move to `status` without writing anything.
    ///
    /// # Errors
    ///
    /// `RunNotFound` or `InvalidStatusTransition`.
    pub fn check_status_update(&mut self, id: &str, status: RunStatus) -> Result<(), DelveError> {
        self.staged_status(id, status).map(|_| ())
    }

    /// Move a run along its lifecycle. Terminal statuses drop it from the
    /// queue; the updated run is returned either way.
    ///
    /// # Errors
    ///
    /// `RunNotFound`, `InvalidStatusTransition`, or `Persistence`.
    pub fn update_run_status(&mut self, id: &str, status: RunStatus) -> Result<Run, DelveError> {
        let (next, updated, current) = self.staged_status(id, status)?;
        self.commit(next)?;
        log::debug!("{id}: {current} -> {status}");
        Ok(updated)
    }

    /// Dates that can no longer be queued because their runs concluded.
    pub fn concluded_dates(&mut self) -> &[String] {
        &self.loaded().concluded_dates
    }

    /// Queue a run for every new day in `records`, writing once.
    ///
    /// # Errors
    ///
    /// `InvalidDate`, `UnorderedHistory` when dates go backwards, or
    /// `Persistence`. Nothing is queued on error.
    pub fn generate_runs_from_step_history(
        &mut self,
        records: &[StepRecord],
    ) -> Result<Vec<Run>, DelveError> {
        let mut next = self.loaded().clone();
        let mut created = Vec::new();
        let mut previous: Option<&str> = None;
        for record in records {
            parse_run_date(&record.date)?;
            if let Some(prev) = previous
                && record.date.as_str() < prev
            {
                return Err(DelveError::UnorderedHistory {
                    date: record.date.clone(),
                    previous: prev.to_string(),
                });
            }
            previous = Some(&record.date);
            if next.has_date(&record.date) {
                continue;
            }
            let run = generate_run_from_steps(&record.date, record.steps)?;
            next.runs.push(run.clone());
            created.push(run);
        }
        if created.is_empty() {
            return Ok(created);
        }
        next.runs.sort_by(|a, b| a.date.cmp(&b.date));
        self.commit(next)?;
        log::info!("imported {} runs from step history", created.len());
        Ok(created)
    }

    /// Live counts from the queue, lifetime counts from progression.
    pub fn get_run_statistics<P: KeyValueStore>(
        &mut self,
        progression: &mut ProgressionManager<P>,
    ) -> RunStatistics {
        let lifetime = progression.data();
        let runs = self.runs();
        let count = |status| {
            u32::try_from(runs.iter().filter(|run| run.status == status).count())
                .unwrap_or(u32::MAX)
        };
        RunStatistics {
            queued: count(RunStatus::Queued),
            active: count(RunStatus::Active),
            completed: lifetime.total_runs_completed,
            busted: lifetime.total_runs_busted,
            attempted: lifetime.total_runs_attempted,
        }
    }
}
