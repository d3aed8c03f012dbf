//! Lifetime statistics across every run.
//!
//! Only independent counters are stored. `total_runs_attempted` is derived
//! on read so it can never drift from the counters it sums.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DelveError;
use crate::storage::{KeyValueStore, save_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
struct StoredProgression {
    #[serde(default)]
    all_time_deepest_depth: u32,
    #[serde(default)]
    total_runs_completed: u32,
    #[serde(default)]
    total_runs_busted: u32,
}

impl StoredProgression {
    /// Read each counter on its own so one bad field does not wipe the rest.
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |name: &str| {
            let parsed = object.get(name).map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()));
            if let Some(None) = parsed {
                log::warn!("progression field {name} is unreadable; using 0");
            }
            parsed.flatten().unwrap_or(0)
        };
        Some(Self {
            all_time_deepest_depth: field("all_time_deepest_depth"),
            total_runs_completed: field("total_runs_completed"),
            total_runs_busted: field("total_runs_busted"),
        })
    }

    const fn snapshot(self) -> ProgressionData {
        ProgressionData {
            all_time_deepest_depth: self.all_time_deepest_depth,
            total_runs_completed: self.total_runs_completed,
            total_runs_busted: self.total_runs_busted,
            total_runs_attempted: self
                .total_runs_completed
                .saturating_add(self.total_runs_busted),
        }
    }
}

/// Stored counters captured before a multi-document update.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProgressionCheckpoint(StoredProgression);

/// Read-only view of lifetime progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProgressionData {
    pub all_time_deepest_depth: u32,
    pub total_runs_completed: u32,
    pub total_runs_busted: u32,
    pub total_runs_attempted: u32,
}

#[derive(Debug, Clone)]
pub struct ProgressionManager<S: KeyValueStore> {
    store: S,
    key: String,
    data: Option<StoredProgression>,
}

impl<S: KeyValueStore> ProgressionManager<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            data: None,
        }
    }

    fn loaded(&mut self) -> StoredProgression {
        if let Some(data) = self.data {
            return data;
        }
        let data = match self.store.get(&self.key) {
            None => StoredProgression::default(),
            Some(raw) => serde_json::from_str::<Value>(&raw)
                .ok()
                .and_then(|value| StoredProgression::from_value(&value))
                .unwrap_or_else(|| {
                    log::warn!("progression under {} is corrupt; starting fresh", self.key);
                    StoredProgression::default()
                }),
        };
        self.data = Some(data);
        data
    }

    fn commit(&mut self, next: StoredProgression) -> Result<ProgressionData, DelveError> {
        save_json(&self.store, &self.key, &next)?;
        self.data = Some(next);
        Ok(next.snapshot())
    }

    pub fn data(&mut self) -> ProgressionData {
        self.loaded().snapshot()
    }

    /// Record a run that made it back to the surface.
    ///
    /// # Errors
    ///
    /// `Persistence` when the write fails; nothing changes in that case.
    pub fn process_run_completion(&mut self, depth: u32) -> Result<ProgressionData, DelveError> {
        let mut next = self.loaded();
        next.all_time_deepest_depth = next.all_time_deepest_depth.max(depth);
        next.total_runs_completed = next.total_runs_completed.saturating_add(1);
        let data = self.commit(next)?;
        log::info!("run completed at depth {depth}; {} attempted", data.total_runs_attempted);
        Ok(data)
    }

    /// Record a run that ran out of energy or gave up below ground.
    ///
    /// # Errors
    ///
    /// `Persistence` when the write fails; nothing changes in that case.
    pub fn process_run_bust(&mut self, depth: u32) -> Result<ProgressionData, DelveError> {
        let mut next = self.loaded();
        next.all_time_deepest_depth = next.all_time_deepest_depth.max(depth);
        next.total_runs_busted = next.total_runs_busted.saturating_add(1);
        let data = self.commit(next)?;
        log::info!("run busted at depth {depth}; {} attempted", data.total_runs_attempted);
        Ok(data)
    }

    pub(crate) fn checkpoint(&mut self) -> ProgressionCheckpoint {
        ProgressionCheckpoint(self.loaded())
    }

    /// Put the counters back to `checkpoint`.
    pub(crate) fn restore(
        &mut self,
        checkpoint: ProgressionCheckpoint,
    ) -> Result<ProgressionData, DelveError> {
        self.commit(checkpoint.0)
    }

    /// # Errors
    ///
    /// `Persistence` when the write fails.
    pub fn reset(&mut self) -> Result<ProgressionData, DelveError> {
        self.commit(StoredProgression::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const KEY: &str = "delve.progression";

    #[test]
    fn bust_ratchets_depth_and_counts() {
        let mut progression = ProgressionManager::new(MemoryStore::new(), KEY);
        progression.process_run_completion(8).unwrap();
        let data = progression.process_run_bust(5).unwrap();
        assert_eq!(data.all_time_deepest_depth, 8);
        assert_eq!(data.total_runs_busted, 1);
        assert_eq!(data.total_runs_attempted, 2);
    }

    #[test]
    fn partial_records_keep_readable_fields() {
        let store = MemoryStore::new();
        store.seed(KEY, r#"{"total_runs_completed": 4, "total_runs_busted": "many"}"#);
        let mut progression = ProgressionManager::new(store, KEY);
        let data = progression.data();
        assert_eq!(data.total_runs_completed, 4);
        assert_eq!(data.total_runs_busted, 0);
        assert_eq!(data.total_runs_attempted, 4);
    }

    #[test]
    fn garbage_falls_back_to_fresh_record() {
        let store = MemoryStore::new();
        store.seed(KEY, "[[[");
        let mut progression = ProgressionManager::new(store, KEY);
        assert_eq!(progression.data(), ProgressionData::default());
    }

    #[test]
    fn failed_save_changes_nothing() {
        let store = MemoryStore::new();
        let mut progression = ProgressionManager::new(store.clone(), KEY);
        progression.process_run_completion(3).unwrap();
        store.set_reject_writes(true);
        assert!(progression.process_run_bust(12).unwrap_err().is_persistence());
        let data = progression.data();
        assert_eq!(data.all_time_deepest_depth, 3);
        assert_eq!(data.total_runs_busted, 0);
    }

    #[test]
    fn restoring_a_checkpoint_undoes_a_recorded_run() {
        let store = MemoryStore::new();
        let mut progression = ProgressionManager::new(store.clone(), KEY);
        progression.process_run_completion(4).unwrap();
        let checkpoint = progression.checkpoint();
        progression.process_run_bust(9).unwrap();

        let data = progression.restore(checkpoint).unwrap();
        assert_eq!(data.all_time_deepest_depth, 4);
        assert_eq!(data.total_runs_busted, 0);
        assert_eq!(ProgressionManager::new(store, KEY).data(), data);
    }

    #[test]
    fn reset_restores_defaults_and_persists() {
        let store = MemoryStore::new();
        let mut progression = ProgressionManager::new(store.clone(), KEY);
        progression.process_run_completion(6).unwrap();
        progression.reset().unwrap();
        let mut reloaded = ProgressionManager::new(store, KEY);
        assert_eq!(reloaded.data(), ProgressionData::default());
    }
}
