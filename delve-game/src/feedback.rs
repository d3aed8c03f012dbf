//! Advisory feedback for the player and collection bookkeeping.
//!
//! Nothing here blocks an action. The session and the UI read these
//! snapshots to explain the current risk and how close each collection is.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::collections::{CollectedItem, CollectionCatalog, catalog};
use crate::constants::{
    MSG_DEPTH_BEYOND_OPTIMAL, MSG_DEPTH_CAUTION, MSG_DEPTH_CRITICAL, MSG_DEPTH_DANGER,
    MSG_DEPTH_SAFE, RISK_CAUTION, RISK_CRITICAL, RISK_DANGER,
};
use crate::energy::{
    Recommendation, calculate_optimal_depth, calculate_point_of_no_return, calculate_risk_level,
    calculate_safety_margin, get_recommended_action_with_buffer,
};
use crate::error::DelveError;
use crate::run_state::RunState;
use crate::storage::{KeyValueStore, load_json, save_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Safe,
    Caution,
    Danger,
    Critical,
}

impl RiskBand {
    #[must_use]
    pub fn from_risk(risk_level: f64) -> Self {
        if risk_level >= RISK_CRITICAL {
            Self::Critical
        } else if risk_level >= RISK_DANGER {
            Self::Danger
        } else if risk_level >= RISK_CAUTION {
            Self::Caution
        } else {
            Self::Safe
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Danger => "danger",
            Self::Critical => "critical",
        }
    }

    const fn message_key(self) -> &'static str {
        match self {
            Self::Safe => MSG_DEPTH_SAFE,
            Self::Caution => MSG_DEPTH_CAUTION,
            Self::Danger => MSG_DEPTH_DANGER,
            Self::Critical => MSG_DEPTH_CRITICAL,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthFeedback {
    pub depth: u32,
    pub energy_remaining: u32,
    pub return_cost: u32,
    pub safety_margin: i64,
    pub risk_level: f64,
    pub band: RiskBand,
    pub point_of_no_return: u32,
    pub recommendation: Recommendation,
    pub optimal_depth: u32,
    pub message: &'static str,
}

impl DepthFeedback {
    #[must_use]
    pub fn evaluate(state: &RunState, safety_buffer: u32) -> Self {
        let energy = state.energy_remaining;
        let return_cost = state.return_cost();
        let risk_level = calculate_risk_level(energy, return_cost);
        let band = RiskBand::from_risk(risk_level);
        let optimal_depth = calculate_optimal_depth(energy, &state.discovered_shortcuts);
        let message = if band == RiskBand::Safe && state.current_depth > optimal_depth {
            MSG_DEPTH_BEYOND_OPTIMAL
        } else {
            band.message_key()
        };
        Self {
            depth: state.current_depth,
            energy_remaining: energy,
            return_cost,
            safety_margin: calculate_safety_margin(energy, return_cost),
            risk_level,
            band,
            point_of_no_return: calculate_point_of_no_return(return_cost, safety_buffer),
            recommendation: get_recommended_action_with_buffer(
                energy,
                return_cost,
                state.current_depth,
                safety_buffer,
            ),
            optimal_depth,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionProgress {
    pub set_id: String,
    pub name: String,
    pub owned: usize,
    pub total: usize,
    pub complete: bool,
}

impl CollectionProgress {
    /// Per-set progress for the owned item ids.
    #[must_use]
    pub fn compute(catalog: &CollectionCatalog, owned: &BTreeSet<String>) -> Vec<Self> {
        catalog
            .sets
            .iter()
            .map(|set| {
                let have = set
                    .items
                    .iter()
                    .filter(|item| owned.contains(&item.id))
                    .count();
                Self {
                    set_id: set.id.clone(),
                    name: set.name.clone(),
                    owned: have,
                    total: set.items.len(),
                    complete: !set.items.is_empty() && have == set.items.len(),
                }
            })
            .collect()
    }
}

/// Owned item ids across every completed run.
#[derive(Debug, Clone)]
pub struct CollectionLedger<S: KeyValueStore> {
    store: S,
    key: String,
    owned: Option<BTreeSet<String>>,
}

impl<S: KeyValueStore> CollectionLedger<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            owned: None,
        }
    }

    pub fn owned(&mut self) -> &BTreeSet<String> {
        if self.owned.is_none() {
            self.owned = Some(load_json(&self.store, &self.key).unwrap_or_default());
        }
        self.owned.get_or_insert_with(BTreeSet::new)
    }

    pub fn progress(&mut self) -> Vec<CollectionProgress> {
        CollectionProgress::compute(catalog(), self.owned())
    }

    /// Bank `items` and return the sets they completed.
    ///
    /// # Errors
    ///
    /// `Persistence` when the write fails; the ledger is unchanged then.
    pub fn record_items(&mut self, items: &[CollectedItem]) -> Result<Vec<String>, DelveError> {
        self.record_items_in(catalog(), items)
    }

    /// # Errors
    ///
    /// See [`Self::record_items`].
    pub fn record_items_in(
        &mut self,
        catalog: &CollectionCatalog,
        items: &[CollectedItem],
    ) -> Result<Vec<String>, DelveError> {
        let before = self.owned().clone();
        let mut after = before.clone();
        after.extend(items.iter().map(|item| item.id.clone()));
        if after.len() == before.len() {
            return Ok(Vec::new());
        }
        save_json(&self.store, &self.key, &after)?;

        let was_complete: BTreeSet<String> = CollectionProgress::compute(catalog, &before)
            .into_iter()
            .filter(|p| p.complete)
            .map(|p| p.set_id)
            .collect();
        let newly: Vec<String> = CollectionProgress::compute(catalog, &after)
            .into_iter()
            .filter(|p| p.complete && !was_complete.contains(&p.set_id))
            .map(|p| p.set_id)
            .collect();
        for set_id in &newly {
            log::info!("collection {set_id} completed");
        }
        self.owned = Some(after);
        Ok(newly)
    }

    /// Replace the owned set with an earlier copy of it.
    pub(crate) fn restore(&mut self, owned: BTreeSet<String>) -> Result<(), DelveError> {
        save_json(&self.store, &self.key, &owned)?;
        self.owned = Some(owned);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::generate_run_from_steps;
    use crate::storage::MemoryStore;

    fn state_at(depth: u32, energy: u32) -> RunState {
        let mut state = RunState::new(&generate_run_from_steps("2024-01-01", energy).unwrap());
        state.current_depth = depth;
        state
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(RiskBand::from_risk(0.1), RiskBand::Safe);
        assert_eq!(RiskBand::from_risk(0.5), RiskBand::Caution);
        assert_eq!(RiskBand::from_risk(0.8), RiskBand::Danger);
        assert_eq!(RiskBand::from_risk(0.95), RiskBand::Critical);
    }

    #[test]
    fn shallow_and_rich_is_safe() {
        let feedback = DepthFeedback::evaluate(&state_at(1, 5_000), 10);
        assert_eq!(feedback.band, RiskBand::Safe);
        assert_eq!(feedback.return_cost, 60);
        assert_eq!(feedback.safety_margin, 4_940);
        assert_eq!(feedback.point_of_no_return, 70);
        assert_eq!(feedback.message, "depth.safe");
        assert!(feedback.optimal_depth > 1);
    }

    #[test]
    fn stranded_deep_is_critical() {
        let feedback = DepthFeedback::evaluate(&state_at(10, 500), 10);
        assert_eq!(feedback.band, RiskBand::Critical);
        assert_eq!(feedback.message, "depth.critical");
        assert!(feedback.safety_margin < 0);
    }

    fn item(id: &str, set_id: &str) -> CollectedItem {
        CollectedItem {
            id: id.into(),
            item_type: "relic".into(),
            set_id: set_id.into(),
            value: 1,
            name: id.into(),
            description: String::new(),
        }
    }

    #[test]
    fn ledger_reports_newly_completed_sets_once() {
        let store = MemoryStore::new();
        let mut ledger = CollectionLedger::new(store.clone(), "delve.collections");
        let set = catalog().set("merchant_curios").unwrap();
        let items: Vec<CollectedItem> = set
            .items
            .iter()
            .map(|def| item(&def.id, &set.id))
            .collect();
        let (first, rest) = items.split_at(1);
        assert!(ledger.record_items(first).unwrap().is_empty());
        assert_eq!(ledger.record_items(rest).unwrap(), vec!["merchant_curios".to_string()]);
        assert!(ledger.record_items(&items).unwrap().is_empty());

        let mut reloaded = CollectionLedger::new(store, "delve.collections");
        let progress = reloaded.progress();
        let curios = progress.iter().find(|p| p.set_id == "merchant_curios").unwrap();
        assert!(curios.complete);
        assert_eq!(curios.owned, curios.total);
    }

    #[test]
    fn ledger_write_failure_keeps_previous_items() {
        let store = MemoryStore::new();
        let mut ledger = CollectionLedger::new(store.clone(), "delve.collections");
        store.set_reject_writes(true);
        assert!(ledger
            .record_items(&[item("relic_idol", "relics_of_the_deep")])
            .is_err());
        assert!(ledger.owned().is_empty());
    }
}
