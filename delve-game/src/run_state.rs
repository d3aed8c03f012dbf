//! Mutable in-run position, energy and inventory.

use serde::{Deserialize, Serialize};

use crate::collections::CollectedItem;
use crate::energy::{Shortcut, calculate_return_cost};
use crate::failure::EncounterLockout;
use crate::run::Run;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    /// Zero while standing at the surface.
    pub current_depth: u32,
    #[serde(default)]
    pub current_node: Option<String>,
    pub energy_remaining: u32,
    #[serde(default)]
    pub inventory: Vec<CollectedItem>,
    #[serde(default)]
    pub visited_nodes: Vec<String>,
    #[serde(default)]
    pub discovered_shortcuts: Vec<Shortcut>,
    #[serde(default)]
    pub deepest_depth: u32,
    #[serde(default)]
    pub lockouts: Vec<EncounterLockout>,
}

impl RunState {
    #[must_use]
    pub fn new(run: &Run) -> Self {
        Self {
            run_id: run.id.clone(),
            current_depth: 0,
            current_node: None,
            energy_remaining: run.total_energy,
            inventory: Vec::new(),
            visited_nodes: Vec::new(),
            discovered_shortcuts: Vec::new(),
            deepest_depth: 0,
            lockouts: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_at_surface(&self) -> bool {
        self.current_depth == 0
    }

    #[must_use]
    pub fn return_cost(&self) -> u32 {
        calculate_return_cost(self.current_depth, &self.discovered_shortcuts)
    }

    /// Deduct up to `amount`, saturating at zero. Returns what was taken.
    pub fn spend_energy(&mut self, amount: u32) -> u32 {
        let spent = amount.min(self.energy_remaining);
        self.energy_remaining -= spent;
        spent
    }

    pub fn gain_energy(&mut self, amount: u32) {
        self.energy_remaining = self.energy_remaining.saturating_add(amount);
    }

    /// Step into `node_id` at `depth`.
    pub fn enter_node(&mut self, node_id: &str, depth: u32) {
        self.current_depth = depth;
        self.current_node = Some(node_id.to_string());
        self.deepest_depth = self.deepest_depth.max(depth);
        if !self.visited_nodes.iter().any(|id| id == node_id) {
            self.visited_nodes.push(node_id.to_string());
        }
    }

    pub fn add_shortcut(&mut self, shortcut: Shortcut) {
        if !self.discovered_shortcuts.iter().any(|s| s.id == shortcut.id) {
            self.discovered_shortcuts.push(shortcut);
        }
    }

    /// Moves left before `node_id` can be entered again, if it is locked.
    #[must_use]
    pub fn lockout_for(&self, node_id: &str) -> Option<u32> {
        self.lockouts
            .iter()
            .find(|lock| lock.node_id == node_id)
            .map(|lock| lock.turns_remaining)
    }

    /// Lock a node, keeping the longer of two overlapping lockouts.
    pub fn add_lockout(&mut self, lockout: EncounterLockout) {
        match self
            .lockouts
            .iter_mut()
            .find(|lock| lock.node_id == lockout.node_id)
        {
            Some(existing) => {
                existing.turns_remaining = existing.turns_remaining.max(lockout.turns_remaining);
            }
            None => self.lockouts.push(lockout),
        }
    }

    /// Count one move off every lockout and drop the expired ones.
    pub fn tick_lockouts(&mut self) {
        for lock in &mut self.lockouts {
            lock.turns_remaining = lock.turns_remaining.saturating_sub(1);
        }
        self.lockouts.retain(|lock| lock.turns_remaining > 0);
    }

    /// Remove the item at `index`, if any.
    pub fn lose_item(&mut self, index: usize) -> Option<CollectedItem> {
        (index < self.inventory.len()).then(|| self.inventory.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::generate_run_from_steps;

    fn state() -> RunState {
        RunState::new(&generate_run_from_steps("2024-01-15", 12_000).unwrap())
    }

    #[test]
    fn starts_at_surface_with_full_budget() {
        let state = state();
        assert!(state.is_at_surface());
        assert_eq!(state.energy_remaining, 14_400);
        assert_eq!(state.return_cost(), 0);
    }

    #[test]
    fn spending_saturates() {
        let mut state = state();
        assert_eq!(state.spend_energy(14_000), 14_000);
        assert_eq!(state.spend_energy(1_000), 400);
        assert_eq!(state.energy_remaining, 0);
    }

    #[test]
    fn visits_track_deepest_depth_once() {
        let mut state = state();
        state.enter_node("node-1-0", 1);
        state.enter_node("node-2-1", 2);
        state.enter_node("node-2-1", 2);
        assert_eq!(state.visited_nodes.len(), 2);
        assert_eq!(state.deepest_depth, 2);
        assert!(state.return_cost() > 0);
    }

    #[test]
    fn lockouts_merge_and_expire() {
        let mut state = state();
        state.add_lockout(EncounterLockout {
            node_id: "n".into(),
            turns_remaining: 2,
        });
        state.add_lockout(EncounterLockout {
            node_id: "n".into(),
            turns_remaining: 1,
        });
        assert_eq!(state.lockout_for("n"), Some(2));
        state.tick_lockouts();
        assert_eq!(state.lockout_for("n"), Some(1));
        state.tick_lockouts();
        assert_eq!(state.lockout_for("n"), None);
    }
}
