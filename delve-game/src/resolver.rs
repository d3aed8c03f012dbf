//! Tracks the single in-progress encounter of a run.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::encounters::{
    ActiveEncounter, EncounterAction, EncounterKind, EncounterOutcome, Progress,
};
use crate::error::DelveError;
use crate::failure::FailureKind;

/// What the caller wants started. `kind` is the wire name, so unknown kinds
/// coming from stored maps are rejected here rather than at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRequest {
    pub kind: String,
    pub node_id: String,
    pub depth: u32,
    pub energy_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedEncounter {
    pub node_id: String,
    pub kind: EncounterKind,
    pub depth: u32,
    pub energy_cost: u32,
    pub outcome: EncounterOutcome,
}

#[derive(Debug, Clone, PartialEq)]
struct Tracked {
    node_id: String,
    depth: u32,
    energy_cost: u32,
    encounter: ActiveEncounter,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncounterResolver {
    tracked: Option<Tracked>,
}

impl EncounterResolver {
    #[must_use]
    pub const fn new() -> Self {
        Self { tracked: None }
    }

    /// # Errors
    ///
    /// `UnsupportedEncounter` for an unknown kind, `EncounterInProgress`
    /// while another encounter is tracked.
    pub fn start_encounter<R: Rng>(
        &mut self,
        request: EncounterRequest,
        rng: &mut R,
    ) -> Result<&ActiveEncounter, DelveError> {
        if let Some(tracked) = &self.tracked {
            return Err(DelveError::EncounterInProgress {
                node_id: tracked.node_id.clone(),
            });
        }
        let kind: EncounterKind = request.kind.parse()?;
        log::debug!(
            "starting {kind} at {} (depth {})",
            request.node_id,
            request.depth
        );
        let tracked = self.tracked.insert(Tracked {
            encounter: ActiveEncounter::spawn(kind, request.depth, rng),
            node_id: request.node_id,
            depth: request.depth,
            energy_cost: request.energy_cost,
        });
        Ok(&tracked.encounter)
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveEncounter> {
        self.tracked.as_ref().map(|tracked| &tracked.encounter)
    }

    #[must_use]
    pub fn active_node(&self) -> Option<&str> {
        self.tracked.as_ref().map(|tracked| tracked.node_id.as_str())
    }

    /// # Errors
    ///
    /// `NoActiveEncounter`, or whatever the variant rejects.
    pub fn apply<R: Rng>(
        &mut self,
        action: EncounterAction,
        rng: &mut R,
    ) -> Result<Progress, DelveError> {
        let tracked = self.tracked.as_mut().ok_or(DelveError::NoActiveEncounter)?;
        tracked.encounter.apply(action, rng)
    }

    /// Hand back the finished encounter and stop tracking it.
    ///
    /// # Errors
    ///
    /// `NoActiveEncounter`, or `EncounterNotFinished` before a terminal state.
    pub fn complete_encounter(&mut self) -> Result<CompletedEncounter, DelveError> {
        let tracked = self.tracked.as_ref().ok_or(DelveError::NoActiveEncounter)?;
        let outcome = tracked
            .encounter
            .outcome()
            .cloned()
            .ok_or(DelveError::EncounterNotFinished)?;
        let tracked = self.tracked.take().ok_or(DelveError::NoActiveEncounter)?;
        log::debug!(
            "{} at {} finished {:?}",
            tracked.encounter.kind(),
            tracked.node_id,
            outcome.status
        );
        Ok(CompletedEncounter {
            node_id: tracked.node_id,
            kind: tracked.encounter.kind(),
            depth: tracked.depth,
            energy_cost: tracked.energy_cost,
            outcome,
        })
    }

    /// Flee an unfinished encounter. Counts as a failure.
    ///
    /// # Errors
    ///
    /// `NoActiveEncounter`, or `EncounterAlreadyComplete` when the encounter
    /// already resolved and should be completed instead.
    pub fn abandon(&mut self) -> Result<CompletedEncounter, DelveError> {
        let tracked = self.tracked.as_ref().ok_or(DelveError::NoActiveEncounter)?;
        if tracked.encounter.is_complete() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        let tracked = self.tracked.take().ok_or(DelveError::NoActiveEncounter)?;
        let kind = tracked.encounter.kind();
        log::debug!("fled {kind} at {}", tracked.node_id);
        Ok(CompletedEncounter {
            outcome: EncounterOutcome::failure(format!("{kind}.fled"), FailureKind::Fled, 0),
            node_id: tracked.node_id,
            kind,
            depth: tracked.depth,
            energy_cost: tracked.energy_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounters::OutcomeStatus;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn request(kind: &str) -> EncounterRequest {
        EncounterRequest {
            kind: kind.to_string(),
            node_id: "node-2-0".to_string(),
            depth: 2,
            energy_cost: 100,
        }
    }

    #[test]
    fn unknown_kinds_are_unsupported() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut resolver = EncounterResolver::new();
        let err = resolver
            .start_encounter(request("dragon_lair"), &mut rng)
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(resolver.active().is_none());
    }

    #[test]
    fn one_encounter_at_a_time() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut resolver = EncounterResolver::new();
        resolver
            .start_encounter(request("safe_passage"), &mut rng)
            .unwrap();
        assert_eq!(
            resolver.start_encounter(request("hazard"), &mut rng).unwrap_err(),
            DelveError::EncounterInProgress {
                node_id: "node-2-0".into()
            }
        );
        assert_eq!(
            resolver.complete_encounter(),
            Err(DelveError::EncounterNotFinished)
        );
        resolver.apply(EncounterAction::Pass, &mut rng).unwrap();
        let done = resolver.complete_encounter().unwrap();
        assert_eq!(done.kind, EncounterKind::SafePassage);
        assert_eq!(done.outcome.status, OutcomeStatus::Success);
        assert_eq!(done.energy_cost, 100);
        assert_eq!(
            resolver.complete_encounter(),
            Err(DelveError::NoActiveEncounter)
        );
    }

    #[test]
    fn fleeing_counts_as_failure() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut resolver = EncounterResolver::new();
        resolver
            .start_encounter(request("scoundrel"), &mut rng)
            .unwrap();
        let fled = resolver.abandon().unwrap();
        assert_eq!(fled.outcome.failure_kind(), Some(FailureKind::Fled));
        assert_eq!(fled.outcome.message, "scoundrel.fled");
        assert!(resolver.active().is_none());
        assert_eq!(
            resolver.apply(EncounterAction::Resolve, &mut rng),
            Err(DelveError::NoActiveEncounter)
        );
    }
}
