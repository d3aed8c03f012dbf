//! Safe passage: a guaranteed, free step.

use serde::{Deserialize, Serialize};

use super::{EncounterOutcome, OutcomeStatus, Progress, RawRewards};
use crate::error::DelveError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafePassage {
    depth: u32,
    outcome: Option<EncounterOutcome>,
}

impl SafePassage {
    #[must_use]
    pub const fn new(depth: u32) -> Self {
        Self {
            depth,
            outcome: None,
        }
    }

    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&EncounterOutcome> {
        self.outcome.as_ref()
    }

    /// Walk through. Always succeeds.
    ///
    /// # Errors
    ///
    /// `EncounterAlreadyComplete` when called twice.
    pub fn pass(&mut self) -> Result<Progress, DelveError> {
        if self.outcome.is_some() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        self.outcome = Some(EncounterOutcome::success(
            "safe_passage.pass.success",
            RawRewards::default(),
        ));
        Ok(Progress::Finished(OutcomeStatus::Success))
    }
}
