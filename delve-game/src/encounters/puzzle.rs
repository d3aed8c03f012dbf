//! Puzzle chamber: flip tiles on a hidden grid looking for the exit before
//! the reveal budget runs out.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{EncounterOutcome, OutcomeStatus, Progress, RawRewards};
use crate::constants::{
    PUZZLE_BASE_REVEALS, PUZZLE_BASE_TRAPS, PUZZLE_BASE_TREASURES, PUZZLE_BONUS_TILES, PUZZLE_COLS,
    PUZZLE_MAX_PROBABILITY, PUZZLE_MAX_REVEALS, PUZZLE_MAX_TRAPS, PUZZLE_MIN_PROBABILITY,
    PUZZLE_ROWS, PUZZLE_SPARE_REVEAL_VALUE, PUZZLE_TREASURE_VALUE,
};
use crate::error::DelveError;
use crate::failure::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Exit,
    Trap,
    Treasure,
    Bonus,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Tile {
    kind: TileKind,
    revealed: bool,
}

/// Player-facing grid; hidden tiles are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuzzleState {
    pub depth: u32,
    pub rows: usize,
    pub cols: usize,
    pub reveals_remaining: u32,
    /// Estimated chance of clearing the chamber with the reveals left.
    pub success_chance: f64,
    pub treasures_found: u32,
    pub tiles: Vec<Option<TileKind>>,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleChamber {
    depth: u32,
    tiles: Vec<Tile>,
    reveals_remaining: u32,
    treasures_found: u32,
    outcome: Option<EncounterOutcome>,
}

const fn trap_count(depth: u32) -> u32 {
    let traps = PUZZLE_BASE_TRAPS + depth / 2;
    if traps > PUZZLE_MAX_TRAPS {
        PUZZLE_MAX_TRAPS
    } else {
        traps
    }
}

const fn treasure_count(depth: u32) -> u32 {
    let shrink = depth / 3;
    if shrink + 1 >= PUZZLE_BASE_TREASURES {
        1
    } else {
        PUZZLE_BASE_TREASURES - shrink
    }
}

const fn reveal_budget(depth: u32) -> u32 {
    let budget = PUZZLE_BASE_REVEALS + depth.saturating_sub(1) / 4;
    if budget > PUZZLE_MAX_REVEALS {
        PUZZLE_MAX_REVEALS
    } else {
        budget
    }
}

/// Display-only estimate of clearing a chamber with `reveals` at `depth`.
#[must_use]
pub fn success_probability(depth: u32, reveals: u32) -> f64 {
    let budget_edge = 0.02 * (f64::from(reveals) - f64::from(PUZZLE_BASE_REVEALS));
    let depth_drag = 0.01 * f64::from(depth.saturating_sub(1));
    (PUZZLE_MAX_PROBABILITY + budget_edge - depth_drag)
        .clamp(PUZZLE_MIN_PROBABILITY, PUZZLE_MAX_PROBABILITY)
}

impl PuzzleChamber {
    /// Shuffle a fresh layout for `depth`.
    pub fn generate<R: Rng>(depth: u32, rng: &mut R) -> Self {
        let mut layout = Vec::with_capacity(PUZZLE_ROWS * PUZZLE_COLS);
        layout.push(TileKind::Exit);
        layout.extend(std::iter::repeat_n(TileKind::Trap, trap_count(depth) as usize));
        layout.extend(std::iter::repeat_n(
            TileKind::Treasure,
            treasure_count(depth) as usize,
        ));
        layout.extend(std::iter::repeat_n(TileKind::Bonus, PUZZLE_BONUS_TILES as usize));
        layout.resize(PUZZLE_ROWS * PUZZLE_COLS, TileKind::Neutral);
        layout.shuffle(rng);
        Self::with_tiles(depth, layout)
    }

    /// Build a chamber from a fixed row-major layout.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` when the layout does not fill the grid exactly.
    pub fn from_layout(depth: u32, layout: Vec<TileKind>) -> Result<Self, DelveError> {
        if layout.len() != PUZZLE_ROWS * PUZZLE_COLS {
            return Err(DelveError::InvalidSelection(format!(
                "layout has {} tiles, expected {}",
                layout.len(),
                PUZZLE_ROWS * PUZZLE_COLS
            )));
        }
        Ok(Self::with_tiles(depth, layout))
    }

    fn with_tiles(depth: u32, layout: Vec<TileKind>) -> Self {
        Self {
            depth,
            tiles: layout
                .into_iter()
                .map(|kind| Tile {
                    kind,
                    revealed: false,
                })
                .collect(),
            reveals_remaining: reveal_budget(depth),
            treasures_found: 0,
            outcome: None,
        }
    }

    #[must_use]
    pub const fn reveals_remaining(&self) -> u32 {
        self.reveals_remaining
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&EncounterOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> PuzzleState {
        PuzzleState {
            depth: self.depth,
            rows: PUZZLE_ROWS,
            cols: PUZZLE_COLS,
            reveals_remaining: self.reveals_remaining,
            success_chance: success_probability(self.depth, self.reveals_remaining),
            treasures_found: self.treasures_found,
            tiles: self
                .tiles
                .iter()
                .map(|tile| tile.revealed.then_some(tile.kind))
                .collect(),
            complete: self.outcome.is_some(),
        }
    }

    /// Flip the tile at `(row, col)` and apply it, following bonus cascades.
    ///
    /// # Errors
    ///
    /// `EncounterAlreadyComplete`, `InvalidSelection` for an off-grid tile,
    /// `TileAlreadyRevealed` for a flipped one.
    pub fn reveal<R: Rng>(
        &mut self,
        row: usize,
        col: usize,
        rng: &mut R,
    ) -> Result<Progress, DelveError> {
        if self.outcome.is_some() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        if row >= PUZZLE_ROWS || col >= PUZZLE_COLS {
            return Err(DelveError::InvalidSelection(format!("tile {row},{col}")));
        }
        let mut idx = row * PUZZLE_COLS + col;
        if self.tiles[idx].revealed {
            return Err(DelveError::TileAlreadyRevealed { row, col });
        }

        self.reveals_remaining = self.reveals_remaining.saturating_sub(1);
        loop {
            self.tiles[idx].revealed = true;
            match self.tiles[idx].kind {
                TileKind::Exit => {
                    self.finish_cleared();
                    return Ok(Progress::Finished(OutcomeStatus::Success));
                }
                TileKind::Trap => {
                    self.reveals_remaining = self.reveals_remaining.saturating_sub(1);
                }
                TileKind::Treasure => {
                    self.reveals_remaining += 1;
                    self.treasures_found += 1;
                }
                TileKind::Bonus => {
                    if let Some(next) = self.cascade_target(idx, rng) {
                        log::debug!("puzzle bonus at {idx} cascades to {next}");
                        idx = next;
                        continue;
                    }
                }
                TileKind::Neutral => {}
            }
            break;
        }

        if self.reveals_remaining == 0 {
            self.outcome = Some(EncounterOutcome::failure(
                "puzzle_chamber.exhausted",
                FailureKind::PuzzleExhausted,
                0,
            ));
            return Ok(Progress::Finished(OutcomeStatus::Failure));
        }
        Ok(Progress::Ongoing)
    }

    fn cascade_target<R: Rng>(&self, idx: usize, rng: &mut R) -> Option<usize> {
        let (row, col) = (idx / PUZZLE_COLS, idx % PUZZLE_COLS);
        let mut neighbours = Vec::with_capacity(4);
        if row > 0 {
            neighbours.push(idx - PUZZLE_COLS);
        }
        if row + 1 < PUZZLE_ROWS {
            neighbours.push(idx + PUZZLE_COLS);
        }
        if col > 0 {
            neighbours.push(idx - 1);
        }
        if col + 1 < PUZZLE_COLS {
            neighbours.push(idx + 1);
        }
        neighbours.retain(|&n| !self.tiles[n].revealed);
        neighbours.choose(rng).copied()
    }

    fn finish_cleared(&mut self) {
        let reward = RawRewards {
            treasure: self.treasures_found * PUZZLE_TREASURE_VALUE
                + self.reveals_remaining * PUZZLE_SPARE_REVEAL_VALUE,
            items: self.treasures_found,
            ..RawRewards::default()
        };
        self.outcome = Some(EncounterOutcome::success("puzzle_chamber.exit_found", reward));
    }
}
