//! Centralized balance and tuning constants for the delving engine.
//!
//! These values define the deterministic math for runs, maps and
//! encounters. Keeping them together means balance only moves through
//! reviewed code changes.

// Run energy ---------------------------------------------------------------
pub(crate) const STREAK_STEP_THRESHOLD: u32 = 10_000;
pub(crate) const STREAK_BONUS_RATIO: f64 = 0.2;

// Return cost curve --------------------------------------------------------
pub(crate) const RETURN_COST_BASE: f64 = 60.0;
pub(crate) const RETURN_COST_EXPONENT: f64 = 1.6;
pub(crate) const DEFAULT_SAFETY_BUFFER: u32 = 10;
pub(crate) const OPTIMAL_DEPTH_SEARCH_LIMIT: u32 = 100;

// Node traversal -----------------------------------------------------------
pub(crate) const NODE_COST_BASE: f64 = 80.0;
pub(crate) const NODE_COST_PER_DEPTH: f64 = 20.0;

// Advisory thresholds ------------------------------------------------------
pub(crate) const RISK_CAUTION: f64 = 0.5;
pub(crate) const RISK_DANGER: f64 = 0.75;
pub(crate) const RISK_CRITICAL: f64 = 0.9;
pub(crate) const REST_ADVICE_MIN_DEPTH: u32 = 3;

// Map generation -----------------------------------------------------------
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 20;
pub(crate) const DEFAULT_NODES_PER_DEPTH: u32 = 3;
pub(crate) const MAX_CONFIG_DEPTH: u32 = 100;
pub(crate) const MAX_NODES_PER_DEPTH: u32 = 6;
pub(crate) const EXTRA_CONNECTION_CHANCE: f64 = 0.6;

// Puzzle chamber -----------------------------------------------------------
pub(crate) const PUZZLE_ROWS: usize = 5;
pub(crate) const PUZZLE_COLS: usize = 6;
pub(crate) const PUZZLE_BASE_REVEALS: u32 = 10;
pub(crate) const PUZZLE_MAX_REVEALS: u32 = 12;
pub(crate) const PUZZLE_BASE_TRAPS: u32 = 3;
pub(crate) const PUZZLE_MAX_TRAPS: u32 = 10;
pub(crate) const PUZZLE_BASE_TREASURES: u32 = 6;
pub(crate) const PUZZLE_BONUS_TILES: u32 = 3;
pub(crate) const PUZZLE_TREASURE_VALUE: u32 = 25;
pub(crate) const PUZZLE_SPARE_REVEAL_VALUE: u32 = 5;
pub(crate) const PUZZLE_MIN_PROBABILITY: f64 = 0.7;
pub(crate) const PUZZLE_MAX_PROBABILITY: f64 = 0.9;

// Trade opportunity --------------------------------------------------------
pub(crate) const TRADE_DEPTH_SCALE: f64 = 0.2;
pub(crate) const TRADE_SELECTIONS_TO_COMPLETE: usize = 2;

// Choice encounters --------------------------------------------------------
pub(crate) const CHOICE_MIN_SUCCESS: f64 = 0.05;
pub(crate) const CHOICE_MAX_SUCCESS: f64 = 1.0;
pub(crate) const DEPTH_PRESSURE_PER_LEVEL: f64 = 0.015;
pub(crate) const DEPTH_PRESSURE_CAP: f64 = 0.3;

// Scoundrel ----------------------------------------------------------------
pub(crate) const SCOUNDREL_MAX_LIFE: u8 = 20;
pub(crate) const SCOUNDREL_ROOM_SIZE: usize = 4;
pub(crate) const SCOUNDREL_MAX_SKIPS: u32 = 3;
pub(crate) const SCOUNDREL_TIER_TWO_SCORE: i32 = 8;
pub(crate) const SCOUNDREL_TIER_THREE_SCORE: i32 = 15;

// Rewards ------------------------------------------------------------------
pub(crate) const REWARD_DEPTH_SCALE: f64 = 0.15;
pub(crate) const SHORTCUT_REDUCTION_RATIO: f64 = 0.5;

// Failure consequences -----------------------------------------------------
pub(crate) const FAILURE_BASE_PENALTY: f64 = 25.0;
pub(crate) const ITEM_LOSS_PER_DEPTH: f64 = 0.02;
pub(crate) const ITEM_LOSS_CAP: f64 = 0.75;
pub(crate) const LOCKOUT_SEVERITY: f64 = 1.3;
pub(crate) const LOCKOUT_DEPTH: u32 = 6;
pub(crate) const LOCKOUT_BASE_TURNS: u32 = 2;

// Storage keys -------------------------------------------------------------
pub(crate) const RUN_QUEUE_KEY: &str = "delve.run_queue";
pub(crate) const PROGRESSION_KEY: &str = "delve.progression";
pub(crate) const COLLECTIONS_KEY: &str = "delve.collections";

// Feedback message keys ----------------------------------------------------
pub(crate) const MSG_RETURN_UNAFFORDABLE: &str = "advice.return.unaffordable";
pub(crate) const MSG_RETURN_PAST_NO_RETURN: &str = "advice.return.point-of-no-return";
pub(crate) const MSG_RETURN_HIGH_RISK: &str = "advice.return.high-risk";
pub(crate) const MSG_REST_RECOVER: &str = "advice.rest.recover";
pub(crate) const MSG_CONTINUE_SAFE: &str = "advice.continue.safe";
pub(crate) const MSG_DEPTH_SAFE: &str = "depth.safe";
pub(crate) const MSG_DEPTH_CAUTION: &str = "depth.caution";
pub(crate) const MSG_DEPTH_DANGER: &str = "depth.danger";
pub(crate) const MSG_DEPTH_CRITICAL: &str = "depth.critical";
pub(crate) const MSG_DEPTH_BEYOND_OPTIMAL: &str = "depth.beyond-optimal";
