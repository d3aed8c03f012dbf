use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use delve_game::StepRecord;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const MIN_DAILY_STEPS: u32 = 1_500;
const MAX_DAILY_STEPS: u32 = 18_000;
/// Share of synthetic days that clear the streak threshold.
const ACTIVE_DAY_CHANCE: f64 = 0.35;

/// Read a JSON array of `{ "date": "YYYY-MM-DD", "steps": n }` records.
///
/// # Errors
///
/// Fails when the file cannot be read or is not a record array.
pub fn load_history(path: &Path) -> Result<Vec<StepRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid history in {}", path.display()))
}

/// Deterministic fake step history of `days` consecutive days.
///
/// # Errors
///
/// Fails if the date range runs off the calendar.
pub fn synthesize_history(start: NaiveDate, days: u32, seed: u64) -> Result<Vec<StepRecord>> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..days)
        .map(|offset| {
            let date = start
                .checked_add_days(Days::new(u64::from(offset)))
                .context("history runs past the end of the calendar")?;
            let steps = if rng.gen_bool(ACTIVE_DAY_CHANCE) {
                rng.gen_range(10_000..=MAX_DAILY_STEPS)
            } else {
                rng.gen_range(MIN_DAILY_STEPS..10_000)
            };
            Ok(StepRecord::new(date.format("%Y-%m-%d").to_string(), steps))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 27).unwrap()
    }

    #[test]
    fn synthetic_history_is_consecutive_and_seeded() {
        let history = synthesize_history(start(), 4, 7).unwrap();
        let dates: Vec<&str> = history.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01"]);
        assert_eq!(history, synthesize_history(start(), 4, 7).unwrap());
        assert!(
            history
                .iter()
                .all(|r| (MIN_DAILY_STEPS..=MAX_DAILY_STEPS).contains(&r.steps))
        );
    }

    #[test]
    fn missing_history_file_is_an_error() {
        let err = load_history(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read history"));
    }
}
