//! Runs: one delve per calendar day, funded by that day's steps.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::energy::{calculate_run_energy, calculate_streak_bonus, qualifies_for_streak};
use crate::error::DelveError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Queued,
    Active,
    Completed,
    Busted,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Busted => "busted",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Busted)
    }

    /// Legal lifecycle moves: `queued -> active -> completed | busted`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Active) | (Self::Active, Self::Completed | Self::Busted)
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "busted" => Ok(Self::Busted),
            other => Err(format!("unknown run status {other:?}")),
        }
    }
}

/// One day's activity as delivered by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub date: String,
    pub steps: u32,
}

impl StepRecord {
    #[must_use]
    pub fn new(date: impl Into<String>, steps: u32) -> Self {
        Self {
            date: date.into(),
            steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub date: String,
    pub steps: u32,
    pub base_energy: u32,
    pub bonus_energy: u32,
    pub total_energy: u32,
    pub has_streak_bonus: bool,
    #[serde(default)]
    pub status: RunStatus,
}

impl Run {
    #[must_use]
    pub fn id_for_date(date: &str) -> String {
        format!("run-{date}")
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// `InvalidDate` for anything else, including unpadded fields.
pub fn parse_run_date(date: &str) -> Result<NaiveDate, DelveError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .filter(|parsed| parsed.format(DATE_FORMAT).to_string() == date)
        .ok_or_else(|| DelveError::InvalidDate {
            date: date.to_string(),
        })
}

/// Build a queued run for `date` funded by `steps`.
///
/// # Errors
///
/// `InvalidDate` when `date` is not `YYYY-MM-DD`.
pub fn generate_run_from_steps(date: &str, steps: u32) -> Result<Run, DelveError> {
    parse_run_date(date)?;
    let has_streak_bonus = qualifies_for_streak(steps);
    let bonus_energy = calculate_streak_bonus(steps);
    Ok(Run {
        id: Run::id_for_date(date),
        date: date.to_string(),
        steps,
        base_energy: steps,
        bonus_energy,
        total_energy: calculate_run_energy(steps, has_streak_bonus),
        has_streak_bonus,
        status: RunStatus::Queued,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_day_gets_bonus_energy() {
        let run = generate_run_from_steps("2024-01-15", 12_000).unwrap();
        assert_eq!(run.id, "run-2024-01-15");
        assert_eq!(run.base_energy, 12_000);
        assert_eq!(run.bonus_energy, 2_400);
        assert_eq!(run.total_energy, 14_400);
        assert!(run.has_streak_bonus);
        assert_eq!(run.status, RunStatus::Queued);
    }

    #[test]
    fn quiet_day_has_no_bonus() {
        let run = generate_run_from_steps("2024-01-16", 9_999).unwrap();
        assert_eq!(run.bonus_energy, 0);
        assert_eq!(run.total_energy, 9_999);
        assert!(!run.has_streak_bonus);
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for bad in ["2024-1-15", "2024-02-30", "15/01/2024", "", "2024-01-15T00:00"] {
            assert_eq!(
                generate_run_from_steps(bad, 100),
                Err(DelveError::InvalidDate {
                    date: bad.to_string()
                }),
                "{bad}"
            );
        }
    }

    #[test]
    fn lifecycle_only_moves_forward() {
        use RunStatus::{Active, Busted, Completed, Queued};
        assert!(Queued.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
        assert!(Active.can_transition_to(Busted));
        assert!(!Active.can_transition_to(Queued));
        assert!(!Active.can_transition_to(Active));
        assert!(!Queued.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Busted.can_transition_to(Busted));
        assert_eq!("busted".parse::<RunStatus>(), Ok(Busted));
        assert_eq!(serde_json::to_string(&Completed).unwrap(), "\"completed\"");
    }
}
