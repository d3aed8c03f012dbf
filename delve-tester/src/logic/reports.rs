use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use delve_game::{CollectionProgress, ProgressionData, RunStatistics, RunStatus};

use super::{DelveStrategy, RunReport};

/// Everything one tester invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub strategy: DelveStrategy,
    pub runs: Vec<RunReport>,
    pub statistics: RunStatistics,
    pub progression: ProgressionData,
    pub collections: Vec<CollectionProgress>,
}

impl CampaignReport {
    #[must_use]
    pub fn completion_rate(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        let completed = self
            .runs
            .iter()
            .filter(|run| run.status == RunStatus::Completed)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let rate = completed as f64 / self.runs.len() as f64;
        rate * 100.0
    }

    #[must_use]
    pub fn average_depth(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        let total: u32 = self.runs.iter().map(|run| run.deepest_depth).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg = f64::from(total) / self.runs.len() as f64;
        avg
    }
}

/// # Errors
///
/// Propagates write failures.
pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    report: &CampaignReport,
    duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Delve Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;
    writeln!(out, "Strategy: {}", report.strategy.label().bold())?;
    writeln!(out, "Runs played: {}", report.runs.len())?;
    writeln!(out, "Completion rate: {:.1}%", report.completion_rate())?;
    writeln!(out, "Average deepest depth: {:.2}", report.average_depth())?;
    writeln!(out, "Total time: {duration:?}")?;
    writeln!(out)?;

    for run in &report.runs {
        let status = match run.status {
            RunStatus::Completed => "✅ COMPLETED".green(),
            _ => "💀 BUSTED".red(),
        };
        writeln!(out, "{} {} ({} steps)", status, run.run_id.bold(), run.steps)?;
        writeln!(
            out,
            "   Depth {} | energy {} -> {} | treasure {}",
            run.deepest_depth, run.starting_energy, run.energy_remaining, run.treasure
        )?;
        writeln!(
            out,
            "   Encounters: {} ({} failed) | items banked: {}",
            run.encounters.len(),
            run.failures(),
            run.items_banked
        )?;
        for set in &run.completed_sets {
            writeln!(out, "   🏆 completed {}", set.yellow())?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "🧭 Lifetime Progress".bright_yellow().bold())?;
    writeln!(out, "{}", "====================".yellow())?;
    let lifetime = &report.progression;
    writeln!(out, "Deepest ever: {}", lifetime.all_time_deepest_depth)?;
    writeln!(
        out,
        "Attempted: {} (completed {}, busted {})",
        lifetime.total_runs_attempted, lifetime.total_runs_completed, lifetime.total_runs_busted
    )?;
    writeln!(out, "Still queued: {}", report.statistics.queued)?;
    for set in &report.collections {
        let line = format!("{}: {}/{}", set.name, set.owned, set.total);
        if set.complete {
            writeln!(out, "   {}", line.green())?;
        } else {
            writeln!(out, "   {line}")?;
        }
    }
    Ok(())
}

/// # Errors
///
/// Propagates serialization and write failures.
pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, report: &CampaignReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(status: RunStatus, depth: u32) -> RunReport {
        RunReport {
            run_id: format!("run-{depth}"),
            date: String::from("2024-01-01"),
            steps: 9_000,
            starting_energy: 9_000,
            status,
            deepest_depth: depth,
            energy_remaining: 100,
            treasure: 40,
            items_banked: 0,
            completed_sets: Vec::new(),
            encounters: Vec::new(),
        }
    }

    fn campaign() -> CampaignReport {
        CampaignReport {
            strategy: DelveStrategy::Greedy,
            runs: vec![run(RunStatus::Completed, 4), run(RunStatus::Busted, 7)],
            statistics: RunStatistics::default(),
            progression: ProgressionData::default(),
            collections: Vec::new(),
        }
    }

    #[test]
    fn aggregates_over_runs() {
        let report = campaign();
        assert!((report.completion_rate() - 50.0).abs() < f64::EPSILON);
        assert!((report.average_depth() - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn json_report_names_the_strategy() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &campaign()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["strategy"], "greedy");
        assert_eq!(value["runs"][1]["status"], "busted");
    }

    #[test]
    fn console_report_lists_each_run() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &campaign(), Duration::from_millis(5)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Strategy: Greedy"));
        assert!(text.contains("run-7"));
        assert!(text.contains("Completion rate: 50.0%"));
    }
}
