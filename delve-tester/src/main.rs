mod logic;
mod store;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use delve_game::{DelveEngine, EngineConfig, KeyValueStore, MemoryStore, StepRecord};
use logic::{Autopilot, CampaignReport, DelveStrategy, load_history, synthesize_history};
use store::FileStore;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for humans
    Console,
    /// Machine-readable campaign report
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "delve-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs of the Stepdelve engine over a step history")]
struct Args {
    /// JSON file of step records; a synthetic history is generated when omitted
    #[arg(long)]
    history: Option<PathBuf>,

    /// Number of synthetic days to generate
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// First synthetic day (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    start_date: String,

    /// Seed for the synthetic history
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Strategy the autopilot plays with
    #[arg(long, value_enum, default_value_t = DelveStrategy::Balanced)]
    strategy: DelveStrategy,

    /// Persist engine state to this JSON file instead of memory
    #[arg(long)]
    store: Option<PathBuf>,

    /// Engine configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if matches!(args.report, ReportFormat::Console) {
        announce_banner();
    }

    let config = load_config(args.config.as_deref())?;
    let history = resolve_history(&args)?;
    match &args.store {
        Some(path) => {
            let store = FileStore::open(path);
            log::info!("persisting to {}", store.path().display());
            run_campaign(&args, store, config, &history)
        }
        None => run_campaign(&args, MemoryStore::new(), config, &history),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    println!("{}", "⛏️  Stepdelve Automated Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn resolve_history(args: &Args) -> Result<Vec<StepRecord>> {
    if let Some(path) = &args.history {
        return load_history(path);
    }
    let start = NaiveDate::parse_from_str(&args.start_date, "%Y-%m-%d")
        .with_context(|| format!("invalid --start-date {}", args.start_date))?;
    synthesize_history(start, args.days, args.seed)
}

fn run_campaign<S>(
    args: &Args,
    store: S,
    config: EngineConfig,
    history: &[StepRecord],
) -> Result<()>
where
    S: KeyValueStore + Clone,
{
    let start_time = Instant::now();
    let mut engine = DelveEngine::new(store, config).context("engine configuration rejected")?;
    let created = engine.import_step_history(history)?;
    log::info!("queued {} new runs from {} records", created.len(), history.len());

    let mut autopilot = Autopilot::new(args.strategy.create_policy(), args.verbose);
    if args.verbose {
        println!("Playing with the {} policy", autopilot.policy_name());
    }
    let runs = autopilot.play_queue(&mut engine)?;

    let report = CampaignReport {
        strategy: args.strategy,
        runs,
        statistics: engine.statistics(),
        progression: engine.progression().data(),
        collections: engine.collections().progress(),
    };
    write_report(args, &report, start_time)
}

fn write_report(args: &Args, report: &CampaignReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, report)?,
        ReportFormat::Console => logic::reports::generate_console_report(
            &mut output_target,
            report,
            start_time.elapsed(),
        )?,
    }
    output_target.flush()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}
