mod logic;
mod util;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use finsim_game::EngineConfig;
use logic::{
    GameRunner, PlayerStrategy, RunRecord, StrategyAggregate, aggregate_runs, expand_iterations,
    resolve_seed_inputs,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "finsim-tester", version = "0.1.0")]
#[command(about = "Automated play-testing for the Finsim round simulation engine")]
struct Args {
    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of games per seed; iteration `i` plays seed + i
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Optional JSON file overriding the engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Print the event log of the first game of each strategy
    #[arg(long)]
    transcript: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    if announces_banner(&args) {
        announce_banner();
    }

    let start_time = Instant::now();
    let cfg = load_config(args.config.as_deref())?;
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let runner = GameRunner::new(cfg, args.verbose);

    let records = run_strategies(&args, &runner, &strategies, &seeds)?;
    let aggregates = aggregate_runs(&records);

    write_reports(&args, &records, &aggregates, start_time)?;

    if records.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in PlayerStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

/// Machine-readable reports on stdout stay free of decoration.
fn announces_banner(args: &Args) -> bool {
    args.output.is_some() || matches!(args.report.as_str(), "console" | "markdown")
}

fn announce_banner() {
    println!("{}", "💰 Finsim Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg = EngineConfig::from_json(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    log::info!("loaded engine configuration from {}", path.display());
    Ok(cfg)
}

fn expand_strategies(strategies_arg: &str) -> Result<Vec<PlayerStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(strategies_arg) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(PlayerStrategy::ALL);
            continue;
        }
        match token.parse::<PlayerStrategy>() {
            Ok(strategy) => strategies.push(strategy),
            Err(_) => eprintln!("⚠️  Unknown strategy: {}", token.yellow()),
        }
    }
    strategies.sort_unstable();
    strategies.dedup();
    if strategies.is_empty() {
        bail!("no known strategies selected (try --list-strategies)");
    }
    Ok(strategies)
}

fn run_strategies(
    args: &Args,
    runner: &GameRunner,
    strategies: &[PlayerStrategy],
    seeds: &[u64],
) -> Result<Vec<RunRecord>> {
    let run_seeds = expand_iterations(seeds, args.iterations);
    let mut records = Vec::with_capacity(strategies.len() * run_seeds.len());

    for &strategy in strategies {
        if args.verbose {
            println!(
                "🧪 Playing {} over {} games",
                strategy.label().bright_white(),
                run_seeds.len()
            );
        }
        for &seed in &run_seeds {
            let record = runner.play(strategy, seed)?;
            if args.verbose {
                let status = if record.passed() {
                    "✅".to_string()
                } else {
                    format!("❌ {}", record.violations.join("; "))
                };
                println!(
                    "   seed {seed}: {} net worth ${:.2} {status}",
                    record.band, record.net_worth
                );
            }
            records.push(record);
        }
    }

    Ok(records)
}

fn write_reports(
    args: &Args,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, records, aggregates)?,
        "markdown" => {
            if records.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Finsim Strategy Results\n\n_No games played._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, records, aggregates)?;
            }
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, records)?,
        _ => {
            if records.is_empty() {
                writeln!(&mut output_target, "No games played.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    records,
                    aggregates,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if args.transcript {
        write_transcripts(&mut output_target, records)?;
    }

    if matches!(args.report.as_str(), "console" | "markdown") {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

/// First game of each strategy, in strategy order.
fn write_transcripts(out: &mut dyn Write, records: &[RunRecord]) -> Result<()> {
    let mut shown: Vec<PlayerStrategy> = Vec::new();
    for record in records {
        if shown.contains(&record.strategy) {
            continue;
        }
        shown.push(record.strategy);
        logic::reports::write_transcript(out, record)?;
    }
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

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
