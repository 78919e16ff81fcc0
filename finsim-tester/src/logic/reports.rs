use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use finsim_game::Band;

use super::aggregate::StrategyAggregate;
use super::runner::RunRecord;

#[derive(Serialize)]
struct JsonReport<'a> {
    aggregates: &'a [StrategyAggregate],
    runs: &'a [RunRecord],
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Strategy Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;

    let failed = records.iter().filter(|r| !r.passed()).count();
    writeln!(out, "Total runs: {}", records.len())?;
    writeln!(out, "Clean: {}", (records.len() - failed).to_string().green())?;
    writeln!(out, "Invariant failures: {}", failed.to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for aggregate in aggregates {
        let status = if aggregate.failed_runs == 0 {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{status} {}", aggregate.strategy.label().bold())?;
        writeln!(out, "   Runs: {}", aggregate.runs)?;
        writeln!(
            out,
            "   Net worth: mean ${:.2} (sd {:.2}), min ${:.2}, max ${:.2}",
            aggregate.mean_net_worth,
            aggregate.std_net_worth,
            aggregate.min_net_worth,
            aggregate.max_net_worth
        )?;
        writeln!(out, "   Rejected actions per run: {:.2}", aggregate.mean_rejected)?;
        let bands: Vec<String> = Band::ALL
            .into_iter()
            .map(|band| format!("{band} {:.0}%", aggregate.band_share(band) * 100.0))
            .collect();
        writeln!(out, "   Bands: {}", bands.join(", "))?;
        writeln!(out)?;
    }

    let failures: Vec<&RunRecord> = records.iter().filter(|r| !r.passed()).collect();
    if !failures.is_empty() {
        writeln!(out, "{}", "⚠️  Invariant Violations".bright_red().bold())?;
        writeln!(out, "{}", "=======================".red())?;
        for record in failures {
            for violation in &record.violations {
                writeln!(
                    out,
                    "   • {} seed {}: {}",
                    record.strategy,
                    record.seed,
                    violation.red()
                )?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    let report = JsonReport {
        aggregates,
        runs: records,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(out, "# Finsim Strategy Results\n")?;

    let failed = records.iter().filter(|r| !r.passed()).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {}", records.len())?;
    writeln!(out, "- **Invariant failures**: {failed}\n")?;

    writeln!(out, "## Strategies\n")?;
    writeln!(
        out,
        "| Strategy | Runs | Mean net worth | Min | Max | Rich | Comfortable | Broke but afloat | Heavy debt |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
    for aggregate in aggregates {
        write!(
            out,
            "| {} | {} | {:.2} | {:.2} | {:.2} |",
            aggregate.strategy,
            aggregate.runs,
            aggregate.mean_net_worth,
            aggregate.min_net_worth,
            aggregate.max_net_worth
        )?;
        for band in Band::ALL {
            write!(out, " {:.1}% |", aggregate.band_share(band) * 100.0)?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    if failed > 0 {
        writeln!(out, "## Violations\n")?;
        for record in records.iter().filter(|r| !r.passed()) {
            for violation in &record.violations {
                writeln!(out, "- {} seed {}: {violation}", record.strategy, record.seed)?;
            }
        }
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[RunRecord]) -> Result<()> {
    writeln!(
        out,
        "strategy,seed,rounds,cash,asset_sum,debt,net_worth,band,accepted,rejected,violations"
    )?;
    for record in records {
        writeln!(
            out,
            "{},{},{},{:.2},{:.2},{:.2},{:.2},{},{},{},{}",
            record.strategy.key(),
            record.seed,
            record.rounds_played,
            record.cash,
            record.asset_sum,
            record.debt,
            record.net_worth,
            record.band.label(),
            record.accepted_actions,
            record.rejected_actions,
            record.violations.len()
        )?;
    }
    Ok(())
}

/// Print a run's event log, newest entry first.
pub fn write_transcript(out: &mut dyn Write, record: &RunRecord) -> Result<()> {
    writeln!(
        out,
        "{}",
        format!("📜 {} seed {}", record.strategy, record.seed)
            .bright_white()
            .bold()
    )?;
    for line in &record.transcript {
        writeln!(out, "   {line}")?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::aggregate::aggregate_runs;
    use crate::logic::policy::PlayerStrategy;

    fn sample_records() -> Vec<RunRecord> {
        vec![
            RunRecord {
                strategy: PlayerStrategy::Balanced,
                seed: 42,
                rounds_played: 6,
                cash: 12.5,
                asset_sum: 240.0,
                debt: 0.0,
                net_worth: 252.5,
                band: Band::Comfortable,
                accepted_actions: 18,
                rejected_actions: 0,
                violations: Vec::new(),
                transcript: vec!["[R6] RESULT: Comfortable. Good job!".to_string()],
            },
            RunRecord {
                strategy: PlayerStrategy::Reckless,
                seed: 42,
                rounds_played: 6,
                cash: 0.0,
                asset_sum: 10.0,
                debt: 790.0,
                net_worth: -780.0,
                band: Band::HeavyDebt,
                accepted_actions: 9,
                rejected_actions: 4,
                violations: vec!["cash went negative: -1.00".to_string()],
                transcript: Vec::new(),
            },
        ]
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).expect("report renders");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn csv_has_header_and_one_row_per_run() {
        let records = sample_records();
        let text = render(|out| generate_csv_report(out, &records));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strategy,seed,rounds"));
        assert_eq!(
            lines[1],
            "balanced,42,6,12.50,240.00,0.00,252.50,comfortable,18,0,0"
        );
        assert!(lines[2].contains("heavy debt"));
    }

    #[test]
    fn json_includes_aggregates_and_runs() {
        let records = sample_records();
        let aggregates = aggregate_runs(&records);
        let text = render(|out| generate_json_report(out, &records, &aggregates));
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["runs"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["aggregates"][0]["strategy"], "balanced");
        assert_eq!(value["runs"][1]["band"], "heavy_debt");
        assert!(value["runs"][0].get("transcript").is_none());
    }

    #[test]
    fn markdown_lists_strategies_and_violations() {
        let records = sample_records();
        let aggregates = aggregate_runs(&records);
        let text = render(|out| generate_markdown_report(out, &records, &aggregates));
        assert!(text.contains("# Finsim Strategy Results"));
        assert!(text.contains("| Balanced | 1 | 252.50"));
        assert!(text.contains("## Violations"));
        assert!(text.contains("Reckless seed 42: cash went negative"));
    }

    #[test]
    fn console_summarises_each_strategy() {
        let records = sample_records();
        let aggregates = aggregate_runs(&records);
        let text = render(|out| {
            generate_console_report(out, &records, &aggregates, Duration::from_millis(5))
        });
        assert!(text.contains("Total runs: 2"));
        assert!(text.contains("Net worth: mean $252.50"));
        assert!(text.contains("comfortable 100%"));
    }

    #[test]
    fn transcript_prints_every_line() {
        let records = sample_records();
        let text = render(|out| write_transcript(out, &records[0]));
        assert!(text.contains("   [R6] RESULT: Comfortable. Good job!"));
    }
}
