//! referral-report: one-shot referral reconciliation run.
//!
//! Usage:
//!   referral-report --input-dir "DE Dataset - Intern" --output-dir output
//!   referral-report --config pipeline.json --json

use anyhow::Result;
use referral_recon_core::{
    config::PipelineConfig,
    pipeline::ReportPipeline,
    summary::RunSummary,
};
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json = args.iter().any(|a| a == "--json");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = string_arg(&args, "--input-dir") {
        config.input_dir = PathBuf::from(dir);
    }
    if let Some(dir) = string_arg(&args, "--output-dir") {
        config.output_dir = PathBuf::from(dir);
    }

    if !json {
        println!("referral-report");
        println!("  input_dir:  {}", config.input_dir.display());
        println!("  output_dir: {}", config.output_dir.display());
        println!();
    }

    let pipeline = ReportPipeline::new(config);
    log::info!("starting run {}", pipeline.run_id);
    let output = pipeline.run()?;
    if let Some(path) = &output.run.report_path {
        log::info!("run {}: event report at {}", pipeline.run_id, path.display());
    }
    match &output.run.summary_path {
        Some(path) => log::info!("run {}: summary report at {}", pipeline.run_id, path.display()),
        None => log::warn!("run {}: no summary report written", pipeline.run_id),
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&output.run)?);
    } else {
        print_summary(&output.run);
    }

    Ok(())
}

fn print_summary(run: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:        {}", run.run_id);
    println!("  base rows:     {}", run.base_rows);
    println!("  joined rows:   {}", run.joined_rows);
    println!("  event rows:    {}", run.event_rows);
    println!("  valid:         {}", run.valid_rows);
    println!("  invalid:       {}", run.invalid_rows);

    println!();
    println!("=== JOINS ===");
    for join in &run.joins {
        match &join.skipped {
            None => println!(
                "  {:<18} {} -> {} rows",
                join.name, join.rows_before, join.rows_after
            ),
            Some(reason) => println!("  {:<18} skipped ({reason})", join.name),
        }
    }

    if !run.override_counts.is_empty() {
        println!();
        println!("=== INVALIDITY OVERRIDES ===");
        for (o, count) in &run.override_counts {
            println!("  {:<28} {count}", o.name());
        }
    }

    println!();
    if let Some(path) = &run.report_path {
        println!("Saved final report to: {}", path.display());
    }
    match (&run.summary_path, run.summary_rows) {
        (Some(path), Some(rows)) => {
            println!("Saved aggregated report ({rows} rows) to: {}", path.display())
        }
        _ => println!("referral_id not found - skipping aggregation."),
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
