//! driftgate - data validation stage CLI

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use driftgate::cli::{Cli, Command, OutputFormat, StageCommand};
use driftgate::config::Config;
use driftgate::logging::{RunLog, parse_level};
use driftgate::{ArtifactLayout, DriftReport, IngestionArtifact, TrainingPipeline};

fn print_artifact<T: Serialize>(title: &str, artifact: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(artifact)?,
        OutputFormat::Json => serde_json::to_string_pretty(artifact)? + "\n",
    };
    println!("{}", title.bold());
    print!("{}", rendered);
    Ok(())
}

fn print_report(report: &DriftReport) {
    for result in report.iter() {
        let line = format!(
            "{:<32} ks={:.4} p={:.4e}",
            result.column, result.test_statistic, result.p_value
        );
        if result.drift_detected {
            println!("{} {}", line.red(), "DRIFT".red().bold());
        } else {
            println!("{} {}", line, "ok".green());
        }
        if let Some(note) = &result.note {
            println!("    {}", note.dimmed());
        }
    }

    let drifted = report.drifted_columns();
    if drifted.is_empty() {
        println!("{} No drift in {} columns", "✓".green(), report.len());
    } else {
        println!("{} Drift in {} of {} columns", "✗".red(), drifted.len(), report.len());
    }
}

fn show_report(path: &Path) -> Result<()> {
    let report = DriftReport::load(path).context(format!("Failed to read drift report {}", path.display()))?;
    print_report(&report);
    Ok(())
}

fn run_stages(cli: &Cli, command: &StageCommand, config: Config) -> Result<()> {
    let level = parse_level(cli.log_level.as_deref().or(config.log_level.as_deref()));
    let run_log = RunLog::create(&config.log_dir, level).context("Failed to setup logging")?;
    let log_path = run_log.path().to_path_buf();
    let format = cli.format;

    let result = run_log.scope(|| -> Result<()> {
        debug!(?command, "run_stages: dispatching command");
        let timestamped = || ArtifactLayout::timestamped(&config.artifact_dir);
        match command {
            StageCommand::Run => {
                let outcome = TrainingPipeline::new(config.clone(), timestamped()).run()?;
                print_artifact("Ingestion artifact", &outcome.ingestion, format)?;
                print_artifact("Validation artifact", &outcome.validation, format)?;
            }
            StageCommand::Ingest => {
                let artifact = TrainingPipeline::new(config.clone(), timestamped()).ingest()?;
                print_artifact("Ingestion artifact", &artifact, format)?;
            }
            StageCommand::Validate { train, test, out } => {
                let layout = match out {
                    Some(dir) => ArtifactLayout::at(dir),
                    None => timestamped(),
                };
                let ingestion = IngestionArtifact {
                    trained_file_path: train.clone(),
                    test_file_path: test.clone(),
                };
                let artifact = TrainingPipeline::new(config.clone(), layout).validate(&ingestion)?;
                print_artifact("Validation artifact", &artifact, format)?;
            }
        }
        Ok(())
    });

    result.context(format!("Pipeline run failed (log: {})", log_path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        // Read-only; needs neither the config nor a run log
        Command::Report { path } => show_report(path),
        Command::Stage(command) => {
            let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
            config.validate().context("Invalid configuration")?;
            run_stages(&cli, command, config)
        }
    }
}
