//! CLI argument parsing for driftgate

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dg")]
#[command(author, version, about = "Schema validation and drift detection for tabular datasets", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Output format for printed artifacts
    #[arg(short, long, global = true, default_value = "yaml")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Stage(StageCommand),

    /// Show a persisted drift report
    Report {
        /// Path to report.yaml
        #[arg(required = true)]
        path: PathBuf,
    },
}

/// Commands that run pipeline stages; these load the config and open a run log
#[derive(Subcommand, Debug)]
pub enum StageCommand {
    /// Ingest the source records, then validate the resulting partitions
    Run,

    /// Ingest the source records into train/test partitions
    Ingest,

    /// Validate existing train/test partitions
    Validate {
        /// Training partition (baseline for drift detection)
        #[arg(long, required = true)]
        train: PathBuf,

        /// Test partition (compared against the baseline)
        #[arg(long, required = true)]
        test: PathBuf,

        /// Directory for validation outputs (default: timestamped under artifact-dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// How artifacts are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_is_not_a_stage_command() {
        let cli = Cli::try_parse_from(["dg", "report", "out/report.yaml"]).unwrap();
        match cli.command {
            Command::Report { path } => assert_eq!(path, PathBuf::from("out/report.yaml")),
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn test_stage_commands_parse() {
        let cli = Cli::try_parse_from(["dg", "--format", "json", "validate", "--train", "a.csv", "--test", "b.csv"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Stage(StageCommand::Validate { train, test, out }) => {
                assert_eq!(train, PathBuf::from("a.csv"));
                assert_eq!(test, PathBuf::from("b.csv"));
                assert!(out.is_none());
            }
            other => panic!("expected validate, got {:?}", other),
        }

        let cli = Cli::try_parse_from(["dg", "run", "-c", "dg.yml"]).unwrap();
        assert!(matches!(cli.command, Command::Stage(StageCommand::Run)));
        assert_eq!(cli.config, Some(PathBuf::from("dg.yml")));
    }

    #[test]
    fn test_validate_requires_both_partitions() {
        assert!(Cli::try_parse_from(["dg", "validate", "--train", "a.csv"]).is_err());
    }
}
