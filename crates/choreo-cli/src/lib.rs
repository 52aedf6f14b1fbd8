//! Choreo CLI
//!
//! ```bash
//! # Compare a student's performance against the example
//! choreo compare --example example_poses.json --assignment ana_poses.json --student Ana
//!
//! # Only arms and legs
//! choreo compare --example e.json --assignment a.json --focus arms,legs
//!
//! # Manage saved reports
//! choreo reports list
//! choreo reports show report_Ana_20260301_093000
//! choreo reports delete report_Ana_20260301_093000
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use choreo_core::FocusArea;
use choreo_service::{ComparisonService, SavedReport, ServiceConfig, DEFAULT_STUDENT};

/// Choreography comparison command line interface
#[derive(Parser, Debug)]
#[command(name = "choreo")]
#[command(author, version, about = "Compare choreography performances and coach the student")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare an assignment against the example performance
    Compare(CompareArgs),

    /// Saved report commands
    #[command(subcommand)]
    Reports(ReportsCommand),

    /// Display version information
    Version,
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Pose-sequence JSON of the example performance
    #[arg(long)]
    pub example: PathBuf,

    /// Pose-sequence JSON of the student's performance
    #[arg(long)]
    pub assignment: PathBuf,

    /// Comma-separated focus areas, e.g. `arms,legs`
    #[arg(long, value_parser = parse_focus)]
    pub focus: Option<FocusList>,

    #[arg(long, default_value = DEFAULT_STUDENT)]
    pub student: String,

    /// Print the full stored report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ReportsCommand {
    /// List saved reports, newest first
    List,

    /// Print one report as JSON
    Show { id: String },

    /// Delete one report
    Delete { id: String },
}

/// Parsed `--focus` value
#[derive(Debug, Clone, PartialEq)]
pub struct FocusList(pub Vec<FocusArea>);

impl FocusList {
    pub fn as_slice(&self) -> &[FocusArea] {
        &self.0
    }
}

fn parse_focus(value: &str) -> Result<FocusList, String> {
    FocusArea::parse_list(value)
        .map(FocusList)
        .map_err(|e| e.to_string())
}

/// File given by `--config`, else environment only
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ServiceConfig> {
    let config = match path {
        Some(path) => {
            let path = path
                .to_str()
                .context("configuration path is not valid UTF-8")?;
            ServiceConfig::from_file(path).with_context(|| format!("loading {path}"))?
        }
        None => ServiceConfig::from_env().context("reading CHOREO_* environment")?,
    };
    tracing::debug!(
        "reports in {}, poses in {}",
        config.storage.reports_dir.display(),
        config.storage.poses_dir.display()
    );
    Ok(config)
}

fn print_summary(saved: &SavedReport) {
    println!("Report: {}", saved.id);
    match saved.report.outcome.report() {
        Some(report) => {
            let b = &report.similarity_breakdown;
            println!("Overall similarity: {:.1}%", report.overall_similarity);
            println!("  Pose accuracy:       {:.1}%", b.pose_accuracy);
            println!("  Timing accuracy:     {:.1}%", b.timing_accuracy);
            println!("  Movement smoothness: {:.1}%", b.movement_smoothness);
            println!("  Angle accuracy:      {:.1}%", b.angle_accuracy);
        }
        None => {
            println!(
                "Comparison failed: {}",
                saved.report.outcome.error().unwrap_or("unknown error")
            );
        }
    }
    if let Some(feedback) = &saved.report.ai_feedback {
        println!("\n{}", feedback);
    }
}

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Version => {
            println!("choreo {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Compare(args) => {
            let service = ComparisonService::new(load_config(cli.config.as_ref())?)?;
            let saved = service
                .compare_files(
                    &args.example,
                    &args.assignment,
                    args.focus.as_ref().map(FocusList::as_slice),
                    &args.student,
                )
                .await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&saved.report)?);
            } else {
                print_summary(&saved);
            }
        }
        Commands::Reports(command) => {
            let service = ComparisonService::new(load_config(cli.config.as_ref())?)?;
            match command {
                ReportsCommand::List => {
                    let reports = service.list_reports().await?;
                    if reports.is_empty() {
                        println!("No reports found");
                    }
                    for summary in reports {
                        println!(
                            "{}  {:<16} {:>6.1}%  {}",
                            summary.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            summary.student_name,
                            summary.overall_similarity,
                            summary.id
                        );
                    }
                }
                ReportsCommand::Show { id } => {
                    let report = service.get_report(&id).await?;
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                ReportsCommand::Delete { id } => {
                    service.delete_report(&id).await?;
                    println!("Deleted {}", id);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from([
            "choreo",
            "compare",
            "--example",
            "e.json",
            "--assignment",
            "a.json",
            "--focus",
            "arms, legs",
        ])
        .unwrap();

        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.focus, Some(FocusList(vec![FocusArea::Arms, FocusArea::Legs])));
                assert_eq!(args.student, DEFAULT_STUDENT);
                assert!(!args.json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_focus() {
        let result = Cli::try_parse_from([
            "choreo",
            "compare",
            "--example",
            "e.json",
            "--assignment",
            "a.json",
            "--focus",
            "torso",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_reports_show() {
        let id = "report_Ana_20260301_093000";
        let cli = Cli::try_parse_from(["choreo", "reports", "show", id]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Reports(ReportsCommand::Show { ref id }) if id == "report_Ana_20260301_093000"
        ));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
