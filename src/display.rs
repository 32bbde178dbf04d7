//! Output Formatting and Display Management
//!
//! Prints the per-file outcome of a run, either as colored terminal text or as
//! a JSON document (`--json`). Each completed file shows both platforms of the
//! pair with their record counts, average payload, time window and any failed
//! row writes; files that could not be read show the error instead.

use crate::coordinator::{FileOutcome, FileReport};
use crate::models::PlatformSummary;
use colored::Colorize;

pub struct DisplayManager;

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    pub fn display_run(&self, outcomes: &[FileOutcome], json_output: bool) {
        if json_output {
            let output = serde_json::json!({ "files": outcomes });
            match serde_json::to_string_pretty(&output) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Error serializing run report to JSON: {}", e),
            }
            return;
        }

        if outcomes.is_empty() {
            println!("No access logs to analyse.");
            return;
        }

        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", "Access Log Usage Report".bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());

        let completed = outcomes.iter().filter(|o| o.is_completed()).count();
        println!(
            "\n{} {} files • {} analysed • {} failed\n",
            "📊".bright_yellow(),
            outcomes.len().to_string().bright_white().bold(),
            completed.to_string().bright_green().bold(),
            (outcomes.len() - completed).to_string().bright_red().bold()
        );

        for outcome in outcomes {
            match outcome {
                FileOutcome::Completed(report) => self.display_report(report),
                FileOutcome::Failed { path, error } => {
                    println!(
                        "{} {}: {}",
                        "❌".bright_red(),
                        path.display().to_string().bright_white().bold(),
                        error.bright_red()
                    );
                    println!();
                }
            }
        }
    }

    fn display_report(&self, report: &FileReport) {
        println!(
            "{} Finished analysing {}",
            "✅".bright_green(),
            report.path.display().to_string().bright_white().bold()
        );

        if let Some(combined) = &report.combined {
            println!(
                "   {} {} → {} ({})",
                combined.date.format("%Y-%m-%d").to_string().bright_blue(),
                combined.start_time,
                combined.end_time,
                combined.duration.bright_yellow()
            );
        }

        for summary in [&report.first, &report.second] {
            println!("   {}", self.platform_line(summary));
        }

        if report.combined.is_some() && !report.summary_written {
            println!("   {}", "combined summary was not saved".bright_red());
        }
        println!();
    }

    fn platform_line(&self, summary: &PlatformSummary) -> String {
        let mut line = format!(
            "{}: {} entries, average {}",
            summary.platform.bright_cyan(),
            summary.length.to_string().bright_white(),
            summary.average.to_string().bright_green()
        );

        if summary.persisted.failed > 0 {
            line.push_str(&format!(
                " ({} of {} rows failed to save)",
                summary.persisted.failed.to_string().bright_red(),
                summary.persisted.attempted
            ));
        }
        line
    }
}
