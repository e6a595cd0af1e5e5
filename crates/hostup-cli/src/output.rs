//! Terminal rendering of run results.

use anyhow::Result;
use console::style;
use serde_json::json;

use hostup_core::pipeline::{PipelineError, PipelineReport, StepRecord};
use hostup_core::types::StepOutcome;

pub fn print_summary(report: &PipelineReport) {
    println!();
    println!("{}", style("  Provisioning complete").bold().green());
    println!();
    print_steps(&report.steps);
    println!();
    println!(
        "  Service:  {} ({})",
        style(&report.service).green(),
        report.unit_path.display()
    );
    println!("  Listens:  {}", style(&report.service_url).cyan().underlined());
    println!(
        "  Start it with: systemctl start {}.service",
        report.service
    );
}

fn print_steps(steps: &[StepRecord]) {
    println!("  {:<14} {:<10} Time", "Stage", "Outcome");
    println!("  {}", "-".repeat(34));
    for record in steps {
        let outcome = match record.outcome {
            StepOutcome::Changed => style("changed").yellow(),
            StepOutcome::Unchanged => style("unchanged").dim(),
        };
        println!(
            "  {:<14} {:<10} {}ms",
            record.stage.as_str(),
            outcome,
            record.duration_ms
        );
    }
}

pub fn print_json(report: &PipelineReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

pub fn print_failure_json(failure: &PipelineError) -> Result<()> {
    let output = json!({
        "state": failure.state(),
        "error": error_chain(&failure.source),
        "completed": failure.completed,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

/// Last line printed before a non-zero exit.
pub fn print_error(err: &anyhow::Error) {
    println!(
        "{} {}",
        style("✗").red().bold(),
        style(format!("{err:#}")).red()
    );
}
