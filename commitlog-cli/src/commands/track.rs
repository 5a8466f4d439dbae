use super::{Context, OutputFormat};
use crate::display;
use anyhow::Result;
use colored::Colorize;
use commitlog_core::{GitCli, Inspector, Selector, TrackOutcome, Tracker};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn run(ctx: &Context, selector: Selector) -> Result<()> {
    let tracker = Tracker::new(
        Inspector::new(GitCli::from_config(&ctx.config)),
        ctx.store(),
        &ctx.config,
    );

    let spinner = (ctx.format == OutputFormat::Text
        && matches!(selector, Selector::Range { .. }))
    .then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Tracking commits...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    });

    let result = tracker.track(&ctx.repo, &selector);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result?;

    match ctx.format {
        OutputFormat::Json => display::print_json(&report)?,
        OutputFormat::Text => {
            display::print_report(&report);
            if !report.written.is_empty() {
                println!(
                    "  {}: {}",
                    "Log".bold(),
                    tracker.store().path().display()
                );
            }
        }
    }

    if report.outcome() == TrackOutcome::Failed {
        anyhow::bail!(
            "No commits were tracked ({} skipped)",
            report.skipped.len()
        );
    }

    Ok(())
}
