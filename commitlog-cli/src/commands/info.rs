use super::{Context, OutputFormat};
use crate::display;
use anyhow::Result;
use colored::Colorize;
use commitlog_core::{GitCli, Inspector};
use serde::Serialize;

#[derive(Serialize)]
struct InfoOutput {
    #[serde(flatten)]
    repository: commitlog_core::RepositoryInfo,
    log_path: String,
    tracked_records: usize,
}

pub fn run(ctx: &Context) -> Result<()> {
    let inspector = Inspector::new(GitCli::from_config(&ctx.config));
    let root = inspector.locate(&ctx.repo)?;
    let store = ctx.store();

    let output = InfoOutput {
        repository: inspector.backend().repository_info(&root),
        log_path: store.path().display().to_string(),
        tracked_records: store.count()?,
    };

    if ctx.format == OutputFormat::Json {
        return display::print_json(&output);
    }

    let info = &output.repository;
    let none = || "n/a".dimmed().to_string();

    println!("{}", "Repository".bold().cyan());
    println!("  {}: {}", "Path".bold(), info.repository_path.display());
    println!(
        "  {}: {}",
        "Remote".bold(),
        info.remote_url.clone().unwrap_or_else(none)
    );
    println!(
        "  {}: {}",
        "Branch".bold(),
        info.current_branch.clone().unwrap_or_else(none)
    );
    println!("  {}: {}", "Commits".bold(), info.total_commits);
    println!(
        "  {}: {}",
        "Last commit".bold(),
        info.last_commit_date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(none)
    );
    println!();
    println!("{}", "Record log".bold().cyan());
    println!("  {}: {}", "Path".bold(), output.log_path);
    println!(
        "  {}: {}",
        "Tracked".bold(),
        output.tracked_records.to_string().cyan()
    );

    Ok(())
}
