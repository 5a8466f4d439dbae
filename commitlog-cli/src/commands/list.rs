use super::{Context, OutputFormat};
use crate::display;
use anyhow::Result;
use colored::Colorize;
use std::collections::VecDeque;

pub fn run(ctx: &Context, limit: usize) -> Result<()> {
    let store = ctx.store();

    // Keep only the newest `limit` records while streaming the log.
    let mut recent = VecDeque::with_capacity(limit.min(1024));
    let mut total = 0usize;
    for record in store.read_all(None)? {
        total += 1;
        if limit == 0 {
            continue;
        }
        if recent.len() == limit {
            recent.pop_front();
        }
        recent.push_back(record);
    }
    let newest_first: Vec<_> = recent.into_iter().rev().collect();

    if ctx.format == OutputFormat::Json {
        return display::print_json(&newest_first);
    }

    if newest_first.is_empty() {
        println!("{}", "No commits tracked yet".yellow());
        return Ok(());
    }

    println!("{}", "Tracked Commits".bold().cyan());
    println!();
    for record in &newest_first {
        display::print_record(record);
    }

    if total > newest_first.len() {
        println!(
            "{}",
            format!("... and {} older records", total - newest_first.len()).dimmed()
        );
        println!("Use {} to see more", "--limit N".cyan());
    }

    Ok(())
}

pub fn count(ctx: &Context) -> Result<()> {
    let count = ctx.store().count()?;

    match ctx.format {
        OutputFormat::Json => display::print_json(&serde_json::json!({ "count": count })),
        OutputFormat::Text => {
            println!("{} tracked commit(s)", count.to_string().cyan());
            Ok(())
        }
    }
}
