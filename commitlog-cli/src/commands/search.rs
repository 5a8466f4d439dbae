use super::{Context, OutputFormat};
use crate::display;
use anyhow::Result;
use colored::Colorize;
use commitlog_core::SearchCriteria;

pub fn run(ctx: &Context, criteria: &SearchCriteria) -> Result<()> {
    let matches: Vec<_> = ctx.store().search(criteria)?.collect();

    if ctx.format == OutputFormat::Json {
        return display::print_json(&matches);
    }

    if matches.is_empty() {
        println!("{}", "No matching commits".yellow());
        return Ok(());
    }

    println!(
        "{} {}",
        "Matching commits".bold().cyan(),
        format!("({})", matches.len()).yellow()
    );
    println!();
    for record in &matches {
        display::print_record(record);
    }

    Ok(())
}
