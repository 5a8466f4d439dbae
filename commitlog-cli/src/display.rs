use anyhow::Result;
use colored::Colorize;
use commitlog_core::{CommitRecord, TrackOutcome, TrackReport};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_record(record: &CommitRecord) {
    println!(
        "{} {}",
        "commit".yellow().bold(),
        record.commit_hash.yellow()
    );
    match &record.author_name {
        Some(name) => println!("{}: {} <{}>", "Author".bold(), name, record.author),
        None => println!("{}: {}", "Author".bold(), record.author),
    }
    if let Some(committed_at) = record.committed_at {
        println!(
            "{}: {}",
            "Date".bold(),
            committed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!(
        "{}: {}",
        "Tracked".bold(),
        record.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}: {}", "Record".bold(), record.id.to_string().dimmed());
    println!();
    println!("    {}", record.message);
    println!();
    println!(
        "    {} file(s) changed, {} {}",
        record.changed_files.len().to_string().cyan(),
        format!("+{}", record.insertions).green(),
        format!("-{}", record.deletions).red()
    );

    for path in record.changed_files.iter().take(5) {
        println!("      • {}", path.dimmed());
    }
    if record.changed_files.len() > 5 {
        println!(
            "      {} and {} more...",
            "...".dimmed(),
            (record.changed_files.len() - 5).to_string().dimmed()
        );
    }

    println!();
}

pub fn print_report(report: &TrackReport) {
    for record in &report.written {
        print_record(record);
    }

    let summary = format!(
        "{} written, {} skipped",
        report.written.len(),
        report.skipped.len()
    );
    match report.outcome() {
        TrackOutcome::Complete => println!("{} {}", "✓".green().bold(), summary.green()),
        TrackOutcome::Partial => println!("{} {}", "!".yellow().bold(), summary.yellow()),
        TrackOutcome::Failed => println!("{} {}", "✗".red().bold(), summary.red()),
        TrackOutcome::Empty => println!("{}", "No commits matched".yellow()),
    }

    for skipped in &report.skipped {
        println!(
            "  {} {}: {}",
            "skipped".red(),
            skipped.commit_id.get(..8).unwrap_or(&skipped.commit_id),
            skipped.reason
        );
    }
}
