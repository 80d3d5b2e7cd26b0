//! CLI UI utilities: colored output and a harvest spinner.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::models::{ProfileDetails, ProfileRecord};
use crate::sources::{HarvestError, HarvestOutcome, HarvestStatus};
use crate::utils::HarvestObserver;

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Search => println!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(80).dimmed());
}

/// Format a number with commas.
pub fn format_number(n: usize) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to `max_chars` characters, ending in `...` when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if max_chars <= 3 {
        return "...".to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

/// Print a one-line summary of a harvested profile.
pub fn print_record(index: usize, record: &ProfileRecord) {
    let citations = record
        .citation_count()
        .map(|c| format_number(c as usize))
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{:>4}. {}  {}",
        index,
        truncate_with_ellipsis(&record.name, 40).blue().bold(),
        citations.yellow()
    );
    if !record.affiliation.is_empty() {
        println!("      {}", truncate_with_ellipsis(&record.affiliation, 72).dimmed());
    }
}

/// Print the end-of-harvest summary.
pub fn print_outcome(outcome: &HarvestOutcome, duration: Duration) {
    print_section("Harvest summary");
    println!(
        "{} {} profiles from {} pages in {:.2}s",
        status_icon(Status::Search).yellow().bold(),
        format_number(outcome.records.len()).green().bold(),
        outcome.pages(),
        duration.as_secs_f64()
    );
    if outcome.duplicates > 0 {
        println!("  {} duplicate profiles dropped", outcome.duplicates);
    }

    match (&outcome.status, &outcome.error) {
        (HarvestStatus::Failed, Some(error)) => {
            print_status(Status::Error, &format!("Stopped early: {}", error))
        }
        (HarvestStatus::Failed, None) => print_status(Status::Error, "Stopped early"),
        _ if outcome.truncated => {
            print_status(Status::Warning, "Page limit reached, more results were available")
        }
        _ => print_status(Status::Success, "Reached the last result page"),
    }
}

/// Print a profile page lookup.
pub fn print_profile(details: &ProfileDetails) {
    print_section(&details.name);
    if !details.affiliation.is_empty() {
        println!("  Affiliation: {}", details.affiliation);
    }
    if let Some(citations) = details.citations {
        println!("  Citations:   {}", format_number(citations as usize).yellow());
    }
    if !details.interests.is_empty() {
        println!("  Interests:   {}", details.interests.join(", ").cyan());
    }
}

fn spinner_style(template: &str, ticks: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(ticks)
}

/// Spinner that follows a harvest through [`HarvestObserver`] events.
///
/// The session's `finished` event leaves the final message on screen.
pub struct HarvestSpinner {
    pb: ProgressBar,
}

impl HarvestSpinner {
    /// Create a spinner labelled with what is being harvested.
    pub fn new(target: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(format!("Harvesting {}", target));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for `--quiet`.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }
}

impl HarvestObserver for HarvestSpinner {
    fn page_harvested(&self, offset: u32, new_records: usize, total: usize) {
        self.pb.set_message(format!(
            "Page at offset {}: +{} profiles ({} total)",
            offset, new_records, total
        ));
    }

    fn retrying(&self, attempt: u32, error: &HarvestError, delay: Duration) {
        self.pb.set_message(format!(
            "Attempt {} failed ({}), retrying in {:.1}s",
            attempt,
            error,
            delay.as_secs_f64()
        ));
    }

    fn finished(&self, status: HarvestStatus, total: usize) {
        let (template, ticks, msg) = match status {
            HarvestStatus::Failed => (
                "{spinner:.red} {msg}",
                "✗",
                format!("✗ Harvest stopped with {} profiles", total),
            ),
            _ => (
                "{spinner:.green} {msg}",
                "✓",
                format!("✓ Harvested {} profiles", total),
            ),
        };
        self.pb.set_style(spinner_style(template, ticks));
        self.pb.finish_with_message(msg);
    }
}
