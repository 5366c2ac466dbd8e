//! Batch and account reporting.

use console::style;

use crate::download::BatchReport;
use crate::store::{AccountRecord, AccountSummary, Group};

/// Print the outcome of a download batch.
pub fn print_batch_report(report: &BatchReport) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Download Statistics:").bold());
    println!("  Downloaded: {}", style(report.downloaded).green());
    println!("  Skipped:    {} (already on disk)", style(report.skipped).yellow());
    if report.failed > 0 {
        println!("  Failed:     {}", style(report.failed).red());
    } else {
        println!("  Failed:     0");
    }
    if let Some(error) = &report.error {
        println!("  Stopped:    {}", style(error).red());
    }
    println!("{}", style("═".repeat(50)).dim());
}

/// Print the saved accounts as a table.
pub fn print_accounts(accounts: &[AccountSummary]) {
    if accounts.is_empty() {
        println!("No saved accounts.");
        return;
    }

    println!(
        "{}",
        style(format!(
            "{:>5}  {:<16} {:<8} {:>7} {:<16} {:<12} {}",
            "ID", "HANDLE", "FILTER", "MEDIA", "LAST FETCHED", "GROUP", "STATE"
        ))
        .bold()
    );
    for account in accounts {
        let state = if account.completed {
            style("complete").green()
        } else {
            style("resumable").yellow()
        };
        println!(
            "{:>5}  {:<16} {:<8} {:>7} {:<16} {:<12} {}",
            account.id,
            account.handle,
            account.filter,
            account.total_media,
            account.last_fetched,
            account.group_name,
            state
        );
    }
}

/// Print one account in detail, without its payload.
pub fn print_account(account: &AccountRecord) {
    println!("{}", style(format!("@{}", account.handle)).bold());
    println!("  ID:           {}", account.id);
    println!("  Name:         {}", account.display_name);
    println!("  Filter:       {}", account.filter);
    println!("  Media:        {}", account.total_media);
    println!("  Last fetched: {}", account.last_fetched);
    println!("  Completed:    {}", account.completed);
    if !account.cursor.is_empty() {
        println!("  Cursor:       {}", account.cursor);
    }
    if !account.group_name.is_empty() {
        println!("  Group:        {} ({})", account.group_name, account.group_color);
    }
}

pub fn print_groups(groups: &[Group]) {
    if groups.is_empty() {
        println!("No groups.");
        return;
    }
    for group in groups {
        println!("  {} {}", group.name, style(&group.color).dim());
    }
}
