//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    println!(
        "{} {}",
        style(crate::APP_NAME).cyan().bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
}

/// Print the settings a download batch runs with.
pub fn print_batch_summary(owner: &str, items: usize, directory: &str, workers: usize) {
    println!();
    println!("{}", style("Batch:").bold());
    if !owner.is_empty() {
        println!("  Account:   {}", owner);
    }
    println!("  Items:     {}", items);
    println!("  Directory: {}", directory);
    println!("  Workers:   {}", workers);
    println!();
}
