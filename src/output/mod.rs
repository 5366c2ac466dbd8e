//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - The terminal progress sink
//! - Batch and account reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_banner, print_batch_summary, print_error, print_info, print_success, print_warning,
};
pub use progress::{create_item_bar, ProgressBarSink};
pub use stats::{print_account, print_accounts, print_batch_report, print_groups};
