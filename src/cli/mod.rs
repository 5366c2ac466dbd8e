//! Command-line interface.

pub mod args;

pub use args::{AccountsCommand, Args, Command, DownloadArgs};
