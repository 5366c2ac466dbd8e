//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::Config;

/// Batch media downloader with a resumable account store.
#[derive(Parser, Debug)]
#[command(
    name = "xmedia-dl",
    version,
    about = "Download media batches and manage saved accounts",
    long_about = "A CLI tool to download images, videos, GIFs and text captures \
                  from a list of work items into a per-account folder layout.\n\n\
                  Fetched accounts are kept in a local database so interrupted \
                  fetches can be resumed and backed up."
)]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Account database file.
    #[arg(long = "database", global = true)]
    pub database: Option<PathBuf>,

    /// Hide progress output.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a batch of work items.
    Download(DownloadArgs),

    /// Manage saved accounts.
    #[command(subcommand)]
    Accounts(AccountsCommand),
}

#[derive(ClapArgs, Debug, Default)]
pub struct DownloadArgs {
    /// JSON file with work items or an account payload.
    #[arg(required_unless_present = "account", conflicts_with = "account")]
    pub input: Option<PathBuf>,

    /// Download the timeline of a saved account instead of a file.
    #[arg(long)]
    pub account: Option<i64>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub directory: Option<PathBuf>,

    /// Owner handle for items that carry none.
    #[arg(long)]
    pub owner: Option<String>,

    /// Proxy URL (http, https or socks5).
    #[arg(long, env = "XMEDIA_PROXY")]
    pub proxy: Option<String>,

    /// Number of concurrent downloads.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Don't write metadata tags into downloaded files.
    #[arg(long)]
    pub no_metadata: bool,

    /// Print the batch result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum AccountsCommand {
    /// List saved accounts.
    List,

    /// Show one account.
    Show { id: i64 },

    /// Delete one account.
    Delete { id: i64 },

    /// Delete every saved account.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Assign an account to a group. Empty values remove the group.
    Group {
        id: i64,
        #[arg(default_value = "")]
        name: String,
        #[arg(default_value = "")]
        color: String,
    },

    /// List groups in use.
    Groups,

    /// Export an account's payload as JSON.
    ExportJson {
        id: i64,
        /// Directory that receives the backup folder.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Export handles of several accounts to a text file.
    ExportTxt {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
        /// Directory that receives the backup folder.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Import an exported JSON payload.
    Import { file: PathBuf },

    /// Save a fetched payload with its resume cursor.
    Save {
        file: PathBuf,
        /// Media filter the payload was fetched with.
        #[arg(long, default_value = "all")]
        filter: String,
    },

    /// Print the resume cursor of an account.
    Resume { id: i64 },
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(database) = &self.database {
            config.store.database_path = Some(database.clone());
        }

        if let Command::Download(download) = &self.command {
            download.merge_into_config(config);
        }
    }
}

impl DownloadArgs {
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.directory {
            config.download.directory = Some(dir.clone());
        }

        if let Some(proxy) = &self.proxy {
            config.download.proxy = Some(proxy.clone());
        }

        if let Some(workers) = self.workers {
            config.download.workers = workers;
        }

        if let Some(timeout) = self.timeout {
            config.download.timeout_seconds = timeout;
        }

        // Only override if set to non-default
        if self.no_metadata {
            config.download.embed_metadata = false;
        }
    }
}
