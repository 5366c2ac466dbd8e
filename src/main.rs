//! xmedia-dl - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use xmedia_dl::{
    cli::{AccountsCommand, Args, Command, DownloadArgs},
    config::{parse_handle, validate_config, Config},
    download::{DownloadResponse, Downloader},
    error::{exit_codes, Error, Result},
    media::{load_work_items, parse_work_items, WorkItem},
    output::{
        print_account, print_accounts, print_banner, print_batch_report, print_batch_summary,
        print_error, print_groups, print_info, print_success, print_warning, ProgressBarSink,
    },
    store::AccountStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            ExitCode::from(exit_code_for(&e) as u8)
        }
    }
}

fn exit_code_for(error: &Error) -> i32 {
    match error {
        Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
            exit_codes::CONFIG_ERROR
        }
        Error::Cancelled => exit_codes::CANCELLED,
        Error::Download(_) | Error::HttpStatus { .. } | Error::Http(_) => {
            exit_codes::DOWNLOAD_ERROR
        }
        e if e.is_storage() => exit_codes::STORAGE_ERROR,
        Error::InvalidInput(_) | Error::Format(_) | Error::InvalidFilename(_) => exit_codes::ABORT,
        _ => exit_codes::UNEXPECTED_ERROR,
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Load configuration, then let CLI flags win
    let mut config = Config::load(&args.config)?;
    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let quiet = args.quiet;
    match args.command {
        Command::Download(download) => run_download(&config, download, quiet).await,
        Command::Accounts(command) => run_accounts(&config, command),
    }
}

async fn run_download(config: &Config, args: DownloadArgs, quiet: bool) -> Result<i32> {
    let (owner, items) = match load_batch(config, &args) {
        Ok(batch) => batch,
        Err(e) => return reject(&args, e),
    };

    let root = config.download_directory();
    let total = items.len();
    let interactive = !quiet && !args.json;

    if interactive {
        print_banner();
        print_batch_summary(
            &owner,
            total,
            &root.display().to_string(),
            config.download.workers.min(total.max(1)),
        );
    }

    // First Ctrl-C cancels the batch
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_warning("Cancelling, waiting for running downloads to stop...");
            on_signal.cancel();
        }
    });

    let sink = Arc::new(if interactive {
        ProgressBarSink::new(total)
    } else {
        ProgressBarSink::hidden(total)
    });

    let downloader = Downloader::new(config.batch_options()).with_embedder(config.embedder());
    let result = downloader
        .download(items, &root, &owner, sink.clone(), cancel)
        .await;
    sink.finish();

    let report = match result {
        Ok(report) => report,
        Err(e) => return reject(&args, e),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.to_response())?);
    } else if !quiet {
        print_batch_report(&report);
    }

    match report.error {
        Some(Error::Cancelled) => Ok(exit_codes::CANCELLED),
        Some(e) => Err(e),
        None if report.failed > 0 => Ok(exit_codes::DOWNLOAD_ERROR),
        None => Ok(exit_codes::SUCCESS),
    }
}

/// Resolve the batch owner and items from a file or a saved account.
fn load_batch(config: &Config, args: &DownloadArgs) -> Result<(String, Vec<WorkItem>)> {
    let (owner, items) = match (args.account, &args.input) {
        (Some(id), _) => {
            let store = AccountStore::open(&config.database_path())?;
            let account = store.get_by_id(id)?;
            let parsed = parse_work_items(&account.payload)?;
            let owner = if parsed.owner.is_empty() {
                account.handle
            } else {
                parsed.owner
            };
            (owner, parsed.items)
        }
        (None, Some(input)) => {
            let parsed = load_work_items(input)?;
            (parsed.owner, parsed.items)
        }
        (None, None) => {
            return Err(Error::InvalidInput(
                "an input file or --account is required".into(),
            ))
        }
    };

    let owner = match &args.owner {
        Some(handle) => parse_handle(handle)?,
        None => owner,
    };

    Ok((owner, items))
}

fn reject(args: &DownloadArgs, error: Error) -> Result<i32> {
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&DownloadResponse::rejected(&error))?
        );
    }
    Err(error)
}

fn run_accounts(config: &Config, command: AccountsCommand) -> Result<i32> {
    let store = AccountStore::open(&config.database_path())?;

    match command {
        AccountsCommand::List => print_accounts(&store.list_all()?),
        AccountsCommand::Show { id } => print_account(&store.get_by_id(id)?),
        AccountsCommand::Delete { id } => {
            store.delete_by_id(id)?;
            print_success(&format!("Deleted account {}", id));
        }
        AccountsCommand::Clear { yes } => {
            if !yes {
                print_warning("This deletes every saved account. Re-run with --yes to confirm.");
                return Ok(exit_codes::ABORT);
            }
            let removed = store.clear_all()?;
            print_success(&format!("Deleted {} account(s)", removed));
        }
        AccountsCommand::Group { id, name, color } => {
            store.update_group(id, &name, &color)?;
            if name.is_empty() {
                print_success(&format!("Removed account {} from its group", id));
            } else {
                print_success(&format!("Account {} is now in group {}", id, name));
            }
        }
        AccountsCommand::Groups => print_groups(&store.list_groups()?),
        AccountsCommand::ExportJson { id, dir } => {
            let path = store.export_json(id, &dir)?;
            print_success(&format!("Exported to {}", path.display()));
        }
        AccountsCommand::ExportTxt { ids, dir } => {
            let path = store.export_txt(&ids, &dir)?;
            print_success(&format!("Exported to {}", path.display()));
        }
        AccountsCommand::Import { file } => {
            let handle = store.import_json(&file)?;
            print_success(&format!("Imported @{}", handle));
        }
        AccountsCommand::Save { file, filter } => {
            let raw = std::fs::read_to_string(&file)?;
            let (id, handle) = store.save_payload(&raw, &filter)?;
            print_success(&format!("Saved @{} ({}) as account {}", handle, filter, id));
        }
        AccountsCommand::Resume { id } => {
            let account = store.get_by_id(id)?;
            if account.completed {
                print_info(&format!("@{} ({}) is complete", account.handle, account.filter));
            } else {
                print_info(&format!(
                    "@{} ({}) can resume from cursor: {}",
                    account.handle, account.filter, account.cursor
                ));
            }
        }
    }

    store.close()?;
    Ok(exit_codes::SUCCESS)
}
