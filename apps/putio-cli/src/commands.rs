//! Subcommand definitions and handlers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use futures_util::StreamExt;
use putio::{Client, File, Transfer};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, RANGE};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;

#[derive(clap::Subcommand)]
pub enum Command {
    /// Validate a token and store it in the config file
    Login {
        /// OAuth token
        token: String,
    },
    /// Show account information
    Whoami,
    /// List a folder
    Ls {
        /// Folder id (0 is the root)
        #[arg(default_value_t = 0)]
        id: i64,
    },
    /// Create a folder
    Mkdir {
        name: String,
        /// Parent folder id
        #[arg(long, default_value_t = 0)]
        parent: i64,
    },
    /// Delete files
    Rm {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Move files into a folder
    Mv {
        /// Destination folder id
        #[arg(long)]
        to: i64,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Rename a file
    Rename { id: i64, name: String },
    /// Search files
    Search {
        query: String,
        /// Result page, or -1 for all results
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
    },
    /// Manage transfers
    Transfers {
        #[command(subcommand)]
        action: TransferAction,
    },
    /// Show dashboard events
    Events {
        /// Clear all events afterwards
        #[arg(long)]
        clear: bool,
    },
    /// Upload a file with resume support
    Upload {
        path: PathBuf,
        /// Destination folder id
        #[arg(long, default_value_t = 0)]
        parent: i64,
        /// Send attempts before giving up
        #[arg(long, default_value_t = 5)]
        attempts: u32,
    },
    /// Download a file, continuing a partial one at OUT
    Download {
        id: i64,
        out: PathBuf,
        /// Download through the put.io tunnel
        #[arg(long)]
        tunnel: bool,
    },
}

#[derive(clap::Subcommand)]
pub enum TransferAction {
    /// List active transfers
    List,
    /// Add a torrent, magnet or HTTP URL
    Add {
        url: String,
        /// Destination folder id
        #[arg(long, default_value_t = 0)]
        parent: i64,
        /// Extract archives after download
        #[arg(long)]
        extract: bool,
        /// URL notified when the transfer completes
        #[arg(long, default_value = "")]
        callback_url: String,
    },
    /// Retry a failed transfer
    Retry { id: i64 },
    /// Cancel transfers
    Cancel {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Remove completed transfers
    Clean,
}

pub async fn run(command: Command, mut config: Config, config_path: &Path) -> anyhow::Result<()> {
    if let Command::Login { token } = &command {
        let client = Client::from_config(config.client.clone(), Some(token.as_str()))?;
        let user_id = client
            .validate_token()
            .await
            .context("token validation failed")?;
        config.token = Some(token.clone());
        config.save(config_path)?;
        info!(user_id, path = %config_path.display(), "token saved");
        return Ok(());
    }

    let token = config.token().with_context(|| {
        format!(
            "no token: run `putio login <TOKEN>` or set {}",
            crate::config::TOKEN_ENV
        )
    })?;
    let client = Client::from_config(config.client, Some(&token))?;

    match command {
        Command::Login { .. } => Ok(()),
        Command::Whoami => whoami(&client).await,
        Command::Ls { id } => {
            let (files, parent) = client.files().list(id).await?;
            println!("{}/ ({})", parent.name, parent.id);
            for file in &files {
                println!("{}", file_line(file));
            }
            Ok(())
        }
        Command::Mkdir { name, parent } => {
            let folder = client.files().create_folder(&name, parent).await?;
            println!("{}", folder.id);
            Ok(())
        }
        Command::Rm { ids } => {
            client.files().delete(&ids).await?;
            Ok(())
        }
        Command::Mv { to, ids } => {
            client.files().move_files(to, &ids).await?;
            Ok(())
        }
        Command::Rename { id, name } => {
            client.files().rename(id, &name).await?;
            Ok(())
        }
        Command::Search { query, page } => {
            let result = client.files().search(&query, page).await?;
            for file in &result.files {
                println!("{}", file_line(file));
            }
            if let Some(next) = next_page_hint(page, &result.next) {
                println!("{next}");
            }
            Ok(())
        }
        Command::Transfers { action } => transfers(&client, action).await,
        Command::Events { clear } => {
            for event in client.events().list().await? {
                let when = event
                    .created_at
                    .map(|t| t.to_string())
                    .unwrap_or_default();
                let name = event.transfer_name.as_deref().unwrap_or("-");
                let kind = event.kind.as_deref().unwrap_or("-");
                println!("{:>10}  {when:19}  {kind:20}  {name}", event.id);
            }
            if clear {
                client.events().delete().await?;
            }
            Ok(())
        }
        Command::Upload {
            path,
            parent,
            attempts,
        } => upload(&client, &path, parent, attempts).await,
        Command::Download { id, out, tunnel } => download(&client, id, &out, tunnel).await,
    }
}

async fn whoami(client: &Client) -> anyhow::Result<()> {
    let info = client.account().info().await?;
    println!("{} <{}>", info.username, info.mail);
    println!(
        "disk: {} used of {} ({} free)",
        human_size(info.disk.used),
        human_size(info.disk.size),
        human_size(info.disk.avail)
    );
    if let Some(expires) = info.plan_expiration_date {
        println!("plan expires: {expires}");
    }
    Ok(())
}

async fn transfers(client: &Client, action: TransferAction) -> anyhow::Result<()> {
    let service = client.transfers();
    match action {
        TransferAction::List => {
            for transfer in service.list().await? {
                println!("{}", transfer_line(&transfer));
            }
        }
        TransferAction::Add {
            url,
            parent,
            extract,
            callback_url,
        } => {
            let transfer = service.add(&url, parent, extract, &callback_url).await?;
            println!("{}", transfer_line(&transfer));
        }
        TransferAction::Retry { id } => {
            let transfer = service.retry(id).await?;
            println!("{}", transfer_line(&transfer));
        }
        TransferAction::Cancel { ids } => service.cancel(&ids).await?,
        TransferAction::Clean => service.clean().await?,
    }
    Ok(())
}

async fn upload(client: &Client, path: &Path, parent: i64, attempts: u32) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, aborting upload");
            on_signal.cancel();
        }
    });

    let sent = client
        .upload()
        .with_cancellation(cancel)
        .upload_file(path, parent, attempts)
        .await
        .with_context(|| format!("upload of {} failed", path.display()))?;
    println!("{} (crc32 {})", sent.file_id, sent.crc32);
    Ok(())
}

async fn download(client: &Client, id: i64, out: &Path, tunnel: bool) -> anyhow::Result<()> {
    let existing = tokio::fs::metadata(out).await.map(|m| m.len()).unwrap_or(0);
    let mut headers = HeaderMap::new();
    if existing > 0 {
        headers.insert(RANGE, HeaderValue::from_str(&format!("bytes={existing}-"))?);
    }

    let resp = match client.files().download(id, tunnel, headers).await {
        Ok(resp) => resp,
        Err(e) if existing > 0 && e.status() == Some(416) => {
            info!(path = %out.display(), "already complete");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let append = resp.status() == StatusCode::PARTIAL_CONTENT;
    let mut file = if append {
        tokio::fs::OpenOptions::new().append(true).open(out).await?
    } else {
        tokio::fs::File::create(out).await?
    };
    if append {
        info!(offset = existing, "continuing download");
    }

    let mut written = 0u64;
    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    info!(path = %out.display(), bytes = written, "download finished");
    Ok(())
}

/// Hint for fetching the next search page. `-1` already returns
/// everything, so it never gets one.
fn next_page_hint(page: i64, next: &str) -> Option<String> {
    (page != -1 && !next.is_empty()).then(|| format!("more results: --page {}", page + 1))
}

fn file_line(file: &File) -> String {
    let name = if file.is_dir() {
        format!("{}/", file.name)
    } else {
        file.name.clone()
    };
    format!("{:>12}  {:>9}  {name}", file.id, human_size(file.size))
}

fn transfer_line(transfer: &Transfer) -> String {
    format!(
        "{:>10}  {:>3}%  {:12}  {}",
        transfer.id, transfer.percent_done, transfer.status, transfer.name
    )
}

/// Formats a byte count with binary units.
fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value.abs() >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
