//! put.io API v2 client.
//!
//! ```no_run
//! # async fn run() -> putio::Result<()> {
//! let client = putio::Client::new("oauth-token")?;
//! let (files, root) = client.files().list(0).await?;
//! println!("{} has {} entries", root.name, files.len());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod files;
pub mod friends;
mod params;
pub mod transfers;
pub mod types;
pub mod upload;
pub mod zips;

#[cfg(test)]
mod testutil;

pub use client::{Client, ClientBuilder, ClientConfig};
pub use error::{Error, ErrorResponse, InvalidArgument, Result};
pub use files::Subtitles;
pub use types::{
    AccountInfo, Disk, Event, File, Friend, Search, Settings, SettingsUpdate, Share, SharedWith,
    Subtitle, Transfer, Upload, Zip,
};
pub use upload::{ResumableUpload, SentFile, UploadService, UploadState};
