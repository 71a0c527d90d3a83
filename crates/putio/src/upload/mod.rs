//! Resumable uploads over the TUS-style endpoint.
//!
//! An upload is created with its total length and gets a `Location`. The
//! body is then sent with `PATCH` starting at an offset; after a failure the
//! server offset is queried with `HEAD` and the body is resent from there.
//! Unfinished uploads are removed with `DELETE`.
//!
//! [`UploadService`] exposes the four protocol calls. [`ResumableUpload`]
//! tracks one upload through them, and [`UploadService::upload_file`] drives
//! a local file to completion.

mod metadata;
mod session;
mod watchdog;

use std::sync::Arc;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, LOCATION};
use reqwest::{Body, Method, StatusCode, Url};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::{Error, InvalidArgument, Result};
use crate::params::check_id;

pub use session::ResumableUpload;

const UPLOAD_LENGTH: &str = "upload-length";
const UPLOAD_OFFSET: &str = "upload-offset";
const UPLOAD_METADATA: &str = "upload-metadata";
const FILE_ID: &str = "putio-file-id";
const FILE_CRC32: &str = "putio-file-crc32";
const OFFSET_CONTENT_TYPE: &str = "application/offset+octet-stream";

/// Lifecycle of a [`ResumableUpload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    NotStarted,
    Created,
    Uploading,
    Complete,
    Terminated,
    Failed,
}

/// Returned by the server once the last byte is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFile {
    pub file_id: i64,
    /// CRC32 of the stored file as lowercase hex.
    pub crc32: String,
}

/// Resumable upload endpoints.
#[derive(Debug, Clone)]
pub struct UploadService<'a> {
    client: &'a Client,
    cancel: CancellationToken,
}

impl<'a> UploadService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            cancel: CancellationToken::new(),
        }
    }

    /// Aborts in-flight body transfers when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Starts a new upload of `length` bytes and returns its location.
    pub async fn create_upload(&self, filename: &str, parent_id: i64, length: u64) -> Result<Url> {
        if filename.is_empty() {
            return Err(InvalidArgument::EmptyFilename.into());
        }
        let parent_id = check_id(parent_id)?.to_string();
        info!(filename, parent_id = %parent_id, length, "creating upload");

        let metadata = metadata::encode(&[
            ("name", filename),
            ("parent_id", &parent_id),
            ("no-torrent", "true"),
        ]);
        let req = self
            .client
            .request_to(Method::POST, self.client.tus_url().clone())
            .header(CONTENT_LENGTH, "0")
            .header(UPLOAD_LENGTH, length.to_string())
            .header(UPLOAD_METADATA, metadata)
            .body(Vec::new());
        let resp = self.client.send(req).await?;
        expect_status(resp.status(), StatusCode::CREATED)?;

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(Error::MissingHeader("location"))?;
        let location = self
            .client
            .tus_url()
            .join(location)
            .map_err(|e| Error::InvalidUrl(format!("{location}: {e}")))?;
        debug!(%location, "upload created");
        Ok(location)
    }

    /// Streams `reader` to the upload starting at `offset`.
    ///
    /// `reader` must already be positioned at `offset`. The transfer is
    /// aborted with [`Error::Stalled`] if no read completes within the
    /// client timeout, and with [`Error::Cancelled`] if the service's
    /// cancellation token fires. There is no limit on the total duration.
    pub async fn send_file<R>(&self, reader: R, location: &Url, offset: u64) -> Result<SentFile>
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        debug!(%location, offset, "sending upload body");
        let progress = watchdog::Progress::new();
        let body = Body::wrap_stream(ReaderStream::new(watchdog::Watched::new(
            reader,
            Arc::clone(&progress),
        )));
        let req = self
            .client
            .untimed_request(Method::PATCH, location.clone())
            .header(CONTENT_TYPE, OFFSET_CONTENT_TYPE)
            .header(UPLOAD_OFFSET, offset.to_string())
            .body(body);

        let timeout = self.client.timeout();
        let watchdog = async {
            if timeout.is_zero() {
                std::future::pending::<()>().await;
            } else {
                watchdog::stalled(&progress, timeout).await;
            }
        };

        let resp = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(%location, sent = progress.bytes(), "upload cancelled");
                return Err(Error::Cancelled);
            }
            _ = watchdog => {
                debug!(%location, sent = progress.bytes(), ?timeout, "upload stalled");
                return Err(Error::Stalled(timeout));
            }
            resp = self.client.send(req) => resp?,
        };
        expect_status(resp.status(), StatusCode::NO_CONTENT)?;

        let headers = resp.headers();
        let file_id = header_str(headers, FILE_ID)?;
        let file_id = file_id.parse::<i64>().map_err(|_| Error::BadHeader {
            name: FILE_ID,
            value: file_id.to_string(),
        })?;
        let crc32 = headers
            .get(FILE_CRC32)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        info!(%location, file_id, sent = progress.bytes(), "upload complete");
        Ok(SentFile { file_id, crc32 })
    }

    /// Returns the number of bytes the server has stored for the upload.
    pub async fn get_offset(&self, location: &Url) -> Result<u64> {
        let req = self.client.request_to(Method::HEAD, location.clone());
        let resp = self.client.send(req).await?;
        expect_status(resp.status(), StatusCode::OK)?;

        let raw = header_str(resp.headers(), UPLOAD_OFFSET)?;
        let offset = raw.parse::<u64>().map_err(|_| Error::BadHeader {
            name: UPLOAD_OFFSET,
            value: raw.to_string(),
        })?;
        debug!(%location, offset, "server offset");
        Ok(offset)
    }

    /// Removes an unfinished upload from the server.
    pub async fn terminate_upload(&self, location: &Url) -> Result<()> {
        info!(%location, "terminating upload");
        let req = self.client.request_to(Method::DELETE, location.clone());
        let resp = self.client.send(req).await?;
        expect_status(resp.status(), StatusCode::NO_CONTENT)
    }

    /// Tracks a new upload through the protocol states.
    pub fn resumable(&self, filename: &str, parent_id: i64, length: u64) -> ResumableUpload<'a> {
        ResumableUpload::new(self.clone(), filename, parent_id, length)
    }

    /// Picks up an upload created earlier, e.g. by a previous process.
    ///
    /// The offset must be synced with [`ResumableUpload::sync_offset`]
    /// before sending.
    pub fn resume(&self, location: Url, length: u64) -> ResumableUpload<'a> {
        ResumableUpload::resume(self.clone(), location, length)
    }
}

fn expect_status(got: StatusCode, want: StatusCode) -> Result<()> {
    if got == want {
        Ok(())
    } else {
        Err(Error::UnexpectedStatus(got.as_u16()))
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &'static str) -> Result<&'h str> {
    let value = headers.get(name).ok_or(Error::MissingHeader(name))?;
    value.to_str().map_err(|_| Error::BadHeader {
        name,
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    })
}
