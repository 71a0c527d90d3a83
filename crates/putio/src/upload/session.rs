//! Upload state machine and the file upload loop.

use std::io::SeekFrom;
use std::path::Path;

use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use super::{SentFile, UploadService, UploadState};
use crate::error::{Error, InvalidArgument, Result};

const CRC_BUF_SIZE: usize = 64 * 1024;

/// One upload tracked through create, send, resume and terminate.
///
/// The local offset only moves forward. After an interrupted send it is
/// marked stale and must be re-read from the server with
/// [`ResumableUpload::sync_offset`] before the next send.
#[derive(Debug)]
pub struct ResumableUpload<'a> {
    service: UploadService<'a>,
    filename: String,
    parent_id: i64,
    length: u64,
    state: UploadState,
    location: Option<Url>,
    offset: u64,
    offset_stale: bool,
}

impl<'a> ResumableUpload<'a> {
    pub(super) fn new(
        service: UploadService<'a>,
        filename: &str,
        parent_id: i64,
        length: u64,
    ) -> Self {
        Self {
            service,
            filename: filename.to_string(),
            parent_id,
            length,
            state: UploadState::NotStarted,
            location: None,
            offset: 0,
            offset_stale: false,
        }
    }

    pub(super) fn resume(service: UploadService<'a>, location: Url, length: u64) -> Self {
        Self {
            service,
            filename: String::new(),
            parent_id: 0,
            length,
            state: UploadState::Uploading,
            location: Some(location),
            offset: 0,
            offset_stale: true,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    /// Bytes known to be stored on the server.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// `true` when the offset must be synced before the next send.
    pub fn is_offset_stale(&self) -> bool {
        self.offset_stale
    }

    /// Creates the upload on the server.
    pub async fn create(&mut self) -> Result<&Url> {
        self.require(&[UploadState::NotStarted], "create")?;
        match self
            .service
            .create_upload(&self.filename, self.parent_id, self.length)
            .await
        {
            Ok(location) => {
                self.state = UploadState::Created;
                Ok(&*self.location.insert(location))
            }
            Err(e) => {
                if !e.is_retryable() {
                    self.state = UploadState::Failed;
                }
                Err(e)
            }
        }
    }

    /// Sends the remaining bytes. `reader` must be positioned at
    /// [`ResumableUpload::offset`].
    ///
    /// A retryable failure leaves the upload resumable with a stale offset.
    /// Any other failure moves it to [`UploadState::Failed`].
    pub async fn send<R>(&mut self, reader: R) -> Result<SentFile>
    where
        R: tokio::io::AsyncRead + Send + Sync + Unpin + 'static,
    {
        self.require(&[UploadState::Created, UploadState::Uploading], "send")?;
        if self.offset_stale {
            return Err(Error::InvalidState {
                state: self.state,
                action: "send with a stale offset",
            });
        }
        let location = self.location_or("send")?.clone();

        self.state = UploadState::Uploading;
        match self.service.send_file(reader, &location, self.offset).await {
            Ok(sent) => {
                self.offset = self.length;
                self.state = UploadState::Complete;
                Ok(sent)
            }
            Err(e) if e.is_retryable() || matches!(e, Error::Cancelled) => {
                debug!(%location, error = %e, "send interrupted");
                self.offset_stale = true;
                Err(e)
            }
            Err(e) => {
                self.state = UploadState::Failed;
                Err(e)
            }
        }
    }

    /// Re-reads the server offset. A server offset behind the local one, or
    /// past the upload length, fails the upload.
    pub async fn sync_offset(&mut self) -> Result<u64> {
        self.require(&[UploadState::Created, UploadState::Uploading], "sync offset")?;
        let location = self.location_or("sync offset")?.clone();

        let server = match self.service.get_offset(&location).await {
            Ok(server) => server,
            Err(e) => {
                if !e.is_retryable() {
                    self.state = UploadState::Failed;
                }
                return Err(e);
            }
        };

        if server < self.offset {
            self.state = UploadState::Failed;
            return Err(Error::OffsetRegressed {
                local: self.offset,
                server,
            });
        }
        if server > self.length {
            self.state = UploadState::Failed;
            return Err(Error::BadHeader {
                name: "upload-offset",
                value: server.to_string(),
            });
        }

        self.offset = server;
        self.offset_stale = false;
        Ok(server)
    }

    /// Deletes the unfinished upload from the server.
    pub async fn terminate(&mut self) -> Result<()> {
        self.require(
            &[
                UploadState::Created,
                UploadState::Uploading,
                UploadState::Failed,
            ],
            "terminate",
        )?;
        let location = self.location_or("terminate")?.clone();
        self.service.terminate_upload(&location).await?;
        self.state = UploadState::Terminated;
        Ok(())
    }

    fn require(&self, allowed: &[UploadState], action: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                state: self.state,
                action,
            })
        }
    }

    fn location_or(&self, action: &'static str) -> Result<&Url> {
        self.location.as_ref().ok_or(Error::InvalidState {
            state: self.state,
            action,
        })
    }
}

impl UploadService<'_> {
    /// Uploads a local file, resuming after network failures.
    ///
    /// Up to `max_attempts` sends are made (at least one). Before each
    /// resend the server offset is re-read and the file is sought to it. On
    /// a terminal failure, or when attempts run out, the upload is deleted
    /// from the server and the last error returned. A successful upload is
    /// checked against the local file's CRC32.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        parent_id: i64,
        max_attempts: u32,
    ) -> Result<SentFile> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or(InvalidArgument::EmptyFilename)?;
        let length = tokio::fs::metadata(path).await?.len();

        let mut upload = self.resumable(filename, parent_id, length);
        let location = upload.create().await?.clone();
        info!(path = %path.display(), %location, length, "upload started");

        let sent = match drive(&mut upload, path, max_attempts.max(1)).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(%location, error = %e, "upload failed, terminating");
                if let Err(te) = upload.terminate().await {
                    warn!(%location, error = %te, "terminate failed");
                }
                return Err(e);
            }
        };

        if !sent.crc32.is_empty() {
            let local = file_crc32(path).await?;
            if local != sent.crc32 {
                return Err(Error::ChecksumMismatch {
                    local,
                    server: sent.crc32,
                });
            }
            debug!(file_id = sent.file_id, crc32 = %local, "checksum verified");
        }
        Ok(sent)
    }
}

async fn drive(upload: &mut ResumableUpload<'_>, path: &Path, max_attempts: u32) -> Result<SentFile> {
    let mut attempt = 0;
    loop {
        attempt += 1;

        if upload.is_offset_stale() {
            if let Err(e) = upload.sync_offset().await {
                if e.is_retryable() && attempt < max_attempts {
                    warn!(attempt, error = %e, "cannot read upload offset, retrying");
                    continue;
                }
                return Err(e);
            }
            info!(attempt, offset = upload.offset(), "resuming upload");
        }

        let mut file = tokio::fs::File::open(path).await?;
        file.seek(SeekFrom::Start(upload.offset())).await?;

        match upload.send(file).await {
            Ok(sent) => return Ok(sent),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "upload interrupted");
            }
            Err(e) => return Err(e),
        }
    }
}

/// CRC32 of a file as lowercase hex.
async fn file_crc32(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; CRC_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:08x}", hasher.finalize()))
}
