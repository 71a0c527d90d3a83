//! Error types for the put.io client.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::upload::UploadState;

/// Maximum number of body bytes echoed back in error messages.
const ERROR_BODY_PREVIEW: usize = 250;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the put.io client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(Box<ErrorResponse>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid header value for {0}")]
    InvalidHeader(String),

    #[error("{0}")]
    InvalidArgument(InvalidArgument),

    #[error("unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("cannot parse {name} header: {value:?}")]
    BadHeader { name: &'static str, value: String },

    #[error("transfer stalled: no progress for {0:?}")]
    Stalled(Duration),

    #[error("request timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    #[error("cannot {action}: upload is {state:?}")]
    InvalidState {
        state: UploadState,
        action: &'static str,
    },

    #[error("upload offset went backwards: local {local}, server {server}")]
    OffsetRegressed { local: u64, server: u64 },

    #[error("checksum mismatch: local {local}, server {server}")]
    ChecksumMismatch { local: String, server: String },
}

impl Error {
    /// Returns `true` for network-level failures a caller may retry.
    ///
    /// Protocol failures (unexpected status codes, malformed headers,
    /// API errors) are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => {
                e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
            }
            Error::Io(_) | Error::Stalled(_) | Error::Timeout => true,
            _ => false,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(resp) => Some(resp.status),
            Error::UnexpectedStatus(code) => Some(*code),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<InvalidArgument> for Error {
    fn from(value: InvalidArgument) -> Self {
        Error::InvalidArgument(value)
    }
}

impl From<ErrorResponse> for Error {
    fn from(value: ErrorResponse) -> Self {
        Error::Api(Box::new(value))
    }
}

/// Argument validation failures, reported before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("empty folder name")]
    EmptyFolderName,
    #[error("no file id is given")]
    NoFileId,
    #[error("filename cannot be empty")]
    EmptyFilename,
    #[error("new filename cannot be empty")]
    EmptyNewFilename,
    #[error("invalid page number")]
    InvalidPage,
    #[error("no query given")]
    NoQuery,
    #[error("empty subtitle key is given")]
    EmptySubtitleKey,
    #[error("time cannot be negative")]
    NegativeTime,
    #[error("no files given")]
    NoFiles,
    #[error("empty username")]
    EmptyUsername,
    #[error("empty URL")]
    EmptyUrl,
    #[error("id cannot be negative")]
    NegativeId,
    #[error("empty config key")]
    EmptyConfigKey,
}

/// Structured error returned by the API for a failed request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code of the response.
    #[serde(skip)]
    pub status: u16,
    #[serde(skip)]
    pub method: String,
    #[serde(skip)]
    pub url: String,
    /// Raw response body.
    #[serde(skip)]
    pub body: String,
    /// Set when the body could not be read or decoded.
    #[serde(skip)]
    pub parse_error: Option<String>,

    #[serde(default, rename = "error_message")]
    pub message: String,
    #[serde(default, rename = "error_type")]
    pub kind: String,
    #[serde(default)]
    pub error_uri: Option<String>,
    /// Status code echoed in the error body, if any.
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl ErrorResponse {
    /// Builds an error from a response status and its raw body.
    ///
    /// The body is decoded only when `is_json` is set.
    pub(crate) fn from_parts(
        status: StatusCode,
        method: &str,
        url: &str,
        body: &[u8],
        is_json: bool,
    ) -> Self {
        let mut resp = if is_json {
            match serde_json::from_slice::<ErrorResponse>(body) {
                Ok(parsed) => parsed,
                Err(e) => ErrorResponse {
                    parse_error: Some(e.to_string()),
                    ..Default::default()
                },
            }
        } else {
            ErrorResponse::default()
        };
        resp.status = status.as_u16();
        resp.method = method.to_string();
        resp.url = url.to_string();
        resp.body = String::from_utf8_lossy(body).into_owned();
        resp
    }

    fn body_preview(&self) -> &str {
        if self.body.len() <= ERROR_BODY_PREVIEW {
            return &self.body;
        }
        let mut end = ERROR_BODY_PREVIEW;
        while !self.body.is_char_boundary(end) {
            end -= 1;
        }
        &self.body[..end]
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parse_error) = &self.parse_error {
            return write!(
                f,
                "cannot parse response. code:{} error:{} body:{:?}",
                self.status,
                parse_error,
                self.body_preview()
            );
        }
        write!(
            f,
            "putio error. code:{} type:{:?} message:{:?} request:{} {}",
            self.status, self.kind, self.message, self.method, self.url
        )
    }
}

impl std::error::Error for ErrorResponse {}
