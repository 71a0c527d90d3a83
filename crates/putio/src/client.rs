//! put.io API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.
//! Resource endpoints are grouped into services borrowed from [`Client`].

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use reqwest::{Method, Request, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::account::AccountService;
use crate::config::ConfigService;
use crate::error::{Error, ErrorResponse, Result};
use crate::events::EventsService;
use crate::files::FilesService;
use crate::friends::FriendsService;
use crate::transfers::TransfersService;
use crate::upload::UploadService;
use crate::zips::ZipsService;

pub const DEFAULT_BASE_URL: &str = "https://api.put.io";
pub const DEFAULT_UPLOAD_URL: &str = "https://upload.put.io";
pub const DEFAULT_TUS_URL: &str = "https://upload.put.io/files/";
pub const DEFAULT_USER_AGENT: &str = "putio-rust";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MEDIA_TYPE: &str = "application/json";

/// Client settings, loadable from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Server accepting multipart uploads.
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Resumable upload creation endpoint.
    #[serde(default = "default_tus_url")]
    pub tus_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Overrides the Host header of API requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Per-request timeout in seconds (0 = none).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_headers: BTreeMap<String, String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.into()
}

fn default_tus_url() -> String {
    DEFAULT_TUS_URL.into()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_url: default_upload_url(),
            tus_url: default_tus_url(),
            user_agent: default_user_agent(),
            host: None,
            timeout_secs: default_timeout_secs(),
            extra_headers: BTreeMap::new(),
        }
    }
}

/// Builder for [`Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Starts from an existing config.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// OAuth token sent as `Authorization: Bearer <token>`.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.config.upload_url = url.into();
        self
    }

    pub fn tus_url(mut self, url: impl Into<String>) -> Self {
        self.config.tus_url = url.into();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Per-request timeout. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Client> {
        let config = self.config;
        let base_url = parse_url(&config.base_url)?;
        let upload_url = parse_url(&config.upload_url)?;
        let tus_url = parse_url(&config.tus_url)?;
        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(config.timeout_secs));

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);
        if let Some(token) = &self.token {
            let mut value = header_value("authorization", &format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let host = config
            .host
            .as_deref()
            .map(|host| header_value("host", host))
            .transpose()?;
        for (name, value) in &config.extra_headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(name.clone()))?;
            headers.append(header, header_value(name, value)?);
        }

        let http = reqwest::Client::builder().build()?;
        let no_redirect = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Client {
            http,
            no_redirect,
            base_url,
            upload_url,
            tus_url,
            headers,
            host,
            timeout,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_string()))
}

/// put.io API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    no_redirect: reqwest::Client,
    base_url: Url,
    upload_url: Url,
    tus_url: Url,
    headers: HeaderMap,
    /// Host override, only sent to the API origin.
    host: Option<HeaderValue>,
    timeout: Duration,
}

impl Client {
    /// Creates a client with default settings and the given OAuth token.
    pub fn new(token: &str) -> Result<Self> {
        Self::builder().token(token).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Creates a client from a config and an optional token.
    pub fn from_config(config: ClientConfig, token: Option<&str>) -> Result<Self> {
        let mut builder = Self::builder().config(config);
        if let Some(token) = token {
            builder = builder.token(token);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout; zero means none.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn account(&self) -> AccountService<'_> {
        AccountService::new(self)
    }

    pub fn files(&self) -> FilesService<'_> {
        FilesService::new(self)
    }

    pub fn transfers(&self) -> TransfersService<'_> {
        TransfersService::new(self)
    }

    pub fn zips(&self) -> ZipsService<'_> {
        ZipsService::new(self)
    }

    pub fn friends(&self) -> FriendsService<'_> {
        FriendsService::new(self)
    }

    pub fn events(&self) -> EventsService<'_> {
        EventsService::new(self)
    }

    pub fn config(&self) -> ConfigService<'_> {
        ConfigService::new(self)
    }

    pub fn upload(&self) -> UploadService<'_> {
        UploadService::new(self)
    }

    /// Validates the OAuth token, returning the owning user's id.
    pub async fn validate_token(&self) -> Result<Option<i64>> {
        #[derive(Deserialize)]
        struct Validate {
            #[serde(default)]
            user_id: Option<i64>,
        }

        let req = self.new_request(Method::GET, "/v2/oauth2/validate")?;
        let resp: Validate = self.send_json(req).await?;
        Ok(resp.user_id)
    }

    /// Resolves `path` against the base URL. Absolute `http(s)://` URLs are
    /// used as-is.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return parse_url(path);
        }
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    pub(crate) fn upload_endpoint(&self, path: &str) -> Result<Url> {
        self.upload_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    pub(crate) fn tus_url(&self) -> &Url {
        &self.tus_url
    }

    /// Creates an API request with the default headers and timeout applied.
    pub fn new_request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.resolve(path)?;
        Ok(self.request_to(method, url))
    }

    pub(crate) fn request_to(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.untimed_request(method, url);
        if self.timeout.is_zero() {
            req
        } else {
            req.timeout(self.timeout)
        }
    }

    /// Like [`Client::request_to`] but without the per-request timeout.
    pub(crate) fn untimed_request(&self, method: Method, url: Url) -> RequestBuilder {
        let host = self
            .host
            .as_ref()
            .filter(|_| url.origin() == self.base_url.origin())
            .cloned();
        let req = self.http.request(method, url).headers(self.headers.clone());
        match host {
            Some(host) => req.header(HOST, host),
            None => req,
        }
    }

    /// Sends a request and checks the response status.
    ///
    /// The body is left unread, so it can be streamed by the caller.
    pub async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let req = req.build()?;
        self.execute(&self.http, req).await
    }

    /// Sends a request without following redirects, bounding only the wait
    /// for the response head.
    ///
    /// The body is left unread and may take as long as it needs, so build
    /// `req` with [`Client::untimed_request`].
    pub(crate) async fn send_streaming(&self, req: RequestBuilder) -> Result<Response> {
        let req = req.build()?;
        let exchange = self.execute(&self.no_redirect, req);
        if self.timeout.is_zero() {
            return exchange.await;
        }
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }

    /// Sends a request and decodes the JSON envelope into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let req = req.build()?;
        let method = req.method().to_string();
        let resp = self.execute(&self.http, req).await?;
        let status = resp.status();
        let url = resp.url().to_string();
        let body = resp.bytes().await?;
        decode_envelope(&body, status, &method, &url)
    }

    async fn execute(&self, http: &reqwest::Client, req: Request) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        debug!(%method, %url, "sending request");

        let resp = http.execute(req).await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Http(e)
            }
        })?;
        debug!(%method, %url, status = resp.status().as_u16(), "received response");

        check_response(resp, method.as_str()).await
    }
}

/// Passes 2xx/3xx responses through; turns anything else into
/// [`Error::Api`] with the decoded error body.
pub(crate) async fn check_response(resp: Response, method: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() || status.is_redirection() || status.is_informational() {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(MEDIA_TYPE));

    let err = match resp.bytes().await {
        Ok(body) => ErrorResponse::from_parts(status, method, &url, &body, is_json),
        Err(e) => {
            let mut err = ErrorResponse::from_parts(status, method, &url, &[], false);
            err.parse_error = Some(e.to_string());
            err
        }
    };
    debug!(status = status.as_u16(), kind = %err.kind, message = %err.message, "API error");
    Err(err.into())
}

/// Decodes a `{"status": "OK"|"ERROR", ...}` envelope.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    body: &[u8],
    status: reqwest::StatusCode,
    method: &str,
    url: &str,
) -> Result<T> {
    #[derive(Deserialize)]
    struct Status {
        #[serde(default)]
        status: Option<String>,
    }

    if let Ok(Status {
        status: Some(s), ..
    }) = serde_json::from_slice::<Status>(body)
        && s == "ERROR"
    {
        return Err(ErrorResponse::from_parts(status, method, url, body, true).into());
    }

    Ok(serde_json::from_slice(body)?)
}
