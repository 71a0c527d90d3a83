//! Scripted HTTP/1.1 server for client tests.
//!
//! Every accepted connection consumes the next scripted response and is
//! closed afterwards, so each client request maps to exactly one entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Upper bound on how long a stalled connection is held open.
const STALL_LIMIT: Duration = Duration::from_secs(5);

/// A request as seen by the mock server.
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorded {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn query(&self) -> HashMap<String, String> {
        let query = self.target.split_once('?').map(|(_, q)| q).unwrap_or("");
        parse_urlencoded(query)
    }

    pub fn form(&self) -> HashMap<String, String> {
        parse_urlencoded(&String::from_utf8_lossy(&self.body))
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn parse_urlencoded(s: &str) -> HashMap<String, String> {
    let url = reqwest::Url::parse(&format!("http://mock/?{s}")).unwrap();
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// A scripted response.
#[derive(Debug, Clone)]
pub(crate) struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    stall: bool,
    /// Body chunk size and the pause before each chunk.
    trickle: Option<(usize, Duration)>,
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.to_string(),
            stall: false,
            trickle: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
            stall: false,
            trickle: None,
        }
    }

    /// Reads the request head and never answers.
    pub fn stall() -> Self {
        Self {
            stall: true,
            ..Self::status(200)
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// Sends the body in `chunk`-byte pieces, pausing `pause` before each.
    pub fn trickle(mut self, chunk: usize, pause: Duration) -> Self {
        self.trickle = Some((chunk.max(1), pause));
        self
    }
}

/// Mock server handle. The accept loop is aborted on drop.
pub(crate) struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn start(script: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            for response in script {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = if response.stall {
                    let head = read_head(&mut stream).await;
                    let _ = tokio::time::timeout(STALL_LIMIT, drain(&mut stream)).await;
                    head.map(|(req, _)| req)
                } else {
                    read_request(&mut stream).await
                };
                if let Some(req) = request {
                    let is_head = req.method == "HEAD";
                    recorded.lock().unwrap().push(req);
                    if !response.stall {
                        write_response(&mut stream, &response, is_head).await;
                    }
                }
            }
        });

        Self {
            url,
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request(&self, index: usize) -> Recorded {
        self.requests()[index].clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn drain(stream: &mut TcpStream) {
    let mut buf = [0u8; 8192];
    while let Ok(n) = stream.read(&mut buf).await {
        if n == 0 {
            break;
        }
    }
}

/// Reads until the end of the header block. Returns the parsed head and
/// any body bytes read past it.
async fn read_head(stream: &mut TcpStream) -> Option<(Recorded, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let rest = buf[end + 4..].to_vec();
    Some((
        Recorded {
            method,
            target,
            headers,
            body: Vec::new(),
        },
        rest,
    ))
}

async fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
    let (mut req, mut pending) = read_head(stream).await?;

    if let Some(len) = req.header("content-length") {
        let len: usize = len.parse().ok()?;
        while pending.len() < len {
            let mut chunk = vec![0u8; len - pending.len()];
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            pending.extend_from_slice(&chunk[..n]);
        }
        req.body = pending;
    } else if req
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        req.body = read_chunked(stream, pending).await?;
    }
    Some(req)
}

async fn read_chunked(stream: &mut TcpStream, mut pending: Vec<u8>) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        // Need a full size line first.
        let line_end = loop {
            if let Some(pos) = find(&pending, b"\r\n") {
                break pos;
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            pending.extend_from_slice(&chunk[..n]);
        };
        let size_line = String::from_utf8_lossy(&pending[..line_end]).into_owned();
        let size = usize::from_str_radix(size_line.split(';').next()?.trim(), 16).ok()?;
        pending.drain(..line_end + 2);

        while pending.len() < size + 2 {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            pending.extend_from_slice(&chunk[..n]);
        }
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&pending[..size]);
        pending.drain(..size + 2);
    }
}

async fn write_response(stream: &mut TcpStream, response: &MockResponse, is_head: bool) {
    let mut out = format!("HTTP/1.1 {} Mock\r\nConnection: close\r\n", response.status);
    for (k, v) in &response.headers {
        out.push_str(&format!("{k}: {v}\r\n"));
    }
    let bodiless = response.status == 204 || response.status == 304;
    if !bodiless {
        out.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    }
    out.push_str("\r\n");
    let send_body = !bodiless && !is_head;
    match response.trickle {
        Some((chunk, pause)) if send_body => {
            if stream.write_all(out.as_bytes()).await.is_err() {
                return;
            }
            for piece in response.body.as_bytes().chunks(chunk) {
                tokio::time::sleep(pause).await;
                if stream.write_all(piece).await.is_err() {
                    return;
                }
                let _ = stream.flush().await;
            }
        }
        _ => {
            if send_body {
                out.push_str(&response.body);
            }
            let _ = stream.write_all(out.as_bytes()).await;
        }
    }
    let _ = stream.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
