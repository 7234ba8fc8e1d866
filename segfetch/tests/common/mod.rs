//! In-process HTTP/1.1 stub server for integration tests.
//!
//! Serves one known byte sequence at any path (except `/missing`, which is a
//! 404) with HEAD and single-range GET support. Faults are configured per
//! server through [`Faults`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Deterministic, non-repeating-per-block test content.
pub fn test_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Misbehaviours the server can be asked to exhibit.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Omit `Content-Length` from HEAD responses.
    pub omit_length: bool,
    /// Status for HEAD responses instead of 200.
    pub head_status: Option<u16>,
    /// Always answer 500 to ranges starting at this offset.
    pub fail_range_start: Option<u64>,
    /// Answer 500 to ranges starting at this offset the first N times.
    pub flaky_range_start: Option<(u64, usize)>,
    /// For a range starting at this offset, the first response announces the
    /// full length but only sends this many bytes before closing.
    pub truncate_range_start: Option<(u64, usize)>,
    /// Ignore `Range` and always answer 200 with the full body.
    pub ignore_range: bool,
    /// Stream 206 bodies in chunks of this many bytes with a pause after each.
    pub slow_body: Option<(usize, Duration)>,
    /// Announce a `Content-Range` starting this many bytes after the request.
    pub shift_content_range: Option<u64>,
    /// Accept ranged GETs but never answer them.
    pub stall_ranges: bool,
}

/// Running stub server. Aborted on drop.
pub struct StubServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    ranges: Arc<Mutex<Vec<String>>>,
}

struct Shared {
    body: Vec<u8>,
    faults: Faults,
    hits: Mutex<HashMap<u64, usize>>,
    ranges: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start(body: Vec<u8>) -> Self {
        Self::start_with(body, Faults::default()).await
    }

    pub async fn start_with(body: Vec<u8>, faults: Faults) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let ranges = Arc::new(Mutex::new(Vec::new()));

        let shared = Arc::new(Shared {
            body,
            faults,
            hits: Mutex::new(HashMap::new()),
            ranges: Arc::clone(&ranges),
        });

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    let _ = handle_connection(stream, shared).await;
                });
            }
        });

        Self {
            addr,
            handle,
            ranges,
        }
    }

    /// URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// `Range` header values received so far, in arrival order.
    pub fn ranges_requested(&self) -> Vec<String> {
        self.ranges.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(mut stream: TcpStream, shared: Arc<Shared>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request = String::from_utf8_lossy(&buf).to_string();
    let mut lines = request.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let range_header = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("range")
            .then(|| value.trim().to_string())
    });

    if path == "/missing" {
        return respond(&mut stream, "404 Not Found", &[], b"").await;
    }

    let total = shared.body.len() as u64;
    let faults = &shared.faults;

    if method == "HEAD" {
        if let Some(status) = faults.head_status {
            return respond(&mut stream, &format!("{} Stub", status), &[], b"").await;
        }
        let mut headers = vec![("Accept-Ranges".to_string(), "bytes".to_string())];
        if !faults.omit_length {
            headers.push(("Content-Length".to_string(), total.to_string()));
        }
        return write_head(&mut stream, "200 OK", &headers).await;
    }

    let range = range_header.as_deref().and_then(parse_range);
    if let Some(value) = &range_header {
        shared.ranges.lock().unwrap().push(value.clone());
    }

    let (start, end) = match range {
        Some(range) if !faults.ignore_range => range,
        _ => return respond(&mut stream, "200 OK", &[], &shared.body).await,
    };
    let end = end.min(total.saturating_sub(1));

    if faults.stall_ranges {
        std::future::pending::<()>().await;
    }

    if faults.fail_range_start == Some(start) {
        return respond(&mut stream, "500 Internal Server Error", &[], b"").await;
    }

    let hit = {
        let mut hits = shared.hits.lock().unwrap();
        let count = hits.entry(start).or_insert(0);
        *count += 1;
        *count
    };

    if let Some((flaky_start, failures)) = faults.flaky_range_start {
        if flaky_start == start && hit <= failures {
            return respond(&mut stream, "500 Internal Server Error", &[], b"").await;
        }
    }

    let slice = &shared.body[start as usize..=end as usize];
    let content_range = vec![(
        "Content-Range".to_string(),
        format!(
            "bytes {}-{}/{}",
            start + faults.shift_content_range.unwrap_or(0),
            end,
            total
        ),
    )];

    if let Some((chunk, pause)) = faults.slow_body {
        let mut headers = content_range;
        headers.push(("Content-Length".to_string(), slice.len().to_string()));
        write_head(&mut stream, "206 Partial Content", &headers).await?;
        for part in slice.chunks(chunk.max(1)) {
            stream.write_all(part).await?;
            stream.flush().await?;
            tokio::time::sleep(pause).await;
        }
        return stream.shutdown().await;
    }

    if let Some((truncate_start, sent)) = faults.truncate_range_start {
        if truncate_start == start && hit == 1 {
            let mut headers = content_range;
            headers.push(("Content-Length".to_string(), slice.len().to_string()));
            write_head(&mut stream, "206 Partial Content", &headers).await?;
            stream.write_all(&slice[..sent.min(slice.len())]).await?;
            stream.flush().await?;
            return stream.shutdown().await;
        }
    }

    respond(&mut stream, "206 Partial Content", &content_range, slice).await
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let rest = value.strip_prefix("bytes=")?;
    let (start, end) = rest.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

async fn write_head(
    stream: &mut TcpStream,
    status: &str,
    headers: &[(String, String)],
) -> std::io::Result<()> {
    let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).await
}

async fn respond(
    stream: &mut TcpStream,
    status: &str,
    headers: &[(String, String)],
    body: &[u8],
) -> std::io::Result<()> {
    let mut headers = headers.to_vec();
    headers.push(("Content-Length".to_string(), body.len().to_string()));
    write_head(stream, status, &headers).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    stream.shutdown().await
}
