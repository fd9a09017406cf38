//! # Page Source
//!
//! Fetches one page of the remote catalog API.
//!
//! ## Request/Response Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Remote Catalog API                               │
//! │                                                                         │
//! │  GET <base_url>?ac=detail&pg=3                                         │
//! │                                                                         │
//! │  {                                                                      │
//! │    "code": 1, "msg": "...", "page": 3, "pagecount": 512,   (ignored)   │
//! │    "total": "10236",        ← string or number                         │
//! │    "limit": "20",           ← string or number                         │
//! │    "list":  [ {...}, ... ], ← required, RawRecord each                 │
//! │    "class": [ {...}, ... ]  ← list mode only, RawCategory each         │
//! │  }                                                                      │
//! │                                                                         │
//! │  total_pages = ceil(total / limit), computed from page 1 only          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use catalog_core::paging;
use catalog_core::{RawCategory, RawRecord, RawScalar};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Request Mode
// =============================================================================

/// Which view of the catalog to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMode {
    /// Lightweight entries plus the category list.
    List,
    /// Full records. Used by incremental sync.
    Detail,
}

impl ApiMode {
    /// Value of the `ac` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::List => "list",
            ApiMode::Detail => "detail",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Page Payload
// =============================================================================

/// One decoded page.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub records: Vec<RawRecord>,
    /// Only populated in list mode.
    pub categories: Vec<RawCategory>,
    /// `None` when `total` or `limit` is missing or unusable.
    pub total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    total: Option<RawScalar>,
    #[serde(default)]
    limit: Option<RawScalar>,
    list: Option<Vec<RawRecord>>,
    #[serde(default)]
    class: Option<Vec<RawCategory>>,
}

/// Strict integer read for pagination metadata.
///
/// Unlike record coercion, garbage here yields `None` rather than `0`.
fn parse_count(value: Option<&RawScalar>) -> Option<i64> {
    match value? {
        RawScalar::Int(n) => Some(*n),
        RawScalar::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        RawScalar::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decodes a response body into a [`CatalogPage`].
pub fn parse_page(body: &str) -> SyncResult<CatalogPage> {
    let response: PageResponse = serde_json::from_str(body)?;

    let records = response
        .list
        .ok_or_else(|| SyncError::InvalidResponse("response has no 'list' field".into()))?;

    let total_pages = match (
        parse_count(response.total.as_ref()),
        parse_count(response.limit.as_ref()),
    ) {
        (Some(total), Some(limit)) => match paging::total_pages(total, limit) {
            Ok(pages) => Some(pages),
            Err(e) => {
                warn!(error = %e, "Unusable pagination metadata");
                None
            }
        },
        _ => None,
    };

    Ok(CatalogPage {
        records,
        categories: response.class.unwrap_or_default(),
        total_pages,
    })
}

// =============================================================================
// PageSource Trait
// =============================================================================

/// Anything that can produce catalog pages.
///
/// Pages are 1-based. Implementations must not retry internally; callers
/// decide whether a failed page is skipped or retried.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches one page.
    ///
    /// ## Returns
    /// * `Ok(CatalogPage)` - Decoded page
    /// * `Err(SyncError::Http | Timeout | Status | InvalidResponse)` - Page unusable
    async fn fetch_page(&self, mode: ApiMode, page: u32) -> SyncResult<CatalogPage>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`PageSource`] backed by the remote HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPageSource {
    /// Builds a client with the configured per-request timeout.
    pub fn new(settings: &ApiSettings) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self::with_client(client, settings))
    }

    /// Uses a prebuilt client. Its own timeout should match
    /// `settings.timeout_secs`, which is what timeout errors report.
    pub fn with_client(client: Client, settings: &ApiSettings) -> Self {
        HttpPageSource {
            client,
            base_url: settings.base_url.clone(),
            timeout: settings.timeout(),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.timeout.as_secs())
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, mode: ApiMode, page: u32) -> SyncResult<CatalogPage> {
        debug!(%mode, page, "Fetching page");

        let page_param = page.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("ac", mode.as_str()), ("pg", page_param.as_str())])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                page,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let parsed = parse_page(&body)?;
        debug!(
            %mode,
            page,
            records = parsed.records.len(),
            total_pages = ?parsed.total_pages,
            "Page decoded"
        );

        Ok(parsed)
    }
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// What the one-shot server does after reading the request head.
    enum Reply {
        Respond(&'static str, String),
        Stall,
    }

    /// Serves exactly one connection and reports the request line.
    async fn serve_once(reply: Reply) -> (SocketAddr, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let request_line = String::from_utf8_lossy(&head)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            let _ = tx.send(request_line);

            match reply {
                Reply::Respond(status, body) => {
                    let response = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    stream.write_all(response.as_bytes()).await.unwrap();
                    stream.shutdown().await.ok();
                }
                Reply::Stall => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    drop(stream);
                }
            }
        });

        (addr, rx)
    }

    fn source_for(addr: SocketAddr, timeout_secs: u64) -> HttpPageSource {
        let settings = ApiSettings {
            base_url: format!("http://{addr}/api.php/provide/vod/"),
            timeout_secs,
        };
        let client = Client::builder()
            .timeout(settings.timeout())
            .no_proxy()
            .build()
            .unwrap();
        HttpPageSource::with_client(client, &settings)
    }

    #[tokio::test]
    async fn test_fetch_page_sends_mode_and_page() {
        let body = r#"{"total": "45", "limit": "20", "list": [{"vod_id": 1}]}"#.to_string();
        let (addr, request) = serve_once(Reply::Respond("200 OK", body)).await;

        let page = source_for(addr, 5).fetch_page(ApiMode::Detail, 3).await.unwrap();

        let request_line = request.await.unwrap();
        assert!(request_line.starts_with("GET /api.php/provide/vod/?"));
        assert!(request_line.contains("ac=detail"));
        assert!(request_line.contains("pg=3"));
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total_pages, Some(3));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (addr, _request) = serve_once(Reply::Respond("503 Service Unavailable", String::new())).await;

        let err = source_for(addr, 5).fetch_page(ApiMode::List, 2).await.unwrap_err();

        assert!(matches!(err, SyncError::Status { status: 503, page: 2 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (addr, _request) = serve_once(Reply::Respond("200 OK", "<html>busy</html>".into())).await;

        let err = source_for(addr, 5).fetch_page(ApiMode::Detail, 1).await.unwrap_err();

        assert!(matches!(err, SyncError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_stalled_response_times_out() {
        let (addr, _request) = serve_once(Reply::Stall).await;

        let err = source_for(addr, 1).fetch_page(ApiMode::Detail, 1).await.unwrap_err();

        assert!(matches!(err, SyncError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source_for(addr, 5).fetch_page(ApiMode::Detail, 1).await.unwrap_err();

        assert!(matches!(err, SyncError::Http(_)));
        assert!(err.is_retryable());
    }
}
