//! Remote catalog access.
//!
//! The catalog API serves pages of game entries as JSON. Fetching is
//! strictly serial: the startup sequence walks pages 1 through
//! [`PAGE_COUNT`], and a failed page is logged and dropped without
//! disturbing its siblings. There are no retries and no timeout beyond
//! the HTTP client's default.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    error::FetchError,
    models::{GameRecord, RawGame},
};

/// Number of catalog pages walked during startup. Fixed, not runtime
/// configurable.
pub const PAGE_COUNT: u32 = 5;

/// Entries requested per catalog page.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    results: Vec<RawGame>,
}

/// Aggregated result of the startup fetch sequence.
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    /// Records in page-major order, API order within a page.
    pub games: Vec<GameRecord>,
    /// 1-based numbers of the pages that failed and were omitted.
    pub failed_pages: Vec<u32>,
    /// When the sequence completed.
    pub fetched_at: DateTime<Utc>,
}

/// Client for the paginated games catalog API.
#[derive(Debug, Clone)]
pub struct GameCatalogClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GameCatalogClient {
    /// Build a client for the given endpoint and credential.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch a single 1-based catalog page.
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies all
    /// come back as [`FetchError`]; an individual result item without a
    /// name is skipped with a warning instead of failing the page.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<GameRecord>, FetchError> {
        let body = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.clone()),
                ("page", page.to_string()),
                ("page_size", PAGE_SIZE.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let decoded: PageResponse = serde_json::from_str(&body)?;
        let mut records = Vec::with_capacity(decoded.results.len());
        for raw in decoded.results {
            match raw.into_record() {
                Some(record) => records.push(record),
                None => warn!(page, "Skipping catalog entry without a name"),
            }
        }
        Ok(records)
    }

    /// Walk pages 1 through [`PAGE_COUNT`] serially, aggregating records
    /// in page-major order. A failed page is logged and omitted; the
    /// remaining pages are still fetched.
    pub async fn fetch_catalog(&self) -> CatalogLoad {
        let mut games = Vec::new();
        let mut failed_pages = Vec::new();
        for page in 1..=PAGE_COUNT {
            match self.fetch_page(page).await {
                Ok(batch) => games.extend(batch),
                Err(err) => {
                    error!(page, %err, "Failed to fetch catalog page");
                    failed_pages.push(page);
                }
            }
        }
        CatalogLoad {
            games,
            failed_pages,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    /// Serve `conns` canned HTTP responses on a local port. The closure
    /// receives the request target (path + query) and returns a status
    /// line plus JSON body.
    fn spawn_server<F>(conns: usize, respond: F) -> String
    where
        F: Fn(&str) -> (&'static str, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("server addr");
        thread::spawn(move || {
            for _ in 0..conns {
                let (mut stream, _) = match listener.accept() {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                let mut head = String::new();
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            head.push_str(&String::from_utf8_lossy(&buf[..n]));
                            if head.contains("\r\n\r\n") {
                                break;
                            }
                        }
                    }
                }
                let target = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                let (status, body) = respond(&target);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/games")
    }

    fn page_of(target: &str) -> u32 {
        let start = target.find("page=").expect("page param") + "page=".len();
        target[start..]
            .chars()
            .take_while(|ch| ch.is_ascii_digit())
            .collect::<String>()
            .parse()
            .expect("page number")
    }

    fn page_body(page: u32) -> String {
        let results: Vec<String> = (0..PAGE_SIZE)
            .map(|idx| {
                format!(
                    r#"{{"name": "page{page}-game{idx}", "released": "2020-01-0{}", "background_image": "https://img.example/{page}/{idx}.jpg"}}"#,
                    idx % 9 + 1
                )
            })
            .collect();
        format!(r#"{{"results": [{}]}}"#, results.join(","))
    }

    #[tokio::test]
    async fn fetch_page_decodes_records_and_skips_nameless_entries() {
        let base = spawn_server(1, |_| {
            (
                "200 OK",
                r#"{"results": [
                    {"name": "Portal", "background_image": "https://img.example/p.jpg"},
                    {"description": "no name, skipped"},
                    {"name": "Portal 2"}
                ]}"#
                .to_string(),
            )
        });

        let client = GameCatalogClient::new(base, "test-key");
        let records = client.fetch_page(1).await.expect("page fetch");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Portal");
        assert_eq!(records[1].name, "Portal 2");
        assert_eq!(records[1].description, crate::models::NO_DESCRIPTION);
    }

    #[tokio::test]
    async fn fetch_page_sends_key_page_and_page_size() {
        let base = spawn_server(1, |target| {
            assert!(target.contains("key=test-key"), "target: {target}");
            assert!(target.contains("page=3"), "target: {target}");
            assert!(target.contains("page_size=10"), "target: {target}");
            ("200 OK", r#"{"results": []}"#.to_string())
        });

        let client = GameCatalogClient::new(base, "test-key");
        let records = client.fetch_page(3).await.expect("page fetch");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_a_network_error() {
        let base = spawn_server(1, |_| ("503 Service Unavailable", String::new()));
        let client = GameCatalogClient::new(base, "test-key");
        match client.fetch_page(1).await {
            Err(FetchError::Network(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let base = spawn_server(1, |_| ("200 OK", "not json at all".to_string()));
        let client = GameCatalogClient::new(base, "test-key");
        match client.fetch_page(1).await {
            Err(FetchError::Decode(_)) => {}
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error_not_a_panic() {
        let client = GameCatalogClient::new("http://127.0.0.1:1/games", "test-key");
        assert!(matches!(
            client.fetch_page(1).await,
            Err(FetchError::Network(_))
        ));
    }

    #[tokio::test]
    async fn fetch_catalog_aggregates_fifty_records_in_page_major_order() {
        let base = spawn_server(PAGE_COUNT as usize, |target| {
            ("200 OK", page_body(page_of(target)))
        });

        let client = GameCatalogClient::new(base, "test-key");
        let load = client.fetch_catalog().await;
        assert_eq!(load.games.len(), (PAGE_COUNT * PAGE_SIZE) as usize);
        assert!(load.failed_pages.is_empty());
        assert_eq!(load.games[0].name, "page1-game0");
        assert_eq!(load.games[9].name, "page1-game9");
        assert_eq!(load.games[10].name, "page2-game0");
        assert_eq!(load.games[49].name, "page5-game9");
    }

    #[tokio::test]
    async fn failed_page_is_omitted_without_aborting_the_rest() {
        let base = spawn_server(PAGE_COUNT as usize, |target| {
            let page = page_of(target);
            if page == 3 {
                ("500 Internal Server Error", String::new())
            } else {
                ("200 OK", page_body(page))
            }
        });

        let client = GameCatalogClient::new(base, "test-key");
        let load = client.fetch_catalog().await;
        assert_eq!(load.games.len(), ((PAGE_COUNT - 1) * PAGE_SIZE) as usize);
        assert_eq!(load.failed_pages, vec![3]);
        // page 4 follows page 2 directly once page 3 is dropped
        assert_eq!(load.games[20].name, "page4-game0");
    }
}
