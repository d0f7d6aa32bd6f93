//! Product page fetching through public CORS proxies
//!
//! Public proxies are unreliable, so resilience comes from trying a short
//! static list sequentially, each attempt with its own timeout, and taking
//! the first success. A timed-out attempt is just a failed attempt; the next
//! proxy still gets its turn.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};
use url::Url;

use crate::AppError;

/// Per-proxy attempt timeout.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(20);
/// Bodies shorter than this are proxy error pages, not product pages.
const MIN_BODY_LEN: usize = 100;

/// Proxy endpoints for `target`, in the order they are tried. The allorigins
/// timestamp busts its response cache.
pub fn proxy_urls(target: &str) -> Vec<String> {
    let enc = urlencoding::encode(target);
    vec![
        format!("https://corsproxy.io/?{enc}"),
        format!(
            "https://api.allorigins.win/raw?url={enc}&timestamp={}",
            Utc::now().timestamp_millis()
        ),
    ]
}

pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> crate::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Fetches the raw HTML of `raw_url` through the proxy list.
    ///
    /// The URL is validated before any network activity. Attempts run
    /// strictly in order and the first non-trivial body short-circuits;
    /// when every proxy fails, the last attempt's error surfaces.
    pub async fn fetch(&self, raw_url: &str) -> crate::Result<String> {
        Url::parse(raw_url).map_err(|_| AppError::InvalidUrl)?;
        self.try_in_order(&proxy_urls(raw_url)).await
    }

    async fn try_in_order(&self, proxies: &[String]) -> crate::Result<String> {
        let mut last_error: Option<AppError> = None;
        for proxy_url in proxies {
            debug!(proxy = %proxy_url, "tentando fetch via proxy");
            match tokio::time::timeout(ATTEMPT_TIMEOUT, self.attempt(proxy_url)).await {
                Ok(Ok(body)) => return Ok(body),
                Ok(Err(e)) => {
                    warn!(proxy = %proxy_url, error = %e, "falha no proxy");
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!(proxy = %proxy_url, "proxy excedeu o tempo limite");
                    last_error = Some(AppError::FetchTimeout);
                }
            }
        }
        Err(last_error.unwrap_or(AppError::FetchExhausted))
    }

    async fn attempt(&self, proxy_url: &str) -> crate::Result<String> {
        let response = self.client.get(proxy_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ProxyStatus(status.as_u16()));
        }
        let body = response.text().await?;
        if body.len() < MIN_BODY_LEN {
            return Err(AppError::EmptyBody);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// One-shot HTTP server on a local port answering with a canned response.
    async fn spawn_one_shot(response: String) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/")
    }

    fn ok_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    const ERROR_RESPONSE: &str =
        "HTTP/1.1 502 Bad Gateway\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

    #[tokio::test]
    async fn test_rejects_invalid_url_before_network() {
        let fetcher = PageFetcher::new().unwrap();
        let err = fetcher.fetch("loja outside produto").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUrl));
    }

    #[tokio::test]
    async fn test_falls_back_to_second_proxy() {
        let body = "<html>".to_string() + &"x".repeat(200) + "</html>";
        let first = spawn_one_shot(ERROR_RESPONSE.to_string()).await;
        let second = spawn_one_shot(ok_response(&body)).await;
        let fetcher = PageFetcher::new().unwrap();
        let fetched = fetcher.try_in_order(&[first, second]).await.unwrap();
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let body = "a".repeat(500);
        let first = spawn_one_shot(ok_response(&body)).await;
        // Unreachable second proxy: a success must never get this far.
        let second = "http://127.0.0.1:1/".to_string();
        let fetcher = PageFetcher::new().unwrap();
        let fetched = fetcher.try_in_order(&[first, second]).await.unwrap();
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_all_attempts_failing_surfaces_last_error() {
        let first = spawn_one_shot(ERROR_RESPONSE.to_string()).await;
        let second = spawn_one_shot(ok_response("curto")).await;
        let fetcher = PageFetcher::new().unwrap();
        let err = fetcher.try_in_order(&[first, second]).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyBody));
    }

    #[test]
    fn test_proxy_order_and_encoding() {
        let urls = proxy_urls("https://loja.example.com/produto?id=1&cor=azul");
        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("https://corsproxy.io/?"));
        assert!(urls[1].starts_with("https://api.allorigins.win/raw?url="));
        // Target must be query-encoded so its own query string survives.
        assert!(urls[0].contains("https%3A%2F%2Floja.example.com%2Fproduto%3Fid%3D1%26cor%3Dazul"));
        assert!(urls[1].contains("&timestamp="));
    }

    #[test]
    fn test_spaces_percent_encoded() {
        // Proxies decode percent encoding, not form encoding: a space must
        // become %20, never +.
        let urls = proxy_urls("https://loja.example.com/busca?q=camiseta azul");
        assert!(urls[0].contains("camiseta%20azul"));
        assert!(!urls[0].contains('+'));
    }
}
