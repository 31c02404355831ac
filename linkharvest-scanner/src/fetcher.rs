use crate::error::{Result, ScanError};
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 5;

/// HTTP access for pages, sitemaps, link checks and webhooks.
///
/// Wraps one pooled client; cloning is cheap and shares the pool.
#[derive(Clone, Debug)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "LinkHarvest/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/trapdoorsec/linkharvest)"
            ))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }

    /// GET a URL and return the decoded body. Non-2xx responses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = ensure_success(self.client.get(parse_target(url)?).send().await?)?;
        Ok(response.text().await?)
    }

    /// GET a URL and return the raw body bytes. Non-2xx responses are errors.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {} (bytes)", url);
        let response = ensure_success(self.client.get(parse_target(url)?).send().await?)?;
        Ok(response.bytes().await?.to_vec())
    }

    /// GET `endpoint` with the given query pairs appended.
    pub async fn get_text_with_query(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!("GET {} {:?}", endpoint, query);
        let response = ensure_success(self.client.get(parse_target(endpoint)?).query(query).send().await?)?;
        Ok(response.text().await?)
    }

    /// HEAD a URL and report its status code, whatever it is.
    pub async fn head_status(&self, url: &str) -> Result<u16> {
        debug!("HEAD {}", url);
        let response = self.client.head(parse_target(url)?).send().await?;
        Ok(response.status().as_u16())
    }

    /// POST a JSON body. Non-2xx responses are errors.
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<u16> {
        debug!("POST {}", url);
        let response = ensure_success(self.client.post(parse_target(url)?).json(body).send().await?)?;
        Ok(response.status().as_u16())
    }
}

/// Only absolute http(s) URLs are requested.
fn parse_target(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ScanError::InvalidUrl(format!("{}: unsupported scheme '{}'", url, other))),
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ScanError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path, query_param},
    };

    #[tokio::test]
    async fn test_get_text_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let body = fetcher.get_text(&format!("{}/page", server.uri())).await.unwrap();
        assert_eq!(body, "<html>hi</html>");
    }

    #[tokio::test]
    async fn test_get_text_not_found_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let err = fetcher
            .get_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }

    #[tokio::test]
    async fn test_network_error() {
        let fetcher = PageFetcher::with_timeout(2).unwrap();
        let err = fetcher.get_text("http://127.0.0.1:1/").await.unwrap_err();
        assert!(matches!(err, ScanError::Network(_)));
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_request() {
        let fetcher = PageFetcher::new().unwrap();

        let err = fetcher.get_text("not a url").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));

        let err = fetcher.head_status("mailto:someone@ex.com").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn test_head_status_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let status = fetcher.head_status(&format!("{}/gone", server.uri())).await.unwrap();
        assert_eq!(status, 410);
    }

    #[tokio::test]
    async fn test_query_and_post() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust crawler"))
            .respond_with(ResponseTemplate::new(200).set_body_string("results"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({"ok": true})))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let body = fetcher
            .get_text_with_query(&format!("{}/search", server.uri()), &[("q", "rust crawler")])
            .await
            .unwrap();
        assert_eq!(body, "results");

        let status = fetcher
            .post_json(&format!("{}/hook", server.uri()), &serde_json::json!({"ok": true}))
            .await
            .unwrap();
        assert_eq!(status, 202);
    }
}
