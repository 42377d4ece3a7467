//! HTTP client abstraction for testability

use async_trait::async_trait;

use crate::error::{Error, Result};

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        log::debug!("GET {} -> {}", url, status);
        Ok(HttpResponse { status })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn connection_refused_returns_http_error() {
        let client = ReqwestHttpClient::default();
        let err = client.get("http://127.0.0.1:1/clear").await.unwrap_err();

        match &err {
            Error::Http(msg) => {
                assert!(msg.starts_with("GET http://127.0.0.1:1/clear failed:"), "{msg}");
            }
            other => panic!("expected Error::Http, got {other:?}"),
        }
    }
}
