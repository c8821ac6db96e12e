use super::Error;
use http::header::{HeaderMap, CONTENT_TYPE};
use http::StatusCode;
use std::time::Duration;

/// Client signature the portal expects to see.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.77 Safari/537.36";

/// Raw HTTP exchange result. Status is not interpreted here.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// HTTP client owning the cookie store of exactly one session. A new `Transport` starts with
/// an empty cookie store.
#[derive(Debug)]
pub struct Transport {
    client: reqwest::Client,
}

/// Map a failed request to `Error::Transport`
fn map_transport_err(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Transport(format!("request timed out: {}", error))
    } else {
        Error::Transport(error.to_string())
    }
}

impl Transport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        reqwest::ClientBuilder::new()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Unable to build HTTP client: {}", e)))
            .map(|client| Transport { client })
    }

    pub async fn get(&self, url: &str) -> Result<RawResponse, Error> {
        log::debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }

    pub async fn post(
        &self,
        url: &str,
        form: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<RawResponse, Error> {
        log::debug!("POST {}", url);
        self.send(self.client.post(url).headers(headers).form(form))
            .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<RawResponse, Error> {
        let response = request.send().await.map_err(map_transport_err)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(map_transport_err)?;

        log::trace!("status: {}, body: {}", status, body);

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
