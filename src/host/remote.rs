use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::HostAdapter;
use crate::error::HostError;
use crate::http::{HeaderValues, RequestDescriptor, ResponseDescriptor};

/// Forwards descriptors to a live server over HTTP.
///
/// Useful when the system under test already runs elsewhere; the scenario
/// surface is unchanged.
#[derive(Debug, Clone)]
pub struct RemoteHost {
    client: Client,
    base_url: Url,
}

impl RemoteHost {
    pub fn new(base_url: &str) -> Result<Self, HostError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| HostError::Transport(format!("Failed to build HTTP client: {err}")))?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, HostError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| HostError::InvalidRequest(format!("Invalid URL: {err}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append a host-relative target to the base URL, keeping its path.
    fn request_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}/{}", path.trim_start_matches('/')));
        url.set_query(query);
        url.set_fragment(None);
        url
    }
}

#[async_trait]
impl HostAdapter for RemoteHost {
    async fn exchange(&self, request: RequestDescriptor) -> Result<ResponseDescriptor, HostError> {
        let url = self.request_url(request.path(), request.query());
        let headers = request
            .headers()
            .to_header_map()
            .map_err(|err| HostError::InvalidRequest(err.to_string()))?;

        let mut builder = self
            .client
            .request(request.method().into(), url)
            .headers(headers);

        if request.method().allows_body() {
            if let Some(body) = request.body() {
                builder = builder.body(body.bytes.clone());
            }
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|err| HostError::Transport(err.to_string()))?;

        let status = response.status();
        let headers = HeaderValues::from(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|err| HostError::ReadBody(err.to_string()))?;

        debug!(
            status = status.as_u16(),
            size = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "remote exchange complete"
        );

        Ok(ResponseDescriptor::new(status)
            .with_headers(headers)
            .with_body(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        let err = RemoteHost::new("not a url").unwrap_err();
        assert!(matches!(err, HostError::InvalidRequest(_)));
    }

    #[test]
    fn keeps_base_url() {
        let host = RemoteHost::new("http://127.0.0.1:9/api/").unwrap();
        assert_eq!(host.base_url().as_str(), "http://127.0.0.1:9/api/");
    }

    #[test]
    fn targets_are_appended_to_the_base_path() {
        let host = RemoteHost::new("http://127.0.0.1:9/api/").unwrap();
        assert_eq!(
            host.request_url("/memory/hello", None).as_str(),
            "http://127.0.0.1:9/api/memory/hello"
        );

        let host = RemoteHost::new("http://127.0.0.1:9/api").unwrap();
        assert_eq!(
            host.request_url("/memory/color/a%2Fb", Some("page=2")).as_str(),
            "http://127.0.0.1:9/api/memory/color/a%2Fb?page=2"
        );

        let host = RemoteHost::new("http://127.0.0.1:9").unwrap();
        assert_eq!(
            host.request_url("/memory/hello", None).as_str(),
            "http://127.0.0.1:9/memory/hello"
        );
    }
}
