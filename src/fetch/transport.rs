use crate::error::{RegistryError, Result};
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("app-registry/", env!("CARGO_PKG_VERSION"));

/// Fetches the body of an http(s) resource.
///
/// Passed into the fetcher at construction time so tests and callers can
/// substitute a cache or a canned transport.
pub trait HttpTransport {
    fn get(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Blocking reqwest client with a bounded request time
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ReqwestTransport { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| RegistryError::transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::transport(
                url.as_str(),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let body = response
            .bytes()
            .map_err(|e| RegistryError::transport(url.as_str(), e))?;
        Ok(body.to_vec())
    }
}

/// Transport answering from a fixed set of responses; anything else fails
/// like an unreachable host.
#[derive(Debug, Default, Clone)]
pub struct StaticTransport {
    responses: HashMap<String, Vec<u8>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }
}

impl HttpTransport for StaticTransport {
    fn get(&self, url: &Url) -> Result<Vec<u8>> {
        self.responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| RegistryError::transport(url.as_str(), "no route to host"))
    }
}
