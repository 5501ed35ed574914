use crate::ExportError;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Seam over plain unauthenticated GETs so the favicon resolver and the
/// page fetch can be exercised without a network.
#[async_trait::async_trait]
pub trait Fetcher {
    async fn get(&self, url: &Url) -> Result<Page, ExportError>;
}

#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Invalid http client configuration");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<Page, ExportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(Page { status, body })
    }
}
