use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::CrawlerConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid url for {path}: {source}")]
    Url {
        path: String,
        source: url::ParseError,
    },
    #[error("Request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("No answer for {path} after {timeout:?}")]
    Timeout { path: String, timeout: Duration },
    #[error("{0}")]
    Other(String),
}

/// Retrieves the markup of a page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// Retrieves the site's robots.txt.
#[async_trait]
pub trait RobotsSource: Send + Sync {
    async fn fetch_policy(&self) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
    robots_path: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| FetchError::Url {
            path: config.base_url.clone(),
            source,
        })?;
        let client = reqwest::ClientBuilder::new()
            .gzip(true)
            .deflate(true)
            .user_agent(&config.user_agent)
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|source| FetchError::Http {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            base_url,
            robots_path: config.robots_path.clone(),
            timeout: config.fetch_timeout(),
        })
    }

    /// Resolves a base-relative path, absolute urls are kept as is.
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url.join(path).map_err(|source| FetchError::Url {
            path: path.to_string(),
            source,
        })
    }

    async fn download(&self, path: &str) -> Result<String, FetchError> {
        let url = self.resolve(path)?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| self.http_error(&url, path, source))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        resp.text()
            .await
            .map_err(|source| self.http_error(&url, path, source))
    }

    fn http_error(&self, url: &Url, path: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                path: path.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                source,
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.download(path).await
    }
}

#[async_trait]
impl RobotsSource for HttpFetcher {
    async fn fetch_policy(&self) -> Result<String, FetchError> {
        self.download(&self.robots_path).await
    }
}

/// A robots source for crawls that ignore the site's policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRobots;

#[async_trait]
impl RobotsSource for NoRobots {
    async fn fetch_policy(&self) -> Result<String, FetchError> {
        Ok(String::new())
    }
}
