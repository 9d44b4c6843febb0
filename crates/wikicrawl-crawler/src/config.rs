use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_robots_path")]
    pub robots_path: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_respect_robots")]
    pub respect_robots: bool,

    #[serde(default)]
    pub politeness: Politeness,

    #[serde(default)]
    pub relevance: RelevanceConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            robots_path: default_robots_path(),
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            respect_robots: default_respect_robots(),
            politeness: Politeness::default(),
            relevance: RelevanceConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_base_url() -> String {
    String::from("https://en.wikipedia.org")
}

fn default_robots_path() -> String {
    String::from("/robots.txt")
}

fn default_user_agent() -> String {
    String::from("wikicrawl")
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_respect_robots() -> bool {
    true
}

/// Pause for `pause_millis` once every `every` fetch-equivalent units
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Politeness {
    #[serde(default = "default_every")]
    pub every: NonZeroUsize,

    #[serde(default = "default_pause_millis")]
    pub pause_millis: u64,
}

impl Default for Politeness {
    fn default() -> Self {
        Self {
            every: default_every(),
            pause_millis: default_pause_millis(),
        }
    }
}

impl Politeness {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_millis)
    }
}

fn default_every() -> NonZeroUsize {
    NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN)
}

fn default_pause_millis() -> u64 {
    1_000
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceConfig {
    #[serde(default = "default_policy")]
    pub policy: RelevancePolicy,

    #[serde(default = "default_threshold")]
    pub threshold: usize,

    #[serde(default = "default_keyword_case")]
    pub keyword_case: KeywordCase,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            threshold: default_threshold(),
            keyword_case: default_keyword_case(),
        }
    }
}

fn default_policy() -> RelevancePolicy {
    RelevancePolicy::Scored
}

fn default_threshold() -> usize {
    1
}

fn default_keyword_case() -> KeywordCase {
    KeywordCase::Insensitive
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum RelevancePolicy {
    /// Score keywords found in the anchor text and the text around the link
    Scored,
    /// Accept when a keyword appears inside the link path itself
    PathContains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum KeywordCase {
    Sensitive,
    Insensitive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorConfig {
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,

    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            content_selector: default_content_selector(),
            link_prefix: default_link_prefix(),
            context_window: default_context_window(),
        }
    }
}

fn default_content_selector() -> String {
    String::from("p")
}

fn default_link_prefix() -> String {
    String::from("/wiki/")
}

fn default_context_window() -> usize {
    100
}

/// What to crawl, as opposed to how
#[derive(Debug, Clone)]
pub struct CrawlParams {
    pub seed: String,
    pub keywords: Vec<String>,
    pub max_vertices: NonZeroUsize,
    pub output: PathBuf,
}
