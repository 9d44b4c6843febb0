mod config;
mod crawler;
mod extract;
mod fetch;
mod frontier;
mod graph;
mod limiter;
mod observer;
mod relevance;
mod robots;
mod sink;

pub use config::{
    CrawlParams, CrawlerConfig, ExtractorConfig, KeywordCase, Politeness, RelevanceConfig,
    RelevancePolicy,
};
pub use crawler::{crawl_site, CrawlEngine, CrawlError, CrawlOutcome, EngineState};
pub use extract::{Candidate, ExtractError, LinkExtractor, WikiLinkExtractor};
pub use fetch::{FetchError, Fetcher, HttpFetcher, NoRobots, RobotsSource};
pub use frontier::FrontierQueue;
pub use graph::{GraphError, Vertex, VertexGraph};
pub use limiter::PolitenessThrottle;
pub use observer::{CrawlObserver, LogObserver, SilentObserver};
pub use relevance::{RelevanceFilter, Verdict};
pub use robots::ExclusionRuleSet;
pub use sink::{write_graph, FileSink, GraphSink, SinkError, WriterSink};

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
