use std::collections::HashSet;
use std::mem;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::{CrawlParams, CrawlerConfig};
use crate::extract::{ExtractError, LinkExtractor, WikiLinkExtractor};
use crate::fetch::{FetchError, Fetcher, HttpFetcher, NoRobots, RobotsSource};
use crate::frontier::FrontierQueue;
use crate::graph::{GraphError, Vertex, VertexGraph};
use crate::limiter::PolitenessThrottle;
use crate::observer::{CrawlObserver, LogObserver};
use crate::relevance::RelevanceFilter;
use crate::robots::ExclusionRuleSet;
use crate::sink::{FileSink, GraphSink, SinkError};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Couldn't set up fetcher: {0}")]
    Fetcher(#[from] FetchError),
    #[error("Couldn't set up link extractor: {0}")]
    Extractor(#[from] ExtractError),
    #[error("Graph invariant violated: {0}")]
    Graph(#[from] GraphError),
    #[error("The engine already ran")]
    Inert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Terminated,
}

#[derive(Debug)]
pub struct CrawlOutcome {
    pub graph: VertexGraph,
    pub visited: HashSet<String>,
    pub rules: ExclusionRuleSet,
    pub pruned_edges: usize,
    pub pauses: usize,
    pub cancelled: bool,
    /// The graph is kept even when persisting it failed
    pub persisted: Result<(), SinkError>,
}

/// Breadth-first crawl from a seed page, bounded by a vertex budget.
pub struct CrawlEngine {
    seed: Vertex,
    budget: usize,
    user_agent: String,
    fetch_timeout: Duration,
    filter: RelevanceFilter,
    throttle: PolitenessThrottle,
    fetcher: Box<dyn Fetcher>,
    robots: Box<dyn RobotsSource>,
    extractor: Box<dyn LinkExtractor>,
    sink: Box<dyn GraphSink>,
    observer: Box<dyn CrawlObserver>,
    cancel: CancellationToken,
    state: EngineState,
    graph: VertexGraph,
    frontier: FrontierQueue,
    visited: HashSet<String>,
    rules: ExclusionRuleSet,
}

impl CrawlEngine {
    /// Robots.txt is ignored until [`Self::with_robots`] is called.
    pub fn new<F, E, S>(
        params: &CrawlParams,
        config: &CrawlerConfig,
        fetcher: F,
        extractor: E,
        sink: S,
    ) -> Self
    where
        F: Fetcher + 'static,
        E: LinkExtractor + 'static,
        S: GraphSink + 'static,
    {
        Self {
            seed: Vertex::new(params.seed.as_str()),
            budget: params.max_vertices.get(),
            user_agent: config.user_agent.clone(),
            fetch_timeout: config.fetch_timeout(),
            filter: RelevanceFilter::new(&params.keywords, &config.relevance),
            throttle: (&config.politeness).into(),
            fetcher: Box::new(fetcher),
            robots: Box::new(NoRobots),
            extractor: Box::new(extractor),
            sink: Box::new(sink),
            observer: Box::new(LogObserver),
            cancel: CancellationToken::new(),
            state: EngineState::Idle,
            graph: VertexGraph::new(),
            frontier: FrontierQueue::new(),
            visited: HashSet::new(),
            rules: ExclusionRuleSet::new(),
        }
    }

    /// Engine over HTTP, extracting wiki links and writing to `params.output`.
    pub fn http(params: &CrawlParams, config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(config)?;
        let extractor = WikiLinkExtractor::new(&config.extractor)?;
        let sink = FileSink::new(&params.output);
        let engine = Self::new(params, config, fetcher.clone(), extractor, sink);
        Ok(if config.respect_robots {
            engine.with_robots(fetcher)
        } else {
            engine
        })
    }

    pub fn with_robots<R: RobotsSource + 'static>(mut self, robots: R) -> Self {
        self.robots = Box::new(robots);
        self
    }

    pub fn with_observer<O: CrawlObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_throttle(mut self, throttle: PolitenessThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&mut self) -> Result<CrawlOutcome, CrawlError> {
        if self.state != EngineState::Idle {
            return Err(CrawlError::Inert);
        }

        self.load_rules().await;
        self.graph.add_vertex(self.seed.clone())?;
        self.frontier.enqueue(self.seed.clone());
        self.state = EngineState::Running;
        self.observer.on_start(&self.seed, self.budget);

        let crawled = self.crawl().await;
        self.state = EngineState::Terminated;
        let cancelled = crawled?;

        let pruned_edges = self.graph.prune_edges_to_unvisited(&self.visited);
        let persisted = self.sink.persist(&self.graph);
        if let Err(e) = &persisted {
            self.observer.on_sink_error(e);
        }

        let outcome = CrawlOutcome {
            graph: mem::take(&mut self.graph),
            visited: mem::take(&mut self.visited),
            rules: mem::take(&mut self.rules),
            pruned_edges,
            pauses: self.throttle.pauses(),
            cancelled,
            persisted,
        };
        self.observer.on_finish(&outcome);

        Ok(outcome)
    }

    async fn load_rules(&mut self) {
        match self.robots.fetch_policy().await {
            Ok(policy) => {
                self.rules = ExclusionRuleSet::parse(&policy, &self.user_agent);
                self.observer.on_robots(Ok(&self.rules));
            }
            Err(e) => {
                self.rules = ExclusionRuleSet::new();
                self.observer.on_robots(Err(&e));
            }
        }
    }

    /// Returns whether the crawl was cancelled.
    async fn crawl(&mut self) -> Result<bool, GraphError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(true);
            }
            if self.graph.len() >= self.budget {
                return Ok(false);
            }
            let Some(v) = self.frontier.dequeue() else {
                return Ok(false);
            };
            if !self.visited.insert(v.path().to_string()) {
                continue;
            }
            self.observer
                .on_visit(&v, self.visited.len(), self.graph.len());

            let markup = match self.fetch(&v).await {
                Ok(markup) => markup,
                Err(e) => {
                    self.observer.on_fetch_error(&v, &e);
                    continue;
                }
            };

            let candidates = self.extractor.extract(&markup);
            self.observer.on_candidates(&v, candidates.len());

            for candidate in candidates {
                if self.graph.len() >= self.budget {
                    break;
                }
                if self.throttle.acquire().await {
                    self.observer.on_pause(self.throttle.pauses());
                }

                let verdict =
                    self.filter
                        .evaluate(&candidate, &self.graph, &self.visited, &self.rules);
                self.observer.on_verdict(&candidate, verdict);
                if !verdict.is_accepted() || self.frontier.contains(&candidate.path) {
                    continue;
                }

                let to = Vertex::new(candidate.path);
                self.graph.add_vertex(to.clone())?;
                self.graph.add_edge(&v, to.clone())?;
                self.observer.on_accept(&v, &to);
                self.frontier.enqueue(to);
            }
        }
    }

    async fn fetch(&self, v: &Vertex) -> Result<String, FetchError> {
        match timeout(self.fetch_timeout, self.fetcher.fetch(v.path())).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout {
                path: v.path().to_string(),
                timeout: self.fetch_timeout,
            }),
        }
    }
}

/// Crawls over HTTP as configured, Ctrl-C style cancellation goes through `cancel`.
pub async fn crawl_site(
    params: &CrawlParams,
    config: &CrawlerConfig,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, CrawlError> {
    CrawlEngine::http(params, config)?
        .with_cancellation(cancel)
        .run()
        .await
}
