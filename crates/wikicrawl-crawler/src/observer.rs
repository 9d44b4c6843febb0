use crate::crawler::CrawlOutcome;
use crate::extract::Candidate;
use crate::fetch::FetchError;
use crate::graph::Vertex;
use crate::relevance::Verdict;
use crate::robots::ExclusionRuleSet;
use crate::sink::SinkError;

/// Hooks into the crawl loop. Every method defaults to doing nothing.
pub trait CrawlObserver: Send + Sync {
    fn on_start(&self, _seed: &Vertex, _budget: usize) {}

    fn on_robots(&self, _rules: Result<&ExclusionRuleSet, &FetchError>) {}

    fn on_visit(&self, _v: &Vertex, _visited: usize, _vertices: usize) {}

    fn on_fetch_error(&self, _v: &Vertex, _error: &FetchError) {}

    fn on_candidates(&self, _v: &Vertex, _count: usize) {}

    fn on_verdict(&self, _candidate: &Candidate, _verdict: Verdict) {}

    fn on_accept(&self, _from: &Vertex, _to: &Vertex) {}

    fn on_pause(&self, _pauses: usize) {}

    fn on_sink_error(&self, _error: &SinkError) {}

    fn on_finish(&self, _outcome: &CrawlOutcome) {}
}

/// Does nothing, for quiet crawls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl CrawlObserver for SilentObserver {}

/// Forwards crawl events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl CrawlObserver for LogObserver {
    fn on_start(&self, seed: &Vertex, budget: usize) {
        log::info!("Crawling from {seed} up to {budget} pages");
    }

    fn on_robots(&self, rules: Result<&ExclusionRuleSet, &FetchError>) {
        match rules {
            Ok(rules) => log::info!("Loaded {} disallowed prefixes", rules.len()),
            Err(e) => log::warn!("Couldn't fetch robots.txt, crawling without rules: {e}"),
        }
    }

    fn on_visit(&self, v: &Vertex, visited: usize, vertices: usize) {
        log::info!("Visiting {v} ({visited} visited, {vertices} vertices)");
    }

    fn on_fetch_error(&self, v: &Vertex, error: &FetchError) {
        log::warn!("Skipping {v} got: {error}");
    }

    fn on_candidates(&self, v: &Vertex, count: usize) {
        log::debug!("Found {count} links on {v}");
    }

    fn on_verdict(&self, candidate: &Candidate, verdict: Verdict) {
        log::trace!("{} -> {verdict:?}", candidate.path);
    }

    fn on_accept(&self, from: &Vertex, to: &Vertex) {
        log::debug!("Accepted {from} -> {to}");
    }

    fn on_pause(&self, pauses: usize) {
        log::info!("Pausing to obey politeness policy (pause #{pauses})");
    }

    fn on_sink_error(&self, error: &SinkError) {
        log::error!("{error}");
    }

    fn on_finish(&self, outcome: &CrawlOutcome) {
        log::info!(
            "Crawl done: {} vertices, {} edges, {} visited{}",
            outcome.graph.len(),
            outcome.graph.edge_count(),
            outcome.visited.len(),
            if outcome.cancelled { " (cancelled)" } else { "" }
        );
    }
}
