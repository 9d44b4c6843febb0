use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wikicrawl_crawler::{
    async_trait, CancellationToken, CrawlEngine, CrawlError, CrawlObserver, CrawlParams,
    CrawlerConfig, EngineState, ExclusionRuleSet, FetchError, Fetcher, FileSink, GraphSink,
    Politeness, RobotsSource, SinkError, Vertex, VertexGraph, WikiLinkExtractor,
};

const TENNIS: &str = r#"<html><body>
<p>See the <a href="/wiki/Tennis_racket">tennis racket</a>.</p>
<p>Capital city <a href="/wiki/Paris">Paris</a>.</p>
<p>Early <a href="/wiki/Tennis#History">tennis history</a>.</p>
<p>The <a href="/wiki/Wimbledon">Wimbledon</a> tennis event.</p>
<p>A <a href="/wiki/Table_tennis">table tennis</a> variant.</p>
</body></html>"#;

const TENNIS_RACKET: &str = r#"<html><body>
<p>Used in <a href="/wiki/Tennis">tennis</a> with a <a href="/wiki/Tennis_ball">tennis ball</a>.</p>
</body></html>"#;

const TABLE_TENNIS: &str = r#"<html><body>
<p>Try a <a href="/wiki/Special:Random">random tennis page</a>.</p>
</body></html>"#;

const TENNIS_BALL: &str = "<html><body><p>Yellow and fuzzy.</p></body></html>";

#[derive(Clone, Default)]
struct FakeWiki {
    pages: HashMap<String, String>,
    fetched: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    cancel_after_fetch: Option<CancellationToken>,
}

impl FakeWiki {
    fn tennis() -> Self {
        let pages = [
            ("/wiki/Tennis", TENNIS),
            ("/wiki/Tennis_racket", TENNIS_RACKET),
            ("/wiki/Table_tennis", TABLE_TENNIS),
            ("/wiki/Tennis_ball", TENNIS_BALL),
        ]
        .into_iter()
        .map(|(path, page)| (path.to_string(), page.to_string()))
        .collect();
        Self {
            pages,
            ..Default::default()
        }
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeWiki {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.fetched.lock().unwrap().push(path.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(cancel) = &self.cancel_after_fetch {
            cancel.cancel();
        }
        self.pages
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::Other(format!("404 {path}")))
    }
}

struct Robots(Option<&'static str>);

#[async_trait]
impl RobotsSource for Robots {
    async fn fetch_policy(&self) -> Result<String, FetchError> {
        self.0
            .map(String::from)
            .ok_or_else(|| FetchError::Other(String::from("robots.txt unreachable")))
    }
}

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn has(&self, prefix: &str) -> bool {
        self.events().iter().any(|e| e.starts_with(prefix))
    }
}

impl CrawlObserver for Recorder {
    fn on_robots(&self, rules: Result<&ExclusionRuleSet, &FetchError>) {
        match rules {
            Ok(rules) => self.push(format!("robots {}", rules.len())),
            Err(_) => self.push(String::from("robots error")),
        }
    }

    fn on_visit(&self, v: &Vertex, _visited: usize, _vertices: usize) {
        self.push(format!("visit {v}"));
    }

    fn on_fetch_error(&self, v: &Vertex, error: &FetchError) {
        let kind = match error {
            FetchError::Timeout { .. } => "timeout",
            _ => "error",
        };
        self.push(format!("fetch {kind} {v}"));
    }

    fn on_pause(&self, pauses: usize) {
        self.push(format!("pause {pauses}"));
    }

    fn on_sink_error(&self, _error: &SinkError) {
        self.push(String::from("sink error"));
    }
}

struct BrokenSink;

impl GraphSink for BrokenSink {
    fn persist(&self, _graph: &VertexGraph) -> Result<(), SinkError> {
        Err(SinkError::Io {
            destination: self.destination(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }

    fn destination(&self) -> String {
        String::from("nowhere")
    }
}

fn params(budget: usize, output: PathBuf) -> CrawlParams {
    CrawlParams {
        seed: String::from("/wiki/Tennis"),
        keywords: vec![String::from("tennis")],
        max_vertices: NonZeroUsize::new(budget).unwrap(),
        output,
    }
}

fn engine(budget: usize, output: PathBuf, wiki: FakeWiki) -> CrawlEngine {
    let params = params(budget, output.clone());
    CrawlEngine::new(
        &params,
        &CrawlerConfig::default(),
        wiki,
        WikiLinkExtractor::default(),
        FileSink::new(output),
    )
}

fn paths(graph: &VertexGraph) -> Vec<String> {
    graph.iter().map(|v| v.path().to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn budget_bounds_the_graph() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("Tennis.txt");
    let wiki = FakeWiki::tennis();

    let mut engine = engine(3, output.clone(), wiki.clone());
    let outcome = engine.run().await.unwrap();

    assert_eq!(EngineState::Terminated, engine.state());
    assert_eq!(
        vec!["/wiki/Tennis", "/wiki/Tennis_racket", "/wiki/Wimbledon"],
        paths(&outcome.graph)
    );
    assert_eq!(vec!["/wiki/Tennis"], wiki.fetched());

    // Edges into the two unvisited vertices are pruned
    assert_eq!(2, outcome.pruned_edges);
    assert_eq!(0, outcome.graph.edge_count());

    assert!(outcome.persisted.is_ok());
    let written = fs::read_to_string(&output).unwrap();
    let mut lines = written.lines();
    assert_eq!(Some("3"), lines.next());
    assert_eq!(
        vec!["/wiki/Tennis", "/wiki/Tennis_racket", "/wiki/Wimbledon"],
        lines.collect::<Vec<_>>()
    );
}

#[tokio::test(start_paused = true)]
async fn breadth_first_until_frontier_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let wiki = FakeWiki::tennis();
    let recorder = Recorder::default();

    let mut engine = engine(10, dir.path().join("out.txt"), wiki.clone())
        .with_robots(Robots(Some("User-agent: *\nDisallow: /wiki/Special:")))
        .with_observer(recorder.clone());
    let outcome = engine.run().await.unwrap();

    assert_eq!(
        vec![
            "/wiki/Tennis",
            "/wiki/Tennis_racket",
            "/wiki/Wimbledon",
            "/wiki/Table_tennis",
            "/wiki/Tennis_ball",
        ],
        paths(&outcome.graph)
    );
    assert_eq!(
        vec![
            "/wiki/Tennis",
            "/wiki/Tennis_racket",
            "/wiki/Wimbledon",
            "/wiki/Table_tennis",
            "/wiki/Tennis_ball",
        ],
        wiki.fetched()
    );
    assert_eq!(5, outcome.visited.len());
    assert_eq!(0, outcome.pruned_edges);
    assert_eq!(4, outcome.graph.edge_count());
    assert_eq!(
        Ok(vec![Vertex::new("/wiki/Tennis_ball")]),
        outcome.graph.neighbors(&Vertex::new("/wiki/Tennis_racket"))
    );
    assert!(recorder.has("robots 1"));
    assert!(recorder.has("fetch error /wiki/Wimbledon"));
    assert!(!outcome.cancelled);
}

#[tokio::test(start_paused = true)]
async fn throttle_counts_examined_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let politeness = Politeness {
        every: NonZeroUsize::new(3).unwrap(),
        pause_millis: 1_000,
    };

    let started = tokio::time::Instant::now();
    let mut engine = engine(10, dir.path().join("out.txt"), FakeWiki::tennis())
        .with_throttle((&politeness).into())
        .with_observer(recorder.clone());
    let outcome = engine.run().await.unwrap();

    // 5 links on Tennis, 2 on Tennis_racket, 1 on Table_tennis
    assert_eq!(2, outcome.pauses);
    assert_eq!(
        vec!["pause 1", "pause 2"],
        recorder
            .events()
            .into_iter()
            .filter(|e| e.starts_with("pause"))
            .collect::<Vec<_>>()
    );
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn robots_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();

    let mut engine = engine(10, dir.path().join("out.txt"), FakeWiki::tennis())
        .with_robots(Robots(None))
        .with_observer(recorder.clone());
    let outcome = engine.run().await.unwrap();

    assert!(recorder.has("robots error"));
    assert!(outcome.rules.is_empty());
    assert_eq!(5, outcome.graph.len());
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_times_out_and_stays_a_leaf() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let wiki = FakeWiki {
        delay: Some(Duration::from_secs(120)),
        ..FakeWiki::tennis()
    };

    let mut engine = engine(10, dir.path().join("out.txt"), wiki).with_observer(recorder.clone());
    let outcome = engine.run().await.unwrap();

    assert!(recorder.has("fetch timeout /wiki/Tennis"));
    assert_eq!(vec!["/wiki/Tennis"], paths(&outcome.graph));
    assert!(outcome.persisted.is_ok());
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_still_persists() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut engine = engine(10, output.clone(), FakeWiki::tennis()).with_cancellation(cancel);
    let outcome = engine.run().await.unwrap();

    assert!(outcome.cancelled);
    assert!(outcome.visited.is_empty());
    assert_eq!("1\n/wiki/Tennis\n", fs::read_to_string(&output).unwrap());
}

#[tokio::test(start_paused = true)]
async fn cancelled_mid_crawl_stops_after_current_page() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");
    let cancel = CancellationToken::new();
    let wiki = FakeWiki {
        cancel_after_fetch: Some(cancel.clone()),
        ..FakeWiki::tennis()
    };

    let mut engine = engine(10, output.clone(), wiki.clone()).with_cancellation(cancel);
    let outcome = engine.run().await.unwrap();

    assert!(outcome.cancelled);
    assert_eq!(vec!["/wiki/Tennis"], wiki.fetched());
    assert_eq!(4, outcome.graph.len());
    assert_eq!(0, outcome.graph.edge_count());
    assert!(fs::read_to_string(&output).unwrap().starts_with("4\n"));
}

#[tokio::test(start_paused = true)]
async fn sink_failure_keeps_the_graph() {
    let recorder = Recorder::default();
    let params = params(10, PathBuf::from("unused"));
    let mut engine = CrawlEngine::new(
        &params,
        &CrawlerConfig::default(),
        FakeWiki::tennis(),
        WikiLinkExtractor::default(),
        BrokenSink,
    )
    .with_observer(recorder.clone());
    let outcome = engine.run().await.unwrap();

    assert!(outcome.persisted.is_err());
    assert!(recorder.has("sink error"));
    assert_eq!(5, outcome.graph.len());
}

#[tokio::test(start_paused = true)]
async fn engine_is_inert_after_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine(3, dir.path().join("out.txt"), FakeWiki::tennis());

    assert_eq!(EngineState::Idle, engine.state());
    engine.run().await.unwrap();

    assert!(matches!(engine.run().await, Err(CrawlError::Inert)));
}
