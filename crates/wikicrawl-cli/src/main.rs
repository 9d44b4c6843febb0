use std::collections::HashSet;
use std::fs::{self, File};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::{env, io};

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use wikicrawl_crawler::{
    crawl_site, CrawlParams, CrawlerConfig, ExclusionRuleSet, Fetcher, HttpFetcher, KeywordCase,
    LinkExtractor, RelevanceFilter, RelevancePolicy, RobotsSource, VertexGraph,
    WikiLinkExtractor,
};

/// Keyword directed Wikipedia crawler
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "crawl")]
    Crawl(CrawlArgs),
    #[command(name = "inspect")]
    Inspect(InspectArgs),
    #[command(name = "robots")]
    Robots(RobotsArgs),
    #[command(hide = true)]
    Completion,
}

/// Options shared by every subcommand that reads the crawler configuration
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Optional crawler yaml configuration file
    #[arg(env = "WIKICRAWL_CONFIG", long)]
    pub crawler_config: Option<PathBuf>,
    /// Override crawler's base url
    #[arg(long)]
    pub base_url: Option<String>,
    /// Override crawler's user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override crawler's relevance policy
    #[arg(value_enum, long)]
    pub policy: Option<RelevancePolicy>,
    /// Override crawler's minimum relevance score
    #[arg(long)]
    pub threshold: Option<usize>,
    /// Override crawler's keyword case handling
    #[arg(value_enum, long)]
    pub keyword_case: Option<KeywordCase>,
}

impl TryFrom<&ConfigArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &ConfigArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.crawler_config.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            CrawlerConfig::default()
        };
        if let Some(base_url) = &args.base_url {
            conf.base_url = base_url.to_string();
        }
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(policy) = args.policy {
            conf.relevance.policy = policy;
        }
        if let Some(threshold) = args.threshold {
            conf.relevance.threshold = threshold;
        }
        if let Some(keyword_case) = args.keyword_case {
            conf.relevance.keyword_case = keyword_case;
        }
        Ok(conf)
    }
}

/// Crawl from a seed page and write the resulting graph
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Path of the first page, relative to the base url
    #[arg(long, short, default_value = "/wiki/Tennis")]
    pub seed: String,
    /// Keyword a page must relate to, can be repeated
    #[arg(long = "keyword", short, required = true)]
    pub keywords: Vec<String>,
    /// Maximum number of pages in the graph
    #[arg(long, short, default_value = "20")]
    pub max_vertices: NonZeroUsize,
    /// Path to the output file that will contain the graph
    #[arg(long, short)]
    pub output_file: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Override crawler's per page timeout in seconds
    #[arg(long)]
    pub fetch_timeout: Option<u64>,
    /// Override how many links are examined between two pauses
    #[arg(long)]
    pub pause_every: Option<NonZeroUsize>,
    /// Override the pause duration in milliseconds
    #[arg(long)]
    pub pause_millis: Option<u64>,
    /// Ignore the site's robots.txt
    #[arg(long)]
    pub no_robots: bool,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

impl TryFrom<&CrawlArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        let mut conf = CrawlerConfig::try_from(&args.config)?;
        if let Some(fetch_timeout) = args.fetch_timeout {
            conf.fetch_timeout_secs = fetch_timeout;
        }
        if let Some(every) = args.pause_every {
            conf.politeness.every = every;
        }
        if let Some(pause_millis) = args.pause_millis {
            conf.politeness.pause_millis = pause_millis;
        }
        if args.no_robots {
            conf.respect_robots = false;
        }
        Ok(conf)
    }
}

pub fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let crawler_conf = CrawlerConfig::try_from(&args)?;
    let params = CrawlParams {
        seed: args.seed,
        keywords: args.keywords,
        max_vertices: args.max_vertices,
        output: args.output_file,
    };

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let outcome = rt.block_on(async {
        let cancel = CancellationToken::new();
        let on_sigint = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, writing the graph crawled so far");
                on_sigint.cancel();
            }
        });
        crawl_site(&params, &crawler_conf, cancel).await
    })?;

    println!(
        "{} pages, {} links, {} visited{}",
        outcome.graph.len(),
        outcome.graph.edge_count(),
        outcome.visited.len(),
        if outcome.cancelled { ", interrupted" } else { "" }
    );
    outcome.persisted?;
    println!("Graph written to {}", params.output.display());

    Ok(())
}

/// Extract the links of a single page and print their relevance
#[derive(Debug, clap::Args)]
#[command(group = clap::ArgGroup::new("page").required(true))]
pub struct InspectArgs {
    /// A local html page to inspect
    #[arg(group = "page", long)]
    pub file: Option<PathBuf>,
    /// A page path or url to download
    #[arg(group = "page", long)]
    pub url: Option<String>,
    /// Keyword a page must relate to, can be repeated
    #[arg(long = "keyword", short, required = true)]
    pub keywords: Vec<String>,
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn inspect(args: InspectArgs) -> anyhow::Result<()> {
    let conf = CrawlerConfig::try_from(&args.config)?;

    let page = if let Some(url) = &args.url {
        let fetcher = HttpFetcher::new(&conf)?;
        let rt = runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(fetcher.fetch(url))?
    } else if let Some(path) = &args.file {
        fs::read_to_string(path)?
    } else {
        anyhow::bail!("Missing `url` or `file`");
    };

    let extractor = WikiLinkExtractor::new(&conf.extractor)?;
    let filter = RelevanceFilter::new(&args.keywords, &conf.relevance);
    let (graph, visited, rules) = (VertexGraph::new(), HashSet::new(), ExclusionRuleSet::new());

    for candidate in extractor.extract(&page) {
        let verdict = filter.evaluate(&candidate, &graph, &visited, &rules);
        println!(
            "{:<24} {}\t{}",
            format!("{verdict:?}"),
            candidate.path,
            candidate.anchor_text.as_deref().unwrap_or_default()
        );
    }

    Ok(())
}

/// Print the disallowed prefixes the crawler would obey
#[derive(Debug, clap::Args)]
pub struct RobotsArgs {
    /// A local robots.txt, downloaded from the base url otherwise
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn robots(args: RobotsArgs) -> anyhow::Result<()> {
    let conf = CrawlerConfig::try_from(&args.config)?;

    let policy = match &args.file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let fetcher = HttpFetcher::new(&conf)?;
            let rt = runtime::Builder::new_current_thread().enable_all().build()?;
            rt.block_on(fetcher.fetch_policy())?
        }
    };

    for prefix in ExclusionRuleSet::parse(&policy, &conf.user_agent).iter() {
        println!("{prefix}");
    }

    Ok(())
}

fn init_logs(filters: &str) {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", filters);
    }
    env_logger::init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Crawl(args) => {
            if !args.quiet {
                init_logs("wikicrawl_crawler=info,wikicrawl=info");
            }
            crawl(args)
        }
        SubCommand::Inspect(args) => {
            init_logs("wikicrawl_crawler=warn");
            inspect(args)
        }
        SubCommand::Robots(args) => {
            init_logs("wikicrawl_crawler=warn");
            robots(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "wikicrawl", &mut io::stdout());
            Ok(())
        }
    }
}
