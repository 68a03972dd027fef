use anyhow::{anyhow, Context, Result};
use clap::Parser;
use corpus::text::count_words;
use corpus::{RawDocument, RawStore};
use reqwest::{header, Client, Url};
use scraper::Html;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

mod page;

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl pages breadth-first from a root URL into the raw text store")]
struct Cli {
    /// URL of the first page to crawl
    url: String,
    /// Directory of the raw text store
    #[arg(long, default_value = "raw_texts")]
    output: String,
    /// Stop after this many pages have been stored
    #[arg(long, default_value_t = 100)]
    max_pages: usize,
    /// Pages with fewer words are followed but not stored
    #[arg(long, default_value_t = 1000)]
    min_words: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string sent with every request
    #[arg(long, default_value = "corpus-crawler/0.1")]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Cli::parse();
    let root = Url::parse(&args.url).with_context(|| format!("invalid root url {}", args.url))?;

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    tracing::info!(output = %args.output, "opening raw text store");
    let mut store = RawStore::open(&args.output).context("open raw text store")?;
    store.delete_all().context("clear raw text store")?;

    crawl(&client, &mut store, root, &args).await?;
    store.close()?;
    Ok(())
}

async fn crawl(client: &Client, store: &mut RawStore, root: Url, args: &Cli) -> Result<()> {
    let root = page::norm(&root);
    let mut frontier: VecDeque<Url> = VecDeque::from([root.clone()]);
    let mut seen: HashSet<Url> = HashSet::from([root]);
    let mut stored = 0usize;

    while stored < args.max_pages {
        let Some(url) = frontier.pop_front() else { break };
        tracing::info!(url = %url, "downloading page");
        let body = match download(client, &url, &seen).await {
            Ok(Some(body)) => body,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "failed to download page");
                continue;
            }
        };

        let doc = Html::parse_document(&body);
        let text = page::page_text(&doc);
        let words = count_words(&text);
        if words >= args.min_words {
            let id = store.get_new_id();
            match store.create(RawDocument::new(id, url.as_str(), text)) {
                Ok(()) => {
                    stored += 1;
                    tracing::info!(id, url = %url, words, stored, "page stored");
                }
                Err(err) => tracing::error!(id, url = %url, error = %err, "failed to store page"),
            }
        } else {
            tracing::debug!(url = %url, words, "page too short, not stored");
        }

        for link in page::link_urls(&url, &doc) {
            if seen.insert(link.clone()) {
                frontier.push_back(link);
            }
        }
    }

    tracing::info!(
        store = %store.root().display(),
        documents = store.len(),
        stored,
        visited = seen.len(),
        frontier = frontier.len(),
        "crawl finished"
    );
    Ok(())
}

/// Fetch an HTML page. `Ok(None)` when a redirect lands on a page that was
/// already queued.
async fn download(client: &Client, url: &Url, seen: &HashSet<Url>) -> Result<Option<String>> {
    let resp = client
        .get(url.clone())
        .header(header::ACCEPT, "text/html")
        .send()
        .await?;

    let landed = page::norm(resp.url());
    if &landed != url && seen.contains(&landed) {
        tracing::debug!(url = %url, landed = %landed, "redirected to a seen page");
        return Ok(None);
    }
    if !resp.status().is_success() {
        return Err(anyhow!("unexpected status {}", resp.status()));
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.is_empty() {
        return Err(anyhow!("empty Content-Type"));
    }
    if !content_type.contains("html") {
        return Err(anyhow!("unsupported Content-Type {content_type}"));
    }

    Ok(Some(resp.text().await?))
}
