use anyhow::{Context, Result};
use clap::Parser;
use corpus::analyzer::{LanguageAnalyzer, StemmingAnalyzer};
use corpus::{RawStore, TokenizedDocument, TokenizedStore};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tokenizer")]
#[command(about = "Detect the language of every crawled page and store its lemmas")]
struct Cli {
    /// Directory of the raw text store (read)
    #[arg(long, default_value = "raw_texts")]
    input: String,
    /// Directory of the tokenized text store (cleared, then written)
    #[arg(long, default_value = "tokenized_texts")]
    output: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    tokenized: usize,
    skipped: usize,
    failed: usize,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    tracing::info!(input = %cli.input, "opening raw text store");
    let pages = RawStore::open(&cli.input).context("open raw text store")?;
    tracing::info!(output = %cli.output, "opening tokenized text store");
    let mut tokenized = TokenizedStore::open(&cli.output).context("open tokenized text store")?;
    tokenized.delete_all().context("clear tokenized text store")?;

    let summary = tokenize_all(&pages, &mut tokenized, &StemmingAnalyzer);
    tracing::info!(
        tokenized = summary.tokenized,
        skipped = summary.skipped,
        failed = summary.failed,
        store = %tokenized.root().display(),
        documents = tokenized.len(),
        "tokenization finished"
    );
    tokenized.close()?;
    Ok(())
}

/// Lemmatize every page of `pages` into `tokenized`, keeping each page's id.
/// Pages that cannot be read or stored are logged and counted, not fatal.
fn tokenize_all<A: LanguageAnalyzer>(pages: &RawStore, tokenized: &mut TokenizedStore, analyzer: &A) -> Summary {
    let mut summary = Summary::default();
    for id in pages.get_all_ids() {
        let page = match pages.get(id) {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(id, error = %err, "failed to read page");
                summary.failed += 1;
                continue;
            }
        };
        let Some((language_code, tokens)) = analyzer.analyze(&page.text) else {
            tracing::warn!(id, url = %page.url, "could not detect language, skipping");
            summary.skipped += 1;
            continue;
        };
        tracing::info!(id, url = %page.url, language = %language_code, tokens = tokens.len(), "tokenized page");
        match tokenized.create(TokenizedDocument::new(id, page.url, language_code, tokens)) {
            Ok(()) => summary.tokenized += 1,
            Err(err) => {
                tracing::error!(id, error = %err, "failed to store tokenized page");
                summary.failed += 1;
            }
        }
    }
    summary
}
