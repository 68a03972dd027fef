use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpus::persist::{IndexStore, MetaFile};
use corpus::postings::{self, BuildReport};
use corpus::TokenizedStore;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect the token → document inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the inverted index from the tokenized text store
    Build {
        /// Directory of the tokenized text store
        #[arg(long, default_value = "tokenized_texts")]
        input: String,
        /// Directory of the inverted index store
        #[arg(long, default_value = "inverted_index")]
        output: String,
    },
    /// Print the metadata of the stored index
    Stats {
        /// Directory of the inverted index store
        #[arg(long, default_value = "inverted_index")]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output).map(|_| ()),
        Commands::Stats { index } => print_stats(&index),
    }
}

fn build_index(input: &str, output: &str) -> Result<MetaFile> {
    tracing::info!(input, "opening tokenized text store");
    let documents = TokenizedStore::open(input).context("open tokenized text store")?;
    tracing::info!(output, "opening inverted index store");
    let store = IndexStore::open(output).context("open inverted index store")?;

    tracing::info!(store = %store.root().display(), documents = documents.len(), "building postings");
    let BuildReport { index, indexed, failures } = postings::build(&documents);
    if !failures.is_empty() {
        let ids: Vec<_> = failures.iter().map(|(id, _)| *id).collect();
        tracing::warn!(?ids, "some documents were left out of the index");
    }

    tracing::info!("saving inverted index");
    if let Err(err) = store.save(&index) {
        tracing::error!(error = %err, "failed to save the built index");
        return Err(err.into());
    }

    let meta = MetaFile {
        num_documents: indexed as u32,
        num_terms: index.num_terms() as u32,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: 1,
    };
    store.save_meta(&meta)?;

    tracing::info!(output, documents = meta.num_documents, terms = meta.num_terms, "index build complete");
    Ok(meta)
}

fn print_stats(index: &str) -> Result<()> {
    let store = IndexStore::open(index).context("open inverted index store")?;
    match store.load_meta()? {
        Some(meta) => println!(
            "documents={} terms={} created_at={} version={}",
            meta.num_documents, meta.num_terms, meta.created_at, meta.version
        ),
        None => println!("no index at {index}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus::TokenizedDocument;
    use tempfile::tempdir;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn build_saves_index_and_meta() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tokenized");
        let output = dir.path().join("inverted");
        {
            let mut docs = TokenizedStore::open(&input).unwrap();
            docs.create(TokenizedDocument::new(0, "http://x/0", "en", words(&["run", "run", "jump"]))).unwrap();
            docs.create(TokenizedDocument::new(1, "http://x/1", "en", words(&["jump"]))).unwrap();
        }

        let meta = build_index(input.to_str().unwrap(), output.to_str().unwrap()).unwrap();
        assert_eq!(meta.num_documents, 2);
        assert_eq!(meta.num_terms, 2);

        let store = IndexStore::open(&output).unwrap();
        let index = store.get().unwrap().unwrap();
        assert_eq!(index.get("run"), Some(&[0][..]));
        assert_eq!(index.get("jump"), Some(&[0, 1][..]));
        assert_eq!(store.load_meta().unwrap(), Some(meta));
    }

    #[test]
    fn rebuild_replaces_previous_index() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tokenized");
        let output = dir.path().join("inverted");
        let (input, output) = (input.to_str().unwrap(), output.to_str().unwrap());
        {
            let mut docs = TokenizedStore::open(input).unwrap();
            docs.create(TokenizedDocument::new(0, "http://x/0", "en", words(&["old"]))).unwrap();
        }
        build_index(input, output).unwrap();
        {
            let mut docs = TokenizedStore::open(input).unwrap();
            docs.delete_all().unwrap();
            docs.create(TokenizedDocument::new(0, "http://x/0", "en", words(&["new"]))).unwrap();
        }
        build_index(input, output).unwrap();

        let index = IndexStore::open(output).unwrap().get().unwrap().unwrap();
        assert_eq!(index.get("old"), None);
        assert_eq!(index.get("new"), Some(&[0][..]));
    }
}
