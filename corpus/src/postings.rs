use crate::document::TokenizedDocument;
use crate::error::StoreError;
use crate::store::DocumentStore;
use crate::{DocId, InvertedIndex};

/// Outcome of one indexing run.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub index: InvertedIndex,
    /// Documents whose tokens made it into `index`.
    pub indexed: usize,
    /// Documents that could not be loaded; none of their tokens were indexed.
    pub failures: Vec<(DocId, StoreError)>,
}

/// Build postings over every document of a tokenized store, visiting ids in the
/// store's order. A document that fails to load is skipped and reported.
pub fn build(store: &DocumentStore<TokenizedDocument>) -> BuildReport {
    let mut report = BuildReport::default();
    for id in store.get_all_ids() {
        let document = match store.get(id) {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(id, error = %err, "failed to load tokenized document, skipping");
                report.failures.push((id, err));
                continue;
            }
        };
        tracing::info!(id, url = %document.url, tokens = document.tokens.len(), "indexing document");
        report.index.add_document(id, document.tokens.iter().map(String::as_str));
        report.indexed += 1;
    }
    tracing::info!(
        indexed = report.indexed,
        failed = report.failures.len(),
        terms = report.index.num_terms(),
        "postings built"
    );
    report
}
