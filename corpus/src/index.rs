use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type DocId = u32;

/// Token → ids of the documents containing it, in the order documents were
/// indexed. Each list holds an id at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub postings: BTreeMap<String, Vec<DocId>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Fold one document's tokens into the postings. Relies on all tokens of a
    /// document being added in a single call: a repeat of `doc_id` can only
    /// sit at the tail of a list.
    pub fn add_document<'a, I>(&mut self, doc_id: DocId, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            let docs = self.postings.entry(token.to_owned()).or_default();
            if docs.last() != Some(&doc_id) {
                docs.push(doc_id);
            }
        }
    }

    pub fn get(&self, token: &str) -> Option<&[DocId]> {
        self.postings.get(token).map(Vec::as_slice)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}
