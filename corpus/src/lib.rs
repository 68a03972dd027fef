//! Storage and indexing core of the crawl → tokenize → index pipeline.
//!
//! - [`store::DocumentStore`] keeps crawled pages ([`RawDocument`]) and their
//!   lemmatized form ([`TokenizedDocument`]) as one file per document plus an
//!   append-only index log.
//! - [`postings::build`] folds a tokenized store into an [`InvertedIndex`].
//! - [`persist::IndexStore`] holds the current inverted index.

pub mod analyzer;
pub mod document;
pub mod error;
pub mod index;
pub mod persist;
pub mod postings;
pub mod store;
pub mod text;

pub use document::{RawDocument, StoredDocument, TokenizedDocument, TokenizedMeta};
pub use error::{Result, StoreError};
pub use index::*;
pub use persist::IndexStore;
pub use store::DocumentStore;

pub type RawStore = DocumentStore<RawDocument>;
pub type TokenizedStore = DocumentStore<TokenizedDocument>;
