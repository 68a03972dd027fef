use crate::error::{Result, StoreError};
use crate::DocId;
use serde::{Deserialize, Serialize};

/// Separator used to join tokens in a tokenized payload file.
pub const TOKEN_SEPARATOR: &str = "\n";

/// A record shape that a [`DocumentStore`](crate::store::DocumentStore) can persist.
///
/// Each document is split into metadata, which lives in the index log, and a
/// payload, which lives in its own file under `documents/`. `from_parts` is the
/// inverse of `into_parts` and rebuilds the typed record on `get`.
pub trait StoredDocument: Sized {
    /// Metadata kept in the index log for every present document.
    type Meta: Clone + std::fmt::Debug;

    /// File name of the index log inside the store directory.
    const INDEX_FILE: &'static str;

    fn id(&self) -> DocId;

    /// Split into `(id, meta, payload)`, rejecting documents whose payload or
    /// metadata would not survive a round trip.
    fn into_parts(self) -> Result<(DocId, Self::Meta, String)>;

    fn from_parts(id: DocId, meta: Self::Meta, payload: String) -> Self;

    fn url(meta: &Self::Meta) -> &str;

    /// Encode one index log line, without the trailing newline.
    fn encode_entry(id: DocId, meta: &Self::Meta) -> Result<String>;

    /// Parse one index log line, without the trailing newline.
    fn decode_entry(line: &str) -> Result<(DocId, Self::Meta)>;
}

/// A crawled page: source URL plus its normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: DocId,
    pub url: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(id: DocId, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id, url: url.into(), text: text.into() }
    }
}

fn check_url(id: DocId, url: &str) -> Result<()> {
    if url.contains(['\n', '\r']) {
        return Err(StoreError::InvalidDocument { id, reason: "url contains a line break".into() });
    }
    Ok(())
}

impl StoredDocument for RawDocument {
    type Meta = String;

    const INDEX_FILE: &'static str = "index.txt";

    fn id(&self) -> DocId { self.id }

    fn into_parts(self) -> Result<(DocId, String, String)> {
        check_url(self.id, &self.url)?;
        Ok((self.id, self.url, self.text))
    }

    fn from_parts(id: DocId, url: String, text: String) -> Self {
        Self { id, url, text }
    }

    fn url(meta: &String) -> &str { meta }

    fn encode_entry(id: DocId, url: &String) -> Result<String> {
        Ok(format!("{id} {url}"))
    }

    fn decode_entry(line: &str) -> Result<(DocId, String)> {
        let (id, url) = line
            .split_once(' ')
            .ok_or_else(|| StoreError::corrupt(line, "expected \"<id> <url>\""))?;
        let id = id
            .parse::<DocId>()
            .map_err(|e| StoreError::corrupt(line, format!("bad id: {e}")))?;
        if url.is_empty() {
            return Err(StoreError::corrupt(line, "empty url"));
        }
        Ok((id, url.to_string()))
    }
}

/// A page after language detection and lemmatization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedDocument {
    pub id: DocId,
    pub url: String,
    pub language_code: String,
    /// Lemmas in word order.
    pub tokens: Vec<String>,
}

impl TokenizedDocument {
    pub fn new(id: DocId, url: impl Into<String>, language_code: impl Into<String>, tokens: Vec<String>) -> Self {
        Self { id, url: url.into(), language_code: language_code.into(), tokens }
    }
}

/// Index-log metadata of a tokenized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedMeta {
    pub url: String,
    pub language_code: String,
}

#[derive(Serialize, Deserialize)]
struct TokenizedEntry {
    id: DocId,
    #[serde(flatten)]
    meta: TokenizedMeta,
}

impl StoredDocument for TokenizedDocument {
    type Meta = TokenizedMeta;

    const INDEX_FILE: &'static str = "index.json";

    fn id(&self) -> DocId { self.id }

    fn into_parts(self) -> Result<(DocId, TokenizedMeta, String)> {
        if let Some(bad) = self.tokens.iter().find(|t| t.is_empty() || t.contains(TOKEN_SEPARATOR)) {
            return Err(StoreError::InvalidDocument {
                id: self.id,
                reason: format!("token {bad:?} is empty or contains the token separator"),
            });
        }
        let payload = self.tokens.join(TOKEN_SEPARATOR);
        let meta = TokenizedMeta { url: self.url, language_code: self.language_code };
        Ok((self.id, meta, payload))
    }

    fn from_parts(id: DocId, meta: TokenizedMeta, payload: String) -> Self {
        // An empty file is an empty token list, not a single empty token.
        let tokens = if payload.is_empty() {
            Vec::new()
        } else {
            payload.split(TOKEN_SEPARATOR).map(str::to_string).collect()
        };
        Self { id, url: meta.url, language_code: meta.language_code, tokens }
    }

    fn url(meta: &TokenizedMeta) -> &str { &meta.url }

    fn encode_entry(id: DocId, meta: &TokenizedMeta) -> Result<String> {
        Ok(serde_json::to_string(&TokenizedEntry { id, meta: meta.clone() })?)
    }

    fn decode_entry(line: &str) -> Result<(DocId, TokenizedMeta)> {
        let entry: TokenizedEntry =
            serde_json::from_str(line).map_err(|e| StoreError::corrupt(line, e.to_string()))?;
        Ok((entry.id, entry.meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_entry_line() {
        let line = RawDocument::encode_entry(12, &"http://x/a b".to_string()).unwrap();
        assert_eq!(line, "12 http://x/a b");
        let (id, url) = RawDocument::decode_entry(&line).unwrap();
        assert_eq!(id, 12);
        assert_eq!(url, "http://x/a b");
    }

    #[test]
    fn raw_entry_rejects_garbage() {
        assert!(matches!(RawDocument::decode_entry("abc"), Err(StoreError::CorruptIndexEntry { .. })));
        assert!(matches!(RawDocument::decode_entry("x http://x"), Err(StoreError::CorruptIndexEntry { .. })));
        assert!(matches!(RawDocument::decode_entry("-1 http://x"), Err(StoreError::CorruptIndexEntry { .. })));
        assert!(matches!(RawDocument::decode_entry("3 "), Err(StoreError::CorruptIndexEntry { .. })));
    }

    #[test]
    fn raw_url_with_newline_is_rejected() {
        let doc = RawDocument::new(1, "http://x/\nevil", "text");
        assert!(matches!(doc.into_parts(), Err(StoreError::InvalidDocument { id: 1, .. })));
    }

    #[test]
    fn tokenized_entry_is_json() {
        let meta = TokenizedMeta { url: "http://x/a".into(), language_code: "ru".into() };
        let line = TokenizedDocument::encode_entry(4, &meta).unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["id"], 4);
        assert_eq!(v["url"], "http://x/a");
        assert_eq!(v["language_code"], "ru");
        assert_eq!(TokenizedDocument::decode_entry(&line).unwrap(), (4, meta));
    }

    #[test]
    fn tokens_survive_parts() {
        let doc = TokenizedDocument::new(2, "u", "en", vec!["b".into(), "a".into(), "b".into()]);
        let (id, meta, payload) = doc.clone().into_parts().unwrap();
        assert_eq!(payload, "b\na\nb");
        assert_eq!(TokenizedDocument::from_parts(id, meta, payload), doc);
    }

    #[test]
    fn empty_token_list_survives_parts() {
        let doc = TokenizedDocument::new(0, "u", "en", vec![]);
        let (id, meta, payload) = doc.clone().into_parts().unwrap();
        assert!(payload.is_empty());
        assert_eq!(TokenizedDocument::from_parts(id, meta, payload), doc);
    }

    #[test]
    fn bad_tokens_are_rejected() {
        let empty = TokenizedDocument::new(5, "u", "en", vec!["".into()]);
        assert!(matches!(empty.into_parts(), Err(StoreError::InvalidDocument { id: 5, .. })));
        let split = TokenizedDocument::new(6, "u", "en", vec!["a\nb".into()]);
        assert!(matches!(split.into_parts(), Err(StoreError::InvalidDocument { id: 6, .. })));
    }
}
