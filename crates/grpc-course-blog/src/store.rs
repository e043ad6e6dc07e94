//! Document store seam for the blog service.
//!
//! The service is written against the [`DocumentStore`] trait - the four
//! store primitives plus a cursor-style `find_all` - and receives its store
//! handle at construction time instead of reaching for ambient global state.
//! [`MemoryStore`] is the shipped implementation; a real document database
//! driver would implement the same trait.

use core::fmt;
use futures::StreamExt;
use futures::stream::BoxStream;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors surfaced by a document store backend.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// No document matches the given id.
    #[error("document not found")]
    NotFound,

    /// The backend itself failed (connection loss, corrupt cursor, ...).
    #[error("store backend error: {context}")]
    Backend { context: String },
}

/// The id string was not 24 hexadecimal characters.
#[derive(Clone, thiserror::Error, Debug)]
#[error("cannot parse id `{input}`")]
pub struct ParseIdError {
    input: String,
}

/// Opaque document identity: 12 bytes, rendered as 24 hex characters on the
/// wire.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId([u8; 12]);

impl DocumentId {
    /// Creates a fresh id: four bytes of unix time followed by eight random
    /// bytes, so ids sort roughly by creation time.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; 12];
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        let tail: [u8; 8] = rand::random();
        bytes[4..].copy_from_slice(&tail);
        Self(bytes)
    }

    /// Parses the wire form. Anything but exactly 24 hex characters is a
    /// parse failure, which callers must keep distinct from not-found.
    pub fn parse(input: &str) -> Result<Self, ParseIdError> {
        let raw = input.as_bytes();
        if raw.len() != 24 {
            return Err(ParseIdError {
                input: input.to_string(),
            });
        }

        let mut bytes = [0_u8; 12];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            match (hex_val(pair[0]), hex_val(pair[1])) {
                (Some(hi), Some(lo)) => bytes[i] = (hi << 4) | lo,
                _ => {
                    return Err(ParseIdError {
                        input: input.to_string(),
                    });
                }
            }
        }
        Ok(Self(bytes))
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({self})")
    }
}

/// One stored blog document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlogDocument {
    pub id: DocumentId,
    pub author_id: String,
    pub title: String,
    pub content: String,
}

/// The four store primitives plus a cursor-style scan, async because every
/// real backend suspends on I/O.
#[tonic::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores the document under a freshly assigned id and returns that id.
    async fn insert_one(&self, doc: BlogDocument) -> Result<DocumentId, StoreError>;

    /// Returns the document with the given id, or [`StoreError::NotFound`].
    async fn find_one(&self, id: DocumentId) -> Result<BlogDocument, StoreError>;

    /// Replaces the document stored under `id` wholesale.
    async fn replace_one(&self, id: DocumentId, doc: BlogDocument) -> Result<(), StoreError>;

    /// Removes the document with the given id, or [`StoreError::NotFound`].
    async fn delete_one(&self, id: DocumentId) -> Result<(), StoreError>;

    /// Lazy cursor over every stored document.
    fn find_all(&self) -> BoxStream<'static, Result<BlogDocument, StoreError>>;
}

/// In-memory [`DocumentStore`]. A `BTreeMap` keeps `find_all` order stable
/// across runs.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<DocumentId, BlogDocument>>,
}

#[tonic::async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, mut doc: BlogDocument) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        doc.id = id;
        self.docs.write().insert(id, doc);
        Ok(id)
    }

    async fn find_one(&self, id: DocumentId) -> Result<BlogDocument, StoreError> {
        self.docs.read().get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn replace_one(&self, id: DocumentId, mut doc: BlogDocument) -> Result<(), StoreError> {
        doc.id = id;
        let mut docs = self.docs.write();
        match docs.get_mut(&id) {
            Some(slot) => {
                *slot = doc;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_one(&self, id: DocumentId) -> Result<(), StoreError> {
        match self.docs.write().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    fn find_all(&self) -> BoxStream<'static, Result<BlogDocument, StoreError>> {
        // Snapshot under the lock; the cursor itself never blocks writers.
        let docs: Vec<BlogDocument> = self.docs.read().values().cloned().collect();
        futures::stream::iter(docs.into_iter().map(Ok)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(author: &str, title: &str, content: &str) -> BlogDocument {
        BlogDocument {
            id: DocumentId::generate(),
            author_id: author.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn id_round_trips_through_its_wire_form() {
        let id = DocumentId::generate();
        let hex = id.to_string();
        assert_eq!(hex.len(), 24);
        assert_eq!(DocumentId::parse(&hex).unwrap(), id);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(DocumentId::parse("").is_err());
        assert!(DocumentId::parse("abc").is_err());
        assert!(DocumentId::parse("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(DocumentId::parse("0123456789abcdef012345678").is_err());
    }

    #[tokio::test]
    async fn insert_then_find_returns_the_same_fields() {
        let store = MemoryStore::default();
        let id = store
            .insert_one(doc("author-1", "First post", "Hello world"))
            .await
            .unwrap();

        let found = store.find_one(id).await.unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.author_id, "author-1");
        assert_eq!(found.title, "First post");
        assert_eq!(found.content, "Hello world");
    }

    #[tokio::test]
    async fn find_one_on_an_absent_id_is_not_found() {
        let store = MemoryStore::default();
        let absent = DocumentId::parse("0123456789abcdef01234567").unwrap();
        assert_eq!(store.find_one(absent).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn replace_one_overwrites_in_place() {
        let store = MemoryStore::default();
        let id = store
            .insert_one(doc("author-1", "Old title", "Old content"))
            .await
            .unwrap();

        store
            .replace_one(id, doc("author-2", "New title", "New content"))
            .await
            .unwrap();

        let found = store.find_one(id).await.unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.author_id, "author-2");
        assert_eq!(found.title, "New title");
    }

    #[tokio::test]
    async fn delete_one_removes_the_document() {
        let store = MemoryStore::default();
        let id = store.insert_one(doc("a", "t", "c")).await.unwrap();

        store.delete_one(id).await.unwrap();
        assert_eq!(store.find_one(id).await, Err(StoreError::NotFound));
        assert_eq!(store.delete_one(id).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn find_all_streams_every_document() {
        let store = MemoryStore::default();
        for n in 0..3 {
            store
                .insert_one(doc("author", &format!("post {n}"), "content"))
                .await
                .unwrap();
        }

        let mut cursor = store.find_all();
        let mut seen = 0;
        while let Some(next) = cursor.next().await {
            next.unwrap();
            seen += 1;
        }
        assert_eq!(seen, 3);
    }
}
