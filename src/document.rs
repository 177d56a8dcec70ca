//! Documents and the factory that creates them.
//!
//! A [`Document`] is an opaque value the engine passes between modules by
//! reference and never interprets: a source path, a destination path, a
//! metadata map, and a content provider. Modules receive and emit ordered,
//! immutable sequences of documents ([`Documents`]).

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata attached to a document. Values are opaque JSON.
pub type Metadata = HashMap<String, Value>;

/// Streams the content of a document on demand.
///
/// The engine never reads content itself; providers exist so modules can
/// defer I/O until a document is actually consumed.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Produce the full content as bytes.
    async fn content(&self) -> anyhow::Result<Vec<u8>>;
}

/// A provider with no content. The default for synthesized documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullContent;

#[async_trait]
impl ContentProvider for NullContent {
    async fn content(&self) -> anyhow::Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// In-memory string content.
#[derive(Debug, Clone)]
pub struct StringContent(String);

impl StringContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }
}

#[async_trait]
impl ContentProvider for StringContent {
    async fn content(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.0.clone().into_bytes())
    }
}

/// An immutable unit of content flowing through pipelines.
pub struct Document {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    metadata: Metadata,
    content: Arc<dyn ContentProvider>,
}

impl Document {
    /// Absolute path the document was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Output-relative path the document will be written to, if any.
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up a single metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn content_provider(&self) -> &Arc<dyn ContentProvider> {
        &self.content
    }

    /// Materialize the document content as bytes.
    pub async fn content(&self) -> anyhow::Result<Vec<u8>> {
        self.content.content().await
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// An ordered, immutable sequence of documents.
///
/// This is the unit threaded between modules. Cloning is cheap (a reference
/// count); the underlying slice is never mutated after construction.
#[derive(Debug, Clone)]
pub struct Documents(Arc<[Arc<Document>]>);

impl Documents {
    /// The empty sequence. Input phases start from this.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Document>> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Document>> {
        self.0.iter()
    }
}

impl Default for Documents {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl std::ops::Deref for Documents {
    type Target = [Arc<Document>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Arc<Document>>> for Documents {
    fn from(documents: Vec<Arc<Document>>) -> Self {
        Self(Arc::from(documents))
    }
}

impl FromIterator<Arc<Document>> for Documents {
    fn from_iter<I: IntoIterator<Item = Arc<Document>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Documents {
    type Item = &'a Arc<Document>;
    type IntoIter = std::slice::Iter<'a, Arc<Document>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Creates documents on behalf of modules.
///
/// Factory-level default metadata is merged under each document's own
/// metadata at creation; the document's values win on key collisions.
#[derive(Debug, Clone, Default)]
pub struct DocumentFactory {
    defaults: Metadata,
}

impl DocumentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metadata default applied to every created document.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Create a document.
    pub fn create(
        &self,
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
        metadata: Metadata,
        content: Arc<dyn ContentProvider>,
    ) -> Arc<Document> {
        let mut merged = self.defaults.clone();
        merged.extend(metadata);
        Arc::new(Document {
            source,
            destination,
            metadata: merged,
            content,
        })
    }

    /// Create a document and convert it into a caller-defined representation.
    pub fn create_as<T: From<Arc<Document>>>(
        &self,
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
        metadata: Metadata,
        content: Arc<dyn ContentProvider>,
    ) -> T {
        T::from(self.create(source, destination, metadata, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(factory: &DocumentFactory, dest: &str) -> Arc<Document> {
        factory.create(
            None,
            Some(PathBuf::from(dest)),
            Metadata::new(),
            Arc::new(NullContent),
        )
    }

    #[test]
    fn factory_merges_defaults_under_document_metadata() {
        let factory = DocumentFactory::new()
            .with_default("layout", "default")
            .with_default("draft", false);

        let mut metadata = Metadata::new();
        metadata.insert("layout".to_string(), json!("post"));
        let document = factory.create(None, None, metadata, Arc::new(NullContent));

        assert_eq!(document.get("layout"), Some(&json!("post")));
        assert_eq!(document.get("draft"), Some(&json!(false)));
    }

    #[test]
    fn documents_from_vec_preserves_order() {
        let factory = DocumentFactory::new();
        let documents: Documents =
            vec![doc(&factory, "a.html"), doc(&factory, "b.html")].into();

        assert_eq!(documents.len(), 2);
        assert_eq!(
            documents[0].destination(),
            Some(Path::new("a.html"))
        );
        assert_eq!(
            documents[1].destination(),
            Some(Path::new("b.html"))
        );
    }

    #[test]
    fn empty_documents_is_empty() {
        assert!(Documents::empty().is_empty());
        assert_eq!(Documents::default().len(), 0);
    }

    #[tokio::test]
    async fn string_content_round_trips_bytes() {
        let content = StringContent::new("hello");
        assert_eq!(content.content().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn null_content_is_empty() {
        assert!(NullContent.content().await.unwrap().is_empty());
    }

    #[test]
    fn create_as_converts_through_from() {
        struct Wrapper(Arc<Document>);
        impl From<Arc<Document>> for Wrapper {
            fn from(document: Arc<Document>) -> Self {
                Self(document)
            }
        }

        let factory = DocumentFactory::new();
        let wrapper: Wrapper = factory.create_as(
            None,
            Some(PathBuf::from("x.html")),
            Metadata::new(),
            Arc::new(NullContent),
        );
        assert_eq!(wrapper.0.destination(), Some(Path::new("x.html")));
    }
}
