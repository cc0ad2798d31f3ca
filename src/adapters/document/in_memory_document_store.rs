//! In-Memory Document Store Adapter
//!
//! Keeps records per record type in memory. Ids are generated from the
//! record type's abbreviation (`SO-00001`) and the display name comes from
//! the record type's title field when one is configured.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::RecordId;
use crate::domain::schema::RecordType;
use crate::ports::{Clock, Document, DocumentStore, DocumentStoreError};

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<RecordType, Vec<Document>>,
    counters: HashMap<RecordType, u64>,
    created: Vec<Document>,
}

/// In-memory record storage
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Inner>>,
    title_fields: Arc<HashMap<RecordType, String>>,
    clock: Arc<dyn Clock>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            title_fields: Arc::new(HashMap::new()),
            clock,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use these fields as display names, per record type.
    pub fn with_title_fields(mut self, title_fields: HashMap<RecordType, String>) -> Self {
        self.title_fields = Arc::new(title_fields);
        self
    }

    /// Make every call fail with `Unavailable` (for failure-path tests).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Records created through `create`, in order (seeded ones included).
    pub async fn created(&self) -> Vec<Document> {
        self.inner.read().await.created.clone()
    }

    /// Number of records of one type.
    pub async fn count(&self, record_type: &RecordType) -> usize {
        self.inner
            .read()
            .await
            .documents
            .get(record_type)
            .map_or(0, Vec::len)
    }

    fn check_available(&self) -> Result<(), DocumentStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::Unavailable(
                "document store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn display_name(&self, record_type: &RecordType, id: &RecordId, data: &Map<String, Value>) -> String {
        self.title_fields
            .get(record_type)
            .and_then(|field| data.get(field))
            .and_then(|value| match value {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| id.to_string())
    }
}

fn is_match(doc: &Document, id_or_name: &str) -> bool {
    let needle = id_or_name.trim();
    doc.id.as_str().eq_ignore_ascii_case(needle) || doc.name.eq_ignore_ascii_case(needle)
}

fn value_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (Some(Value::String(a)), Value::String(e)) => a.eq_ignore_ascii_case(e.trim()),
        (Some(a), e) => a == e,
        (None, _) => false,
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn exists(&self, record_type: &RecordType, id_or_name: &str) -> Result<bool, DocumentStoreError> {
        Ok(self.get(record_type, id_or_name).await?.is_some())
    }

    async fn create(
        &self,
        record_type: &RecordType,
        data: Map<String, Value>,
    ) -> Result<RecordId, DocumentStoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;

        let counter = inner.counters.entry(record_type.clone()).or_insert(0);
        *counter += 1;
        let id = RecordId::new(format!("{}-{:05}", record_type.abbreviation(), counter))
            .map_err(|e| DocumentStoreError::Invalid(e.to_string()))?;

        let document = Document {
            name: self.display_name(record_type, &id, &data),
            id: id.clone(),
            record_type: record_type.clone(),
            data,
            modified_at: self.clock.now(),
        };

        inner.created.push(document.clone());
        inner
            .documents
            .entry(record_type.clone())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn get(
        &self,
        record_type: &RecordType,
        id_or_name: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(record_type)
            .and_then(|docs| docs.iter().find(|d| is_match(d, id_or_name)))
            .cloned())
    }

    async fn update(
        &self,
        record_type: &RecordType,
        id_or_name: &str,
        changes: Map<String, Value>,
    ) -> Result<Document, DocumentStoreError> {
        self.check_available()?;
        let now = self.clock.now();
        let mut inner = self.inner.write().await;

        let doc = inner
            .documents
            .get_mut(record_type)
            .and_then(|docs| docs.iter_mut().find(|d| is_match(d, id_or_name)))
            .ok_or_else(|| DocumentStoreError::NotFound {
                record_type: record_type.clone(),
                id: id_or_name.to_string(),
            })?;

        doc.data.extend(changes);
        doc.modified_at = now;
        let name = self.display_name(record_type, &doc.id, &doc.data);
        doc.name = name;
        Ok(doc.clone())
    }

    async fn delete(&self, record_type: &RecordType, id_or_name: &str) -> Result<(), DocumentStoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let docs = inner.documents.get_mut(record_type);
        match docs.and_then(|docs| {
            docs.iter()
                .position(|d| is_match(d, id_or_name))
                .map(|index| docs.remove(index))
        }) {
            Some(_) => Ok(()),
            None => Err(DocumentStoreError::NotFound {
                record_type: record_type.clone(),
                id: id_or_name.to_string(),
            }),
        }
    }

    async fn list(
        &self,
        record_type: &RecordType,
        filters: &Map<String, Value>,
        limit: usize,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let mut docs: Vec<Document> = inner
            .documents
            .get(record_type)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| {
                        filters.iter().all(|(key, expected)| match key.as_str() {
                            "name" => expected.as_str().is_some_and(|n| is_match(doc, n)),
                            _ => value_matches(doc.data.get(key), expected),
                        })
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        docs.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        docs.truncate(limit);
        Ok(docs)
    }

    async fn list_names(&self, record_type: &RecordType) -> Result<Vec<String>, DocumentStoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(record_type)
            .map(|docs| docs.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default())
    }
}
