//! In-memory datastore.
//!
//! Collections live behind a single `RwLock`; reads run concurrently and the
//! lock is never held across an await point other than its own acquisition.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::datastore::{Datastore, DatastoreError, Filter, FindQuery};
use crate::rest::document::{Document, ObjectId, Value, document_from_json};
use crate::rest::query::SortOrder;

const ID_FIELD: &str = "_id";

#[derive(Debug, Default)]
pub struct MemoryDatastore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from seed documents; see [`MemoryDatastore::insert`].
    pub fn seeded(seed: &BTreeMap<String, Vec<serde_json::Map<String, serde_json::Value>>>) -> Self {
        let collections = seed
            .iter()
            .map(|(source, docs)| {
                let docs = docs
                    .iter()
                    .cloned()
                    .map(|doc| with_id(document_from_json(doc)))
                    .collect::<Vec<_>>();
                tracing::info!(source = %source, documents = docs.len(), "Seeded collection");
                (source.clone(), docs)
            })
            .collect();

        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Stores `doc`, assigning a fresh `_id` when it has none, and returns the
    /// stored copy.
    pub async fn insert(&self, source: &str, doc: Document) -> Document {
        let doc = with_id(doc);
        self.collections
            .write()
            .await
            .entry(source.to_string())
            .or_default()
            .push(doc.clone());
        doc
    }
}

fn with_id(mut doc: Document) -> Document {
    doc.entry(ID_FIELD.to_string())
        .or_insert_with(|| Value::ObjectId(ObjectId::generate()));
    doc
}

fn matches(doc: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| doc.get(field).is_some_and(|v| v.loosely_equals(expected)))
}

fn compare(a: &Document, b: &Document, sort: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort {
        let ord = match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => x.sort_cmp(y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ord = match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn find(&self, source: &str, query: &FindQuery) -> Result<Vec<Document>, DatastoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(source) else {
            return Ok(Vec::new());
        };

        let mut found: Vec<&Document> = docs.iter().filter(|d| matches(d, &query.filter)).collect();
        if !query.sort.is_empty() {
            found.sort_by(|a, b| compare(a, b, &query.sort));
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(found.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn count(&self, source: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(source)
            .map_or(0, |docs| docs.iter().filter(|d| matches(d, filter)).count() as u64))
    }

    async fn remove(&self, source: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(source) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|d| !matches(d, filter));
        Ok((before - docs.len()) as u64)
    }
}
