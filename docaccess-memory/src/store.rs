//! In-memory storage implementation.
//!
//! Documents live in insertion order per namespace, so "the first matching
//! document" is the earliest inserted one still present.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::oid::ObjectId;
use mea::rwlock::RwLock;
use tracing::debug;

use docaccess_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{AccessError, AccessResult},
    query::{FieldLookup, FindOptions, Namespace, SortDirection, WriteSummary},
    value::{DataMap, DataMapExt, Value},
};

use crate::evaluator::{FilterEvaluator, total_cmp, values_equal};

type CollectionRows = Vec<DataMap>;
type StoreMap = HashMap<Namespace, CollectionRows>;


/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so
/// clones share the same data and can be handed to concurrent tasks.
///
/// Queries scan the whole collection. Filters support equality, dotted
/// paths, `$eq $ne $gt $gte $lt $lte $in $nin $exists` and
/// `$and $or $nor`; anything else is [`AccessError::Unsupported`].
///
/// Sorting follows BSON type order. Timestamps and binary values compare by
/// value, but `Decimal128` and other rarely used raw kinds compare by their
/// debug rendering rather than numerically.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// namespace -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn position(rows: &[DataMap], filter: &DataMap) -> AccessResult<Option<usize>> {
        for (index, row) in rows.iter().enumerate() {
            if FilterEvaluator::matches(row, filter)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    fn duplicate_key(namespace: &Namespace, id: &Value) -> AccessError {
        AccessError::Backend(format!(
            "E11000 duplicate key error collection: {namespace} index: _id_ dup key: {{ _id: {} }}",
            id.to_text(),
        ))
    }

    /// Applies `$set` semantics to a copy of `row`.
    fn merge(row: &DataMap, set: DataMap) -> AccessResult<DataMap> {
        let mut merged = row.clone();

        for (path, value) in set {
            if path == "_id" && row.get("_id").is_some_and(|id| !values_equal(id, &value)) {
                return Err(AccessError::InvalidDocument(
                    "Performing an update on the path '_id' would modify the immutable field '_id'".into(),
                ));
            }

            Self::set_path(&mut merged, &path, value)?;
        }

        Ok(merged)
    }

    fn set_path(target: &mut DataMap, path: &str, value: Value) -> AccessResult<()> {
        match path.split_once('.') {
            None => {
                target.insert(path.to_string(), value);
                Ok(())
            }
            Some((head, rest)) => {
                let child = target
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Map(DataMap::new()));

                Self::set_in_value(child, head, rest, value)
            }
        }
    }

    /// Sets `path` inside `child`, the value stored under the segment `head`.
    ///
    /// Arrays take a numeric segment; setting past the end pads with nulls.
    fn set_in_value(child: &mut Value, head: &str, path: &str, value: Value) -> AccessResult<()> {
        let (segment, rest) = match path.split_once('.') {
            Some((segment, rest)) => (segment, Some(rest)),
            None => (path, None),
        };

        match child {
            Value::Map(map) => Self::set_path(map, path, value),
            Value::Array(items) => {
                let index = segment.parse::<usize>().map_err(|_| {
                    AccessError::InvalidDocument(format!(
                        "Cannot create field '{segment}' in element {{{head}: {}}}",
                        Value::Array(items.clone()).to_text(),
                    ))
                })?;

                if items.len() <= index {
                    items.resize(index + 1, Value::Null);
                }

                match rest {
                    None => {
                        items[index] = value;
                        Ok(())
                    }
                    Some(rest) => {
                        if items[index].is_null() {
                            items[index] = Value::Map(DataMap::new());
                        }
                        Self::set_in_value(&mut items[index], segment, rest, value)
                    }
                }
            }
            other => Err(AccessError::InvalidDocument(format!(
                "Cannot create field '{segment}' in element {{{head}: {}}}",
                other.to_text(),
            ))),
        }
    }

    fn sort_rows(rows: &mut [DataMap], options: &FindOptions) {
        if options.sort.is_empty() {
            return;
        }

        rows.sort_by(|a, b| {
            options.sort.iter().fold(Ordering::Equal, |ordering, key| {
                ordering.then_with(|| {
                    let left = a.get_path(&key.field).unwrap_or(&Value::Null);
                    let right = b.get_path(&key.field).unwrap_or(&Value::Null);

                    match key.direction {
                        SortDirection::Asc => total_cmp(left, right),
                        SortDirection::Desc => total_cmp(right, left),
                    }
                })
            })
        });
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_one(&self, namespace: &Namespace, mut document: DataMap) -> AccessResult<Value> {
        let mut store = self.store.write().await;
        let rows = store
            .entry(namespace.clone())
            .or_default();

        let id = document
            .entry("_id".to_string())
            .or_insert_with(|| Value::ObjectId(ObjectId::new()))
            .clone();

        if rows.iter().any(|row| row.get("_id").is_some_and(|existing| values_equal(existing, &id))) {
            return Err(Self::duplicate_key(namespace, &id));
        }

        rows.push(document);

        Ok(id)
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        set: DataMap,
    ) -> AccessResult<WriteSummary> {
        let mut store = self.store.write().await;
        let Some(rows) = store.get_mut(namespace) else {
            return Ok(WriteSummary::default());
        };
        let Some(index) = Self::position(rows, filter)? else {
            return Ok(WriteSummary::default());
        };

        let merged = Self::merge(&rows[index], set)?;
        let affected = u64::from(merged != rows[index]);
        rows[index] = merged;

        Ok(WriteSummary { matched: 1, affected })
    }

    async fn delete_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<WriteSummary> {
        let mut store = self.store.write().await;
        let Some(rows) = store.get_mut(namespace) else {
            return Ok(WriteSummary::default());
        };
        let Some(index) = Self::position(rows, filter)? else {
            return Ok(WriteSummary::default());
        };

        rows.remove(index);

        Ok(WriteSummary { matched: 1, affected: 1 })
    }

    async fn find_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<Option<DataMap>> {
        let store = self.store.read().await;
        let Some(rows) = store.get(namespace) else {
            return Ok(None);
        };

        Ok(Self::position(rows, filter)?.map(|index| rows[index].clone()))
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        options: FindOptions,
    ) -> AccessResult<Vec<DataMap>> {
        let store = self.store.read().await;
        let Some(rows) = store.get(namespace) else {
            return Ok(vec![]);
        };

        let mut matched = FilterEvaluator::filter_documents(rows, filter)?
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();

        Self::sort_rows(&mut matched, &options);

        if let Some(limit) = options.limit {
            matched.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        debug!(namespace = %namespace, returned = matched.len(), "in-memory find");

        Ok(matched)
    }

    async fn count(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<u64> {
        let store = self.store.read().await;
        let Some(rows) = store.get(namespace) else {
            return Ok(0);
        };

        Ok(FilterEvaluator::filter_documents(rows, filter)?.len() as u64)
    }

    async fn field_value(&self, namespace: &Namespace, lookup: &FieldLookup) -> AccessResult<Option<Value>> {
        if lookup.is_text_search() {
            return Err(AccessError::Unsupported("$text search needs a text index".into()));
        }

        Ok(self
            .find_one(namespace, &lookup.filter)
            .await?
            .and_then(|document| document.get_path(&lookup.field).cloned()))
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// Collections can be pre-populated with [`seed`](Self::seed), which is
/// handy for tests.
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    seeds: Vec<(Namespace, Vec<DataMap>)>,
}

impl InMemoryStoreBuilder {
    /// Queues documents to be inserted into `namespace` when the store is built.
    pub fn seed(mut self, namespace: Namespace, documents: Vec<DataMap>) -> Self {
        self.seeds.push((namespace, documents));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds the store and inserts any seeded documents.
    ///
    /// Seeds go through [`StoreBackend::insert_one`], so documents without an
    /// `_id` get one and duplicate ids fail the build.
    async fn build(self) -> AccessResult<Self::Backend> {
        let store = InMemoryStore::new();

        for (namespace, documents) in self.seeds {
            for document in documents {
                store.insert_one(&namespace, document).await?;
            }
        }

        Ok(store)
    }
}
