//! Per-collection CRUD helpers.
//!
//! [`Collection`] is the function-per-operation surface of the crate. Each
//! method issues exactly one backend call and translates its outcome.
//!
//! # Not-found handling
//!
//! Not-found is reported differently depending on the operation:
//!
//! - [`find_one`](Collection::find_one) and [`find_one_by_id`](Collection::find_one_by_id)
//!   return [`AccessError::NotFound`].
//! - Updates and deletes that match nothing succeed without effect.
//! - [`exists`](Collection::exists) returns `false` for both "no match" and
//!   any store failure.
//! - Field lookups return an empty string when nothing matches, when the
//!   field is absent and when the value is empty.

use tracing::debug;

use crate::{
    backend::StoreBackend,
    error::{AccessError, AccessResult},
    object_id::{id_filter, parse_object_id},
    query::{FieldLookup, FindOptions, Namespace, Sort, WriteSummary},
    value::{DataMap, Value},
};

/// A collection in one database, reached through a borrowed backend.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    namespace: Namespace,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(namespace: Namespace, backend: &'a B) -> Self {
        Self { namespace, backend }
    }

    /// Returns the database and collection this handle targets.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Inserts one document and returns its `_id`.
    ///
    /// # Errors
    ///
    /// Store errors such as a duplicate key are returned as
    /// [`AccessError::Backend`].
    pub async fn insert_one(&self, document: DataMap) -> AccessResult<Value> {
        debug!(namespace = %self.namespace, "insert_one");

        self.backend
            .insert_one(&self.namespace, document)
            .await
    }

    /// Sets the fields of `document` on the first document matching `filter`.
    ///
    /// A filter that matches nothing is not an error.
    pub async fn update_one(&self, document: DataMap, filter: &DataMap) -> AccessResult<()> {
        debug!(namespace = %self.namespace, "update_one");

        let summary = self.backend
            .update_one(&self.namespace, filter, document)
            .await?;

        self.log_noop("update_one", summary);

        Ok(())
    }

    /// Sets the fields of `document` on the document with the given hex id.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidObjectId`] if `id` does not parse.
    pub async fn update_one_by_id(&self, document: DataMap, id: &str) -> AccessResult<()> {
        self.update_one(document, &id_filter(parse_object_id(id)?))
            .await
    }

    /// Permanently removes the first document matching `filter`.
    ///
    /// A filter that matches nothing is not an error.
    pub async fn delete_one(&self, filter: &DataMap) -> AccessResult<()> {
        debug!(namespace = %self.namespace, "delete_one");

        let summary = self.backend
            .delete_one(&self.namespace, filter)
            .await?;

        self.log_noop("delete_one", summary);

        Ok(())
    }

    /// Permanently removes the document with the given hex id.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidObjectId`] if `id` does not parse.
    pub async fn delete_one_by_id(&self, id: &str) -> AccessResult<()> {
        self.delete_one(&id_filter(parse_object_id(id)?))
            .await
    }

    /// Returns the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NotFound`] when nothing matches.
    pub async fn find_one(&self, filter: &DataMap) -> AccessResult<DataMap> {
        debug!(namespace = %self.namespace, "find_one");

        self.backend
            .find_one(&self.namespace, filter)
            .await?
            .ok_or_else(|| AccessError::NotFound { namespace: self.namespace.to_string() })
    }

    /// Returns the document with the given hex id.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidObjectId`] if `id` does not parse and
    /// [`AccessError::NotFound`] when no document has that id.
    pub async fn find_one_by_id(&self, id: &str) -> AccessResult<DataMap> {
        self.find_one(&id_filter(parse_object_id(id)?))
            .await
    }

    /// Returns every document matching `filter` in the order given by `sort`.
    ///
    /// A `limit` of zero or less returns all matches. An empty result is `Ok`.
    pub async fn find(&self, filter: &DataMap, sort: &[Sort], limit: i64) -> AccessResult<Vec<DataMap>> {
        debug!(namespace = %self.namespace, limit, "find");

        self.backend
            .find(&self.namespace, filter, FindOptions::new(sort, limit))
            .await
    }

    /// Returns `true` if at least one document matches `filter`.
    ///
    /// Store failures are reported as `false`, the same as no match.
    pub async fn exists(&self, filter: &DataMap) -> bool {
        match self.backend.find_one(&self.namespace, filter).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                debug!(namespace = %self.namespace, error = %e, "exists lookup failed, reporting false");
                false
            }
        }
    }

    /// Counts the documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Timeout`] if the store's count budget elapses.
    pub async fn count_rows(&self, filter: &DataMap) -> AccessResult<u64> {
        debug!(namespace = %self.namespace, "count_rows");

        self.backend
            .count(&self.namespace, filter)
            .await
    }

    /// Returns the text form of `field` on the best-ranked match of `filter`.
    ///
    /// Returns an empty string when nothing matches or the field is absent.
    pub async fn get_field_value(&self, filter: &DataMap, field: &str) -> AccessResult<String> {
        debug!(namespace = %self.namespace, field, "get_field_value");

        let lookup = FieldLookup {
            filter: filter.clone(),
            field: field.to_string(),
        };

        Ok(self.backend
            .field_value(&self.namespace, &lookup)
            .await?
            .map(|value| value.to_text())
            .unwrap_or_default())
    }

    /// Returns the text form of `field` on the document with the given hex id.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidObjectId`] if `id` does not parse.
    pub async fn get_field_value_by_id(&self, id: &str, field: &str) -> AccessResult<String> {
        self.get_field_value(&id_filter(parse_object_id(id)?), field)
            .await
    }

    fn log_noop(&self, operation: &'static str, summary: WriteSummary) {
        if summary.is_noop() {
            debug!(namespace = %self.namespace, operation, "filter matched no document");
        }
    }
}
