use std::{env, time::Duration};

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{Client, Collection as MongoCollection, options::ClientOptions};
use tracing::{debug, info, warn};

use docaccess_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{AccessError, AccessResult},
    query::{FieldLookup, FindOptions, Namespace, WriteSummary},
    value::{DataMap, DataMapExt, Value, from_document, into_document, to_document},
};

use crate::{
    error::{backend_error, connection_error},
    query::{field_options, find_options},
};

/// Upper bound for establishing and validating the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
/// Server-side time budget for counting documents.
pub const DEFAULT_COUNT_MAX_TIME: Duration = Duration::from_secs(2);

/// Environment variable holding the connection string for [`MongoDbStoreBuilder::from_env`].
pub const URI_ENV: &str = "MONGODB_URI";
/// Optional environment variable naming the application to the server.
pub const APP_NAME_ENV: &str = "MONGODB_APP_NAME";


/// MongoDB-backed store.
///
/// Wraps one driver [`Client`], which pools connections internally and is
/// safe to share between tasks. The database and collection are chosen per
/// call.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    count_max_time: Duration,
}

impl MongoDbStore {
    /// Wraps an already configured client.
    pub fn new(client: Client) -> Self {
        Self { client, count_max_time: DEFAULT_COUNT_MAX_TIME }
    }

    pub fn builder(dsn: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn)
    }

    /// Returns the underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, namespace: &Namespace) -> MongoCollection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }

    async fn shutdown(self) -> AccessResult<()> {
        self.client.shutdown().await;
        info!("mongodb client shut down");

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_one(&self, namespace: &Namespace, document: DataMap) -> AccessResult<Value> {
        let result = self.get_collection(namespace)
            .insert_one(into_document(document))
            .await
            .map_err(backend_error)?;

        Ok(Value::from(result.inserted_id))
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        set: DataMap,
    ) -> AccessResult<WriteSummary> {
        let result = self.get_collection(namespace)
            .update_one(
                to_document(filter),
                doc! { "$set": into_document(set) },
            )
            .await
            .map_err(backend_error)?;

        Ok(WriteSummary {
            matched: result.matched_count,
            affected: result.modified_count,
        })
    }

    async fn delete_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<WriteSummary> {
        let result = self.get_collection(namespace)
            .delete_one(to_document(filter))
            .await
            .map_err(backend_error)?;

        Ok(WriteSummary {
            matched: result.deleted_count,
            affected: result.deleted_count,
        })
    }

    async fn find_one(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<Option<DataMap>> {
        Ok(
            self.get_collection(namespace)
                .find_one(to_document(filter))
                .await
                .map_err(backend_error)?
                .map(from_document)
        )
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: &DataMap,
        options: FindOptions,
    ) -> AccessResult<Vec<DataMap>> {
        Ok(
            self.get_collection(namespace)
                .find(to_document(filter))
                .with_options(find_options(&options))
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error)?
                .into_iter()
                .map(from_document)
                .collect()
        )
    }

    async fn count(&self, namespace: &Namespace, filter: &DataMap) -> AccessResult<u64> {
        self.get_collection(namespace)
            .count_documents(to_document(filter))
            .max_time(self.count_max_time)
            .await
            .map_err(backend_error)
    }

    async fn field_value(&self, namespace: &Namespace, lookup: &FieldLookup) -> AccessResult<Option<Value>> {
        let documents = self.get_collection(namespace)
            .find(to_document(&lookup.filter))
            .with_options(field_options(lookup))
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)?;

        Ok(
            documents
                .into_iter()
                .next()
                .map(from_document)
                .and_then(|document| document.get_path(&lookup.field).cloned())
        )
    }

    async fn shutdown(self) -> AccessResult<()> {
        self.shutdown().await
    }
}

/// Builder for [`MongoDbStore`].
///
/// Defaults: a 20 second bound on connecting and a 2 second server budget
/// for counts.
#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    connect_timeout: Duration,
    count_max_time: Duration,
    app_name: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            count_max_time: DEFAULT_COUNT_MAX_TIME,
            app_name: None,
        }
    }

    /// Reads the connection string from `MONGODB_URI` and the optional
    /// application name from `MONGODB_APP_NAME`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Connection`] if `MONGODB_URI` is not set.
    pub fn from_env() -> AccessResult<Self> {
        let dsn = env::var(URI_ENV)
            .map_err(|e| AccessError::Connection(format!("{URI_ENV}: {e}")))?;

        let builder = Self::new(&dsn);

        Ok(match env::var(APP_NAME_ENV) {
            Ok(name) => builder.app_name(name),
            Err(_) => builder,
        })
    }

    /// Bounds connection establishment and server selection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the server-side time budget for counts.
    pub fn count_max_time(mut self, max_time: Duration) -> Self {
        self.count_max_time = max_time;
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    fn apply(&self, mut options: ClientOptions) -> ClientOptions {
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.connect_timeout);
        if let Some(name) = &self.app_name {
            options.app_name = Some(name.clone());
        }
        options
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Connects and pings the server.
    ///
    /// Fails with [`AccessError::Connection`] for a malformed URI, an
    /// unreachable server, rejected credentials, or no answer within the
    /// connect timeout. There is no retry.
    async fn build(self) -> AccessResult<Self::Backend> {
        let options = self.apply(
            ClientOptions::parse(&self.dsn)
                .await
                .map_err(connection_error)?,
        );
        let hosts = options.hosts.clone();
        let client = Client::with_options(options).map_err(connection_error)?;

        debug!(?hosts, timeout = ?self.connect_timeout, "pinging mongodb");

        if let Err(e) = client
            .database("admin")
            .run_command(doc! { "ping": Bson::Int32(1) })
            .await
        {
            warn!(?hosts, error = %e, "mongodb connection failed");
            return Err(connection_error(e));
        }

        info!(?hosts, "connected to mongodb");

        Ok(MongoDbStore {
            client,
            count_max_time: self.count_max_time,
        })
    }
}
