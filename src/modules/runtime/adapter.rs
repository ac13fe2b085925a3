//! Adapter facade
//!
//! Every CRUD call walks the same path: look up the connection, prepare the
//! request (option merge and path resolution), run the before hooks, answer
//! from the cache or dispatch to the transport, run the after hooks, then
//! normalize. Bulk update/destroy first resolves the matching ids with a
//! `find` and replays the operation once per id.

use futures::stream::{self, StreamExt, TryStreamExt};
use restbridge_core::{
    is_scalar_id, AdapterConfig, CollectionDefinition, QueryOptions, RestError,
};
use restbridge_types::{CrudMethod, Record};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::builder::Prepared;
use crate::context::{RequestContext, ResponseContext};
use crate::normalizer::Normalizer;
use crate::registry::{Connection, ConnectionRegistry, Registration};

/// Replays issued concurrently during a bulk update/destroy
pub const DEFAULT_FAN_OUT_CONCURRENCY: usize = 4;

/// Result of one call before it is narrowed to the caller's type
enum Outcome {
    Records(Vec<Record>),
    Record(Record),
    Done,
}

impl Outcome {
    fn into_records(self) -> Vec<Record> {
        match self {
            Outcome::Records(records) => records,
            Outcome::Record(record) => vec![record],
            Outcome::Done => Vec::new(),
        }
    }

    fn into_record(self) -> Record {
        match self {
            Outcome::Record(record) => record,
            Outcome::Records(records) => records.into_iter().next().unwrap_or_default(),
            Outcome::Done => Map::new(),
        }
    }
}

/// Storage adapter mapping CRUD calls onto REST requests
pub struct RestAdapter {
    registry: Arc<ConnectionRegistry>,
    fan_out_concurrency: usize,
}

impl RestAdapter {
    /// Create an adapter with an empty registry
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ConnectionRegistry::new()))
    }

    /// Create an adapter over an existing registry
    pub fn with_registry(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }

    /// Set how many replays of a bulk update/destroy run at once
    pub fn with_fan_out_concurrency(mut self, concurrency: usize) -> Self {
        self.fan_out_concurrency = concurrency.max(1);
        self
    }

    /// Register every connection of a parsed configuration together with the
    /// collections bound to it
    pub async fn from_config(config: &AdapterConfig) -> Result<Self, RestError> {
        let adapter = Self::new();

        let registrations = config.connections.iter().map(|connection| {
            config
                .collections
                .iter()
                .filter(|collection| collection.connection == connection.identity)
                .fold(Registration::new(connection.clone()), |registration, collection| {
                    registration.with_collection(&collection.name, collection.attributes.clone())
                })
        });

        futures::future::try_join_all(
            registrations.map(|registration| adapter.registry.register(registration)),
        )
        .await?;

        info!(
            "Adapter ready with {} connection(s)",
            config.connections.len()
        );
        Ok(adapter)
    }

    /// Underlying connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Register a connection
    pub async fn register(&self, registration: Registration) -> Result<(), RestError> {
        self.registry.register(registration).await.map(|_| ())
    }

    /// Unregister one connection, or all of them
    pub async fn teardown(&self, identity: Option<&str>) {
        self.registry.unregister(identity).await
    }

    /// Store a collection definition
    pub async fn define(
        &self,
        identity: &str,
        collection: &str,
        definition: CollectionDefinition,
    ) -> Result<(), RestError> {
        self.registry.define(identity, collection, definition).await
    }

    /// Stored collection definition, if any
    pub async fn describe(
        &self,
        identity: &str,
        collection: &str,
    ) -> Result<Option<CollectionDefinition>, RestError> {
        self.registry.describe(identity, collection).await
    }

    /// Dropping a collection is not something a REST API exposes; succeeds
    /// without a request once the connection is known
    pub async fn drop_collection(
        &self,
        identity: &str,
        collection: &str,
        relations: &[String],
    ) -> Result<(), RestError> {
        self.registry.get(identity).await?;
        debug!(
            "Drop of '{}' on '{}' ({} relation(s)) is a no-op",
            collection,
            identity,
            relations.len()
        );
        Ok(())
    }

    /// Create a record
    pub async fn create(
        &self,
        identity: &str,
        collection: &str,
        values: Value,
    ) -> Result<Record, RestError> {
        self.call(identity, collection, CrudMethod::Create, None, Some(values))
            .await
            .map(Outcome::into_record)
    }

    /// Find records; always a sequence
    pub async fn find(
        &self,
        identity: &str,
        collection: &str,
        options: QueryOptions,
    ) -> Result<Vec<Record>, RestError> {
        self.call(identity, collection, CrudMethod::Find, Some(options), None)
            .await
            .map(Outcome::into_records)
    }

    /// Update one record (`where.id`) or every matching record
    ///
    /// A bulk update returns the record produced by the last replay, or an
    /// empty record when nothing matched.
    pub async fn update(
        &self,
        identity: &str,
        collection: &str,
        options: QueryOptions,
        values: Value,
    ) -> Result<Record, RestError> {
        self.call(identity, collection, CrudMethod::Update, Some(options), Some(values))
            .await
            .map(Outcome::into_record)
    }

    /// Destroy one record (`where.id`) or every matching record
    pub async fn destroy(
        &self,
        identity: &str,
        collection: &str,
        options: QueryOptions,
    ) -> Result<(), RestError> {
        self.call(identity, collection, CrudMethod::Destroy, Some(options), None)
            .await
            .map(|_| ())
    }

    async fn call(
        &self,
        identity: &str,
        collection: &str,
        method: CrudMethod,
        options: Option<QueryOptions>,
        values: Option<Value>,
    ) -> Result<Outcome, RestError> {
        let result = self
            .execute(identity, collection, method, options, values)
            .await;

        if let Err(e) = &result {
            if e.is_error() {
                error!("{} {}.{} failed: {}", method, identity, collection, e);
            } else {
                warn!("{} {}.{} failed: {}", method, identity, collection, e);
            }
        }
        result
    }

    async fn execute(
        &self,
        identity: &str,
        collection: &str,
        method: CrudMethod,
        options: Option<QueryOptions>,
        values: Option<Value>,
    ) -> Result<Outcome, RestError> {
        let connection = self.registry.get(identity).await?;

        let prepared = connection
            .request_builder()
            .prepare(collection, method, options, values.clone())?;

        match prepared {
            Prepared::Single(ctx) => self.dispatch(&connection, *ctx, true).await,
            Prepared::FanOut(options) => {
                self.fan_out(&connection, collection, method, options, values)
                    .await
            }
        }
    }

    /// Resolve matching ids with `find`, then replay `method` once per id
    async fn fan_out(
        &self,
        connection: &Connection,
        collection: &str,
        method: CrudMethod,
        options: QueryOptions,
        values: Option<Value>,
    ) -> Result<Outcome, RestError> {
        let lookup = single(
            connection
                .request_builder()
                .prepare(collection, CrudMethod::Find, Some(options), None)?,
        )?;
        // Matches must reflect the API now, not an earlier lookup
        let matches = self.dispatch(connection, lookup, false).await?.into_records();

        let ids: Vec<Value> = matches
            .into_iter()
            .filter_map(|record| match record.get("id") {
                Some(id) if is_scalar_id(id) => Some(id.clone()),
                _ => {
                    warn!("Skipping matched {} record without a usable id", collection);
                    None
                }
            })
            .collect();

        info!(
            "{} {} replays over {} matching record(s)",
            method,
            collection,
            ids.len()
        );

        let outcomes: Vec<Outcome> = stream::iter(ids)
            .map(move |id| {
                let values = values.clone();
                async move {
                    let ctx = single(connection.request_builder().prepare(
                        collection,
                        method,
                        Some(QueryOptions::by_id(id)),
                        values,
                    )?)?;
                    self.dispatch(connection, ctx, true).await
                }
            })
            .buffered(self.fan_out_concurrency)
            .try_collect()
            .await?;

        Ok(match outcomes.into_iter().last() {
            Some(last) => last,
            None if method == CrudMethod::Update => Outcome::Record(Map::new()),
            None => Outcome::Done,
        })
    }

    /// Run one prepared request through hooks, cache, transport and normalizer
    ///
    /// With `use_cache` off, a `find` neither reads nor fills the cache.
    async fn dispatch(
        &self,
        connection: &Connection,
        mut ctx: RequestContext,
        use_cache: bool,
    ) -> Result<Outcome, RestError> {
        connection.hooks().run_before(&mut ctx).await?;
        let request = ctx.to_request()?;
        let method = ctx.method;
        let read_cache = connection.cache().filter(|_| use_cache);

        if method == CrudMethod::Find {
            if let Some(cache) = read_cache {
                match cache.get(&request.url).await {
                    Ok(Some(cached)) => {
                        debug!("Cache hit for {}", request.url);
                        return Ok(Outcome::Records(records_from_cache(cached)));
                    }
                    Ok(None) => debug!("Cache miss for {}", request.url),
                    Err(e) => warn!("Cache lookup for {} failed: {}", request.url, e),
                }
            }
        }

        debug!("Dispatching {} {}", request.verb.as_wire(), request.url);
        let response = connection.transport().send(&request).await?;

        let mut response_ctx = ResponseContext {
            identity: ctx.identity,
            collection: ctx.collection,
            method,
            url: request.url.clone(),
            status: response.status,
            body: response.body,
        };
        connection.hooks().run_after(&mut response_ctx).await?;

        match response_ctx.status {
            404 if method == CrudMethod::Find => {
                debug!("{} returned 404, answering with no records", request.url);
                return Ok(Outcome::Records(Vec::new()));
            }
            404 => return Err(RestError::NotFound(request.url)),
            status if status >= 400 => {
                let message = error_message(&response_ctx.body, status);
                return Err(RestError::status(status, message, response_ctx.body));
            }
            _ => {}
        }

        let definition = connection.describe(&response_ctx.collection).await;
        let normalizer = Normalizer::new(definition.as_ref(), connection.formatters());

        let outcome = match method {
            CrudMethod::Find => {
                let records = normalizer.to_collection(response_ctx.body);
                if let Some(cache) = read_cache {
                    let cached = Value::Array(records.iter().cloned().map(Value::Object).collect());
                    if let Err(e) = cache.set(&request.url, cached).await {
                        warn!("Cache store for {} failed: {}", request.url, e);
                    }
                }
                Outcome::Records(records)
            }
            CrudMethod::Create | CrudMethod::Update => {
                Outcome::Record(normalizer.to_record(response_ctx.body))
            }
            CrudMethod::Destroy => Outcome::Done,
        };

        if method.is_mutation() {
            if let Some(cache) = connection.cache() {
                debug!("Invalidating cache entry {}", request.url);
                if let Err(e) = cache.del(&request.url).await {
                    warn!("Cache invalidation for {} failed: {}", request.url, e);
                }
            }
        }

        Ok(outcome)
    }
}

impl Default for RestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn single(prepared: Prepared) -> Result<RequestContext, RestError> {
    match prepared {
        Prepared::Single(ctx) => Ok(*ctx),
        Prepared::FanOut(_) => Err(RestError::Internal(
            "id-addressed request unexpectedly fanned out".to_string(),
        )),
    }
}

fn records_from_cache(cached: Value) -> Vec<Record> {
    match cached {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect(),
        Value::Object(record) => vec![record],
        _ => Vec::new(),
    }
}

/// Best human-readable message for a failing response
fn error_message(body: &Value, status: u16) -> String {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| body.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}
