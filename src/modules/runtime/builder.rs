//! Request builder
//!
//! Turns a CRUD call into a [`RequestContext`]: call-scoped config with
//! overrides applied, resolved verb, resource pathname and single-resource
//! id. Calls that address many records through a `where` clause are reported
//! as [`Prepared::FanOut`] instead.

use restbridge_core::{ConnectionConfig, QueryOptions, RestError};
use restbridge_types::{CrudMethod, HttpVerb};
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::RequestContext;

/// Capability replacing the default `pathname/resource[/action]` rule
///
/// Receives the call-scoped config with `resource` already resolved.
pub trait PathnameResolver: Send + Sync {
    fn pathname(
        &self,
        config: &ConnectionConfig,
        verb: HttpVerb,
        values: Option<&Value>,
        options: &QueryOptions,
    ) -> String;
}

impl<F> PathnameResolver for F
where
    F: Fn(&ConnectionConfig, HttpVerb, Option<&Value>, &QueryOptions) -> String + Send + Sync,
{
    fn pathname(
        &self,
        config: &ConnectionConfig,
        verb: HttpVerb,
        values: Option<&Value>,
        options: &QueryOptions,
    ) -> String {
        self(config, verb, values, options)
    }
}

/// Outcome of preparing a call
#[derive(Debug)]
pub enum Prepared {
    /// One request, ready for the before hooks
    Single(Box<RequestContext>),
    /// Bulk update/destroy: resolve ids with `find`, then replay per id
    FanOut(QueryOptions),
}

/// Prepares calls against one connection
pub struct RequestBuilder<'a> {
    identity: &'a str,
    config: &'a ConnectionConfig,
    resolver: Option<&'a dyn PathnameResolver>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a ConnectionConfig) -> Self {
        Self {
            identity: &config.identity,
            config,
            resolver: None,
        }
    }

    /// Use a custom pathname resolver
    pub fn with_resolver(mut self, resolver: Option<&'a dyn PathnameResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Prepare a call
    pub fn prepare(
        &self,
        collection: &str,
        method: CrudMethod,
        options: Option<QueryOptions>,
        values: Option<Value>,
    ) -> Result<Prepared, RestError> {
        let mut options = options.unwrap_or_default();

        // Call-scoped copy; keys shared with the config override it
        let mut config = self.config.with_overrides(&options.extra)?;
        debug!(
            "Prepared config for {} {}.{}",
            method, self.identity, collection
        );

        let verb = config.methods.resolve(method)?;

        let resource = config.resource_name(collection);
        config.resource = Some(resource.clone());
        let base_url = config.base_url()?;

        let pathname = match self.resolver {
            Some(resolver) => resolver.pathname(&config, verb, values.as_ref(), &options),
            None => config.resource_pathname(&resource),
        };
        debug!("Resolved pathname {} for {}", pathname, collection);

        let id = options.take_single_id();

        // Any `where` without a single id selects records through a find
        if id.is_none() && method.fans_out() && options.where_clause.is_some() {
            debug!("{} on {} fans out over matching records", method, collection);
            return Ok(Prepared::FanOut(options));
        }

        let remaining = self.remaining_options(&options)?;
        let query = config.query.clone();

        Ok(Prepared::Single(Box::new(RequestContext {
            identity: self.identity.to_string(),
            collection: collection.to_string(),
            method,
            verb,
            config,
            base_url,
            pathname,
            id,
            where_clause: options.where_clause.take().unwrap_or_default(),
            options: remaining,
            values,
            query,
            body: None,
            endpoint: None,
        })))
    }

    /// Pagination plus every extra option that is not a config key
    fn remaining_options(&self, options: &QueryOptions) -> Result<Map<String, Value>, RestError> {
        let config_keys = match serde_json::to_value(self.config)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let mut remaining = options.pagination();
        for (key, value) in &options.extra {
            if !config_keys.contains_key(key) {
                remaining.insert(key.clone(), value.clone());
            }
        }
        Ok(remaining)
    }
}
