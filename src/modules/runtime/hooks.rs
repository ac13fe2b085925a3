//! Before/after hook pipeline
//!
//! Before hooks shape the outgoing [`RequestContext`]; after hooks see the
//! [`ResponseContext`] before the normalizer does. Hooks run strictly in
//! order and the first failure stops the pipeline.

use async_trait::async_trait;
use restbridge_core::{merge::extend, HookSettings, RestError, PAGINATION_KEYS};
use restbridge_types::Record;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::{RequestContext, ResponseContext};
use crate::normalizer::{for_each_record, normalize_iso_string};

/// Hook run on the outgoing request context
#[async_trait]
pub trait BeforeHook: Send + Sync {
    async fn before(&self, ctx: &mut RequestContext) -> Result<(), RestError>;

    /// Name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

/// Hook run on the received response
#[async_trait]
pub trait AfterHook: Send + Sync {
    async fn after(&self, ctx: &mut ResponseContext) -> Result<(), RestError>;

    /// Name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

#[async_trait]
impl<F> BeforeHook for F
where
    F: Fn(&mut RequestContext) -> Result<(), RestError> + Send + Sync,
{
    async fn before(&self, ctx: &mut RequestContext) -> Result<(), RestError> {
        self(ctx)
    }
}

#[async_trait]
impl<F> AfterHook for F
where
    F: Fn(&mut ResponseContext) -> Result<(), RestError> + Send + Sync,
{
    async fn after(&self, ctx: &mut ResponseContext) -> Result<(), RestError> {
        self(ctx)
    }
}

/// Moves the `where` clause into the query string (reads) or the payload (mutations)
///
/// Reads get `where` plus pagination merged over the configured query.
/// Mutations send a non-empty `where` as the payload; otherwise the values,
/// merged over any remaining options.
pub struct FlattenWhere;

#[async_trait]
impl BeforeHook for FlattenWhere {
    async fn before(&self, ctx: &mut RequestContext) -> Result<(), RestError> {
        let where_clause = std::mem::take(&mut ctx.where_clause);

        if ctx.verb.is_read() {
            extend(&mut ctx.query, &where_clause);
            for key in PAGINATION_KEYS {
                if let Some(value) = ctx.options.get(key) {
                    ctx.query.insert(key.to_string(), value.clone());
                }
            }
            return Ok(());
        }

        if !where_clause.is_empty() {
            ctx.body = Some(Value::Object(where_clause));
            return Ok(());
        }

        ctx.body = match ctx.values.clone() {
            Some(Value::Object(values)) => {
                let mut body = ctx.options.clone();
                extend(&mut body, &values);
                Some(Value::Object(body))
            }
            Some(Value::Null) | None => None,
            Some(other) => Some(other),
        };
        Ok(())
    }

    fn name(&self) -> &str {
        "flatten-where"
    }
}

/// Formats the absolute endpoint from the base URL, resource path, id and query
pub struct ResolveEndpoint;

#[async_trait]
impl BeforeHook for ResolveEndpoint {
    async fn before(&self, ctx: &mut RequestContext) -> Result<(), RestError> {
        let mut endpoint = ctx.resource_url()?;

        let pairs: Vec<(&String, String)> = ctx
            .query
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s.clone())),
                other => Some((key, other.to_string())),
            })
            .collect();

        if !pairs.is_empty() {
            let mut serializer = endpoint.query_pairs_mut();
            for (key, value) in pairs {
                serializer.append_pair(key, &value);
            }
        }

        ctx.endpoint = Some(endpoint);
        Ok(())
    }

    fn name(&self) -> &str {
        "resolve-endpoint"
    }
}

/// Rewrites ISO-8601-looking string fields of successful responses into the
/// canonical UTC date form
pub struct CastIsoDates;

#[async_trait]
impl AfterHook for CastIsoDates {
    async fn after(&self, ctx: &mut ResponseContext) -> Result<(), RestError> {
        if !ctx.is_success() {
            return Ok(());
        }

        for_each_record(&mut ctx.body, &mut |record: &mut Record| {
            for value in record.values_mut() {
                if let Value::String(s) = value {
                    if let Some(normalized) = normalize_iso_string(s) {
                        *s = normalized;
                    }
                }
            }
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "cast-iso-dates"
    }
}

/// Ordered before/after hook lists of one connection
#[derive(Clone, Default)]
pub struct HookPipeline {
    before: Vec<Arc<dyn BeforeHook>>,
    after: Vec<Arc<dyn AfterHook>>,
}

impl HookPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in hooks: flatten `where`, resolve the endpoint, cast ISO dates
    pub fn defaults() -> Self {
        Self::new()
            .before(FlattenWhere)
            .before(ResolveEndpoint)
            .after(CastIsoDates)
    }

    /// Append a before hook
    pub fn before(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.before.push(Arc::new(hook));
        self
    }

    /// Append an after hook
    pub fn after(mut self, hook: impl AfterHook + 'static) -> Self {
        self.after.push(Arc::new(hook));
        self
    }

    /// Combine connection hooks with the defaults
    ///
    /// With `merge` set, connection hooks run after the defaults; otherwise
    /// they replace them.
    pub fn compose(settings: &HookSettings, custom: HookPipeline) -> Self {
        if !settings.merge {
            return custom;
        }
        let mut pipeline = Self::defaults();
        pipeline.before.extend(custom.before);
        pipeline.after.extend(custom.after);
        pipeline
    }

    /// Names of the before hooks, in order
    pub fn before_names(&self) -> Vec<&str> {
        self.before.iter().map(|h| h.name()).collect()
    }

    /// Names of the after hooks, in order
    pub fn after_names(&self) -> Vec<&str> {
        self.after.iter().map(|h| h.name()).collect()
    }

    /// Run every before hook in order
    pub async fn run_before(&self, ctx: &mut RequestContext) -> Result<(), RestError> {
        for hook in &self.before {
            debug!("Running before hook '{}'", hook.name());
            if let Err(e) = hook.before(ctx).await {
                warn!("Before hook '{}' failed: {}", hook.name(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Run every after hook in order
    pub async fn run_after(&self, ctx: &mut ResponseContext) -> Result<(), RestError> {
        for hook in &self.after {
            debug!("Running after hook '{}'", hook.name());
            if let Err(e) = hook.after(ctx).await {
                warn!("After hook '{}' failed: {}", hook.name(), e);
                return Err(e);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPipeline")
            .field("before", &self.before_names())
            .field("after", &self.after_names())
            .finish()
    }
}
