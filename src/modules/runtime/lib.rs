//! Runtime for Restbridge
//!
//! This crate maps CRUD calls onto REST requests: the connection registry,
//! request builder, hook pipeline, response normalizer, cache layer, the
//! HTTP transport, and the [`RestAdapter`] facade tying them together.

pub mod adapter;
pub mod builder;
pub mod cache;
pub mod context;
pub mod hooks;
pub mod normalizer;
pub mod registry;
pub mod transport;

pub use adapter::RestAdapter;
pub use builder::{PathnameResolver, Prepared};
pub use cache::{MemoryCache, RedisCache, ResponseCache};
pub use context::{RequestContext, ResponseContext};
pub use hooks::{AfterHook, BeforeHook, HookPipeline};
pub use normalizer::{parse_date, Normalizer, ResponseShape, ResultFormatters};
pub use registry::{Connection, ConnectionRegistry, Registration};
pub use transport::{ReqwestTransport, Transport};
