//! Request-scoped context carried through a middleware chain.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use keel_core::{ConfigRecord, ConfigValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a request, backed by a UUID v7.
///
/// UUID v7 is time-ordered, so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a hyphenated or simple UUID string.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// State that flows through a middleware chain for one request.
///
/// Units can read resolved configuration through [`config`](Self::config)
/// and exchange arbitrary typed data through extensions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use keel_core::ConfigRecord;
/// use keel_middleware::RequestContext;
/// use serde_json::json;
///
/// let mut record = ConfigRecord::new();
/// record.insert("server", json!({"port": 8080}));
///
/// let ctx = RequestContext::new().with_config(Arc::new(record));
/// assert_eq!(ctx.config_value("server.port"), Some(&json!(8080)));
/// ```
pub struct RequestContext {
    request_id: RequestId,
    started_at: Instant,
    config: Option<Arc<ConfigRecord>>,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            config: None,
            extensions: HashMap::new(),
        }
    }

    /// Attaches resolved configuration.
    pub fn with_config(mut self, config: Arc<ConfigRecord>) -> Self {
        self.config = Some(config);
        self
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// When the context was created.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time elapsed since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The resolved configuration, if attached.
    pub fn config(&self) -> Option<&ConfigRecord> {
        self.config.as_deref()
    }

    /// Looks up a dotted path in the resolved configuration.
    pub fn config_value(&self, path: &str) -> Option<&ConfigValue> {
        self.config.as_deref()?.get_path(path)
    }

    /// Stores a typed extension, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension.
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Retrieves a typed extension mutably.
    pub fn get_extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Removes and returns a typed extension.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks whether an extension of type `T` is present.
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("started_at", &self.started_at)
            .field("has_config", &self.config.is_some())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
