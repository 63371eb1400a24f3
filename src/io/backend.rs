//! Storage backend abstraction and the scheme registry
//!
//! A backend turns a source identifier into a readable stream. The
//! registry maps URI schemes to backends; it is built once at startup and
//! shared read-only by every reader.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::debug;

use super::http::HttpBackend;
use super::local::LocalBackend;
use crate::config::BenchConfig;
use crate::{ReadBenchError, Result};

/// Scheme used for bare paths without a `scheme://` prefix
pub const LOCAL_SCHEME: &str = "file";

/// Opens sources for reading
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Open a source; failures here are open errors for that source
    async fn open(&self, path: &str) -> io::Result<Box<dyn SourceStream>>;

    /// Short backend name for diagnostics
    fn name(&self) -> &'static str;
}

/// A byte stream opened from a backend
#[async_trait]
pub trait SourceStream: Send {
    /// Read into `buf`, returning the number of bytes read.
    ///
    /// `Ok(0)` with a non-empty buffer signals end-of-data; any `Err` is a
    /// read failure, never end-of-data.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Extract the URI scheme of a source, `file` for bare paths
pub fn scheme_of(path: &str) -> &str {
    match path.split_once("://") {
        Some((scheme, _))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') =>
        {
            scheme
        }
        _ => LOCAL_SCHEME,
    }
}

/// Scheme to backend mapping
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn StorageBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the local and HTTP backends plus configured mappings
    pub fn from_config(config: &BenchConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(LOCAL_SCHEME, Arc::new(LocalBackend::new()));

        let http: Arc<dyn StorageBackend> = Arc::new(HttpBackend::new()?);
        registry.register("http", Arc::clone(&http));
        registry.register("https", http);

        for mapping in &config.backends {
            let backend = HttpBackend::with_endpoint(&mapping.endpoint)?;
            registry.register(&mapping.scheme, Arc::new(backend));
        }

        Ok(registry)
    }

    /// Register a backend for a scheme, returning any backend it replaces
    pub fn register(
        &mut self,
        scheme: &str,
        backend: Arc<dyn StorageBackend>,
    ) -> Option<Arc<dyn StorageBackend>> {
        self.backends.insert(scheme.to_ascii_lowercase(), backend)
    }

    /// Find the backend responsible for a source
    pub fn resolve(&self, path: &str) -> Result<Arc<dyn StorageBackend>> {
        let scheme = scheme_of(path).to_ascii_lowercase();
        match self.backends.get(&scheme) {
            Some(backend) => {
                debug!(path, scheme = %scheme, backend = backend.name(), "resolved backend");
                Ok(Arc::clone(backend))
            }
            None => Err(ReadBenchError::UnknownScheme {
                scheme,
                path: path.to_string(),
            }),
        }
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}
