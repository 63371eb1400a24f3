//! Storage I/O module
//!
//! Contains the storage backend abstraction, the scheme registry, and the
//! local filesystem and HTTP implementations.

pub mod backend;
pub mod http;
pub mod local;

pub use backend::{scheme_of, BackendRegistry, SourceStream, StorageBackend, LOCAL_SCHEME};
pub use http::HttpBackend;
pub use local::LocalBackend;
