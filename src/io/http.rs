//! HTTP(S) backend
//!
//! Streams a source with a single GET request. With an endpoint, object
//! store URIs such as `s3://bucket/key` are rewritten path-style onto it.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::io;
use url::Url;

use super::backend::{SourceStream, StorageBackend};
use crate::{ReadBenchError, Result};

/// Reads sources over HTTP, optionally through a fixed endpoint
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: Option<Url>,
}

impl HttpBackend {
    /// Backend for plain `http://` and `https://` sources
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            endpoint: None,
        })
    }

    /// Backend serving another scheme from `endpoint`
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ReadBenchError::Config(format!("Invalid endpoint '{}': {}", endpoint, e))
        })?;
        Ok(Self {
            client: build_client()?,
            endpoint: Some(endpoint),
        })
    }

    /// The URL a source is fetched from
    pub fn request_url(&self, path: &str) -> io::Result<Url> {
        let url = match &self.endpoint {
            None => Url::parse(path),
            Some(endpoint) => {
                let object = path.split_once("://").map_or(path, |(_, rest)| rest);
                let base = endpoint.as_str().trim_end_matches('/');
                Url::parse(&format!("{}/{}", base, object.trim_start_matches('/')))
            }
        };
        url.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }
}

fn build_client() -> Result<Client> {
    Client::builder()
        .build()
        .map_err(|e| ReadBenchError::Config(format!("Failed to build HTTP client: {}", e)))
}

fn status_error(status: StatusCode) -> io::Error {
    let kind = match status {
        StatusCode::NOT_FOUND => io::ErrorKind::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => io::ErrorKind::PermissionDenied,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, format!("HTTP status {}", status))
}

#[async_trait]
impl StorageBackend for HttpBackend {
    async fn open(&self, path: &str) -> io::Result<Box<dyn SourceStream>> {
        let url = self.request_url(path)?;
        let response = self.client.get(url).send().await.map_err(io::Error::other)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        Ok(Box::new(HttpStream {
            body: response.bytes_stream().boxed(),
            pending: Bytes::new(),
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

struct HttpStream {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    pending: Bytes,
}

#[async_trait]
impl SourceStream for HttpStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.is_empty() {
            match self.body.next().await {
                Some(Ok(chunk)) => self.pending = chunk,
                Some(Err(e)) => return Err(io::Error::other(e)),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        let chunk = self.pending.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }
}
