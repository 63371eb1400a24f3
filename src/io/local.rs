use async_trait::async_trait;
use std::io;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::backend::{SourceStream, StorageBackend};

/// Local filesystem backend for bare paths and `file://` URIs
#[derive(Debug, Clone, Default)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

fn local_path(path: &str) -> &str {
    path.strip_prefix("file://").unwrap_or(path)
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn open(&self, path: &str) -> io::Result<Box<dyn SourceStream>> {
        let file = File::open(local_path(path)).await?;
        Ok(Box::new(LocalStream { file }))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

struct LocalStream {
    file: File,
}

#[async_trait]
impl SourceStream for LocalStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf).await
    }
}
