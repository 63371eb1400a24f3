//! Source reader
//!
//! Reads one source to end-of-data in fixed-size chunks, publishing
//! progress into the slot it owns after every read.

use std::sync::Arc;
use tracing::{debug, info};

use crate::bench::progress::SlotWriter;
use crate::io::BackendRegistry;
use crate::{ReadBenchError, Result};

/// Reads sources through the shared backend registry
#[derive(Debug, Clone)]
pub struct SourceReader {
    registry: Arc<BackendRegistry>,
    chunk_size: usize,
}

impl SourceReader {
    pub fn new(registry: Arc<BackendRegistry>, chunk_size: usize) -> Self {
        Self {
            registry,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read the slot's source to completion, returning the total bytes read.
    ///
    /// Any open or read failure is returned immediately; nothing is retried.
    pub async fn run(&self, slot: &SlotWriter) -> Result<u64> {
        let path = slot.path();
        info!("{}: start", path);

        let backend = self.registry.resolve(path)?;
        let mut stream = backend
            .open(path)
            .await
            .map_err(|error| ReadBenchError::Open {
                path: path.to_string(),
                error,
            })?;

        let mut buf = vec![0u8; self.chunk_size];
        let mut total = 0u64;
        loop {
            let n = stream
                .read(&mut buf)
                .await
                .map_err(|error| ReadBenchError::Read {
                    path: path.to_string(),
                    offset: total,
                    error,
                })?;

            slot.record(n);
            if n == 0 {
                break;
            }
            total += n as u64;
        }

        debug!(path, backend = backend.name(), total, "end of data");
        info!("{}: done, {} bytes", path, total);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::progress::ProgressTable;
    use crate::io::{SourceStream, StorageBackend};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;

    /// Returns scripted read results, then end-of-data
    struct ScriptedBackend {
        script: Vec<std::result::Result<usize, io::ErrorKind>>,
    }

    struct ScriptedStream {
        script: VecDeque<std::result::Result<usize, io::ErrorKind>>,
    }

    #[async_trait]
    impl StorageBackend for ScriptedBackend {
        async fn open(&self, path: &str) -> io::Result<Box<dyn SourceStream>> {
            if path.ends_with("missing") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such object"));
            }
            Ok(Box::new(ScriptedStream {
                script: self.script.iter().cloned().collect(),
            }))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    #[async_trait]
    impl SourceStream for ScriptedStream {
        async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(n)) => Ok(n.min(buf.len())),
                Some(Err(kind)) => Err(io::Error::new(kind, "scripted failure")),
                None => Ok(0),
            }
        }
    }

    fn reader(script: Vec<std::result::Result<usize, io::ErrorKind>>) -> SourceReader {
        let mut registry = BackendRegistry::new();
        registry.register("mem", Arc::new(ScriptedBackend { script }));
        SourceReader::new(Arc::new(registry), 1024)
    }

    #[tokio::test]
    async fn test_reads_to_end_and_publishes_progress() {
        let reader = reader(vec![Ok(1024), Ok(1024), Ok(300)]);
        let (table, writers) = ProgressTable::new(["mem://a"]);

        let total = reader.run(&writers[0]).await.unwrap();
        assert_eq!(total, 2348);

        let snapshot = table.snapshot();
        assert_eq!(snapshot[0].bytes_read, 2348);
        assert!(snapshot[0].is_active());
    }

    #[tokio::test]
    async fn test_empty_source_still_records_activity() {
        let reader = reader(Vec::new());
        let (table, writers) = ProgressTable::new(["mem://empty"]);

        assert_eq!(reader.run(&writers[0]).await.unwrap(), 0);
        assert!(table.snapshot()[0].is_active());
    }

    #[tokio::test]
    async fn test_read_error_reports_offset() {
        let reader = reader(vec![Ok(1024), Ok(512), Err(io::ErrorKind::ConnectionReset), Ok(1)]);
        let (table, writers) = ProgressTable::new(["mem://flaky"]);

        match reader.run(&writers[0]).await {
            Err(ReadBenchError::Read { path, offset, error }) => {
                assert_eq!(path, "mem://flaky");
                assert_eq!(offset, 1536);
                assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected read error, got {:?}", other),
        }
        assert_eq!(table.snapshot()[0].bytes_read, 1536);
    }

    #[tokio::test]
    async fn test_open_and_scheme_errors() {
        let reader = reader(Vec::new());
        let (_table, writers) = ProgressTable::new(["mem://missing", "gs://bucket/x"]);

        assert!(matches!(
            reader.run(&writers[0]).await,
            Err(ReadBenchError::Open { .. })
        ));
        assert!(matches!(
            reader.run(&writers[1]).await,
            Err(ReadBenchError::UnknownScheme { .. })
        ));
    }
}
