//! Simulated storage backend for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use readbench::config::BenchConfig;
use readbench::io::{BackendRegistry, SourceStream, StorageBackend};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const SIM_SCHEME: &str = "sim";
pub const MIB: u64 = 1024 * 1024;

/// Behaviour of one simulated source
#[derive(Debug, Clone)]
pub enum SimSource {
    /// `len` bytes, sleeping `delay` before every read
    Sized { len: u64, delay: Duration },
    /// `len` bytes, then a read error of `kind`
    FailAfter { len: u64, kind: io::ErrorKind },
    /// `head` bytes, then no progress for `pause`, then `tail` bytes
    Pausing {
        head: u64,
        pause: Duration,
        tail: u64,
    },
    /// `head` bytes, then a read that never returns
    Blocking { head: u64 },
}

/// In-memory backend serving [`SimSource`]s under `sim://<name>`
#[derive(Default)]
pub struct SimBackend {
    sources: HashMap<String, SimSource>,
    open_streams: Arc<AtomicUsize>,
}

impl SimBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, name: &str, source: SimSource) -> Self {
        self.sources.insert(sim_path(name), source);
        self
    }

    /// Streams opened and not yet dropped
    pub fn open_streams(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.open_streams)
    }

    /// A registry with the default backends plus this one under `sim`
    pub fn into_registry(self, config: &BenchConfig) -> Arc<BackendRegistry> {
        let mut registry = BackendRegistry::from_config(config).unwrap();
        registry.register(SIM_SCHEME, Arc::new(self));
        Arc::new(registry)
    }
}

pub fn sim_path(name: &str) -> String {
    format!("{}://{}", SIM_SCHEME, name)
}

#[async_trait]
impl StorageBackend for SimBackend {
    async fn open(&self, path: &str) -> io::Result<Box<dyn SourceStream>> {
        let source = self
            .sources
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such simulated source"))?;

        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimStream {
            source,
            position: 0,
            paused: false,
            open_streams: Arc::clone(&self.open_streams),
        }))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

struct SimStream {
    source: SimSource,
    position: u64,
    paused: bool,
    open_streams: Arc<AtomicUsize>,
}

impl SimStream {
    fn serve(&mut self, buf: &mut [u8], end: u64) -> usize {
        let n = (end - self.position).min(buf.len() as u64) as usize;
        buf[..n].fill(0x5A);
        self.position += n as u64;
        n
    }
}

#[async_trait]
impl SourceStream for SimStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.source.clone() {
            SimSource::Sized { len, delay } => {
                tokio::time::sleep(delay).await;
                Ok(self.serve(buf, len))
            }
            SimSource::FailAfter { len, kind } => {
                if self.position >= len {
                    return Err(io::Error::new(kind, "simulated failure"));
                }
                Ok(self.serve(buf, len))
            }
            SimSource::Pausing { head, pause, tail } => {
                if self.position >= head && !self.paused {
                    self.paused = true;
                    tokio::time::sleep(pause).await;
                }
                Ok(self.serve(buf, head + tail))
            }
            SimSource::Blocking { head } => {
                if self.position >= head {
                    std::future::pending::<()>().await;
                }
                Ok(self.serve(buf, head))
            }
        }
    }
}

impl Drop for SimStream {
    fn drop(&mut self) {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Collects formatted log lines from the current thread
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route info-level events on this thread into the buffer until the
    /// guard is dropped
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_target(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Lines whose message ends with `suffix`
    pub fn ending_with(&self, suffix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.ends_with(suffix))
            .collect()
    }
}

pub struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buf: Arc::clone(&self.buf),
        }
    }
}
