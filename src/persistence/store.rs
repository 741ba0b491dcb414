//! Byte-level snapshot stores

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Where encoded snapshots live, one record per session name
///
/// `remove` of an absent record is not an error.
pub trait SnapshotStore: Send + Sync {
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;
    fn remove(&self, name: &str) -> io::Result<()>;
    fn exists(&self, name: &str) -> io::Result<bool>;
}

/// One JSON file per session inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the record for `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        // tmp → save, so a crash mid-write never leaves a torn record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)
    }

    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(name)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn exists(&self, name: &str) -> io::Result<bool> {
        self.path_for(name).try_exists()
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Mutex<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

/// In-process store; clones share records
///
/// Supports artificial latency and failure injection so the busy/failure
/// paths of the service can be exercised.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write and remove sleeps this long first
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make write/read/remove fail with an i/o error
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> io::Result<()> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(io::Error::other("injected store failure"));
        }
        Ok(())
    }

    fn delay(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.delay();
        self.check()?;
        self.records().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.records().get(name).cloned())
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        self.delay();
        self.check()?;
        self.records().remove(name);
        Ok(())
    }

    fn exists(&self, name: &str) -> io::Result<bool> {
        Ok(self.contains(name))
    }
}
