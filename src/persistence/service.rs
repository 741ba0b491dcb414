//! Asynchronous persistence service
//!
//! ```text
//!   coordinator ──save/delete/load──> [job queue] ──> worker thread ──> SnapshotStore
//!        │                                                 │
//!        └──────── is_busy / wait_idle / has_data <── Status (Mutex + Condvar)
//! ```
//!
//! Jobs run strictly in submission order. The in-flight counter is bumped
//! before a job is queued, so every reader sees the service as busy the
//! moment `save` returns.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use super::PersistenceError;
use super::snapshot::Snapshot;
use super::store::{FileStore, SnapshotStore};

/// What the coordinator needs from persistence
///
/// `save` and `delete` return immediately; completion is observable only
/// through `is_busy` and `has_data`. Callers must not start a second save of
/// a session while one is in flight.
pub trait SessionStore {
    fn save(&self, name: &str, snapshot: Snapshot);
    fn load(&self, name: &str) -> Result<Snapshot, PersistenceError>;
    fn delete(&self, name: &str);
    fn has_data(&self, name: &str) -> bool;
    fn is_busy(&self) -> bool;

    /// Block until no operation is in flight
    fn wait_idle(&self, poll: Duration) {
        while self.is_busy() {
            thread::sleep(poll);
        }
    }
}

enum Job {
    Save {
        name: String,
        snapshot: Snapshot,
    },
    Delete {
        name: String,
    },
    Load {
        name: String,
        reply: Sender<Result<Snapshot, PersistenceError>>,
    },
}

#[derive(Default)]
struct Status {
    in_flight: usize,
    /// Last known "record exists" per session
    present: HashMap<String, bool>,
}

struct Shared {
    status: Mutex<Status>,
    idle: Condvar,
    store: Arc<dyn SnapshotStore>,
}

impl Shared {
    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn probe(&self, name: &str) -> bool {
        self.store.exists(name).unwrap_or_else(|e| {
            log::warn!("Cannot probe session '{}': {}", name, e);
            false
        })
    }

    /// Recompute the presence flag for `name`, then retire one job
    fn finish(&self, name: &str) {
        let present = self.probe(name);
        let mut status = self.status();
        status.present.insert(name.to_string(), present);
        status.in_flight = status.in_flight.saturating_sub(1);
        if status.in_flight == 0 {
            self.idle.notify_all();
        }
    }
}

/// Session persistence backed by a worker thread
pub struct Persistence {
    jobs: Option<Sender<Job>>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Persistence {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Result<Self, PersistenceError> {
        let shared = Arc::new(Shared {
            status: Mutex::new(Status::default()),
            idle: Condvar::new(),
            store,
        });
        let (tx, rx) = unbounded();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("persistence".to_string())
            .spawn(move || run_worker(rx, worker_shared))?;

        Ok(Self {
            jobs: Some(tx),
            shared,
            worker: Some(worker),
        })
    }

    /// Service over a [`FileStore`] in `dir`
    pub fn file_backed(dir: impl Into<std::path::PathBuf>) -> Result<Self, PersistenceError> {
        Self::new(Arc::new(FileStore::new(dir)))
    }

    /// Queue a job, counting it as in flight first
    fn submit(&self, name: &str, job: Job) -> Result<(), PersistenceError> {
        self.shared.status().in_flight += 1;

        let sent = self
            .jobs
            .as_ref()
            .map(|tx| tx.send(job).is_ok())
            .unwrap_or(false);
        if !sent {
            log::error!("Persistence worker gone, dropping job for '{}'", name);
            let mut status = self.shared.status();
            status.in_flight = status.in_flight.saturating_sub(1);
            self.shared.idle.notify_all();
            return Err(PersistenceError::WorkerGone);
        }
        Ok(())
    }
}

impl SessionStore for Persistence {
    fn save(&self, name: &str, snapshot: Snapshot) {
        log::debug!("Queueing save of '{}' ({} entities)", name, snapshot.len());
        let _ = self.submit(
            name,
            Job::Save {
                name: name.to_string(),
                snapshot,
            },
        );
    }

    fn load(&self, name: &str) -> Result<Snapshot, PersistenceError> {
        let (reply, result) = bounded(1);
        self.submit(
            name,
            Job::Load {
                name: name.to_string(),
                reply,
            },
        )?;
        result.recv().map_err(|_| PersistenceError::WorkerGone)?
    }

    fn delete(&self, name: &str) {
        log::debug!("Queueing delete of '{}'", name);
        let _ = self.submit(
            name,
            Job::Delete {
                name: name.to_string(),
            },
        );
    }

    fn has_data(&self, name: &str) -> bool {
        if let Some(&present) = self.shared.status().present.get(name) {
            return present;
        }
        let present = self.shared.probe(name);
        self.shared
            .status()
            .present
            .insert(name.to_string(), present);
        present
    }

    fn is_busy(&self) -> bool {
        self.shared.status().in_flight > 0
    }

    /// Condition-variable wait; `poll` bounds each individual wait so a
    /// missed notification cannot stall the caller forever.
    fn wait_idle(&self, poll: Duration) {
        let mut status = self.shared.status();
        while status.in_flight > 0 {
            status = match self.shared.idle.wait_timeout(status, poll) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

impl Drop for Persistence {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain pending jobs and exit
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Persistence worker panicked");
            }
        }
    }
}

fn run_worker(jobs: Receiver<Job>, shared: Arc<Shared>) {
    log::debug!("Persistence worker started");
    for job in jobs.iter() {
        match job {
            Job::Save { name, snapshot } => {
                let result = snapshot
                    .encode()
                    .and_then(|bytes| shared.store.write(&name, &bytes).map_err(Into::into));
                match result {
                    Ok(()) => log::info!("Session '{}' saved", name),
                    Err(e) => log::error!("Saving session '{}' failed: {}", name, e),
                }
                shared.finish(&name);
            }
            Job::Delete { name } => {
                match shared.store.remove(&name) {
                    Ok(()) => log::info!("Session '{}' deleted", name),
                    Err(e) => log::error!("Deleting session '{}' failed: {}", name, e),
                }
                shared.finish(&name);
            }
            Job::Load { name, reply } => {
                let result = match shared.store.read(&name) {
                    Ok(Some(bytes)) => Snapshot::decode(&bytes),
                    Ok(None) => Err(PersistenceError::NotFound(name.clone())),
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = &result {
                    log::debug!("Loading session '{}': {}", name, e);
                }
                // Flags are current before the caller wakes
                shared.finish(&name);
                let _ = reply.send(result);
            }
        }
    }
    log::debug!("Persistence worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::snapshot::{BodyRecord, EntityRecord};
    use crate::persistence::snapshot::strategies;
    use crate::persistence::store::MemoryStore;
    use glam::Vec2;
    use proptest::prelude::*;

    const POLL: Duration = Duration::from_millis(1);

    fn snapshot(score: u64) -> Snapshot {
        let mut snapshot = Snapshot::new("local");
        snapshot.insert(
            "player",
            EntityRecord::Player {
                body: BodyRecord {
                    pos: Vec2::new(40.0, 24.0),
                    vel: Vec2::new(0.5, -1.25),
                },
                health: 3,
                score,
            },
        );
        snapshot
    }

    fn service(store: &MemoryStore) -> Persistence {
        Persistence::new(Arc::new(store.clone())).unwrap()
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = MemoryStore::new();
        let persistence = service(&store);

        persistence.save("local", snapshot(12));
        let loaded = persistence.load("local").unwrap();

        assert_eq!(loaded, snapshot(12));
        assert!(persistence.has_data("local"));
        assert!(!persistence.is_busy());
    }

    #[test]
    fn test_busy_while_save_in_flight() {
        let store = MemoryStore::new().with_latency(Duration::from_millis(50));
        let persistence = service(&store);

        persistence.save("local", snapshot(1));
        assert!(persistence.is_busy());

        persistence.wait_idle(POLL);
        assert!(!persistence.is_busy());
        assert!(persistence.has_data("local"));
        assert!(store.contains("local"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let persistence = service(&store);

        persistence.save("local", snapshot(1));
        persistence.delete("local");
        persistence.wait_idle(POLL);
        assert!(!persistence.has_data("local"));

        persistence.delete("local");
        persistence.wait_idle(POLL);
        assert!(!persistence.has_data("local"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_session_is_not_found() {
        let persistence = service(&MemoryStore::new());
        assert!(matches!(
            persistence.load("nobody"),
            Err(PersistenceError::NotFound(name)) if name == "nobody"
        ));
        assert!(!persistence.has_data("nobody"));
    }

    #[test]
    fn test_failed_save_clears_busy() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let persistence = service(&store);

        persistence.save("local", snapshot(1));
        persistence.wait_idle(POLL);

        assert!(!persistence.is_busy());
        assert!(!persistence.has_data("local"));
    }

    #[test]
    fn test_corrupt_record_is_codec_error() {
        let store = MemoryStore::new();
        store.write("local", b"{ broken").unwrap();
        let persistence = service(&store);

        assert!(persistence.has_data("local"));
        assert!(matches!(
            persistence.load("local"),
            Err(PersistenceError::Codec(_))
        ));
    }

    #[test]
    fn test_has_data_reflects_existing_record() {
        let store = MemoryStore::new();
        store.write("local", &snapshot(3).encode().unwrap()).unwrap();
        let persistence = service(&store);

        assert!(persistence.has_data("local"));
        assert!(!persistence.has_data("duel"));
    }

    #[test]
    fn test_drop_flushes_pending_saves() {
        let store = MemoryStore::new().with_latency(Duration::from_millis(20));
        {
            let persistence = service(&store);
            persistence.save("local", snapshot(1));
            persistence.save("duel", snapshot(2));
        }
        assert!(store.contains("local"));
        assert!(store.contains("duel"));
    }

    #[test]
    fn test_default_wait_idle_polls() {
        struct BusyFor(std::cell::Cell<u32>);

        impl SessionStore for BusyFor {
            fn save(&self, _: &str, _: Snapshot) {}
            fn load(&self, name: &str) -> Result<Snapshot, PersistenceError> {
                Err(PersistenceError::NotFound(name.to_string()))
            }
            fn delete(&self, _: &str) {}
            fn has_data(&self, _: &str) -> bool {
                false
            }
            fn is_busy(&self) -> bool {
                let left = self.0.get();
                self.0.set(left.saturating_sub(1));
                left > 0
            }
        }

        let fake = BusyFor(std::cell::Cell::new(3));
        fake.wait_idle(POLL);
        assert_eq!(fake.0.get(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_save_then_load_any_snapshot(snapshot in strategies::snapshot()) {
            let store = MemoryStore::new();
            let persistence = service(&store);
            let name = snapshot.session.clone();

            persistence.save(&name, snapshot.clone());
            prop_assert_eq!(persistence.load(&name).unwrap(), snapshot);
            prop_assert!(persistence.has_data(&name));
            prop_assert!(!persistence.is_busy());
        }
    }
}
