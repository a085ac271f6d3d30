//! Persisted link database with single-slot backup
//!
//! The database lives under [`STORAGE_KEY`]. Before every write the previous
//! blob is copied to [`BACKUP_STORAGE_KEY`], which is what corruption recovery
//! falls back to.
//!
//! [`Store`] performs the raw operations. [`LinkStore`] is the shareable handle
//! that funnels all of them through a [`MutationQueue`], so read-modify-write
//! cycles never interleave.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use super::kv::KeyValueStore;
use super::model::{parse_database, Database, Parsed};
use super::queue::{MutationQueue, Ticket};
use crate::error::StoreError;
use crate::notify::{Notifier, Toast};

/// Key of the primary database blob
pub const STORAGE_KEY: &str = "link-groups-db";

/// Key of the backup slot (the blob replaced by the latest write)
pub const BACKUP_STORAGE_KEY: &str = "link-groups-db-backup";

/// Serialized empty database
pub const DEFAULT_DB_RAW: &str = r#"{"version":1,"groups":[]}"#;

/// Observer of database changes
pub type Listener = Box<dyn Fn(&Database) + Send + Sync>;

/// Handle returned by [`LinkStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Unserialized store operations
///
/// Callers must not run these concurrently; use [`LinkStore`].
pub struct Store {
    kv: Box<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl Store {
    pub fn new(kv: Box<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            kv,
            notifier,
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Read the database, recovering from corruption
    ///
    /// A corrupt primary blob is replaced by the backup if that parses, or by
    /// an empty database otherwise. Either way the user is told, and the
    /// returned value is always structurally valid. Only a failure to read
    /// the primary slot at all is an error.
    pub fn load(&self) -> Result<Database, StoreError> {
        let raw = self.read_slot(STORAGE_KEY)?;
        match parse_database(raw.as_deref()) {
            Parsed::Missing => Ok(Database::default()),
            Parsed::Valid(db) => Ok(db),
            Parsed::Corrupt => Ok(self.recover()),
        }
    }

    /// Replace the database, backing up the previous blob first
    pub fn write(&self, db: &Database) -> Result<(), StoreError> {
        let current_raw = self.read_slot(STORAGE_KEY)?;
        self.commit(current_raw.as_deref(), db)
    }

    /// Read-modify-write with a function from old to new database
    pub fn atomic_update<F>(&self, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(Database) -> Database,
    {
        self.atomic_modify(|db| {
            let current = std::mem::take(db);
            *db = update(current);
        })
    }

    /// Read-modify-write in place, returning whatever the closure returns
    ///
    /// State is read fresh from the backend, never from a cached copy. An
    /// update that leaves the database unchanged writes nothing, so the
    /// backup slot keeps the last real change.
    pub fn atomic_modify<R, F>(&self, update: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Database) -> R,
    {
        let mut current_raw = self.read_slot(STORAGE_KEY)?;
        let current = match parse_database(current_raw.as_deref()) {
            Parsed::Missing => Database::default(),
            Parsed::Valid(db) => db,
            Parsed::Corrupt => {
                let recovered = self.recover();
                current_raw = self.read_slot(STORAGE_KEY)?;
                recovered
            }
        };

        let mut next = current.clone();
        let out = update(&mut next);

        if next == current {
            debug!("update left database unchanged, skipping write");
        } else {
            self.commit(current_raw.as_deref(), &next)?;
        }

        Ok(out)
    }

    /// Register an observer called after every write or recovery
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Remove an observer; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    fn read_slot(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.kv.get(key).map_err(|source| StoreError::Read {
            key: key.to_string(),
            source,
        })
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv.set(key, value).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })
    }

    fn commit(&self, current_raw: Option<&str>, next: &Database) -> Result<(), StoreError> {
        let next_raw = next.to_blob()?;

        if let Some(current) = current_raw.filter(|raw| !raw.is_empty()) {
            self.write_slot(BACKUP_STORAGE_KEY, current)?;
        }
        self.write_slot(STORAGE_KEY, &next_raw)?;

        debug!(groups = next.groups.len(), "database written");
        self.publish(next);
        Ok(())
    }

    fn recover(&self) -> Database {
        warn!("stored database is corrupt, trying backup");

        let backup_raw = self.read_slot(BACKUP_STORAGE_KEY).unwrap_or_else(|e| {
            warn!("could not read backup: {}", e);
            None
        });

        let (db, raw, message) = match (parse_database(backup_raw.as_deref()), backup_raw) {
            (Parsed::Valid(db), Some(raw)) => (db, raw, "Recovered from the last backup."),
            _ => (
                Database::default(),
                DEFAULT_DB_RAW.to_string(),
                "Reset to an empty database.",
            ),
        };

        match self.write_slot(STORAGE_KEY, &raw) {
            Ok(()) => {
                info!("{}", message);
                self.notifier
                    .toast(Toast::failure("Data corrupted").with_message(message));
                self.publish(&db);
            }
            Err(e) => {
                warn!("could not persist recovered database: {}", e);
                self.notifier
                    .toast(Toast::failure("Failed to recover data").with_message(e.to_string()));
            }
        }

        db
    }

    /// Listener panics are logged and do not affect the committed write
    fn publish(&self, db: &Database) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for (id, listener) in listeners.iter() {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(db))).is_err() {
                warn!(subscription = id.0, "change listener panicked");
            }
        }
    }
}

/// Shareable, serialized handle to the link database
#[derive(Clone)]
pub struct LinkStore {
    queue: Arc<MutationQueue<Store>>,
}

impl LinkStore {
    /// Wrap a backend and start the mutation queue
    pub fn open(
        kv: Box<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StoreError> {
        let queue = MutationQueue::new(Store::new(kv, notifier))?;
        Ok(Self {
            queue: Arc::new(queue),
        })
    }

    /// See [`Store::load`]
    pub fn load(&self) -> Result<Database, StoreError> {
        self.queue.run(Store::load)
    }

    /// See [`Store::write`]
    pub fn write(&self, db: Database) -> Result<(), StoreError> {
        self.queue.run(move |store| store.write(&db))
    }

    /// See [`Store::atomic_update`]
    pub fn atomic_update<F>(&self, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(Database) -> Database + Send + 'static,
    {
        self.queue.run(move |store| store.atomic_update(update))
    }

    /// See [`Store::atomic_modify`]
    pub fn atomic_modify<R, F>(&self, update: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Database) -> R + Send + 'static,
    {
        self.enqueue_modify(update).wait()
    }

    /// Queue an in-place update without waiting for it
    pub fn enqueue_modify<R, F>(&self, update: F) -> Ticket<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Database) -> R + Send + 'static,
    {
        self.queue.enqueue(move |store| store.atomic_modify(update))
    }

    /// Call `listener` after every write or recovery
    ///
    /// Listeners run on the queue's worker thread and receive the new
    /// database. Calling back into the store from a listener fails with
    /// [`StoreError::Reentrant`].
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Database) + Send + Sync + 'static,
    {
        self.queue.state().subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.queue.state().unsubscribe(id)
    }
}
