//! File-backed record store.
//!
//! The whole dataset lives in memory as named collections of [`Document`]s
//! and is mirrored to a single JSON file. Every mutation rewrites the file
//! through a temporary sibling that is renamed over the target, so a crash
//! mid-write never leaves a truncated store behind.

use crate::error::{Result, StoreError};
use crate::models::{Loan, Model};
use crate::types::{Document, StoreStats, BOOKS, DEFAULT_COLLECTIONS, LOANS, MEMBERS};
use chrono::Local;
use fs2::FileExt;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Named collections in file order.
type Collections = IndexMap<String, Vec<Document>>;

/// What to do when the backing file exists but cannot be parsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorruptPolicy {
    /// Refuse to open with [`StoreError::Corruption`].
    #[default]
    Fail,

    /// Move the file aside to `<file>.corrupt-<stamp>` and start empty.
    Quarantine,
}

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Path of the JSON backing file.
    pub path: PathBuf,

    /// Whether to start empty if the file doesn't exist.
    pub create_if_missing: bool,

    /// Handling of an unreadable backing file.
    pub on_corrupt: CorruptPolicy,

    /// Indent the JSON output.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./library.json"),
            create_if_missing: true,
            on_corrupt: CorruptPolicy::Fail,
            pretty: true,
        }
    }
}

/// The record store.
///
/// Reads are served from memory. Writes take the data lock exclusively, apply
/// the change, and persist the full dataset before releasing it; if the write
/// fails the in-memory change is undone and the error returned.
pub struct Store {
    config: StoreConfig,

    /// Held for the lifetime of the store.
    lock_file: File,

    data: RwLock<Collections>,
}

impl Store {
    /// Open the store at `config.path`, loading the file if it exists.
    pub fn open(config: StoreConfig) -> Result<Self> {
        if config.path.file_name().is_none() {
            return Err(StoreError::InvalidOperation(format!(
                "store path has no file name: {}",
                config.path.display()
            )));
        }

        let exists = config.path.exists();
        if !exists {
            if !config.create_if_missing {
                return Err(StoreError::NotInitialized);
            }
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let lock_file = Self::acquire_lock(&config.path)?;

        let data = if exists {
            Self::load(&config)?
        } else {
            Self::empty()
        };

        tracing::debug!(
            path = %config.path.display(),
            collections = data.len(),
            "opened store"
        );

        Ok(Self {
            config,
            lock_file,
            data: RwLock::new(data),
        })
    }

    fn empty() -> Collections {
        DEFAULT_COLLECTIONS
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect()
    }

    fn load(config: &StoreConfig) -> Result<Collections> {
        let bytes = fs::read(&config.path)?;

        let reason = match serde_json::from_slice::<Collections>(&bytes) {
            Ok(mut collections) => {
                for name in DEFAULT_COLLECTIONS {
                    collections.entry(name.to_string()).or_default();
                }
                return Ok(collections);
            }
            Err(e) => e.to_string(),
        };

        match config.on_corrupt {
            CorruptPolicy::Fail => Err(StoreError::Corruption {
                path: config.path.display().to_string(),
                reason,
            }),
            CorruptPolicy::Quarantine => {
                let target = quarantine_path(&config.path);
                fs::rename(&config.path, &target)?;
                tracing::warn!(
                    path = %config.path.display(),
                    moved_to = %target.display(),
                    %reason,
                    "store file unreadable, quarantined and starting empty"
                );
                Ok(Self::empty())
            }
        }
    }

    // --- Record Operations ---

    /// Append a record to a collection, creating the collection if unseen.
    ///
    /// No validation or deduplication happens here.
    pub fn insert(&self, collection: &str, record: Document) -> Result<()> {
        let mut data = self.data.write();

        let created = !data.contains_key(collection);
        data.entry(collection.to_string()).or_default().push(record);

        if let Err(e) = self.persist(&data) {
            if created {
                data.shift_remove(collection);
            } else if let Some(records) = data.get_mut(collection) {
                records.pop();
            }
            return Err(e);
        }

        Ok(())
    }

    /// All records in a collection, in insertion order.
    pub fn find_all(&self, collection: &str) -> Vec<Document> {
        self.data
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Records whose `field` equals `value` exactly, in insertion order.
    ///
    /// A missing field compares equal to `null`.
    pub fn find(&self, collection: &str, field: &str, value: &Value) -> Vec<Document> {
        self.data
            .read()
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|doc| field_equals(doc, field, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Merge `patch` into the first record whose `field` equals `value`.
    ///
    /// Returns `Ok(false)` if nothing matched. Later matches are never touched.
    pub fn update(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        patch: Document,
    ) -> Result<bool> {
        self.update_where(collection, &[(field, value)], patch)
    }

    /// Merge `patch` into the first record matching every `(field, value)` pair.
    ///
    /// Same first-match semantics as [`Store::update`].
    pub fn update_where(
        &self,
        collection: &str,
        criteria: &[(&str, &Value)],
        patch: Document,
    ) -> Result<bool> {
        let mut data = self.data.write();

        let (position, previous) = {
            let Some(records) = data.get_mut(collection) else {
                return Ok(false);
            };
            let Some(position) = records.iter().position(|doc| {
                criteria
                    .iter()
                    .all(|(field, value)| field_equals(doc, field, value))
            }) else {
                return Ok(false);
            };
            let previous = records[position].clone();
            records[position].extend(patch);
            (position, previous)
        };

        if let Err(e) = self.persist(&data) {
            if let Some(records) = data.get_mut(collection) {
                records[position] = previous;
            }
            return Err(e);
        }

        Ok(true)
    }

    // --- Typed Operations ---

    /// Encode and insert a model into its collection.
    pub fn insert_model<M: Model>(&self, model: &M) -> Result<()> {
        self.insert(M::COLLECTION, model.to_document()?)?;
        tracing::debug!(collection = M::COLLECTION, key = model.key(), "inserted record");
        Ok(())
    }

    /// Decode every record in a model's collection.
    pub fn all_models<M: Model>(&self) -> Result<Vec<M>> {
        self.find_all(M::COLLECTION)
            .into_iter()
            .map(M::from_document)
            .collect()
    }

    /// Whether a record with this key exists in the model's collection.
    pub fn contains_key<M: Model>(&self, key: &str) -> bool {
        !self
            .find(M::COLLECTION, M::KEY_FIELD, &Value::from(key))
            .is_empty()
    }

    /// Decode the first record keyed by `key`.
    pub fn find_by_key<M: Model>(&self, key: &str) -> Result<Option<M>> {
        let found: Vec<M> = self.find_models(M::KEY_FIELD, key)?;
        Ok(found.into_iter().next())
    }

    /// Decode the records of a model's collection whose `field` equals `value`.
    pub fn find_models<M: Model>(&self, field: &str, value: impl Into<Value>) -> Result<Vec<M>> {
        self.find(M::COLLECTION, field, &value.into())
            .into_iter()
            .map(M::from_document)
            .collect()
    }

    // --- Store Operations ---

    /// Names of all collections, in file order.
    pub fn collection_names(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Get store statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        let file_size_bytes = match fs::metadata(&self.config.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let data = self.data.read();
        let count = |name: &str| data.get(name).map_or(0, Vec::len);
        let active_loan_count = data.get(LOANS).map_or(0, |loans| {
            loans
                .iter()
                .filter(|doc| field_equals(doc, Loan::RETURN_DATE, &Value::Null))
                .count()
        });

        Ok(StoreStats {
            book_count: count(BOOKS),
            member_count: count(MEMBERS),
            loan_count: count(LOANS),
            active_loan_count,
            collection_count: data.len(),
            file_size_bytes,
        })
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    // --- Internal ---

    fn persist(&self, data: &Collections) -> Result<()> {
        let result = self.write_file(data);
        if let Err(e) = &result {
            tracing::error!(
                path = %self.config.path.display(),
                error = %e,
                "failed to persist store"
            );
        }
        result
    }

    fn write_file(&self, data: &Collections) -> Result<()> {
        let encoded = if self.config.pretty {
            serde_json::to_vec_pretty(data)?
        } else {
            serde_json::to_vec(data)?
        };

        let tmp_path = sibling(&self.config.path, ".tmp");
        let written = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .and_then(|mut file| {
                file.write_all(&encoded)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp_path, &self.config.path));

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!(
            path = %self.config.path.display(),
            bytes = encoded.len(),
            "persisted store"
        );
        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(sibling(path, ".lock"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
    }
}

fn field_equals(doc: &Document, field: &str, value: &Value) -> bool {
    doc.get(field).unwrap_or(&Value::Null) == value
}

/// An unused `<file>.corrupt-<stamp>` sibling of `path`.
fn quarantine_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d%H%M%S%9f");
    let mut target = sibling(path, &format!(".corrupt-{}", stamp));
    let mut n = 1;
    while target.exists() {
        target = sibling(path, &format!(".corrupt-{}-{}", stamp, n));
        n += 1;
    }
    target
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
