//! JSONL storage for catalog records
//!
//! Each record kind lives in its own `.lend/{kind}.jsonl` file with one JSON
//! object per line. Readers take a shared lock on the data file; writers hold
//! an exclusive lock on a sidecar `.lock` file for the whole
//! read-modify-write, and replace the data file atomically (temp file +
//! rename).

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::hash::Hash;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{Category, CategoryId, Tag, TagId, Task, TaskId, User, UserId};

/// A record that can be kept in a [`JsonlStore`]
pub trait Record: Serialize + DeserializeOwned + Clone {
    type Id: Clone + Eq + Hash + Display;

    /// File name under `.lend/`
    const FILE_NAME: &'static str;

    fn id(&self) -> &Self::Id;
}

impl Record for Task {
    type Id = TaskId;
    const FILE_NAME: &'static str = "tasks.jsonl";

    fn id(&self) -> &TaskId {
        &self.id
    }
}

impl Record for Category {
    type Id = CategoryId;
    const FILE_NAME: &'static str = "categories.jsonl";

    fn id(&self) -> &CategoryId {
        &self.id
    }
}

impl Record for Tag {
    type Id = TagId;
    const FILE_NAME: &'static str = "tags.jsonl";

    fn id(&self) -> &TagId {
        &self.id
    }
}

impl Record for User {
    type Id = UserId;
    const FILE_NAME: &'static str = "users.jsonl";

    fn id(&self) -> &UserId {
        &self.id
    }
}

/// Store for one record kind in JSONL format
pub struct JsonlStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonlStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<T> JsonlStore<T> {
    /// Creates a new store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }
}

impl<T: Record> JsonlStore<T> {
    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".lend").join(T::FILE_NAME))
    }

    /// Reads all records from the store
    pub fn read_all(&self) -> Result<HashMap<T::Id, T>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open store: {}", self.path.display()))?;

        file.lock_shared()
            .with_context(|| format!("Failed to acquire read lock on {}", self.path.display()))?;

        let reader = BufReader::new(&file);
        let mut records = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let record: T = serde_json::from_str(&line).with_context(|| {
                format!(
                    "Failed to parse record at {}:{}",
                    self.path.display(),
                    line_num + 1
                )
            })?;

            // Later lines win if a hand-edited file repeats an ID
            records.insert(record.id().clone(), record);
        }

        Ok(records)
    }

    /// Reads records sorted by ID
    pub fn read_sorted(&self) -> Result<Vec<T>> {
        let mut records: Vec<T> = self.read_all()?.into_values().collect();
        records.sort_by_key(|r| r.id().to_string());
        Ok(records)
    }

    /// Looks up a single record
    pub fn get(&self, id: &T::Id) -> Result<Option<T>> {
        Ok(self.read_all()?.remove(id))
    }

    /// Takes the exclusive write lock; it is released when the file drops
    fn lock(&self) -> Result<File> {
        self.ensure_parent()?;

        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        lock.lock_exclusive()
            .with_context(|| format!("Failed to acquire write lock on {}", self.path.display()))?;
        Ok(lock)
    }

    /// Runs `f` over the full record set under an exclusive lock and writes
    /// the result back
    pub fn modify<R>(&self, f: impl FnOnce(&mut HashMap<T::Id, T>) -> Result<R>) -> Result<R> {
        let _lock = self.lock()?;

        let mut records = self.read_all()?;
        let result = f(&mut records)?;
        self.write_all(&records)?;

        Ok(result)
    }

    /// Runs `f` under the same exclusive lock as [`modify`](Self::modify)
    /// without writing anything back
    ///
    /// No other writer can change the records until `f` returns.
    pub fn with_lock<R>(&self, f: impl FnOnce(&HashMap<T::Id, T>) -> Result<R>) -> Result<R> {
        let _lock = self.lock()?;
        let records = self.read_all()?;
        f(&records)
    }

    /// Removes a record by ID
    pub fn remove(&self, id: &T::Id) -> Result<bool> {
        self.modify(|records| Ok(records.remove(id).is_some()))
    }

    /// Writes all records to the store (full rewrite)
    fn write_all(&self, records: &HashMap<T::Id, T>) -> Result<()> {
        self.ensure_parent()?;

        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = File::create(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);

            // Sort by ID for consistent output
            let mut sorted: Vec<_> = records.values().collect();
            sorted.sort_by_key(|r| r.id().to_string());

            for record in sorted {
                let line = serde_json::to_string(record).context("Failed to serialize record")?;
                writeln!(writer, "{}", line).context("Failed to write record")?;
            }

            writer.flush().context("Failed to flush store")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
