//! Task persistence boundary
//!
//! The workflow and catalog services only see [`TaskRepository`]. Saves are
//! checked against the stored version so that two writers working from the
//! same snapshot cannot silently overwrite each other.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::domain::{CategoryId, ReservationStatus, TagId, Task, TaskId, UserId};

use super::jsonl::JsonlStore;
use super::query::TaskFilters;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("task {id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        id: TaskId,
        expected: u64,
        found: u64,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Storage for tasks
pub trait TaskRepository {
    fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Persists a snapshot and returns it with its version bumped
    ///
    /// A task with version 0 must not already exist; any other version must
    /// match the stored one, otherwise [`PersistenceError::Conflict`].
    fn save(&self, task: &Task) -> Result<Task>;

    /// Removes a task; returns false if it did not exist
    fn delete(&self, id: &TaskId) -> Result<bool>;

    fn find_all(&self) -> Result<Vec<Task>>;

    fn count_by_category(&self, category: &CategoryId) -> Result<usize> {
        Ok(self
            .find_all()?
            .iter()
            .filter(|t| &t.category == category)
            .count())
    }

    fn find_by_statuses(&self, statuses: &[ReservationStatus]) -> Result<Vec<Task>> {
        self.list(&TaskFilters::new().statuses(statuses.iter().copied()))
    }

    fn find_reserved_by(&self, user: &UserId) -> Result<Vec<Task>> {
        self.list(&TaskFilters::new().reserved_by(user.clone()))
    }

    /// Matching tasks, newest update first
    fn list(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        Ok(filters.apply(self.find_all()?))
    }

    /// Detaches a tag from every task carrying it; returns how many changed
    fn remove_tag_everywhere(&self, tag: &TagId) -> Result<usize> {
        let mut changed = 0;
        for mut task in self.find_all()? {
            if task.remove_tag(tag) {
                self.save(&task)?;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        (**self).find_by_id(id)
    }

    fn save(&self, task: &Task) -> Result<Task> {
        (**self).save(task)
    }

    fn delete(&self, id: &TaskId) -> Result<bool> {
        (**self).delete(id)
    }

    fn find_all(&self) -> Result<Vec<Task>> {
        (**self).find_all()
    }

    fn count_by_category(&self, category: &CategoryId) -> Result<usize> {
        (**self).count_by_category(category)
    }

    fn list(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        (**self).list(filters)
    }
}

/// Checks a snapshot against the stored copy and stamps the next version
fn next_version(stored: Option<&Task>, task: &Task) -> Result<Task> {
    // Absent tasks count as version 0, so only fresh snapshots may insert
    let found = stored.map_or(0, |t| t.version);
    if found != task.version {
        return Err(PersistenceError::Conflict {
            id: task.id.clone(),
            expected: task.version,
            found,
        });
    }

    let mut saved = task.clone();
    saved.version = found + 1;
    Ok(saved)
}

/// Tasks kept in `.lend/tasks.jsonl`
#[derive(Clone)]
pub struct JsonlTaskRepository {
    store: JsonlStore<Task>,
}

impl JsonlTaskRepository {
    pub fn new(store: JsonlStore<Task>) -> Self {
        Self { store }
    }
}

impl TaskRepository for JsonlTaskRepository {
    fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.store.get(id)?)
    }

    fn save(&self, task: &Task) -> Result<Task> {
        self.store
            .modify(|tasks| {
                let saved = next_version(tasks.get(&task.id), task)?;
                tasks.insert(saved.id.clone(), saved.clone());
                Ok(saved)
            })
            .map_err(|err| match err.downcast::<PersistenceError>() {
                Ok(conflict) => conflict,
                Err(other) => PersistenceError::Storage(other),
            })
    }

    fn delete(&self, id: &TaskId) -> Result<bool> {
        Ok(self.store.remove(id)?)
    }

    fn find_all(&self) -> Result<Vec<Task>> {
        Ok(self.store.read_sorted()?)
    }
}

/// Process-local repository for tests and embedding
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<TaskId, Task>>> {
        self.tasks
            .lock()
            .map_err(|_| anyhow::anyhow!("task map lock poisoned").into())
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn save(&self, task: &Task) -> Result<Task> {
        let mut tasks = self.lock()?;
        let saved = next_version(tasks.get(&task.id), task)?;
        tasks.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }

    fn delete(&self, id: &TaskId) -> Result<bool> {
        Ok(self.lock()?.remove(id).is_some())
    }

    fn find_all(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.lock()?.values().cloned().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }
}
