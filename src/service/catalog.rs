//! Catalog management
//!
//! Everything around the reservation workflow: the task catalog itself,
//! categories, tags, registered users, and the per-user and admin views of
//! outstanding reservations. Records are referred to by ID or by a natural
//! key (category slug or title, tag title, user e-mail).

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    is_valid_label, slugify, validate_comment, validate_email, validate_nickname,
    validate_title, Actor, AuthorizationError, AvailabilityStatus, Category, CategoryId,
    ReservationStatus, Role, Tag, TagId, Task, TaskId, User, UserId, ValidationError,
    LABEL_MAX_LEN, LABEL_MIN_LEN,
};
use crate::storage::{
    JsonlStore, JsonlTaskRepository, Page, PersistenceError, Project, TaskFilters,
    TaskRepository, DEFAULT_PAGE_SIZE,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} not found: {reference}")]
    NotFound {
        kind: &'static str,
        reference: String,
    },

    #[error("{kind} already exists: {value}")]
    Duplicate { kind: &'static str, value: String },

    #[error("Category '{title}' still has {count} task(s); move or delete them first")]
    CategoryInUse { title: String, count: usize },

    #[error("Label must be between {min} and {max} characters")]
    InvalidLabel { min: usize, max: usize },

    #[error("Administrators cannot revoke their own admin role")]
    SelfDemotion,

    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CatalogError {
    fn not_found(kind: &'static str, reference: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind,
            reference: reference.into(),
        }
    }

    /// Recovers a catalog error raised inside a store transaction
    fn from_store(err: anyhow::Error) -> Self {
        match err.downcast::<CatalogError>() {
            Ok(err) => err,
            Err(other) => CatalogError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

fn check_label(title: &str) -> Result<()> {
    if is_valid_label(title) {
        Ok(())
    } else {
        Err(CatalogError::InvalidLabel {
            min: LABEL_MIN_LEN,
            max: LABEL_MAX_LEN,
        })
    }
}

/// Fields of a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    /// Category ID, slug, or title
    pub category: String,
    /// Tag IDs or titles
    pub tags: Vec<String>,
    pub comment: Option<String>,
}

/// Changes to an existing task; unset fields are left alone
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub category: Option<String>,
    /// `Some(None)` clears the description
    pub comment: Option<Option<String>>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.comment.is_none()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
    }
}

/// Counts shown by `lend status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub tasks: usize,
    pub lent: usize,
    pub awaiting_review: usize,
    pub by_status: Vec<(ReservationStatus, usize)>,
    pub categories: usize,
    pub tags: usize,
    pub users: usize,
}

/// Catalog operations over the task repository and the label/user stores
pub struct CatalogService<R> {
    tasks: R,
    categories: JsonlStore<Category>,
    tags: JsonlStore<Tag>,
    users: JsonlStore<User>,
    page_size: usize,
}

impl CatalogService<JsonlTaskRepository> {
    /// Opens the catalog of a project
    pub fn for_project(project: &Project) -> Self {
        Self::new(
            project.task_repository(),
            project.category_store(),
            project.tag_store(),
            project.user_store(),
        )
        .with_page_size(project.config().project.catalog.page_size)
    }
}

impl<R: TaskRepository> CatalogService<R> {
    pub fn new(
        tasks: R,
        categories: JsonlStore<Category>,
        tags: JsonlStore<Tag>,
        users: JsonlStore<User>,
    ) -> Self {
        Self {
            tasks,
            categories,
            tags,
            users,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn tasks(&self) -> &R {
        &self.tasks
    }

    // ---- Tasks ----

    pub fn create_task(&self, actor: &Actor, new: NewTask) -> Result<Task> {
        actor.require(Role::Admin, "add tasks")?;
        validate_title(&new.title)?;
        if let Some(comment) = &new.comment {
            validate_comment(comment)?;
        }
        let author = actor
            .user_id()
            .cloned()
            .ok_or_else(|| AuthorizationError::forbidden(actor, "add tasks", Role::Admin))?;

        let category = self.find_category(&new.category)?;
        let mut task = Task::new(new.title.trim(), category.id, author);
        for tag in &new.tags {
            task.add_tag(self.find_tag(tag)?.id);
        }
        task.comment = new.comment;

        let saved = self.save_filed(&task)?;
        tracing::info!(task = %saved.id, category = %category.slug, "task created");
        Ok(saved)
    }

    pub fn edit_task(&self, actor: &Actor, id: &TaskId, changes: TaskChanges) -> Result<Task> {
        actor.require(Role::Admin, "edit tasks")?;
        let mut task = self.get_task(id)?;

        if let Some(title) = changes.title {
            validate_title(&title)?;
            task.set_title(title.trim());
        }
        if let Some(category) = changes.category {
            let category = self.find_category(&category)?;
            task.set_category(category.id);
        }
        if let Some(comment) = changes.comment {
            if let Some(text) = &comment {
                validate_comment(text)?;
            }
            task.set_comment(comment);
        }
        for tag in &changes.add_tags {
            task.add_tag(self.find_tag(tag)?.id);
        }
        for tag in &changes.remove_tags {
            let tag = self.find_tag(tag)?;
            task.remove_tag(&tag.id);
        }

        let saved = self.save_filed(&task)?;
        tracing::info!(task = %saved.id, version = saved.version, "task updated");
        Ok(saved)
    }

    /// Saves a task while its category is held in place
    ///
    /// Runs under the category store lock, so a concurrent
    /// [`delete_category`](Self::delete_category) sees the task or fails the
    /// save with `NotFound`.
    fn save_filed(&self, task: &Task) -> Result<Task> {
        self.categories
            .with_lock(|categories| {
                if !categories.contains_key(&task.category) {
                    return Err(CatalogError::not_found("Category", task.category.to_string()).into());
                }
                self.tasks
                    .save(task)
                    .map_err(|err| CatalogError::from(err).into())
            })
            .map_err(CatalogError::from_store)
    }

    pub fn delete_task(&self, actor: &Actor, id: &TaskId) -> Result<Task> {
        actor.require(Role::Admin, "delete tasks")?;
        let task = self.get_task(id)?;
        self.tasks.delete(id)?;
        tracing::info!(task = %id, "task deleted");
        Ok(task)
    }

    pub fn get_task(&self, id: &TaskId) -> Result<Task> {
        self.tasks
            .find_by_id(id)?
            .ok_or_else(|| CatalogError::not_found("Task", id.to_string()))
    }

    /// One page of tasks matching `filters`
    pub fn list_tasks(&self, filters: &TaskFilters, page: usize) -> Result<Page<Task>> {
        let tasks = self.tasks.list(filters)?;
        Ok(Page::paginate(tasks, page, self.page_size))
    }

    /// Tasks currently on the shelf, optionally within one category or tag
    pub fn public_tasks(
        &self,
        category: Option<&str>,
        tag: Option<&str>,
        page: usize,
    ) -> Result<Page<Task>> {
        let mut filters = TaskFilters::new().availability(AvailabilityStatus::Available);
        if let Some(category) = category {
            filters = filters.category(self.find_category(category)?.id);
        }
        if let Some(tag) = tag {
            filters = filters.tag(self.find_tag(tag)?.id);
        }
        self.list_tasks(&filters, page)
    }

    // ---- Categories ----

    pub fn add_category(&self, actor: &Actor, title: &str) -> Result<Category> {
        actor.require(Role::Admin, "add categories")?;
        check_label(title)?;
        let category = Category::new(title);

        self.categories
            .modify(|categories| {
                if categories.values().any(|c| c.slug == category.slug) {
                    return Err(CatalogError::Duplicate {
                        kind: "Category",
                        value: category.title.clone(),
                    }
                    .into());
                }
                categories.insert(category.id.clone(), category.clone());
                Ok(())
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(category = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    pub fn rename_category(&self, actor: &Actor, reference: &str, title: &str) -> Result<Category> {
        actor.require(Role::Admin, "rename categories")?;
        check_label(title)?;
        let id = self.find_category(reference)?.id;
        let slug = slugify(title);

        let renamed = self
            .categories
            .modify(|categories| {
                if categories.values().any(|c| c.slug == slug && c.id != id) {
                    return Err(CatalogError::Duplicate {
                        kind: "Category",
                        value: title.trim().to_string(),
                    }
                    .into());
                }
                let category = categories
                    .get_mut(&id)
                    .ok_or_else(|| CatalogError::not_found("Category", reference))?;
                category.rename(title);
                Ok(category.clone())
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(category = %renamed.id, slug = %renamed.slug, "category renamed");
        Ok(renamed)
    }

    /// Deletes a category that no task uses
    ///
    /// The usage check and the removal share the category store lock, which
    /// task saves also take.
    pub fn delete_category(&self, actor: &Actor, reference: &str) -> Result<Category> {
        actor.require(Role::Admin, "delete categories")?;
        let id = self.find_category(reference)?.id;

        let category = self
            .categories
            .modify(|categories| {
                let category = categories
                    .remove(&id)
                    .ok_or_else(|| CatalogError::not_found("Category", reference))?;
                let count = self
                    .tasks
                    .count_by_category(&id)
                    .map_err(CatalogError::from)?;
                if count > 0 {
                    tracing::debug!(category = %id, count, "category still in use");
                    return Err(CatalogError::CategoryInUse {
                        title: category.title,
                        count,
                    }
                    .into());
                }
                Ok(category)
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(category = %category.id, "category deleted");
        Ok(category)
    }

    /// Categories ordered by title
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.categories.read_sorted()?;
        categories.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(categories)
    }

    /// Finds a category by ID, slug, or title
    pub fn find_category(&self, reference: &str) -> Result<Category> {
        let categories = self.categories.read_all()?;

        if let Ok(id) = CategoryId::from_str(reference) {
            if let Some(category) = categories.get(&id) {
                return Ok(category.clone());
            }
        }

        let slug = slugify(reference);
        categories
            .into_values()
            .find(|c| c.slug == slug)
            .ok_or_else(|| CatalogError::not_found("Category", reference))
    }

    // ---- Tags ----

    pub fn add_tag(&self, actor: &Actor, title: &str) -> Result<Tag> {
        actor.require(Role::Admin, "add tags")?;
        check_label(title)?;
        let tag = Tag::new(title);

        self.tags
            .modify(|tags| {
                if tags.values().any(|t| t.matches_title(&tag.title)) {
                    return Err(CatalogError::Duplicate {
                        kind: "Tag",
                        value: tag.title.clone(),
                    }
                    .into());
                }
                tags.insert(tag.id.clone(), tag.clone());
                Ok(())
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(tag = %tag.id, title = %tag.title, "tag created");
        Ok(tag)
    }

    pub fn rename_tag(&self, actor: &Actor, reference: &str, title: &str) -> Result<Tag> {
        actor.require(Role::Admin, "rename tags")?;
        check_label(title)?;
        let id = self.find_tag(reference)?.id;

        let renamed = self
            .tags
            .modify(|tags| {
                if tags.values().any(|t| t.matches_title(title) && t.id != id) {
                    return Err(CatalogError::Duplicate {
                        kind: "Tag",
                        value: title.trim().to_string(),
                    }
                    .into());
                }
                let tag = tags
                    .get_mut(&id)
                    .ok_or_else(|| CatalogError::not_found("Tag", reference))?;
                tag.rename(title);
                Ok(tag.clone())
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(tag = %renamed.id, title = %renamed.title, "tag renamed");
        Ok(renamed)
    }

    /// Deletes a tag and detaches it from every task; returns the number of
    /// tasks that carried it
    pub fn delete_tag(&self, actor: &Actor, reference: &str) -> Result<(Tag, usize)> {
        actor.require(Role::Admin, "delete tags")?;
        let tag = self.find_tag(reference)?;

        let detached = self.tasks.remove_tag_everywhere(&tag.id)?;
        self.tags.remove(&tag.id)?;

        tracing::info!(tag = %tag.id, detached, "tag deleted");
        Ok((tag, detached))
    }

    /// Tags ordered by title
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags = self.tags.read_sorted()?;
        tags.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(tags)
    }

    /// Finds a tag by ID or title (case-insensitive)
    pub fn find_tag(&self, reference: &str) -> Result<Tag> {
        let tags = self.tags.read_all()?;

        if let Ok(id) = TagId::from_str(reference) {
            if let Some(tag) = tags.get(&id) {
                return Ok(tag.clone());
            }
        }

        tags.into_values()
            .find(|t| t.matches_title(reference))
            .ok_or_else(|| CatalogError::not_found("Tag", reference))
    }

    /// Resolves tag IDs to titles, skipping unknown ones
    pub fn tag_titles(&self, ids: &[TagId]) -> Result<Vec<String>> {
        let tags = self.tags.read_all()?;
        Ok(ids
            .iter()
            .filter_map(|id| tags.get(id).map(|t| t.title.clone()))
            .collect())
    }

    // ---- Users ----

    /// Registers a user; the first user of a catalog becomes its administrator
    pub fn register_user(&self, email: &str, nickname: Option<String>) -> Result<User> {
        validate_email(email)?;
        if let Some(nickname) = &nickname {
            validate_nickname(nickname)?;
        }
        let mut user = User::new(email, nickname.filter(|n| !n.trim().is_empty()));

        let user = self
            .users
            .modify(|users| {
                if users.values().any(|u| u.email == user.email) {
                    return Err(CatalogError::Duplicate {
                        kind: "User",
                        value: user.email.clone(),
                    }
                    .into());
                }
                if users.is_empty() {
                    user.grant(Role::Admin);
                }
                users.insert(user.id.clone(), user.clone());
                Ok(user)
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(user = %user.id, admin = user.is_admin(), "user registered");
        Ok(user)
    }

    /// Changes a user's e-mail address or nickname (admin only)
    ///
    /// `nickname: Some(None)` clears the nickname. The new address must not
    /// belong to another user.
    pub fn edit_user(
        &self,
        actor: &Actor,
        reference: &str,
        email: Option<&str>,
        nickname: Option<Option<String>>,
    ) -> Result<User> {
        actor.require(Role::Admin, "edit users")?;
        if let Some(email) = email {
            validate_email(email)?;
        }
        if let Some(Some(nickname)) = &nickname {
            validate_nickname(nickname)?;
        }
        let email = email.map(|e| e.trim().to_lowercase());
        let id = self.find_user(reference)?.id;

        let user = self
            .users
            .modify(|users| {
                if let Some(email) = &email {
                    if users.values().any(|u| &u.email == email && u.id != id) {
                        return Err(CatalogError::Duplicate {
                            kind: "User",
                            value: email.clone(),
                        }
                        .into());
                    }
                }
                let user = users
                    .get_mut(&id)
                    .ok_or_else(|| CatalogError::not_found("User", reference))?;
                if let Some(email) = email {
                    user.email = email;
                }
                if let Some(nickname) = nickname {
                    user.nickname = nickname.filter(|n| !n.trim().is_empty());
                }
                Ok(user.clone())
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(user = %user.id, "user updated");
        Ok(user)
    }

    /// Users ordered by e-mail (admin only)
    pub fn list_users(&self, actor: &Actor) -> Result<Vec<User>> {
        actor.require(Role::Admin, "list users")?;
        let mut users = self.users.read_sorted()?;
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    pub fn grant_admin(&self, actor: &Actor, reference: &str) -> Result<User> {
        actor.require(Role::Admin, "grant roles")?;
        self.update_roles(reference, |user| {
            user.grant(Role::Admin);
            Ok(())
        })
    }

    pub fn revoke_admin(&self, actor: &Actor, reference: &str) -> Result<User> {
        actor.require(Role::Admin, "revoke roles")?;
        let target = self.find_user(reference)?;
        if actor.user_id() == Some(&target.id) {
            return Err(CatalogError::SelfDemotion);
        }
        self.update_roles(reference, |user| {
            user.revoke(Role::Admin);
            Ok(())
        })
    }

    fn update_roles(
        &self,
        reference: &str,
        change: impl FnOnce(&mut User) -> Result<()>,
    ) -> Result<User> {
        let id = self.find_user(reference)?.id;

        let user = self
            .users
            .modify(|users| {
                let user = users
                    .get_mut(&id)
                    .ok_or_else(|| CatalogError::not_found("User", reference))?;
                change(user)?;
                Ok(user.clone())
            })
            .map_err(CatalogError::from_store)?;

        tracing::info!(user = %user.id, admin = user.is_admin(), "user roles updated");
        Ok(user)
    }

    /// Finds a user by ID or e-mail
    pub fn find_user(&self, reference: &str) -> Result<User> {
        let users = self.users.read_all()?;

        if let Ok(id) = UserId::from_str(reference) {
            if let Some(user) = users.get(&id) {
                return Ok(user.clone());
            }
        }

        let email = reference.trim().to_lowercase();
        users
            .into_values()
            .find(|u| u.email == email)
            .ok_or_else(|| CatalogError::not_found("User", reference))
    }

    /// Turns an optional user reference into the acting identity
    pub fn resolve_actor(&self, reference: Option<&str>) -> Result<Actor> {
        match reference {
            Some(reference) => Ok(self.find_user(reference)?.actor()),
            None => Ok(Actor::anonymous()),
        }
    }

    // ---- Reservations ----

    /// Tasks reserved by the acting user
    pub fn my_reservations(&self, actor: &Actor) -> Result<Vec<Task>> {
        actor.require(Role::User, "list reservations")?;
        match actor.user_id() {
            Some(user) => Ok(self.tasks.find_reserved_by(user)?),
            None => Ok(Vec::new()),
        }
    }

    /// Tasks somewhere in the reservation workflow (admin only)
    pub fn admin_queue(&self, actor: &Actor) -> Result<Vec<Task>> {
        actor.require(Role::Admin, "view the reservation queue")?;
        Ok(self
            .tasks
            .find_by_statuses(ReservationStatus::workflow_queue())?)
    }

    pub fn summary(&self) -> Result<CatalogSummary> {
        let tasks = self.tasks.find_all()?;
        let by_status = ReservationStatus::all()
            .iter()
            .map(|status| {
                let count = tasks
                    .iter()
                    .filter(|t| t.reservation_status == *status)
                    .count();
                (*status, count)
            })
            .collect();

        Ok(CatalogSummary {
            tasks: tasks.len(),
            lent: tasks
                .iter()
                .filter(|t| t.availability() == AvailabilityStatus::Lent)
                .count(),
            awaiting_review: tasks
                .iter()
                .filter(|t| t.reservation_status.is_requested())
                .count(),
            by_status,
            categories: self.categories.read_all()?.len(),
            tags: self.tags.read_all()?.len(),
            users: self.users.read_all()?.len(),
        })
    }
}
