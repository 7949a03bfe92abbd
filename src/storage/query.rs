//! Task filtering and pagination
//!
//! Filters are combined with AND; unset fields match everything. Listings are
//! ordered by most recently updated first.

use serde::Serialize;

use crate::domain::{
    Actor, AvailabilityStatus, CategoryId, ReservationStatus, TagId, Task, UserId,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Criteria for narrowing a task listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilters {
    pub category: Option<CategoryId>,
    pub tag: Option<TagId>,
    pub availability: Option<AvailabilityStatus>,
    /// Empty means any status
    pub statuses: Vec<ReservationStatus>,
    pub author: Option<UserId>,
    pub reserved_by: Option<UserId>,
}

impl TaskFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn tag(mut self, tag: TagId) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn availability(mut self, availability: AvailabilityStatus) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = ReservationStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn reserved_by(mut self, user: UserId) -> Self {
        self.reserved_by = Some(user);
        self
    }

    /// Restricts the listing to tasks authored by `author`, unless the viewer
    /// is an administrator, who sees every task
    pub fn authored_by(mut self, author: UserId, viewer: &Actor) -> Self {
        self.author = if viewer.is_admin() { None } else { Some(author) };
        self
    }

    /// Returns true if the task satisfies every set criterion
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(category) = &self.category {
            if &task.category != category {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !task.has_tag(tag) {
                return false;
            }
        }
        if let Some(availability) = self.availability {
            if task.availability() != availability {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.reservation_status) {
            return false;
        }
        if let Some(author) = &self.author {
            if &task.author != author {
                return false;
            }
        }
        if let Some(user) = &self.reserved_by {
            if !task.is_reserved_by(user) {
                return false;
            }
        }
        true
    }

    /// Filters and orders tasks, newest update first
    pub fn apply(&self, tasks: impl IntoIterator<Item = Task>) -> Vec<Task> {
        let mut matched: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        matched.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        matched
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    /// Number of items across all pages
    pub total: usize,
}

impl<T> Page<T> {
    /// Cuts `page` (1-based; 0 is treated as 1) out of `items`
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len();
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
