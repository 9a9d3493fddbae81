//! Visibility and ordering rules for the task list.
//!
//! A [`TaskQuery`] is the combination of the current search text and the
//! persisted [`FilterPreferences`]. The same rules are expressed twice: as
//! SQL fragments for the SQLite store and as plain Rust predicates for
//! in-memory stores and assertions. Both must agree.
//!
//! - A task is visible iff its name contains the search text (literal,
//!   case-sensitive; the empty string matches everything) and either
//!   completed tasks are shown or the task is not completed.
//! - Important tasks always come first. Ties are broken by name (byte
//!   order) or by creation time depending on [`SortOrder`], then by id.

use crate::types::{FilterPreferences, SortOrder, Task};
use std::cmp::Ordering;

/// One concrete (search, sort order, hide-completed) combination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskQuery {
    pub search: String,
    pub sort_order: SortOrder,
    pub hide_completed: bool,
}

impl TaskQuery {
    pub fn new(search: impl Into<String>, preferences: FilterPreferences) -> Self {
        Self {
            search: search.into(),
            sort_order: preferences.sort_order,
            hide_completed: preferences.hide_completed,
        }
    }

    pub fn preferences(&self) -> FilterPreferences {
        FilterPreferences::new(self.sort_order, self.hide_completed)
    }

    /// Whether `task` belongs to the visible set for this query.
    pub fn matches(&self, task: &Task) -> bool {
        let name_matches = task.name.contains(self.search.as_str());
        let completion_matches = !self.hide_completed || !task.completed;
        name_matches && completion_matches
    }

    /// Total order of the visible set.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let secondary = match self.sort_order {
            SortOrder::ByName => a.name.as_bytes().cmp(b.name.as_bytes()),
            SortOrder::ByDate => a.created.cmp(&b.created),
        };
        b.important
            .cmp(&a.important)
            .then(secondary)
            .then(a.id.cmp(&b.id))
    }

    /// Filter and sort an in-memory collection.
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut visible: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect();
        visible.sort_by(|a, b| self.compare(a, b));
        visible
    }

    /// WHERE clause bound as `?1` = hide_completed, `?2` = search text.
    ///
    /// `instr` keeps the match literal and case-sensitive, unlike `LIKE`.
    pub fn where_clause() -> &'static str {
        "(completed != ?1 OR completed = 0) AND (?2 = '' OR instr(name, ?2) > 0)"
    }

    /// ORDER BY expression for this query's sort order.
    pub fn order_clause(&self) -> &'static str {
        match self.sort_order {
            SortOrder::ByName => "important DESC, name ASC, id ASC",
            SortOrder::ByDate => "important DESC, created ASC, id ASC",
        }
    }
}
