// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tasks the assistant has confirmed, per user.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A to-do item owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Owner's display name.
    pub username: String,
    /// Title as confirmed by the assistant.
    pub title: String,
    /// Whether the assistant confirmed completion.
    pub complete: bool,
}

impl Task {
    /// An open task.
    pub fn open(username: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            title: title.into(),
            complete: false,
        }
    }
}

/// Shared task list in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<Mutex<Vec<Task>>>,
}

impl TaskStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task, replacing any task of the same user with the same title.
    pub fn add(&self, task: Task) {
        let mut tasks = self.lock();
        tasks.retain(|t| !(t.username == task.username && t.title == task.title));
        tasks.push(task);
    }

    /// Every task of `username`.
    pub fn tasks(&self, username: &str) -> Vec<Task> {
        self.lock()
            .iter()
            .filter(|t| t.username == username)
            .cloned()
            .collect()
    }

    /// Open tasks of `username`.
    pub fn active_tasks(&self, username: &str) -> Vec<Task> {
        self.lock()
            .iter()
            .filter(|t| t.username == username && !t.complete)
            .cloned()
            .collect()
    }

    /// Mark every task of `username` titled `title` complete. Returns how many changed.
    pub fn mark_complete(&self, username: &str, title: &str) -> usize {
        let mut tasks = self.lock();
        let mut changed = 0;
        for t in tasks
            .iter_mut()
            .filter(|t| t.username == username && t.title == title)
        {
            t.complete = true;
            changed += 1;
        }
        changed
    }

    /// Replace every task of `username` titled `old_title` with a single task
    /// titled `new_title`. The completion state of the first match carries
    /// over; an existing task already titled `new_title` is replaced too.
    pub fn rename(&self, username: &str, new_title: &str, old_title: &str) {
        let mut tasks = self.lock();
        let Some(complete) = tasks
            .iter()
            .find(|t| t.username == username && t.title == old_title)
            .map(|t| t.complete)
        else {
            return;
        };
        tasks.retain(|t| !(t.username == username && (t.title == old_title || t.title == new_title)));
        tasks.push(Task {
            username: username.to_string(),
            title: new_title.to_string(),
            complete,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().expect("task store lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_tasks_exclude_completed() {
        let store = TaskStore::new();
        store.add(Task::open("Ann", "Buy milk"));
        store.add(Task::open("Ann", "Call mom"));
        store.add(Task::open("Ben", "Buy milk"));
        assert_eq!(store.mark_complete("Ann", "Buy milk"), 1);

        let active: Vec<_> = store
            .active_tasks("Ann")
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(active, vec!["Call mom"]);
        assert_eq!(store.tasks("Ann").len(), 2);
        assert_eq!(store.active_tasks("Ben").len(), 1);
    }

    #[test]
    fn titles_are_unique_per_user() {
        let store = TaskStore::new();
        store.add(Task::open("Ann", "milk"));
        store.add(Task::open("Ann", "milk"));
        store.add(Task::open("Ben", "milk"));
        assert_eq!(store.tasks("Ann").len(), 1);
        assert_eq!(store.tasks("Ben").len(), 1);
    }

    #[test]
    fn rename_leaves_one_task_with_the_new_title() {
        let store = TaskStore::new();
        store.add(Task::open("Ann", "milk"));
        store.add(Task::open("Ann", "bread"));
        store.add(Task::open("Ben", "milk"));
        store.mark_complete("Ann", "milk");
        store.rename("Ann", "oat milk", "milk");

        let ann: Vec<_> = store.tasks("Ann").into_iter().map(|t| (t.title, t.complete)).collect();
        assert_eq!(ann, vec![("bread".to_string(), false), ("oat milk".to_string(), true)]);
        assert_eq!(store.tasks("Ben")[0].title, "milk");
    }

    #[test]
    fn rename_onto_an_existing_title_merges() {
        let store = TaskStore::new();
        store.add(Task::open("Ann", "milk"));
        store.add(Task::open("Ann", "oat milk"));
        store.rename("Ann", "oat milk", "milk");
        assert_eq!(store.tasks("Ann").len(), 1);
        assert_eq!(store.tasks("Ann")[0].title, "oat milk");
    }

    #[test]
    fn rename_of_unknown_title_is_a_noop() {
        let store = TaskStore::new();
        store.add(Task::open("Ann", "milk"));
        store.rename("Ann", "bread", "eggs");
        assert_eq!(store.tasks("Ann")[0].title, "milk");
    }
}
