// In-memory todo storage. The store is the sole owner of the todo
// collection; everything else goes through its four operations.

use crate::types::{Priority, StatusFilter, Todo, TodoId, TodoPatch};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Errors produced by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The referenced todo does not exist.
    #[error("todo {0} not found")]
    NotFound(TodoId),

    /// An input violated a field constraint.
    #[error("{0}")]
    Validation(String),
}

/// A store handle shared between tools. All mutations serialize through
/// the one mutex, which is the concurrency boundary for the whole system.
pub type SharedTodoStore = Arc<Mutex<TodoStore>>;

/// In-memory todo collection with monotone id assignment.
///
/// Keyed by id, and ids are issued in ascending order, so iteration
/// order is creation order.
#[derive(Debug)]
pub struct TodoStore {
    todos: BTreeMap<TodoId, Todo>,
    next_id: u64,
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoStore {
    pub fn new() -> Self {
        Self {
            todos: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a shared handle around a fresh store.
    pub fn shared() -> SharedTodoStore {
        Arc::new(Mutex::new(Self::new()))
    }

    fn allocate_id(&mut self) -> TodoId {
        let id = TodoId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a new todo. The title must contain at least one
    /// non-whitespace character; no record is created otherwise.
    pub fn create(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
        priority: Priority,
    ) -> Result<Todo, StoreError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(StoreError::Validation(
                "title must not be empty".to_string(),
            ));
        }

        let id = self.allocate_id();
        let todo = Todo {
            id,
            title,
            description,
            priority,
            completed: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.todos.insert(id, todo.clone());
        tracing::debug!(id = %id, "created todo");
        Ok(todo)
    }

    /// List todos in creation order, optionally filtered by completion.
    pub fn list(&self, filter: StatusFilter) -> Vec<Todo> {
        self.todos
            .values()
            .filter(|t| filter.matches(t.completed))
            .cloned()
            .collect()
    }

    /// Look up a single todo.
    pub fn get(&self, id: TodoId) -> Result<&Todo, StoreError> {
        self.todos.get(&id).ok_or(StoreError::NotFound(id))
    }

    /// Apply a partial update. The patch is validated in full before any
    /// field changes, so a rejected patch leaves the record untouched.
    pub fn update(&mut self, id: TodoId, patch: TodoPatch) -> Result<Todo, StoreError> {
        if let Some(ref title) = patch.title {
            if title.trim().is_empty() {
                return Err(StoreError::Validation(
                    "title must not be empty".to_string(),
                ));
            }
        }

        let todo = self.todos.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(title) = patch.title {
            todo.title = title;
        }
        if let Some(description) = patch.description {
            todo.description = Some(description);
        }
        if let Some(priority) = patch.priority {
            todo.priority = priority;
        }
        if let Some(completed) = patch.completed {
            todo.completed = completed;
        }
        todo.updated_at = Some(Utc::now());

        tracing::debug!(id = %id, "updated todo");
        Ok(todo.clone())
    }

    /// Remove a todo, returning the removed record.
    pub fn delete(&mut self, id: TodoId) -> Result<Todo, StoreError> {
        let removed = self.todos.remove(&id).ok_or(StoreError::NotFound(id))?;
        tracing::debug!(id = %id, "deleted todo");
        Ok(removed)
    }

    /// Number of todos currently stored.
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn create_some(store: &mut TodoStore, titles: &[&str]) -> Vec<TodoId> {
        titles
            .iter()
            .map(|t| store.create(*t, None, Priority::default()).unwrap().id)
            .collect()
    }

    #[test]
    fn test_create_assigns_monotone_ids() {
        let mut store = TodoStore::new();
        let ids = create_some(&mut store, &["a", "b", "c"]);
        assert_eq!(ids, vec![TodoId(1), TodoId(2), TodoId(3)]);
    }

    #[test]
    fn test_default_store_issues_ids_from_one() {
        let mut store = TodoStore::default();
        let todo = store.create("first", None, Priority::default()).unwrap();
        assert_eq!(todo.id, TodoId(1));
    }

    #[test]
    fn test_ids_never_reused_after_delete() {
        let mut store = TodoStore::new();
        let ids = create_some(&mut store, &["a", "b"]);
        store.delete(ids[1]).unwrap();

        let next = store.create("c", None, Priority::default()).unwrap();
        assert_eq!(next.id, TodoId(3));
    }

    #[test]
    fn test_create_rejects_empty_title() {
        let mut store = TodoStore::new();
        let err = store.create("", None, Priority::default()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // Whitespace-only counts as empty too.
        let err = store.create("   ", None, Priority::default()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // Nothing was inserted.
        assert!(store.is_empty());
        // And the id counter did not advance.
        let todo = store.create("real", None, Priority::default()).unwrap();
        assert_eq!(todo.id, TodoId(1));
    }

    #[test]
    fn test_list_creation_order_with_survivors() {
        let mut store = TodoStore::new();
        let ids = create_some(&mut store, &["a", "b", "c", "d"]);
        store.delete(ids[1]).unwrap();

        let titles: Vec<_> = store
            .list(StatusFilter::All)
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_list_status_filtering() {
        let mut store = TodoStore::new();
        let ids = create_some(&mut store, &["a", "b", "c"]);
        store
            .update(
                ids[1],
                TodoPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.list(StatusFilter::All).len(), 3);
        let completed = store.list(StatusFilter::Completed);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].title, "b");
        assert_eq!(store.list(StatusFilter::Pending).len(), 2);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = TodoStore::new();
        let err = store.update(TodoId(42), TodoPatch::default()).unwrap_err();
        assert_eq!(err, StoreError::NotFound(TodoId(42)));
    }

    #[test]
    fn test_update_applies_only_supplied_fields() {
        let mut store = TodoStore::new();
        let todo = store
            .create("write report", Some("q3 numbers".to_string()), Priority::Low)
            .unwrap();

        let updated = store
            .update(
                todo.id,
                TodoPatch {
                    priority: Some(Priority::High),
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "write report");
        assert_eq!(updated.description.as_deref(), Some("q3 numbers"));
        assert_eq!(updated.priority, Priority::High);
        assert!(updated.completed);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_update_rejects_empty_title_without_partial_mutation() {
        let mut store = TodoStore::new();
        let todo = store.create("keep me", None, Priority::Low).unwrap();

        let err = store
            .update(
                todo.id,
                TodoPatch {
                    title: Some("  ".to_string()),
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // The rejected patch must not have applied any of its fields.
        let current = store.get(todo.id).unwrap();
        assert_eq!(current.title, "keep me");
        assert!(!current.completed);
        assert!(current.updated_at.is_none());
    }

    #[test]
    fn test_delete_returns_removed_record() {
        let mut store = TodoStore::new();
        let todo = store.create("ephemeral", None, Priority::Medium).unwrap();

        let removed = store.delete(todo.id).unwrap();
        assert_eq!(removed.title, "ephemeral");
        assert!(store.is_empty());

        let err = store.delete(todo.id).unwrap_err();
        assert_eq!(err, StoreError::NotFound(todo.id));
    }
}
