// The four todo tools. Each validates its arguments against the
// declared schema before touching the store, and converts every store
// outcome into the uniform result shape.

use crate::catalog::{ActionDocs, ToolCatalog};
use crate::failure::ToolFailure;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    json_schema_boolean, json_schema_enum, json_schema_integer, json_schema_object,
    json_schema_string, Tool, ToolRegistry,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tally_core::{Priority, SharedTodoStore, StatusFilter, TodoId, TodoPatch, TodoStore};

/// Build the full todo registry over a shared store, documented by the
/// given catalog.
pub fn todo_registry(store: SharedTodoStore, catalog: &ToolCatalog) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CreateTodoTool::new(
        store.clone(),
        catalog.create.clone(),
    )));
    registry.register(Arc::new(ListTodosTool::new(
        store.clone(),
        catalog.list.clone(),
    )));
    registry.register(Arc::new(UpdateTodoTool::new(
        store.clone(),
        catalog.update.clone(),
    )));
    registry.register(Arc::new(DeleteTodoTool::new(store, catalog.delete.clone())));
    registry
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolFailure> {
    serde_json::from_value(arguments)
        .map_err(|err| ToolFailure::validation(format!("invalid arguments: {}", err)))
}

fn parse_priority(raw: Option<String>) -> Result<Option<Priority>, ToolFailure> {
    raw.map(|s| s.parse::<Priority>())
        .transpose()
        .map_err(|err| ToolFailure::validation(err.to_string()))
}

fn success(payload: Value) -> Result<CallToolResult> {
    let body = serde_json::to_string_pretty(&payload).context("serializing tool payload")?;
    Ok(CallToolResult::text(body))
}

fn lock(store: &SharedTodoStore) -> std::sync::MutexGuard<'_, TodoStore> {
    store.lock().unwrap()
}

/// Create a new todo.
pub struct CreateTodoTool {
    store: SharedTodoStore,
    docs: ActionDocs,
}

impl CreateTodoTool {
    pub fn new(store: SharedTodoStore, docs: ActionDocs) -> Self {
        Self { store, docs }
    }
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

#[async_trait::async_trait]
impl Tool for CreateTodoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.docs.name.to_string(),
            description: self.docs.description.to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "title": json_schema_string(self.docs.param("title")),
                    "description": json_schema_string(self.docs.param("description")),
                    "priority": json_schema_enum(&Priority::NAMES, self.docs.param("priority")),
                }),
                &["title"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: CreateArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(failure.into_result()),
        };
        let priority = match parse_priority(args.priority) {
            Ok(priority) => priority.unwrap_or_default(),
            Err(failure) => return Ok(failure.into_result()),
        };

        let created = lock(&self.store).create(args.title, args.description, priority);
        match created {
            Ok(todo) => success(serde_json::json!({ "todo": todo })),
            Err(err) => Ok(ToolFailure::from(err).into_result()),
        }
    }
}

/// List todos, optionally filtered by completion status.
pub struct ListTodosTool {
    store: SharedTodoStore,
    docs: ActionDocs,
}

impl ListTodosTool {
    pub fn new(store: SharedTodoStore, docs: ActionDocs) -> Self {
        Self { store, docs }
    }
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default)]
    status: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ListTodosTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.docs.name.to_string(),
            description: self.docs.description.to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "status": json_schema_enum(&StatusFilter::NAMES, self.docs.param("status")),
                }),
                &[],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ListArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(failure.into_result()),
        };
        let filter = match args.status {
            None => StatusFilter::All,
            Some(raw) => match raw.parse::<StatusFilter>() {
                Ok(filter) => filter,
                Err(message) => return Ok(ToolFailure::validation(message).into_result()),
            },
        };

        let (todos, total) = {
            let store = lock(&self.store);
            (store.list(filter), store.len())
        };
        let count = todos.len();
        success(serde_json::json!({
            "todos": todos,
            "count": count,
            "total": total,
        }))
    }
}

/// Update fields of an existing todo.
pub struct UpdateTodoTool {
    store: SharedTodoStore,
    docs: ActionDocs,
}

impl UpdateTodoTool {
    pub fn new(store: SharedTodoStore, docs: ActionDocs) -> Self {
        Self { store, docs }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
}

#[async_trait::async_trait]
impl Tool for UpdateTodoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.docs.name.to_string(),
            description: self.docs.description.to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "id": json_schema_integer(self.docs.param("id")),
                    "title": json_schema_string(self.docs.param("title")),
                    "description": json_schema_string(self.docs.param("description")),
                    "priority": json_schema_enum(&Priority::NAMES, self.docs.param("priority")),
                    "completed": json_schema_boolean(self.docs.param("completed")),
                }),
                &["id"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: UpdateArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(failure.into_result()),
        };
        let priority = match parse_priority(args.priority) {
            Ok(priority) => priority,
            Err(failure) => return Ok(failure.into_result()),
        };

        let patch = TodoPatch {
            title: args.title,
            description: args.description,
            priority,
            completed: args.completed,
        };
        let updated = lock(&self.store).update(TodoId(args.id), patch);
        match updated {
            Ok(todo) => success(serde_json::json!({ "todo": todo })),
            Err(err) => Ok(ToolFailure::from(err).into_result()),
        }
    }
}

/// Delete a todo by id.
pub struct DeleteTodoTool {
    store: SharedTodoStore,
    docs: ActionDocs,
}

impl DeleteTodoTool {
    pub fn new(store: SharedTodoStore, docs: ActionDocs) -> Self {
        Self { store, docs }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteArgs {
    id: u64,
}

#[async_trait::async_trait]
impl Tool for DeleteTodoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.docs.name.to_string(),
            description: self.docs.description.to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "id": json_schema_integer(self.docs.param("id")),
                }),
                &["id"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: DeleteArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(failure.into_result()),
        };

        let removed = lock(&self.store).delete(TodoId(args.id));
        match removed {
            Ok(todo) => success(serde_json::json!({ "deleted": true, "todo": todo })),
            Err(err) => Ok(ToolFailure::from(err).into_result()),
        }
    }
}
