//! The per-turn conversation loop: consult the model with the action
//! catalog, execute whatever tools it asked for, feed the results back,
//! and repeat until the model answers in plain text.

use crate::client::{ModelClient, ModelReply};
use crate::error::ChatError;
use crate::model::{ContentBlock, Message};
use crate::surface::ToolSurface;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant that manages a todo list using the provided tools.

You may need to call several tools to complete a request, and you may analyze \
one tool's result before deciding on the next call. If a request is ambiguous, \
ask a clarifying question instead of guessing. When a tool reports a failure, \
explain the problem to the user in plain language.

Be conversational and concise in your replies.";

const DEFAULT_MAX_ROUNDS: usize = 10;

/// Drives one conversation. The orchestrator never chooses tools on
/// its own; every invocation is one the model explicitly requested.
pub struct Orchestrator {
    model: Arc<dyn ModelClient>,
    surface: Arc<dyn ToolSurface>,
    system_prompt: String,
    history: Vec<Message>,
    max_rounds: usize,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ModelClient>, surface: Arc<dyn ToolSurface>) -> Self {
        Self {
            model,
            surface,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history: Vec::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// The accumulated conversation, including tool traffic.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Run one full turn: user utterance in, final model text out.
    ///
    /// Tool-level failures stay inside the conversation; only model
    /// transport/API failures and the round cap surface as errors.
    pub async fn handle_turn(&mut self, user_text: &str) -> Result<String, ChatError> {
        self.history.push(Message::user_text(user_text));
        let tools = self.surface.catalog();

        for round in 0..self.max_rounds {
            let reply = self
                .model
                .complete(&self.system_prompt, &self.history, &tools)
                .await?;
            self.history
                .push(Message::assistant(reply.content.clone()));

            let requests = reply.tool_uses();
            if requests.is_empty() {
                return Ok(final_text(&reply));
            }

            debug!(round, count = requests.len(), "dispatching tool requests");

            // Sequential, in the model's order: a later request may
            // depend on an earlier result having been reported.
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                let outcome = self.surface.invoke(&request.name, request.input).await;
                debug!(
                    tool = %request.name,
                    is_error = outcome.is_error,
                    "tool invocation finished"
                );
                results.push(ContentBlock::tool_result(
                    request.id,
                    outcome.content,
                    outcome.is_error,
                ));
            }
            self.history.push(Message::tool_results(results));
        }

        Err(ChatError::TurnLimit(self.max_rounds))
    }
}

fn final_text(reply: &ModelReply) -> String {
    let text = reply.text();
    if text.is_empty() {
        "I completed the task.".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolDefinition;
    use crate::surface::LocalSurface;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tally_core::{Priority, SharedTodoStore, TodoStore};
    use tally_mcp::catalog::ToolCatalog;
    use tally_mcp::tools::todo_registry;

    /// Model fake that replays a fixed script of replies.
    struct ScriptedModel {
        replies: Mutex<VecDeque<ModelReply>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Vec<ContentBlock>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|content| ModelReply {
                            content,
                            stop_reason: None,
                        })
                        .collect(),
                ),
            })
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(
            &self,
            _system: &str,
            _messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> Result<ModelReply, ChatError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(ChatError::Api {
                    status: 500,
                    message: "script exhausted".to_string(),
                })
        }
    }

    /// Model fake whose endpoint is always down.
    struct UnreachableModel;

    #[async_trait::async_trait]
    impl ModelClient for UnreachableModel {
        async fn complete(
            &self,
            _system: &str,
            _messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> Result<ModelReply, ChatError> {
            Err(ChatError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            })
        }
    }

    fn surface_over(store: SharedTodoStore) -> Arc<LocalSurface> {
        Arc::new(LocalSurface::new(todo_registry(
            store,
            &ToolCatalog::descriptive(),
        )))
    }

    fn tool_use(id: &str, name: &str, input: serde_json::Value) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }
    }

    fn last_tool_results(orchestrator: &Orchestrator) -> Vec<(String, Option<bool>)> {
        orchestrator
            .history()
            .iter()
            .rev()
            .find_map(|message| {
                let results: Vec<_> = message
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::ToolResult {
                            content, is_error, ..
                        } => Some((content.clone(), *is_error)),
                        _ => None,
                    })
                    .collect();
                (!results.is_empty()).then_some(results)
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_create_flow_end_to_end() {
        let store = TodoStore::shared();
        let model = ScriptedModel::new(vec![
            vec![
                ContentBlock::text("I'll add that for you."),
                tool_use(
                    "tu_1",
                    "create_todo",
                    json!({"title": "buy groceries", "priority": "high"}),
                ),
            ],
            vec![ContentBlock::text(
                "Added \"buy groceries\" as todo 1 with high priority.",
            )],
        ]);
        let mut orchestrator = Orchestrator::new(model, surface_over(store.clone()));

        let reply = orchestrator
            .handle_turn("add buy groceries with high priority")
            .await
            .unwrap();

        assert!(reply.contains("buy groceries"));
        assert!(reply.contains('1'));

        let todos = store.lock().unwrap().list(Default::default());
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "buy groceries");
        assert_eq!(todos[0].priority, Priority::High);

        // The tool result reported the created record back to the model.
        let results = last_tool_results(&orchestrator);
        assert_eq!(results.len(), 1);
        assert!(results[0].0.contains("buy groceries"));
        assert_eq!(results[0].1, None);
    }

    #[tokio::test]
    async fn test_missing_todo_reported_to_model_not_user() {
        let model = ScriptedModel::new(vec![
            vec![tool_use(
                "tu_1",
                "update_todo",
                json!({"id": 1, "completed": true}),
            )],
            vec![ContentBlock::text(
                "There's no task 1 yet. Would you like me to create one?",
            )],
        ]);
        let mut orchestrator = Orchestrator::new(model, surface_over(TodoStore::shared()));

        // The turn succeeds with a graceful explanation; the failure
        // never escapes as an error.
        let reply = orchestrator
            .handle_turn("mark task 1 as completed")
            .await
            .unwrap();
        assert!(reply.contains("no task 1"));

        let results = last_tool_results(&orchestrator);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, Some(true));
        assert!(results[0].0.contains("not_found"));
    }

    #[tokio::test]
    async fn test_unknown_tool_fed_back_as_failure() {
        let model = ScriptedModel::new(vec![
            vec![tool_use("tu_1", "teleport_todo", json!({"id": 1}))],
            vec![ContentBlock::text("Sorry, I can't do that.")],
        ]);
        let mut orchestrator = Orchestrator::new(model, surface_over(TodoStore::shared()));

        let reply = orchestrator.handle_turn("teleport my todo").await.unwrap();
        assert!(reply.contains("Sorry"));

        let results = last_tool_results(&orchestrator);
        assert_eq!(results[0].1, Some(true));
        assert!(results[0].0.contains("unknown tool: teleport_todo"));
    }

    #[tokio::test]
    async fn test_multiple_tools_dispatch_in_order() {
        let store = TodoStore::shared();
        let model = ScriptedModel::new(vec![
            vec![
                tool_use("tu_1", "create_todo", json!({"title": "first"})),
                tool_use("tu_2", "create_todo", json!({"title": "second"})),
            ],
            vec![ContentBlock::text("Added both.")],
        ]);
        let mut orchestrator = Orchestrator::new(model, surface_over(store.clone()));

        orchestrator.handle_turn("add first and second").await.unwrap();

        let todos = store.lock().unwrap().list(Default::default());
        let titles: Vec<_> = todos.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);

        let results = last_tool_results(&orchestrator);
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_model_failure_fails_the_turn() {
        let mut orchestrator =
            Orchestrator::new(Arc::new(UnreachableModel), surface_over(TodoStore::shared()));

        let err = orchestrator.handle_turn("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_round_cap_is_enforced() {
        // A model that asks for a tool on every round never terminates
        // on its own; the cap turns that into an error.
        let endless: Vec<Vec<ContentBlock>> = (0..3)
            .map(|i| vec![tool_use(&format!("tu_{i}"), "list_todos", json!({}))])
            .collect();
        let model = ScriptedModel::new(endless);
        let mut orchestrator = Orchestrator::new(model, surface_over(TodoStore::shared()))
            .with_max_rounds(2);

        let err = orchestrator.handle_turn("loop forever").await.unwrap_err();
        assert!(matches!(err, ChatError::TurnLimit(2)));
    }

    #[tokio::test]
    async fn test_history_carries_across_turns() {
        let model = ScriptedModel::new(vec![
            vec![ContentBlock::text("Hello!")],
            vec![ContentBlock::text("Still here.")],
        ]);
        let mut orchestrator = Orchestrator::new(model, surface_over(TodoStore::shared()));

        orchestrator.handle_turn("hi").await.unwrap();
        orchestrator.handle_turn("you there?").await.unwrap();

        // Two user messages and two assistant messages accumulated.
        assert_eq!(orchestrator.history().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_text_reply_gets_fallback() {
        let store = TodoStore::shared();
        let model = ScriptedModel::new(vec![
            vec![tool_use("tu_1", "create_todo", json!({"title": "quiet"}))],
            // Final reply with no text blocks at all.
            vec![],
        ]);
        let mut orchestrator = Orchestrator::new(model, surface_over(store));

        let reply = orchestrator.handle_turn("add quiet").await.unwrap();
        assert_eq!(reply, "I completed the task.");
    }
}
