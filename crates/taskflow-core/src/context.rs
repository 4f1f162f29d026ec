//! Execution State: per-run state threaded through every stage of a pipeline
//!
//! Stages never mutate the state directly. They return a [`StateUpdate`]
//! which is folded in with one reducer per field:
//!
//! ```text
//! messages      concatenate            (left ++ right)
//! context       shallow merge          (right wins per key)
//! current_task  replace when supplied
//! step          replace when supplied
//! is_processing replace when supplied
//! ```
use crate::data_model::{Message, Task, TaskStatus};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Step name a fresh execution state starts at.
pub const INITIAL_STEP: &str = "start";

pub type Context = HashMap<String, Value>;

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionState {
    pub run_id: String,
    pub messages: Vec<Message>,
    pub current_task: Option<Task>,
    pub context: Context,
    pub step: String,
    pub is_processing: bool,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            current_task: None,
            context: Context::new(),
            step: INITIAL_STEP.to_string(),
            is_processing: false,
        }
    }
}

impl ExecutionState {
    /// Fresh state for one run of `task`: the task is copied at status
    /// `processing`, the context is empty.
    pub fn for_task(task: &Task) -> Self {
        let mut current = task.clone();
        current.status = TaskStatus::Processing;

        Self {
            current_task: Some(current),
            is_processing: true,
            ..Self::default()
        }
    }

    /// Text payload of the current task; empty when there is none.
    pub fn input(&self) -> &str {
        self.current_task
            .as_ref()
            .map(|t| t.input.as_str())
            .unwrap_or("")
    }

    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Fold a stage's partial update into this state.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            messages,
            current_task,
            context,
            step,
            is_processing,
        } = update;

        append_messages(&mut self.messages, messages);
        merge_context(&mut self.context, context);
        replace_if_set(&mut self.current_task, current_task.map(Some));
        replace_if_set(&mut self.step, step);
        replace_if_set(&mut self.is_processing, is_processing);
    }
}

// ============================================================================
// REDUCERS
// ============================================================================

/// Sequence reducer: right-hand items are appended in order.
pub fn append_messages(left: &mut Vec<Message>, right: Vec<Message>) {
    left.extend(right);
}

/// Mapping reducer: shallow union, right-hand wins per key. Nested objects
/// are replaced, not merged.
pub fn merge_context(left: &mut Context, right: Context) {
    for (key, value) in right {
        left.insert(key, value);
    }
}

/// Scalar reducer: replaced wholesale when the update supplies a value.
pub fn replace_if_set<T>(left: &mut T, right: Option<T>) {
    if let Some(value) = right {
        *left = value;
    }
}

// ============================================================================
// PARTIAL UPDATE
// ============================================================================

/// Partial state returned by a stage handler. Unset fields leave the
/// running state untouched.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub current_task: Option<Task>,
    pub context: Context,
    pub step: Option<String>,
    pub is_processing: Option<bool>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.current_task = Some(task);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn processing(mut self, is_processing: bool) -> Self {
        self.is_processing = Some(is_processing);
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::{Role, TaskType};
    use serde_json::json;

    fn state() -> ExecutionState {
        ExecutionState::for_task(&Task::new(TaskType::Sentiment, "hello").with_id("t1"))
    }

    #[test]
    fn test_for_task_initial_state() {
        let state = state();
        assert_eq!(state.step, "start");
        assert!(state.is_processing);
        assert!(state.context.is_empty());
        assert!(state.messages.is_empty());
        assert_eq!(state.current_task.unwrap().status, TaskStatus::Processing);
    }

    #[test]
    fn test_context_merge_right_wins() {
        let mut state = state();
        state.apply(StateUpdate::new().context("a", json!(1)).context("b", json!({"x": 1})));
        state.apply(StateUpdate::new().context("b", json!({"y": 2})).context("c", json!(3)));

        assert_eq!(state.context["a"], json!(1));
        // shallow: the nested object is replaced, not merged
        assert_eq!(state.context["b"], json!({"y": 2}));
        assert_eq!(state.context["c"], json!(3));
    }

    #[test]
    fn test_messages_concatenate_in_order() {
        let mut state = state();
        state.apply(StateUpdate::new().message(Message::new(Role::User, "one")));
        state.apply(
            StateUpdate::new()
                .message(Message::new(Role::Assistant, "two"))
                .message(Message::new(Role::System, "three")),
        );

        let contents: Vec<_> = state.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_scalars_retained_when_unset() {
        let mut state = state();
        state.apply(StateUpdate::new().step("analyzed"));
        state.apply(StateUpdate::new().context("k", json!(true)));

        assert_eq!(state.step, "analyzed");
        assert!(state.is_processing);
        assert_eq!(state.current_task.as_ref().unwrap().id, "t1");

        state.apply(StateUpdate::new().processing(false));
        assert!(!state.is_processing);
        assert_eq!(state.step, "analyzed");
    }

    #[test]
    fn test_task_replaced_wholesale() {
        let mut state = state();
        let mut task = state.current_task.clone().unwrap();
        task.output = Some("positive".to_string());
        task.input = "normalized".to_string();
        state.apply(StateUpdate::new().task(task));

        let current = state.current_task.unwrap();
        assert_eq!(current.output.as_deref(), Some("positive"));
        assert_eq!(current.input, "normalized");
    }

    #[test]
    fn test_input_defaults_to_empty() {
        let state = ExecutionState::default();
        assert_eq!(state.input(), "");
    }

    #[test]
    fn test_runs_do_not_share_context() {
        let mut first = state();
        first.apply(StateUpdate::new().context("tokens", json!(["a"])));
        let second = state();
        assert!(second.context.is_empty());
        assert_ne!(first.run_id, second.run_id);
    }
}
