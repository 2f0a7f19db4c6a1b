use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::Context, error::Result};

/// Result of a single task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Id of the task that produced this result. Filled in by the graph.
    #[serde(default)]
    pub task_id: String,
    /// Reply to surface to the user, if any.
    pub response: Option<String>,
    /// Short progress description kept on the session for diagnostics.
    pub status_message: Option<String>,
    /// What the graph should do next.
    pub next_action: NextAction,
}

impl TaskResult {
    pub fn new(response: Option<String>, next_action: NextAction) -> Self {
        Self {
            task_id: String::new(),
            response,
            status_message: None,
            next_action,
        }
    }

    pub fn new_with_status(
        response: Option<String>,
        next_action: NextAction,
        status_message: Option<String>,
    ) -> Self {
        Self {
            task_id: String::new(),
            response,
            status_message,
            next_action,
        }
    }
}

/// Defines what should happen after a task completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NextAction {
    /// Advance to the next task along the edges, then wait for the next turn.
    Continue,
    /// Advance to the next task and execute it within the same turn.
    ContinueAndExecute,
    /// Stay on the current task until the user provides more input.
    WaitForInput,
    /// Jump to a specific task by id, then wait for the next turn.
    GoTo(String),
    /// Finish the flow.
    End,
}

/// Core trait implemented by every step of an intake flow.
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique identifier for this task.
    fn id(&self) -> &str;

    /// Execute the task against the session context.
    async fn run(&self, context: Context) -> Result<TaskResult>;
}
