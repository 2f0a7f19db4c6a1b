pub mod context;
pub mod error;
pub mod graph;
pub mod runner;
pub mod storage;
pub mod task;

// Re-export commonly used types
pub use context::{ChatMessage, Context, MessageRole};
pub use error::{FlowError, Result};
pub use graph::{ExecutionResult, ExecutionStatus, Graph, GraphBuilder};
pub use runner::FlowRunner;
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use task::{NextAction, Task, TaskResult};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoTask;

    #[async_trait]
    impl Task for EchoTask {
        fn id(&self) -> &str {
            "echo"
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let input: String = context.get("input").await.unwrap_or_default();
            context.set("output", format!("Processed: {}", input)).await;

            Ok(TaskResult::new(
                Some("done".to_string()),
                NextAction::End,
            ))
        }
    }

    struct RouteTask;

    #[async_trait]
    impl Task for RouteTask {
        fn id(&self) -> &str {
            "route"
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            context.set("routed", true).await;
            Ok(TaskResult::new(None, NextAction::ContinueAndExecute))
        }
    }

    struct LeftTask;

    #[async_trait]
    impl Task for LeftTask {
        fn id(&self) -> &str {
            "left"
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            context.set("branch", "left").await;
            Ok(TaskResult::new(None, NextAction::End))
        }
    }

    #[tokio::test]
    async fn single_task_session_completes() {
        let graph = GraphBuilder::new("test_graph")
            .add_task(Arc::new(EchoTask))
            .build();

        let mut session = Session::new_from_task("s1".to_string(), "echo");
        session.context.set("input", "Hello, World!").await;

        let result = graph.execute_session(&mut session).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.response.as_deref(), Some("done"));

        let output: String = session.context.get("output").await.unwrap();
        assert_eq!(output, "Processed: Hello, World!");
    }

    #[tokio::test]
    async fn conditional_edge_selects_branch() {
        let graph = GraphBuilder::new("branching")
            .add_task(Arc::new(RouteTask))
            .add_task(Arc::new(LeftTask))
            .add_conditional_edge("route", "left", |ctx| {
                ctx.get_sync::<bool>("routed").unwrap_or(false)
            })
            .build();

        let mut session = Session::new_from_task("s1".to_string(), "route");
        let result = graph.execute_session(&mut session).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Completed);
        let branch: String = session.context.get("branch").await.unwrap();
        assert_eq!(branch, "left");
    }

    #[tokio::test]
    async fn unknown_task_is_an_error() {
        let graph = GraphBuilder::new("empty").build();
        let mut session = Session::new_from_task("s1".to_string(), "missing");

        let err = graph.execute_session(&mut session).await.unwrap_err();
        assert!(matches!(err, FlowError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn storage_round_trip_and_purge() {
        let storage = InMemorySessionStorage::new();

        let session = Session::new_from_task("session1".to_string(), "echo");
        storage.save(session.clone()).await.unwrap();

        let retrieved = storage.get("session1").await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().current_task_id, "echo");

        // Nothing is old enough to purge yet.
        assert_eq!(storage.purge_older_than(chrono::Duration::hours(1)), 0);
        // Everything is older than "zero seconds ago".
        assert_eq!(storage.purge_older_than(chrono::Duration::seconds(-1)), 1);
        assert!(storage.get("session1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transcript_preserves_order() {
        let context = Context::new();
        context.add_user_message("hello").await;
        context.add_assistant_message("hi, which form?").await;
        context.add_user_message("form fc").await;

        let history = context.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[2].content, "form fc");
    }
}
