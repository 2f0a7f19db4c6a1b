//! End-to-end tests of the conversational collector: form selection, per-turn
//! field collection, auto-fill from a prior validation pass, and document
//! generation.

use forms_intake_service::models::{CollectorState, FieldSet};
use forms_intake_service::schema::FormSchemas;
use forms_intake_service::tasks::session_keys;
use forms_intake_service::workflow::{create_chat_session, create_flow_runner};
use intake_flow::{
    ExecutionResult, ExecutionStatus, FlowRunner, InMemorySessionStorage, Session, SessionStorage,
};
use std::sync::Arc;
use tempfile::TempDir;

const TEST_SCHEMAS: &str = r#"
fc:
  - Entity Name
  - Investment Amount
apr:
  - UIN
  - Entity Name
  - Financial Year
ecb:
  - Loan Registration Number
  - Entity Name
"#;

struct Harness {
    storage: Arc<InMemorySessionStorage>,
    runner: FlowRunner,
    _output: TempDir,
    output_dir: String,
}

impl Harness {
    fn new() -> Self {
        let schemas = Arc::new(FormSchemas::from_yaml(TEST_SCHEMAS).unwrap());
        let storage = Arc::new(InMemorySessionStorage::new());
        let runner = create_flow_runner(schemas, storage.clone());
        let output = TempDir::new().unwrap();
        let output_dir = output.path().to_str().unwrap().to_string();
        Self {
            storage,
            runner,
            _output: output,
            output_dir,
        }
    }

    async fn start_session(&self, auto: Option<FieldSet>) -> String {
        self.start_session_with_output(auto, &self.output_dir).await
    }

    async fn start_session_with_output(&self, auto: Option<FieldSet>, output_dir: &str) -> String {
        let session = create_chat_session(output_dir, auto).await;
        let id = session.id.clone();
        self.storage.save(session).await.unwrap();
        id
    }

    async fn session(&self, id: &str) -> Session {
        self.storage.get(id).await.unwrap().unwrap()
    }

    async fn send(&self, id: &str, text: &str) -> ExecutionResult {
        let session = self.session(id).await;
        session.context.set(session_keys::USER_INPUT, text).await;
        self.storage.save(session).await.unwrap();
        self.runner.run(id).await.unwrap()
    }
}

#[tokio::test]
async fn greeting_and_irrelevant_turns_stay_in_no_form_selected() {
    let harness = Harness::new();
    let id = harness.start_session(None).await;

    let result = harness.send(&id, "hello").await;
    assert_eq!(result.status, ExecutionStatus::WaitingForInput);
    assert!(result.response.unwrap().contains("FC"));

    let result = harness.send(&id, "what's the weather like?").await;
    assert_eq!(result.status, ExecutionStatus::WaitingForInput);
    assert!(result.response.unwrap().contains("only help"));

    let state: CollectorState = harness
        .session(&id)
        .await
        .context
        .get(session_keys::COLLECTOR_STATE)
        .await
        .unwrap();
    assert_eq!(state, CollectorState::NoFormSelected);
}

#[tokio::test]
async fn autofilled_field_is_skipped_and_flow_completes() {
    let harness = Harness::new();
    // Schema is [Entity Name, Investment Amount]; the amount is already known.
    let auto = FieldSet {
        amount: Some("2500000".to_string()),
        ..Default::default()
    };
    let id = harness.start_session(Some(auto)).await;

    let result = harness.send(&id, "i want to fill form fc").await;
    assert_eq!(result.status, ExecutionStatus::WaitingForInput);
    let reply = result.response.unwrap();
    assert!(reply.contains("Form FC"));
    assert!(reply.contains("Entity Name"));

    let result = harness.send(&id, "Acme Industries").await;
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.response.unwrap().contains("ready for download"));

    let session = harness.session(&id).await;
    let state: CollectorState = session
        .context
        .get(session_keys::COLLECTOR_STATE)
        .await
        .unwrap();
    assert_eq!(state, CollectorState::Complete);

    let answers: Vec<(String, String)> = session.context.get(session_keys::ANSWERS).await.unwrap();
    assert_eq!(
        answers,
        vec![
            ("Entity Name".to_string(), "Acme Industries".to_string()),
            ("Investment Amount".to_string(), "2500000".to_string()),
        ]
    );

    let ready: bool = session
        .context
        .get(session_keys::ARTIFACT_READY)
        .await
        .unwrap();
    assert!(ready);

    let path: String = session
        .context
        .get(session_keys::ARTIFACT_PATH)
        .await
        .unwrap();
    assert!(path.ends_with("fc_filled.pdf"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn every_field_is_prompted_without_auto_data() {
    let harness = Harness::new();
    let id = harness.start_session(None).await;

    let result = harness.send(&id, "apr").await;
    assert!(result.response.unwrap().contains("UIN"));

    let result = harness.send(&id, "U12345").await;
    assert!(result.response.unwrap().contains("Entity Name"));

    let result = harness.send(&id, "Acme Corp").await;
    assert!(result.response.unwrap().contains("Financial Year"));

    let result = harness.send(&id, "2024-25").await;
    assert_eq!(result.status, ExecutionStatus::Completed);

    let session = harness.session(&id).await;
    let answers: Vec<(String, String)> = session.context.get(session_keys::ANSWERS).await.unwrap();
    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0], ("UIN".to_string(), "U12345".to_string()));
}

#[tokio::test]
async fn form_token_priority_prefers_fc() {
    let harness = Harness::new();
    let id = harness.start_session(None).await;

    // Both tokens present; fc wins by priority order.
    let result = harness.send(&id, "not sure if i need apr or fc").await;
    assert!(result.response.unwrap().contains("Form FC"));
}

#[tokio::test]
async fn completed_session_is_terminal() {
    let harness = Harness::new();
    let auto = FieldSet {
        entity_name: Some("Acme".to_string()),
        amount: Some("100".to_string()),
        ..Default::default()
    };
    let id = harness.start_session(Some(auto)).await;

    // Selecting the form auto-fills the entire schema and completes in one turn.
    let result = harness.send(&id, "form fc please").await;
    assert_eq!(result.status, ExecutionStatus::Completed);

    let path: String = harness
        .session(&id)
        .await
        .context
        .get(session_keys::ARTIFACT_PATH)
        .await
        .unwrap();

    // A further turn does not collect anything or regenerate the artifact.
    let result = harness.send(&id, "Another Answer").await;
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.response.unwrap().contains("already complete"));

    let session = harness.session(&id).await;
    let answers: Vec<(String, String)> = session.context.get(session_keys::ANSWERS).await.unwrap();
    assert_eq!(answers.len(), 2);
    let same_path: String = session
        .context
        .get(session_keys::ARTIFACT_PATH)
        .await
        .unwrap();
    assert_eq!(path, same_path);
}

#[tokio::test]
async fn generation_failure_leaves_artifact_not_ready() {
    let harness = Harness::new();

    // Output dir nested under a regular file cannot be created.
    let blocker_dir = TempDir::new().unwrap();
    let blocker = blocker_dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let bad_dir = blocker.join("sub");

    let auto = FieldSet {
        entity_name: Some("Acme".to_string()),
        amount: Some("100".to_string()),
        ..Default::default()
    };
    let id = harness
        .start_session_with_output(Some(auto), bad_dir.to_str().unwrap())
        .await;

    let result = harness.send(&id, "fc").await;
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.response.unwrap().contains("failed"));

    let session = harness.session(&id).await;
    let ready: bool = session
        .context
        .get(session_keys::ARTIFACT_READY)
        .await
        .unwrap_or(false);
    assert!(!ready);

    let state: CollectorState = session
        .context
        .get(session_keys::COLLECTOR_STATE)
        .await
        .unwrap();
    assert_eq!(state, CollectorState::Complete);
}
