use intake_flow::{FlowRunner, Graph, GraphBuilder, Session, SessionStorage, Task};
use std::any::type_name;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{CollectorState, FieldSet};
use crate::schema::FormSchemas;
use crate::tasks::{CollectFieldsTask, FormSelectTask, GenerateDocumentTask, session_keys};

pub fn build_intake_graph(schemas: Arc<FormSchemas>) -> Graph {
    let form_select = Arc::new(FormSelectTask::new(schemas.clone()));
    let form_select_id = form_select.id().to_string();

    let collect_fields = Arc::new(CollectFieldsTask::new(schemas));
    let collect_fields_id = collect_fields.id().to_string();

    let generate_document = Arc::new(GenerateDocumentTask);
    let generate_document_id = generate_document.id().to_string();

    GraphBuilder::new("form_intake")
        .add_task(form_select)
        .add_task(collect_fields)
        .add_task(generate_document)
        .add_edge(&form_select_id, &collect_fields_id)
        .add_edge(&collect_fields_id, &generate_document_id)
        .build()
}

/// Create a fresh collector session. `auto_extracted` carries field values
/// captured during a validation pass so the collector can skip those fields.
pub async fn create_chat_session(output_dir: &str, auto_extracted: Option<FieldSet>) -> Session {
    let session_id = Uuid::new_v4().to_string();
    let session = Session::new_from_task(session_id, type_name::<FormSelectTask>());

    session
        .context
        .set(session_keys::COLLECTOR_STATE, CollectorState::NoFormSelected)
        .await;
    session
        .context
        .set(session_keys::OUTPUT_DIR, output_dir)
        .await;
    if let Some(fields) = auto_extracted {
        session
            .context
            .set(session_keys::AUTO_EXTRACTED, fields)
            .await;
    }

    session
}

pub fn create_flow_runner(
    schemas: Arc<FormSchemas>,
    session_storage: Arc<dyn SessionStorage>,
) -> FlowRunner {
    let graph = Arc::new(build_intake_graph(schemas));
    FlowRunner::new(graph, session_storage)
}
