use async_trait::async_trait;
use intake_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use std::path::PathBuf;
use tracing::{error, info};

use crate::models::{CollectorState, FormKind};
use crate::pdfgen;
use crate::tasks::session_keys;

const ALREADY_COMPLETE_REPLY: &str = "This session is already complete. \
    Download your document, or start a new session to fill another form.";

/// Terminal task: renders the filled form and marks the artifact ready.
pub struct GenerateDocumentTask;

#[async_trait]
impl Task for GenerateDocumentTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        info!("running task: {}", self.id());

        let state: CollectorState = context
            .get(session_keys::COLLECTOR_STATE)
            .await
            .unwrap_or(CollectorState::NoFormSelected);

        // Complete is terminal: a later turn never regenerates the artifact.
        if state == CollectorState::Complete {
            context.add_assistant_message(ALREADY_COMPLETE_REPLY).await;
            return Ok(TaskResult::new_with_status(
                Some(ALREADY_COMPLETE_REPLY.to_string()),
                NextAction::End,
                Some("session already complete".to_string()),
            ));
        }

        let kind: FormKind = context
            .get(session_keys::FORM_KIND)
            .await
            .ok_or_else(|| FlowError::Context("form_kind not found".to_string()))?;

        let answers: Vec<(String, String)> = context
            .get(session_keys::ANSWERS)
            .await
            .unwrap_or_default();

        let output_dir: String = context
            .get(session_keys::OUTPUT_DIR)
            .await
            .unwrap_or_else(|| "generated".to_string());

        context
            .set(session_keys::COLLECTOR_STATE, CollectorState::Complete)
            .await;

        let generated = {
            let answers = answers.clone();
            let dir = PathBuf::from(output_dir);
            tokio::task::spawn_blocking(move || pdfgen::generate_filled_pdf(kind, &answers, &dir))
                .await
                .map_err(|e| FlowError::TaskFailed(e.to_string()))?
        };

        match generated {
            Ok(path) => {
                context
                    .set(session_keys::ARTIFACT_PATH, path.display().to_string())
                    .await;
                context.set(session_keys::ARTIFACT_READY, true).await;

                let reply = format!(
                    "All {} fields are filled. Your **Form {}** document is ready for download.",
                    answers.len(),
                    kind.label()
                );
                context.add_assistant_message(reply.clone()).await;
                info!(path = %path.display(), "filled form generated");

                Ok(TaskResult::new_with_status(
                    Some(reply),
                    NextAction::End,
                    Some(format!("form {} document generated", kind.label())),
                ))
            }
            Err(e) => {
                // Artifact stays not-ready; retrieval will report "not found".
                error!(error = %e, "document generation failed");
                let reply = format!(
                    "I collected all your answers for Form {}, but generating the \
                     document failed. Please try again later.",
                    kind.label()
                );
                context.add_assistant_message(reply.clone()).await;

                Ok(TaskResult::new_with_status(
                    Some(reply),
                    NextAction::End,
                    Some(format!("document generation failed: {}", e)),
                ))
            }
        }
    }
}
