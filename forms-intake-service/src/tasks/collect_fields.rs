use async_trait::async_trait;
use intake_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use crate::models::{CollectorState, FieldSet, FormKind};
use crate::schema::FormSchemas;
use crate::tasks::{FormSelectTask, advance_through_autofilled, prompt_for, session_keys};

/// Collects one field answer per user turn, auto-filling fields whose value is
/// already known from a validation pass.
pub struct CollectFieldsTask {
    schemas: Arc<FormSchemas>,
}

impl CollectFieldsTask {
    pub fn new(schemas: Arc<FormSchemas>) -> Self {
        Self { schemas }
    }
}

#[async_trait]
impl Task for CollectFieldsTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        info!("running task: {}", self.id());

        let user_input: String = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| FlowError::Context("user_input not found".to_string()))?;

        let state: CollectorState = context
            .get(session_keys::COLLECTOR_STATE)
            .await
            .unwrap_or(CollectorState::NoFormSelected);

        let CollectorState::Collecting { index } = state else {
            // Not collecting: route back to form selection.
            let reply = "Let's start over - which form would you like to fill? \
                **FC**, **APR**, or **ECB-2**?";
            context.add_assistant_message(reply).await;
            return Ok(TaskResult::new_with_status(
                Some(reply.to_string()),
                NextAction::GoTo(std::any::type_name::<FormSelectTask>().to_string()),
                Some("collector reset to form selection".to_string()),
            ));
        };

        let kind: FormKind = context
            .get(session_keys::FORM_KIND)
            .await
            .ok_or_else(|| FlowError::Context("form_kind not found".to_string()))?;

        let schema = self.schemas.fields(kind);
        let mut answers: Vec<(String, String)> = context
            .get(session_keys::ANSWERS)
            .await
            .unwrap_or_default();

        let mut index = index;
        if index < schema.len() {
            // Record this turn's utterance as the answer for the current field.
            context.add_user_message(user_input.clone()).await;
            answers.push((schema[index].clone(), user_input.trim().to_string()));
            index += 1;
        }

        let auto: FieldSet = context
            .get(session_keys::AUTO_EXTRACTED)
            .await
            .unwrap_or_default();
        let next = advance_through_autofilled(schema, &auto, &mut answers, index);
        context.set(session_keys::ANSWERS, &answers).await;

        match next {
            Some(index) => {
                context
                    .set(
                        session_keys::COLLECTOR_STATE,
                        CollectorState::Collecting { index },
                    )
                    .await;
                let reply = prompt_for(&schema[index]);
                context.add_assistant_message(reply.clone()).await;
                Ok(TaskResult::new_with_status(
                    Some(reply),
                    NextAction::WaitForInput,
                    Some(format!(
                        "collecting field {}/{} for form {}",
                        index + 1,
                        schema.len(),
                        kind.label()
                    )),
                ))
            }
            None => {
                context
                    .set(
                        session_keys::COLLECTOR_STATE,
                        CollectorState::Collecting {
                            index: schema.len(),
                        },
                    )
                    .await;
                Ok(TaskResult::new_with_status(
                    None,
                    NextAction::ContinueAndExecute,
                    Some(format!(
                        "all {} fields collected for form {} - generating document",
                        schema.len(),
                        kind.label()
                    )),
                ))
            }
        }
    }
}
