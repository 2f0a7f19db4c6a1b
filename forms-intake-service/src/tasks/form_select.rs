use async_trait::async_trait;
use intake_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use crate::models::{CollectorState, FieldSet, FormKind};
use crate::schema::FormSchemas;
use crate::tasks::{advance_through_autofilled, prompt_for, session_keys};

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "namaste",
];

/// Words that make an utterance relevant to form filing even without naming a
/// specific form kind.
const RELEVANT_KEYWORDS: &[&str] = &[
    "form", "fill", "file", "filing", "return", "submit", "document", "fc", "apr", "ecb",
];

const GREETING_REPLY: &str = "Hello! I can help you fill a regulatory form. \
    Which one do you need - **FC**, **APR**, or **ECB-2**?";

const IRRELEVANT_REPLY: &str = "I can only help with regulatory form filing. \
    Tell me which form you'd like to fill: **FC**, **APR**, or **ECB-2**.";

const WHICH_FORM_REPLY: &str = "Sure - which form would you like to fill? \
    I support **FC**, **APR**, and **ECB-2**.";

fn is_greeting(utterance: &str) -> bool {
    GREETINGS
        .iter()
        .any(|g| utterance == *g || utterance.starts_with(&format!("{} ", g)))
}

fn has_relevant_keyword(utterance: &str) -> bool {
    RELEVANT_KEYWORDS.iter().any(|kw| utterance.contains(kw))
}

/// Entry task of the collector: waits for the user to pick a form kind.
pub struct FormSelectTask {
    schemas: Arc<FormSchemas>,
}

impl FormSelectTask {
    pub fn new(schemas: Arc<FormSchemas>) -> Self {
        Self { schemas }
    }

    fn reply_and_wait(reply: &str, status: &str) -> TaskResult {
        TaskResult::new_with_status(
            Some(reply.to_string()),
            NextAction::WaitForInput,
            Some(status.to_string()),
        )
    }
}

#[async_trait]
impl Task for FormSelectTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        info!("running task: {}", self.id());

        let user_input: String = context
            .get(session_keys::USER_INPUT)
            .await
            .ok_or_else(|| FlowError::Context("user_input not found".to_string()))?;

        context.add_user_message(user_input.clone()).await;
        let utterance = user_input.trim().to_lowercase();

        if is_greeting(&utterance) {
            context.add_assistant_message(GREETING_REPLY).await;
            return Ok(Self::reply_and_wait(
                GREETING_REPLY,
                "waiting for form selection",
            ));
        }

        if let Some(kind) = FormKind::from_utterance(&utterance) {
            info!("form kind selected: {}", kind.label());
            context.set(session_keys::FORM_KIND, kind).await;

            let schema = self.schemas.fields(kind);
            let auto: FieldSet = context
                .get(session_keys::AUTO_EXTRACTED)
                .await
                .unwrap_or_default();

            let mut answers: Vec<(String, String)> = Vec::new();
            let next = advance_through_autofilled(schema, &auto, &mut answers, 0);
            let autofilled = answers.len();
            context.set(session_keys::ANSWERS, &answers).await;

            return match next {
                Some(index) => {
                    context
                        .set(
                            session_keys::COLLECTOR_STATE,
                            CollectorState::Collecting { index },
                        )
                        .await;
                    let reply = format!(
                        "You selected **Form {}**. {}",
                        kind.label(),
                        prompt_for(&schema[index])
                    );
                    context.add_assistant_message(reply.clone()).await;
                    Ok(TaskResult::new_with_status(
                        Some(reply),
                        NextAction::Continue,
                        Some(format!(
                            "form {} selected - {} fields auto-filled, collecting field {}/{}",
                            kind.label(),
                            autofilled,
                            index + 1,
                            schema.len()
                        )),
                    ))
                }
                None => {
                    // Everything was auto-filled; hand over to generation.
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
                            "form {} selected - all fields auto-filled",
                            kind.label()
                        )),
                    ))
                }
            };
        }

        let reply = if has_relevant_keyword(&utterance) {
            WHICH_FORM_REPLY
        } else {
            IRRELEVANT_REPLY
        };
        context.add_assistant_message(reply).await;
        Ok(Self::reply_and_wait(reply, "waiting for form selection"))
    }
}
