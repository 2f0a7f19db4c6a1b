// Conversational field-collection tasks
pub mod collect_fields;
pub mod form_select;
pub mod generate_document;

// Re-export task implementations
pub use collect_fields::CollectFieldsTask;
pub use form_select::FormSelectTask;
pub use generate_document::GenerateDocumentTask;

/// Keys under which tasks share state in the session context.
pub mod session_keys {
    pub const USER_INPUT: &str = "user_input";
    pub const SESSION_ID: &str = "session_id";
    pub const FORM_KIND: &str = "form_kind";
    pub const COLLECTOR_STATE: &str = "collector_state";
    pub const ANSWERS: &str = "answers";
    pub const AUTO_EXTRACTED: &str = "auto_extracted";
    pub const OUTPUT_DIR: &str = "output_dir";
    pub const ARTIFACT_READY: &str = "artifact_ready";
    pub const ARTIFACT_PATH: &str = "artifact_path";
}

use crate::fields::auto_value_for;
use crate::models::FieldSet;

/// Starting at `index`, auto-fill consecutive schema fields whose value is
/// already present in the auto-extracted data, appending them to `answers`.
/// Returns the index of the first field still needing user input, or `None`
/// when the end of the schema was reached.
pub(crate) fn advance_through_autofilled(
    schema: &[String],
    auto: &FieldSet,
    answers: &mut Vec<(String, String)>,
    mut index: usize,
) -> Option<usize> {
    while index < schema.len() {
        match auto_value_for(&schema[index], auto) {
            Some(value) => {
                answers.push((schema[index].clone(), value.to_string()));
                index += 1;
            }
            None => return Some(index),
        }
    }
    None
}

pub(crate) fn prompt_for(field: &str) -> String {
    format!("Please provide: **{}**", field)
}
