//! Cross-checks the form-side and support-side field sets.
//!
//! Absence on either side is never a conflict; only two present values that
//! differ after trimming and case folding produce a mismatch.

use crate::models::{FieldName, FieldSet, Mismatch};

fn values_agree(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Compare the two field sets and report mismatches in fixed field order.
/// An empty result means the documents are consistent.
pub fn reconcile(form: &FieldSet, support: &FieldSet) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for field in FieldName::ALL {
        let (Some(form_value), Some(support_value)) = (form.get(field), support.get(field)) else {
            continue;
        };
        if !values_agree(form_value, support_value) {
            mismatches.push(Mismatch {
                field,
                form_value: form_value.to_string(),
                support_value: support_value.to_string(),
            });
        }
    }

    mismatches
}
