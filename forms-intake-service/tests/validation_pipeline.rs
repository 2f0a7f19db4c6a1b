//! Classify → extract → reconcile, composed the way the validation endpoint
//! runs them (minus PDF I/O: the extractors are driven with raw text here).

use forms_intake_service::models::{FieldName, FormKind, SupportOutcome};
use forms_intake_service::{classify, fields, reconcile};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn matching_uin_across_form_and_csv_reports_no_mismatch() {
    let form_text = "Form FC submission under FC-GPR.\nUIN: U12345\nEntity Name: Acme Corp";

    let detected = classify::classify(&classify::normalize(form_text));
    assert_eq!(detected, Some(FormKind::Fc));

    let form_fields = fields::extract_form_fields(form_text);
    assert_eq!(form_fields.uin.as_deref(), Some("U12345"));

    let dir = TempDir::new().unwrap();
    let csv = write_csv(&dir, "bank.csv", "UIN,Branch\nU12345,Mumbai\n");
    let (support_fields, reports) = fields::extract_support_fields(&[csv]);

    assert_eq!(support_fields.uin.as_deref(), Some("U12345"));
    assert_eq!(reports[0].outcome, SupportOutcome::Parsed { fields_found: 1 });

    let mismatches = reconcile::reconcile(&form_fields, &support_fields);
    assert!(mismatches.is_empty());
}

#[test]
fn conflicting_entity_is_reported_with_both_originals() {
    let form_text = "Annual Performance Report (APR)\nEntity Name: ABC Corp\nAmount: 100";

    let detected = classify::classify(&classify::normalize(form_text));
    assert_eq!(detected, Some(FormKind::Apr));

    let form_fields = fields::extract_form_fields(form_text);

    let dir = TempDir::new().unwrap();
    let csv = write_csv(&dir, "entity.csv", "Entity,Amount\nXYZ Ltd,100\n");
    let (support_fields, _) = fields::extract_support_fields(&[csv]);

    let mismatches = reconcile::reconcile(&form_fields, &support_fields);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].field, FieldName::EntityName);
    assert_eq!(mismatches[0].form_value, "ABC Corp");
    assert_eq!(mismatches[0].support_value, "XYZ Ltd");
}

#[test]
fn unknown_form_with_failed_support_files_still_produces_a_report() {
    // Empty text classifies as unknown; a broken CSV is reported, not fatal.
    assert_eq!(classify::classify(""), None);

    let form_fields = fields::extract_form_fields("");
    assert!(form_fields.is_empty());

    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("gone.csv");
    let (support_fields, reports) = fields::extract_support_fields(&[missing]);

    assert!(support_fields.is_empty());
    assert!(matches!(
        reports[0].outcome,
        SupportOutcome::ParseFailed { .. }
    ));

    assert!(reconcile::reconcile(&form_fields, &support_fields).is_empty());
}
