//! Static form metadata: the ordered field schema driving the conversational
//! collector, and the discovery catalog shown to users before they upload.

use anyhow::{Context as _, bail};
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{FormInfo, FormKind};

const DEFAULT_SCHEMAS: &str = include_str!("../config/form_schemas.yaml");

#[derive(Debug, Deserialize)]
struct RawSchemas {
    fc: Vec<String>,
    apr: Vec<String>,
    ecb: Vec<String>,
}

/// Ordered field labels per form kind. Loaded once at startup, read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct FormSchemas {
    fields: HashMap<FormKind, Vec<String>>,
}

impl FormSchemas {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let raw: RawSchemas =
            serde_yaml::from_str(yaml).context("failed to parse form schema YAML")?;

        let mut fields = HashMap::new();
        fields.insert(FormKind::Fc, raw.fc);
        fields.insert(FormKind::Apr, raw.apr);
        fields.insert(FormKind::Ecb, raw.ecb);

        for kind in FormKind::PRIORITY {
            if fields[&kind].is_empty() {
                bail!("form schema for {} has no fields", kind.label());
            }
        }

        Ok(Self { fields })
    }

    /// Load from `FORM_SCHEMAS_PATH` if set, otherwise the embedded default.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("FORM_SCHEMAS_PATH") {
            Ok(path) => {
                let yaml = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read form schemas from {}", path))?;
                Self::from_yaml(&yaml)
            }
            Err(_) => Self::from_yaml(DEFAULT_SCHEMAS),
        }
    }

    pub fn fields(&self, kind: FormKind) -> &[String] {
        &self.fields[&kind]
    }
}

/// Discovery metadata, surfaced via `GET /forms/{kind}`.
pub fn form_info(kind: FormKind) -> FormInfo {
    match kind {
        FormKind::Fc => FormInfo {
            title: "Form FC - Foreign Collaboration",
            checklist: &["PAN card", "Bank details", "Signature"],
            sample_link: "https://forms.regality.example/form-fc-sample.pdf",
        },
        FormKind::Apr => FormInfo {
            title: "Form APR - Annual Performance Report",
            checklist: &[
                "UIN allotment letter",
                "Audited financial statements",
                "Share certificates",
            ],
            sample_link: "https://forms.regality.example/form-apr-sample.pdf",
        },
        FormKind::Ecb => FormInfo {
            title: "Form ECB-2 - External Commercial Borrowings Return",
            checklist: &[
                "Loan Registration Number",
                "Lender agreement",
                "Bank statement",
            ],
            sample_link: "https://forms.regality.example/form-ecb-2-sample.pdf",
        },
    }
}
