//! Document text extraction: direct PDF text first, vision OCR as fallback.
//!
//! Extraction never fails at the interaction boundary. Every error path
//! degrades to the best text obtained so far, ultimately the empty string,
//! which downstream classification maps to "unknown".

use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use pdf2image::{PDF, Pages};
use reqwest::Client;
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::classify::MIN_TEXT_LEN;

/// Pages rendered for OCR are capped to bound rasterization work.
const OCR_MAX_PAGES: u32 = 8;
/// Hard ceiling on one OCR round trip.
const OCR_TIMEOUT_SECS: u64 = 60;
const OCR_MODEL: &str = "openai/gpt-4.1-mini";
const OCR_MAX_TOKENS: u32 = 4000;

const OCR_PROMPT: &str = "You are an OCR system for regulatory filing documents. \
    Extract ALL text from the provided pages with perfect accuracy, preserving \
    labels, field names and values exactly as printed. Return ONLY the extracted \
    text without any commentary.";

/// Extracts plain text from an uploaded document, falling back to vision OCR
/// when direct extraction yields too little text.
pub struct TextExtractor {
    http: Client,
    api_key: Option<String>,
}

impl TextExtractor {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
        }
    }

    /// Reads `OPENROUTER_API_KEY`; without it the OCR fallback is disabled and
    /// extraction relies on direct text only.
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENROUTER_API_KEY").ok();
        if api_key.is_none() {
            warn!("OPENROUTER_API_KEY not set - OCR fallback disabled");
        }
        Self::new(api_key)
    }

    /// Extract text from the document at `path`. Infallible: returns the empty
    /// string when nothing could be extracted.
    pub async fn extract(&self, path: &Path) -> String {
        let direct = match extract_direct(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "direct text extraction failed");
                String::new()
            }
        };

        if direct.trim().len() >= MIN_TEXT_LEN {
            return direct;
        }

        info!(
            path = %path.display(),
            direct_len = direct.trim().len(),
            "extracted text is near-empty, trying OCR fallback"
        );

        match self.ocr_fallback(path).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => direct,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "OCR fallback failed");
                direct
            }
        }
    }

    async fn ocr_fallback(&self, path: &Path) -> anyhow::Result<String> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(anyhow!("no OCR credentials configured"));
        };

        let images = render_pdf_pages(path, OCR_MAX_PAGES).await?;
        if images.is_empty() {
            return Err(anyhow!("no pages rendered from PDF"));
        }
        info!("rendered {} pages for OCR", images.len());

        let mut content = vec![json!({
            "type": "text",
            "text": OCR_PROMPT,
        })];
        for image in &images {
            let encoded = image_to_base64(image)?;
            content.push(json!({
                "type": "image_url",
                "image_url": {
                    "url": format!("data:image/png;base64,{}", encoded)
                }
            }));
        }

        let text = self.call_vision_api(&api_key, content).await?;
        info!("OCR extracted {} characters", text.len());
        Ok(text)
    }

    async fn call_vision_api(&self, api_key: &str, content: Vec<Value>) -> anyhow::Result<String> {
        let payload = json!({
            "model": OCR_MODEL,
            "messages": [
                {
                    "role": "user",
                    "content": content
                }
            ],
            "max_tokens": OCR_MAX_TOKENS
        });

        let response = self
            .http
            .post("https://openrouter.ai/api/v1/chat/completions")
            .timeout(Duration::from_secs(OCR_TIMEOUT_SECS))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("OCR API request failed: {}", response.status()));
        }

        let response_json: Value = response.json().await?;
        let text = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("invalid response format from OCR API"))?;

        Ok(text.to_string())
    }
}

async fn extract_direct(path: &Path) -> anyhow::Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text(&path).map_err(|e| anyhow!("failed to extract text: {}", e))
    })
    .await?
}

async fn render_pdf_pages(path: &Path, max_pages: u32) -> anyhow::Result<Vec<DynamicImage>> {
    if !tokio::fs::try_exists(path).await? {
        return Err(anyhow!("document not found: {}", path.display()));
    }

    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<DynamicImage>> {
        let pdf = PDF::from_file(&path).map_err(|e| anyhow!("failed to load PDF: {}", e))?;
        let last_page = pdf.page_count().min(max_pages);
        let images = pdf
            .render(Pages::Range(1..=last_page), None)
            .map_err(|e| anyhow!("failed to render PDF pages: {}", e))?;
        Ok(images)
    })
    .await?
}

fn image_to_base64(image: &DynamicImage) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| anyhow!("failed to encode image: {}", e))?;

    Ok(STANDARD.encode(&buffer))
}
