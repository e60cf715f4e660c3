//! Gemini `generateContent` provider for both capabilities.

use super::capability::{parse_keywords, CapabilityError, ContextRecord, KeywordExtractor, Narrator, OMITTED_DOMAINS};
use crate::config::GeminiSettings;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    agent: ureq::Agent,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings, timeout: Duration) -> Self {
        Self {
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn generate_blocking(&self, prompt: &str) -> Result<String, CapabilityError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CapabilityError::Unavailable("no Gemini API key configured".into()))?;

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response = self
            .agent
            .post(&url)
            .set("x-goog-api-key", key)
            .send_json(body)
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        let val: Value = response
            .into_json()
            .map_err(|e| CapabilityError::InvalidResponse(e.to_string()))?;

        val.pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| CapabilityError::InvalidResponse("no candidate text".into()))
    }

    async fn generate(&self, prompt: String) -> Result<String, CapabilityError> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.generate_blocking(&prompt))
            .await
            .map_err(|e| CapabilityError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl KeywordExtractor for GeminiClient {
    async fn extract(&self, query: &str) -> Result<Vec<String>, CapabilityError> {
        let text = self.generate(extraction_prompt(query)).await?;
        let keywords = parse_keywords(&text);
        debug!(?keywords, "extracted keywords");
        if keywords.is_empty() {
            return Err(CapabilityError::InvalidResponse("empty keyword list".into()));
        }
        Ok(keywords)
    }
}

#[async_trait]
impl Narrator for GeminiClient {
    async fn narrate(&self, query: &str, records: &[ContextRecord]) -> Result<String, CapabilityError> {
        let text = self.generate(narration_prompt(query, records)).await?;
        Ok(text.trim().to_string())
    }
}

// ─── Prompts ────────────────────────────────────────────────────

pub fn extraction_prompt(query: &str) -> String {
    format!(
        r#"Analyze this question about educational and cultural centers in Tenerife: "{query}"
Extract the most important keywords for searching a database.

RULES:
1. Reduce every word to its singular form (e.g. "universidades" -> "universidad", "museos" -> "museo").
2. Remove stopwords (e.g. "busco", "quiero", "algun", "en", "de").
3. If a municipality is mentioned, include it.
4. Return ONLY the words, separated by commas.
5. Never drop a proper name (e.g. "Sobradillo", "Anchieta", "Viera").
6. Split multi-word proper names into separate comma-separated words: 'IES El Sobradillo' -> 'ies, sobradillo'.

Example: "¿Hay universidades en La Laguna?" -> "universidad, La Laguna"
Example: "Quiero ver bibliotecas de Arona" -> "biblioteca, Arona""#
    )
}

pub fn narration_prompt(query: &str, records: &[ContextRecord]) -> String {
    let context = if records.is_empty() {
        "No specific centers were found in the database for this question.".to_string()
    } else {
        let data = serde_json::to_string(records).unwrap_or_default();
        format!("Data from the Cabildo de Tenerife: {}", data)
    };

    format!(
        r#"You are GeoBot, the GeoLearn Tenerife assistant.
Instructions:
- Answer the question: "{query}"
- Use this data: {context}
- Give the phone or website when present. For long websites give only the main domain. Never show websites on: {omitted}.
- No long paragraphs and no blank lines between list items.
- Use a compact list, one item per line (e.g. 1. Name - Municipality).
- If there is no data, answer with one short sentence.
- Be friendly and very brief.
- No bold, no asterisks, no Markdown: plain clean text only.
- Classify each center by its 'category' field. If the name says Ludoteca, treat it as a children's space even when it sits inside a library.
- Reply in the language of the question."#,
        omitted = OMITTED_DOMAINS.join(", "),
    )
}
