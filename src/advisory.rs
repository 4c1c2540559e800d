//! Expert Q&A over a hosted generative model.
//!
//! The question is prefixed with a persona brief and sent as one request; no
//! retries. Every failure is turned into a message the user can act on.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cli::Persona;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const KNOWN_MODELS: [&str; 4] = [
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

const ESTIMATOR_BRIEF: &str = "\
ANDA ADALAH CHIEF QUANTITY SURVEYOR (QS) SENIOR.
KEAHLIAN: perencanaan biaya, Analisa Harga Satuan Pekerjaan (AHSP), dan manajemen kontrak konstruksi.
TUGAS: menerjemahkan kebutuhan teknis pengguna menjadi item pekerjaan dan kode AHSP yang relevan.
GAYA BAHASA: profesional, langsung ke inti, dan memberi solusi.";

const FINANCE_BRIEF: &str = "\
ANDA ADALAH PROJECT FINANCE MANAGER.
KEAHLIAN: arus kas proyek, perpajakan konstruksi (PPN 11%, PPh final), dan analisa risiko.
TUGAS: memberi strategi keuangan agar kontraktor tidak merugi.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    #[error("no API key supplied (set GEMINI_API_KEY or pass --api-key)")]
    MissingApiKey,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("quota exhausted for model {model}")]
    QuotaExhausted { model: String },

    #[error("model {model} not found")]
    ModelUnavailable { model: String },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("failed to parse response: {0}")]
    ParseError(String),
}

/// Seam between prompt assembly and the HTTP call.
pub trait TextGenerator {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AdvisoryError>;
}

pub struct GeminiClient {
    api_key: String,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Result<Self, AdvisoryError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AdvisoryError::RequestFailed(err.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            http,
        })
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AdvisoryError> {
        let request_body = serde_json::json!({
            "contents": [
                {"role": "user", "parts": [{"text": prompt}]}
            ]
        });

        let url = format!("{GEMINI_API_BASE}/{model}:generateContent");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .map_err(|err| AdvisoryError::RequestFailed(err.to_string()))?;

        let status = response.status();
        debug!(status = %status, model, "advisory response received");
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AdvisoryError::QuotaExhausted {
                    model: model.to_string(),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(AdvisoryError::ModelUnavailable {
                    model: model.to_string(),
                });
            }
            status if !status.is_success() => {
                let body = response.text().unwrap_or_default();
                return Err(AdvisoryError::RequestFailed(format!("HTTP {status}: {body}")));
            }
            _ => {}
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|err| AdvisoryError::ParseError(err.to_string()))?;
        extract_answer(&json)
    }
}

fn extract_answer(json: &serde_json::Value) -> Result<String, AdvisoryError> {
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| AdvisoryError::ParseError("no candidate content in response".to_string()))?;

    let answer: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if answer.trim().is_empty() {
        return Err(AdvisoryError::ParseError("candidate has no text".to_string()));
    }
    Ok(answer)
}

pub fn persona_brief(persona: Persona) -> &'static str {
    match persona {
        Persona::Estimator => ESTIMATOR_BRIEF,
        Persona::Finance => FINANCE_BRIEF,
    }
}

pub fn build_prompt(persona: Persona, question: &str) -> String {
    format!(
        "PERAN SYSTEM:\n{}\n\nPERTANYAAN USER:\n{}\n\nINSTRUKSI:\nJawablah dalam Bahasa Indonesia yang profesional. Gunakan Markdown.\n",
        persona_brief(persona),
        question.trim()
    )
}

pub fn consult<G: TextGenerator>(
    generator: &G,
    persona: Persona,
    question: &str,
    model: &str,
) -> Result<String, AdvisoryError> {
    if question.trim().is_empty() {
        return Err(AdvisoryError::EmptyQuestion);
    }

    let prompt = build_prompt(persona, question);
    generator.generate(model, &prompt)
}

/// Answer text, or a user-facing failure message.
pub fn ask_expert(api_key: Option<&str>, persona: Persona, question: &str, model: &str) -> String {
    let result = match api_key.map(str::trim).filter(|key| !key.is_empty()) {
        None => Err(AdvisoryError::MissingApiKey),
        Some(key) => GeminiClient::new(key)
            .and_then(|client| consult(&client, persona, question, model)),
    };

    match result {
        Ok(answer) => answer,
        Err(err) => {
            warn!(error = %err, model, persona = persona.as_str(), "advisory request failed");
            failure_message(&err, model)
        }
    }
}

pub fn failure_message(err: &AdvisoryError, model: &str) -> String {
    match err {
        AdvisoryError::MissingApiKey => {
            "Set GEMINI_API_KEY (or pass --api-key) before asking an expert.".to_string()
        }
        AdvisoryError::EmptyQuestion => "The question is empty.".to_string(),
        AdvisoryError::QuotaExhausted { .. } => format!(
            "Quota exhausted: model `{model}` is rate limited. Try another --model ({}).",
            alternative_models(model).join(", ")
        ),
        AdvisoryError::ModelUnavailable { .. } => format!(
            "Model not found: `{model}` is not available for this key. Try one of: {}.",
            alternative_models(model).join(", ")
        ),
        AdvisoryError::RequestFailed(_) | AdvisoryError::ParseError(_) => {
            format!("Advisory request failed: {err}")
        }
    }
}

fn alternative_models(model: &str) -> Vec<&'static str> {
    KNOWN_MODELS
        .iter()
        .copied()
        .filter(|known| *known != model)
        .collect()
}
