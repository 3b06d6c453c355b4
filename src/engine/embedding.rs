// Decora Design Engine — Embedding Client
//
// Calls Ollama or OpenAI-compatible embedding APIs to produce vector
// representations of conversation text. Used by the SQLite semantic index.

use log::info;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::MemoryConfig;

const EMBED_TIMEOUT: Duration = Duration::from_secs(60);

/// Embedding client — calls Ollama or an OpenAI-compatible embedding API.
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(config: &MemoryConfig) -> Self {
        EmbeddingClient {
            client: Client::new(),
            base_url: config.embedding_base_url.clone(),
            model: config.embedding_model.clone(),
        }
    }

    /// Get the embedding vector for a text string.
    /// Tries the Ollama API formats first, falls back to OpenAI format.
    pub async fn embed(&self, text: &str) -> EngineResult<Vec<f32>> {
        let ollama_err = match self.embed_ollama(text).await {
            Ok(vec) => return Ok(vec),
            Err(e) => e,
        };

        match self.embed_openai(text).await {
            Ok(vec) => Ok(vec),
            Err(openai_err) => Err(EngineError::Embedding(format!(
                "Ollama: {ollama_err} | OpenAI: {openai_err}"
            ))),
        }
    }

    /// Ollama current API: POST /api/embed { model, input } → { embeddings: [[f32…]] }
    /// Falls back to legacy: POST /api/embeddings { model, prompt } → { embedding: [f32…] }
    async fn embed_ollama(&self, text: &str) -> EngineResult<Vec<f32>> {
        let url = format!("{}/api/embed", self.base_url.trim_end_matches('/'));
        let body = json!({ "model": self.model, "input": text });

        let result = self
            .client
            .post(&url)
            .json(&body)
            .timeout(EMBED_TIMEOUT)
            .send()
            .await;

        if let Ok(resp) = result {
            if resp.status().is_success() {
                if let Ok(v) = resp.json::<Value>().await {
                    // New format: { embeddings: [[f32…], …] }
                    if let Some(first) = v["embeddings"]
                        .as_array()
                        .and_then(|e| e.first())
                        .and_then(|e| e.as_array())
                    {
                        let vec = json_floats(first);
                        if !vec.is_empty() {
                            return Ok(vec);
                        }
                    }
                    // Some Ollama versions return singular "embedding" here too.
                    if let Some(embedding) = v["embedding"].as_array() {
                        let vec = json_floats(embedding);
                        if !vec.is_empty() {
                            return Ok(vec);
                        }
                    }
                }
            } else {
                info!(
                    "[embedding] /api/embed returned {} — trying legacy endpoint",
                    resp.status()
                );
            }
        }

        // ── Legacy /api/embeddings endpoint ────────────────────────────
        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));
        let body = json!({ "model": self.model, "prompt": text });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(EMBED_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                EngineError::Embedding(format!(
                    "Ollama not reachable at {} — is Ollama running? Error: {e}",
                    self.base_url
                ))
            })?;

        if !resp.status().is_success() {
            return Err(EngineError::Embedding(format!(
                "Ollama /api/embeddings returned {}",
                resp.status()
            )));
        }

        let v: Value = resp.json().await?;
        match v["embedding"].as_array() {
            Some(embedding) => {
                let vec = json_floats(embedding);
                if vec.is_empty() {
                    Err(EngineError::Embedding("empty embedding in Ollama response".into()))
                } else {
                    Ok(vec)
                }
            }
            None => Err(EngineError::Embedding("no embedding in Ollama response".into())),
        }
    }

    /// OpenAI-compatible format: POST /v1/embeddings { model, input }
    /// → { data: [{ embedding: [f32…] }] }
    async fn embed_openai(&self, text: &str) -> EngineResult<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'));
        let body = json!({ "model": self.model, "input": text });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(EMBED_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(EngineError::Embedding(format!(
                "/v1/embeddings returned {}",
                resp.status()
            )));
        }

        let v: Value = resp.json().await?;
        match v["data"]
            .as_array()
            .and_then(|d| d.first())
            .and_then(|d| d["embedding"].as_array())
        {
            Some(embedding) => {
                let vec = json_floats(embedding);
                if vec.is_empty() {
                    Err(EngineError::Embedding("empty embedding in OpenAI response".into()))
                } else {
                    Ok(vec)
                }
            }
            None => Err(EngineError::Embedding("no embedding in OpenAI response".into())),
        }
    }
}

fn json_floats(values: &[Value]) -> Vec<f32> {
    values.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect()
}
