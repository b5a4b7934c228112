use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::options::DecodingOptions;

#[derive(Error, Debug)]
enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// The generation seam of the pipeline.
///
/// Failure is expressed as absence, never as an error: `generate` returns
/// `None` on timeout, transport failure, or a malformed response, and
/// `list_models` returns an empty list when discovery fails. The orchestrator
/// only ever branches on presence of a result.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str, options: &DecodingOptions)
    -> Option<String>;

    async fn list_models(&self) -> Vec<String>;
}

#[async_trait]
impl GenerationBackend for Arc<dyn GenerationBackend> {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &DecodingOptions,
    ) -> Option<String> {
        (**self).generate(model, prompt, options).await
    }

    async fn list_models(&self) -> Vec<String> {
        (**self).list_models().await
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a DecodingOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// One NDJSON line of a streamed response. Fragments carry `response`; the
/// terminal line carries `done: true` plus metadata we ignore.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Ollama HTTP client.
pub struct OllamaClient {
    base_url: String,
    stream: bool,
    client: Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64, stream: bool) -> Self {
        let base_url = base_url.into();
        info!("Ollama client initialized (url={}, timeout={}s)", base_url, timeout_secs);
        Self {
            base_url,
            stream,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    async fn try_generate(
        &self,
        model: &str,
        prompt: &str,
        options: &DecodingOptions,
    ) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: self.stream,
            options,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        if self.stream {
            self.accumulate_stream(response).await
        } else {
            Ok(response.json::<GenerateResponse>().await?.response)
        }
    }

    /// Consume an NDJSON body, appending each fragment until the `done` line.
    async fn accumulate_stream(&self, response: reqwest::Response) -> Result<String, GenerationError> {
        let mut body = response.bytes_stream();
        let mut buffer = String::new();
        let mut answer = String::new();

        while let Some(chunk) = body.next().await {
            let bytes = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                if consume_stream_line(line.trim(), &mut answer)? {
                    return Ok(answer);
                }
            }
        }

        // Terminal line without a trailing newline.
        consume_stream_line(buffer.trim(), &mut answer)?;
        Ok(answer)
    }
}

/// Parse one streamed line into the accumulator; returns true on the `done`
/// marker. Blank lines are skipped.
fn consume_stream_line(line: &str, answer: &mut String) -> Result<bool, GenerationError> {
    if line.is_empty() {
        return Ok(false);
    }
    let chunk: StreamChunk = serde_json::from_str(line)?;
    if let Some(fragment) = chunk.response {
        answer.push_str(&fragment);
    }
    Ok(chunk.done)
}

#[async_trait]
impl GenerationBackend for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &DecodingOptions,
    ) -> Option<String> {
        match self.try_generate(model, prompt, options).await {
            Ok(text) => {
                debug!("Generation succeeded ({} chars, model={})", text.len(), model);
                Some(text)
            }
            Err(e) => {
                warn!("Generation unavailable (model={}): {}", model, e);
                None
            }
        }
    }

    async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Model discovery failed: {}", e);
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            warn!("Model discovery failed: HTTP {}", response.status());
            return Vec::new();
        }
        match response.json::<TagsResponse>().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                warn!("Model discovery returned malformed body: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_fragments_accumulate_in_order() {
        let mut answer = String::new();
        assert!(!consume_stream_line(r#"{"response":"Cool the "}"#, &mut answer).unwrap());
        assert!(!consume_stream_line(r#"{"response":"burn."}"#, &mut answer).unwrap());
        assert!(
            consume_stream_line(r#"{"done":true,"total_duration":12}"#, &mut answer).unwrap()
        );
        assert_eq!(answer, "Cool the burn.");
    }

    #[test]
    fn test_done_line_may_carry_final_fragment() {
        let mut answer = String::new();
        assert!(consume_stream_line(r#"{"response":"ok","done":true}"#, &mut answer).unwrap());
        assert_eq!(answer, "ok");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut answer = String::new();
        assert!(!consume_stream_line("", &mut answer).unwrap());
        assert!(answer.is_empty());
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let mut answer = String::new();
        assert!(consume_stream_line("not json", &mut answer).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_backend_yields_absence() {
        // Reserved TEST-NET address; connection fails fast and normalizes to None.
        let client = OllamaClient::new("http://192.0.2.1:1", 1, false);
        let options = DecodingOptions::default();
        assert!(client.generate("phi3:mini", "test", &options).await.is_none());
        assert!(client.list_models().await.is_empty());
    }
}
