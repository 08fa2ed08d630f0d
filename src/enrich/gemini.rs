// src/enrich/gemini.rs
//! Generative text client: provider abstraction + Gemini `generateContent`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ai::{AiConfig, Credential};
use crate::error::{NewsError, Result};

/// Opaque text-completion service: prompt in, text out.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Returns `None` without a credential; callers then stay offline.
    pub fn from_config(cfg: &AiConfig, user_agent: &str) -> Result<Option<Self>> {
        let api_key = match &cfg.credential {
            Credential::ApiKey(k) => k.clone(),
            Credential::None => return Ok(None),
        };
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Some(Self {
            http,
            api_key,
            model: cfg.model.clone(),
            endpoint: cfg.endpoint.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        }))
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn generate_impl(&self, prompt: &str) -> Result<String> {
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let resp = self
            .http
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .map_err(|e| NewsError::EnrichmentUnavailable(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NewsError::EnrichmentUnavailable(format!(
                "generateContent returned http {}",
                status.as_u16()
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| NewsError::Decode(e.without_url().to_string()))?;
        first_candidate_text(body)
            .ok_or_else(|| NewsError::EnrichmentUnavailable("response had no candidate text".into()))
    }
}

fn first_candidate_text(body: Resp) -> Option<String> {
    body.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .map(|p| p.text)
        .filter(|t| !t.trim().is_empty())
}

impl TextGenerator for GeminiClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.generate_impl(prompt))
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_camel_case_generation_config() {
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 4096,
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 4096);
        assert!(v["generationConfig"]["temperature"].as_f64().unwrap() < 0.31);
    }

    #[test]
    fn extracts_first_candidate_text() {
        let body: Resp = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[1]"},{"text":"x"}]}},
                              {"content":{"parts":[{"text":"other"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(body).as_deref(), Some("[1]"));

        let empty: Resp = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(first_candidate_text(empty).is_none());
    }

    #[test]
    fn no_credential_builds_no_client() {
        let cfg = AiConfig::default();
        assert!(GeminiClient::from_config(&cfg, "ua").unwrap().is_none());
    }
}
