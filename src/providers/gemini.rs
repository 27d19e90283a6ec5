use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ImageProvider, StrategyProvider};
use crate::{config, prelude::*};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
  #[serde(alias = "mime_type")]
  pub mime_type: String,
  /// Base64 payload
  pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
  Inline {
    #[serde(rename = "inlineData")]
    inline_data: Blob,
  },
  Text {
    text: String,
  },
}

impl Part {
  pub fn text(text: impl Into<String>) -> Self {
    Self::Text { text: text.into() }
  }

  pub fn inline(blob: Blob) -> Self {
    Self::Inline { inline_data: blob }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySetting {
  pub category: &'static str,
  pub threshold: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
  pub parts: Vec<Part>,
  pub safety_settings: Vec<SafetySetting>,
  pub aspect_ratio: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
  #[serde(default)]
  pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
  #[serde(default)]
  pub content: Option<Content>,
  #[serde(default)]
  pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
  #[serde(default)]
  pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
  #[serde(default)]
  pub text: Option<String>,
  #[serde(default, alias = "inline_data")]
  pub inline_data: Option<Blob>,
}

impl GenerateResponse {
  pub fn text(&self) -> String {
    self
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .map(|content| {
        content.parts.iter().filter_map(|p| p.text.as_deref()).collect()
      })
      .unwrap_or_default()
  }
}

/// Client for the `generateContent` REST endpoint.
pub struct Gemini {
  client: Client,
  config: config::Gemini,
}

impl Gemini {
  pub fn new(client: Client, config: config::Gemini) -> Self {
    Self { client, config }
  }

  async fn generate(
    &self,
    model: &str,
    body: json::Value,
  ) -> Result<GenerateResponse> {
    let key = self
      .config
      .api_key
      .as_deref()
      .ok_or_else(|| Error::missing_config("GEMINI_API_KEY"))?;

    let url =
      format!("{}/models/{}:generateContent", self.config.base_url, model);
    let resp = self
      .client
      .post(&url)
      .header("x-goog-api-key", key)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let text = resp.text().await.unwrap_or_default();
      return Err(Error::Upstream(format!(
        "Gemini `{model}` returned {status}: {text}"
      )));
    }

    Ok(resp.json().await?)
  }
}

#[async_trait]
impl StrategyProvider for Gemini {
  async fn complete(&self, prompt: &str) -> Result<String> {
    let body = json::json!({
      "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
    });

    let resp = self.generate(&self.config.text_model, body).await?;
    Ok(resp.text())
  }
}

#[async_trait]
impl ImageProvider for Gemini {
  async fn render(&self, request: &ImageRequest) -> Result<GenerateResponse> {
    let body = json::json!({
      "contents": [{ "role": "user", "parts": request.parts }],
      "safetySettings": request.safety_settings,
      "generationConfig": {
        "responseModalities": ["IMAGE"],
        "imageConfig": { "aspectRatio": request.aspect_ratio },
      },
    });

    self.generate(&self.config.image_model, body).await
  }
}
