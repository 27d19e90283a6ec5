use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::truncate;
use crate::{prelude::*, providers::StrategyProvider};

pub const FALLBACK_CTA: &str = "Discover Now";
pub const FALLBACK_LAYOUT: &str = "Cinematic";
pub const FALLBACK_PALETTE: [&str; 4] =
  ["#1A1A2E", "#F5F5F5", "#C9A227", "#2E2E2E"];
const FALLBACK_SUBTEXT_CHARS: usize = 50;

static JSON_OBJECT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Creative brief rendered onto the poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdStrategy {
  pub headline: String,
  pub subtext: String,
  #[serde(alias = "callToAction")]
  pub cta: String,
  pub visual_concept: String,
  #[serde(alias = "palette")]
  pub color_palette: Vec<String>,
  pub layout_type: String,
}

impl AdStrategy {
  /// Deterministic strategy used whenever the model output is unusable.
  pub fn fallback(brand_name: &str, description: &str) -> Self {
    Self {
      headline: brand_name.to_string(),
      subtext: truncate(description, FALLBACK_SUBTEXT_CHARS),
      cta: FALLBACK_CTA.to_string(),
      visual_concept: String::from(
        "Hero product shot on a clean premium backdrop with soft studio light",
      ),
      color_palette: FALLBACK_PALETTE.iter().map(|c| c.to_string()).collect(),
      layout_type: FALLBACK_LAYOUT.to_string(),
    }
  }

  /// Parses the first `{...}` span of a model reply.
  pub fn parse(reply: &str) -> Option<Self> {
    let span = JSON_OBJECT.find(reply)?;
    let strategy: Self = json::from_str(span.as_str()).ok()?;
    (!strategy.headline.trim().is_empty()).then_some(strategy)
  }
}

pub struct Analyzer<'a> {
  provider: &'a dyn StrategyProvider,
}

impl<'a> Analyzer<'a> {
  pub fn new(provider: &'a dyn StrategyProvider) -> Self {
    Self { provider }
  }

  /// Transport failures propagate; anything the model says that cannot be
  /// parsed yields [`AdStrategy::fallback`].
  pub async fn analyze(
    &self,
    brand_name: &str,
    description: &str,
    industry: &str,
    language: &str,
  ) -> Result<AdStrategy> {
    let prompt = prompt(brand_name, description, industry, language);
    let reply = self.provider.complete(&prompt).await?;

    Ok(AdStrategy::parse(&reply).unwrap_or_else(|| {
      warn!("Unusable strategy reply for `{brand_name}`, using fallback");
      debug!("Strategy reply: {reply}");
      AdStrategy::fallback(brand_name, description)
    }))
  }
}

fn prompt(
  brand_name: &str,
  description: &str,
  industry: &str,
  language: &str,
) -> String {
  format!(
    r#"You are a senior creative director at a top advertising agency.
Design the advertising strategy for a marketing poster.

Brand: {brand_name}
Product description: {description}
Industry: {industry}
Language for all poster copy: {language}

Respond with ONLY a JSON object with exactly these fields:
{{
  "headline": "catchy headline, at most 5 words",
  "subtext": "supporting line, at most 10 words",
  "cta": "short call to action",
  "visualConcept": "one or two sentences describing the scene",
  "colorPalette": ["3 to 4 hex colors, e.g. #1A1A2E"],
  "layoutType": "layout label, e.g. Cinematic, Minimal, Split, Bold Typography"
}}"#
  )
}
