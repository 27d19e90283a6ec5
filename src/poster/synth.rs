use super::{AdStrategy, Brief, request::PosterType};
use crate::{
  prelude::*,
  providers::{GenerateResponse, ImageProvider, ImageRequest, Part, SafetySetting},
};

/// Commercial ad content: only high-severity content is blocked.
pub const SAFETY_SETTINGS: [SafetySetting; 4] = [
  SafetySetting {
    category: "HARM_CATEGORY_HARASSMENT",
    threshold: "BLOCK_ONLY_HIGH",
  },
  SafetySetting {
    category: "HARM_CATEGORY_HATE_SPEECH",
    threshold: "BLOCK_ONLY_HIGH",
  },
  SafetySetting {
    category: "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    threshold: "BLOCK_ONLY_HIGH",
  },
  SafetySetting {
    category: "HARM_CATEGORY_DANGEROUS_CONTENT",
    threshold: "BLOCK_ONLY_HIGH",
  },
];

pub struct Synthesizer<'a> {
  provider: &'a dyn ImageProvider,
}

impl<'a> Synthesizer<'a> {
  pub fn new(provider: &'a dyn ImageProvider) -> Self {
    Self { provider }
  }

  /// Renders the poster and returns it as a `data:` URL.
  pub async fn synthesize(
    &self,
    brief: &Brief,
    strategy: &AdStrategy,
  ) -> Result<String> {
    let request = build_request(brief, strategy);
    let resp = self.provider.render(&request).await?;
    into_data_url(resp)
  }
}

/// Product photos, then the logo, then the base poster, then the prompt.
pub fn build_request(brief: &Brief, strategy: &AdStrategy) -> ImageRequest {
  let mut parts: Vec<Part> =
    brief.product_images.iter().cloned().map(Part::inline).collect();
  parts.extend(brief.logo.clone().map(Part::inline));
  parts.extend(brief.base_image.clone().map(Part::inline));
  parts.push(Part::text(prompt(brief, strategy)));

  ImageRequest {
    parts,
    safety_settings: SAFETY_SETTINGS.to_vec(),
    aspect_ratio: brief.aspect_ratio.clone(),
  }
}

fn into_data_url(resp: GenerateResponse) -> Result<String> {
  let candidate = resp
    .candidates
    .into_iter()
    .next()
    .ok_or_else(|| Error::Upstream("image model returned no candidates".into()))?;

  let reason = candidate.finish_reason.unwrap_or_default();
  let part = candidate
    .content
    .and_then(|content| content.parts.into_iter().next())
    .ok_or_else(|| {
      Error::Upstream(format!("image model returned no content ({reason})"))
    })?;

  let blob = part.inline_data.ok_or_else(|| {
    Error::Upstream(format!("image model returned no image data ({reason})"))
  })?;

  Ok(format!("data:{};base64,{}", blob.mime_type, blob.data))
}

fn prompt(brief: &Brief, strategy: &AdStrategy) -> String {
  let mut out = String::new();

  if brief.is_update() {
    out.push_str(
      "The LAST image is an existing poster. Keep its layout, composition, \
       imagery and colors exactly as they are. Only replace the text on it \
       with the copy below.\n\n",
    );
  } else {
    out.push_str(&format!(
      "Create a professional commercial advertising poster for the brand \
       \"{}\". Use the provided product photos as the hero subject and keep \
       the products faithful to the photos.\n\n",
      brief.brand_name
    ));
  }

  out.push_str(&format!(
    "Render this text EXACTLY as written, spelled verbatim:\n\
     - Headline: \"{}\"\n\
     - Subtext: \"{}\"\n\
     - Call to action: \"{}\"\n\n",
    strategy.headline, strategy.subtext, strategy.cta
  ));

  if !brief.is_update() {
    out.push_str(&format!(
      "Visual concept: {}\nLayout style: {}\nColor palette: {}\n",
      strategy.visual_concept,
      strategy.layout_type,
      strategy.color_palette.join(", ")
    ));
    if brief.logo.is_some() {
      out.push_str("Place the provided brand logo cleanly in a corner.\n");
    }
    if let Some(url) = &brief.product_url {
      out.push_str(&format!("Product reference: {url}\n"));
    }
  }

  if brief.poster_type == PosterType::Festival
    && let Some(festival) = &brief.festival_name
  {
    out.push_str(&format!(
      "This is a {festival} festival greeting poster: weave tasteful \
       {festival} motifs and a short {festival} greeting into the design.\n"
    ));
  }

  let contact = brief.contact.lines();
  if !contact.is_empty() {
    out.push_str(&format!(
      "Add a small, legible contact strip at the bottom: {}\n",
      contact.join(" | ")
    ));
  }

  out.push_str(&format!(
    "\nRequirements: photorealistic, commercial-grade, high resolution, \
     sharp legible typography, no extra text beyond the copy above, \
     vertical poster format with aspect ratio {}. All copy in {}.",
    brief.aspect_ratio, brief.language
  ));

  out
}
