use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;

use crate::{prelude::*, providers::Blob};

pub const MAX_PRODUCT_IMAGES: usize = 4;
pub const DEFAULT_ASPECT_RATIO: &str = "3:4";
pub const ASPECT_RATIOS: [&str; 5] = ["1:1", "2:3", "3:4", "4:5", "9:16"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PosterType {
  #[default]
  #[serde(alias = "professional")]
  Professional,
  #[serde(alias = "festival")]
  Festival,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Contact {
  pub phone: Option<String>,
  pub email: Option<String>,
  pub website: Option<String>,
  pub address: Option<String>,
}

impl Contact {
  /// Non-empty contact lines in display order.
  pub fn lines(&self) -> Vec<&str> {
    [&self.phone, &self.email, &self.website, &self.address]
      .into_iter()
      .filter_map(|v| v.as_deref().map(str::trim))
      .filter(|v| !v.is_empty())
      .collect()
  }
}

/// Poster request as submitted by the client. Images are base64 strings or
/// data URLs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
  #[serde(default)]
  pub brand_name: String,
  #[serde(default)]
  pub description: String,
  pub industry: Option<String>,
  pub language: Option<String>,
  #[serde(default)]
  pub product_images: Vec<String>,
  pub product_url: Option<String>,
  pub brand_logo: Option<String>,
  /// Previously generated poster: update the text, keep the layout.
  pub base_image: Option<String>,
  pub aspect_ratio: Option<String>,
  #[serde(default)]
  pub poster_type: PosterType,
  pub festival_name: Option<String>,
  #[serde(flatten)]
  pub contact: Contact,
}

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct Brief {
  pub brand_name: String,
  pub description: String,
  pub industry: String,
  pub language: String,
  pub product_images: Vec<Blob>,
  pub product_url: Option<String>,
  pub logo: Option<Blob>,
  pub base_image: Option<Blob>,
  pub aspect_ratio: String,
  pub poster_type: PosterType,
  pub festival_name: Option<String>,
  pub contact: Contact,
}

impl Brief {
  pub fn is_update(&self) -> bool {
    self.base_image.is_some()
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl GenerationRequest {
  pub fn validate(self) -> Result<Brief> {
    let brand_name = self.brand_name.trim().to_string();
    if brand_name.is_empty() {
      return Err(Error::validation("Brand name is required"));
    }

    let description = self.description.trim().to_string();
    if description.is_empty() {
      return Err(Error::validation("Description is required"));
    }

    let festival_name = non_empty(self.festival_name);
    if self.poster_type == PosterType::Festival && festival_name.is_none() {
      return Err(Error::validation(
        "Festival name is required for festival posters",
      ));
    }

    let images: Vec<&String> =
      self.product_images.iter().filter(|s| !s.trim().is_empty()).collect();
    if images.len() > MAX_PRODUCT_IMAGES {
      return Err(Error::validation(format!(
        "At most {MAX_PRODUCT_IMAGES} product images are allowed"
      )));
    }
    let product_images = images
      .into_iter()
      .map(|raw| decode_image(raw, "Product image"))
      .collect::<Result<Vec<_>>>()?;

    let product_url = non_empty(self.product_url);
    if let Some(url) = &product_url
      && !(url.starts_with("http://") || url.starts_with("https://"))
    {
      return Err(Error::validation("Product URL must be an http(s) link"));
    }

    let logo = non_empty(self.brand_logo)
      .map(|raw| decode_image(&raw, "Brand logo"))
      .transpose()?;
    let base_image = non_empty(self.base_image)
      .map(|raw| decode_image(&raw, "Base image"))
      .transpose()?;

    let aspect_ratio = non_empty(self.aspect_ratio);
    let aspect_ratio = if base_image.is_some() {
      aspect_ratio.ok_or_else(|| {
        Error::validation("Aspect ratio is required when updating a poster")
      })?
    } else {
      if product_images.is_empty() && product_url.is_none() {
        return Err(Error::validation(
          "Upload at least one product image or provide a product URL",
        ));
      }
      aspect_ratio.unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string())
    };
    if !ASPECT_RATIOS.contains(&aspect_ratio.as_str()) {
      return Err(Error::validation(format!(
        "Unsupported aspect ratio `{aspect_ratio}`, expected one of {}",
        ASPECT_RATIOS.join(", ")
      )));
    }

    Ok(Brief {
      brand_name,
      description,
      industry: non_empty(self.industry).unwrap_or_else(|| "General".into()),
      language: non_empty(self.language).unwrap_or_else(|| "English".into()),
      product_images,
      product_url,
      logo,
      base_image,
      aspect_ratio,
      poster_type: self.poster_type,
      festival_name,
      contact: self.contact,
    })
  }
}

/// Accepts `data:<mime>;base64,<payload>` or bare base64, in which case the
/// mime type is sniffed from the magic bytes.
pub fn decode_image(raw: &str, field: &str) -> Result<Blob> {
  let raw = raw.trim();
  let invalid = || Error::validation(format!("{field} is not a valid image"));

  let (declared, payload) = match raw.strip_prefix("data:") {
    Some(rest) => {
      let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
      let mime = header.strip_suffix(";base64").ok_or_else(invalid)?;
      (Some(mime.to_ascii_lowercase()), payload)
    }
    None => (None, raw),
  };

  let data: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
  let bytes = STANDARD.decode(&data).map_err(|_| invalid())?;
  if bytes.is_empty() {
    return Err(invalid());
  }

  let mime_type = match declared {
    Some(mime) if mime.starts_with("image/") => mime,
    Some(_) => return Err(invalid()),
    None => sniff_mime(&bytes).ok_or_else(invalid)?.to_string(),
  };

  Ok(Blob { mime_type, data })
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
  match bytes {
    [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
    [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
    [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
      Some("image/webp")
    }
    [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::PNG_B64;

  fn fresh() -> GenerationRequest {
    GenerationRequest {
      brand_name: "Aura".into(),
      description: "Luxury skincare".into(),
      product_images: vec![PNG_B64.into()],
      ..Default::default()
    }
  }

  fn message(result: Result<Brief>) -> String {
    match result {
      Err(Error::Validation(msg)) => msg,
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn test_fresh_defaults() {
    let brief = fresh().validate().unwrap();
    assert_eq!(brief.industry, "General");
    assert_eq!(brief.language, "English");
    assert_eq!(brief.aspect_ratio, DEFAULT_ASPECT_RATIO);
    assert_eq!(brief.product_images[0].mime_type, "image/png");
    assert!(!brief.is_update());
  }

  #[test]
  fn test_required_fields() {
    let msg = message(GenerationRequest { brand_name: " ".into(), ..fresh() }.validate());
    assert!(msg.contains("Brand name"));

    let msg = message(GenerationRequest { description: "".into(), ..fresh() }.validate());
    assert!(msg.contains("Description"));
  }

  #[test]
  fn test_festival_needs_name() {
    let req = GenerationRequest { poster_type: PosterType::Festival, ..fresh() };
    assert!(message(req.validate()).contains("Festival name"));

    let req = GenerationRequest {
      poster_type: PosterType::Festival,
      festival_name: Some("Diwali".into()),
      ..fresh()
    };
    assert_eq!(req.validate().unwrap().festival_name.as_deref(), Some("Diwali"));
  }

  #[test]
  fn test_fresh_needs_image_or_url() {
    let req = GenerationRequest { product_images: vec![" ".into()], ..fresh() };
    assert!(message(req.validate()).contains("product image"));

    let req = GenerationRequest {
      product_images: vec![],
      product_url: Some("https://aura.example/serum".into()),
      ..fresh()
    };
    assert!(req.validate().is_ok());

    let req = GenerationRequest {
      product_images: vec![],
      product_url: Some("ftp://aura.example".into()),
      ..fresh()
    };
    assert!(message(req.validate()).contains("http"));
  }

  #[test]
  fn test_update_mode_waives_images_but_needs_ratio() {
    let req = GenerationRequest {
      product_images: vec![],
      base_image: Some(format!("data:image/png;base64,{PNG_B64}")),
      ..fresh()
    };
    assert!(message(req.clone().validate()).contains("Aspect ratio"));

    let brief = GenerationRequest { aspect_ratio: Some("9:16".into()), ..req }
      .validate()
      .unwrap();
    assert!(brief.is_update());
    assert_eq!(brief.aspect_ratio, "9:16");
  }

  #[test]
  fn test_image_limits() {
    let req = GenerationRequest {
      product_images: vec![PNG_B64.into(); MAX_PRODUCT_IMAGES + 1],
      ..fresh()
    };
    assert!(message(req.validate()).contains("At most"));

    let req = GenerationRequest { aspect_ratio: Some("16:9".into()), ..fresh() };
    assert!(message(req.validate()).contains("aspect ratio"));
  }

  #[test]
  fn test_decode_image() {
    let blob =
      decode_image(&format!("data:image/webp;base64,{PNG_B64}"), "x").unwrap();
    assert_eq!(blob.mime_type, "image/webp");
    assert_eq!(blob.data, PNG_B64);

    assert!(decode_image("data:text/plain;base64,aGk=", "x").is_err());
    assert!(decode_image("data:image/png,raw", "x").is_err());
    assert!(decode_image("!!!not base64!!!", "x").is_err());
    // valid base64 but not an image
    assert!(decode_image("aGVsbG8=", "x").is_err());
  }
}
