//! Local vector poster used when the image model fails. CPU only, fixed
//! layout, no external calls.

use std::fmt::Write;

use base64::{Engine, engine::general_purpose::STANDARD};

use super::{Brief, request::PosterType, strategy::FALLBACK_PALETTE, truncate};
use crate::prelude::*;

const WIDTH: u32 = 1080;
const HEIGHT: u32 = 1440;
const DESCRIPTION_CHARS: usize = 80;
const LINE_CHARS: usize = 32;

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      c if c.is_control() => out.push(' '),
      c => out.push(c),
    }
  }
  out
}

/// Greedy word wrap on character counts.
fn wrap(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut line = String::new();

  for word in text.split_whitespace() {
    let len = line.chars().count();
    if len > 0 && len + 1 + word.chars().count() > width {
      lines.push(std::mem::take(&mut line));
    }
    if !line.is_empty() {
      line.push(' ');
    }
    line.push_str(word);
  }
  if !line.is_empty() {
    lines.push(line);
  }
  lines
}

pub fn description(text: &str) -> String {
  if text.chars().count() > DESCRIPTION_CHARS {
    format!("{}...", truncate(text, DESCRIPTION_CHARS).trim_end())
  } else {
    text.to_string()
  }
}

pub fn svg(brief: &Brief) -> Result<String, std::fmt::Error> {
  let [dark, light, accent, muted] = FALLBACK_PALETTE;
  let mut out = String::new();

  writeln!(
    out,
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
  )?;
  writeln!(
    out,
    r#"<defs><linearGradient id="bg" x1="0" y1="0" x2="0" y2="1"><stop offset="0" stop-color="{dark}"/><stop offset="1" stop-color="{muted}"/></linearGradient></defs>"#
  )?;
  writeln!(out, r#"<rect width="100%" height="100%" fill="url(#bg)"/>"#)?;
  writeln!(
    out,
    r#"<rect x="60" y="60" width="{}" height="{}" fill="none" stroke="{accent}" stroke-width="4"/>"#,
    WIDTH - 120,
    HEIGHT - 120
  )?;

  let mut y = 420;
  if brief.poster_type == PosterType::Festival
    && let Some(festival) = &brief.festival_name
  {
    writeln!(
      out,
      r#"<text x="540" y="300" text-anchor="middle" font-family="Georgia, serif" font-size="48" fill="{accent}">Happy {}</text>"#,
      escape(festival)
    )?;
  }

  for line in wrap(&brief.brand_name, 18) {
    writeln!(
      out,
      r#"<text x="540" y="{y}" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" font-size="96" font-weight="bold" fill="{light}">{}</text>"#,
      escape(&line)
    )?;
    y += 110;
  }

  y += 20;
  writeln!(
    out,
    r#"<rect x="440" y="{y}" width="200" height="6" fill="{accent}"/>"#
  )?;
  y += 90;

  for line in wrap(&description(&brief.description), LINE_CHARS) {
    writeln!(
      out,
      r#"<text x="540" y="{y}" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" font-size="44" fill="{light}">{}</text>"#,
      escape(&line)
    )?;
    y += 60;
  }

  let contact = brief.contact.lines();
  let mut cy = HEIGHT as usize - 140 - 50 * contact.len().saturating_sub(1);
  for line in contact {
    writeln!(
      out,
      r#"<text x="540" y="{cy}" text-anchor="middle" font-family="Helvetica, Arial, sans-serif" font-size="34" fill="{accent}">{}</text>"#,
      escape(line)
    )?;
    cy += 50;
  }

  writeln!(out, "</svg>")?;
  Ok(out)
}

/// Renders the fallback poster as a `data:image/svg+xml;base64,` URL.
pub fn render(brief: &Brief) -> Result<String> {
  let svg = svg(brief)
    .map_err(|err| Error::Internal(format!("fallback render: {err}")))?;
  Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
}
