//! Poster generation pipeline: validate the brief, gate on credits, derive an
//! ad strategy, synthesize the image and fall back to a local SVG poster when
//! the image model fails.

pub mod fallback;
pub mod generator;
pub mod request;
pub mod strategy;
pub mod synth;

pub use generator::{Generator, Poster};
pub use request::{Brief, GenerationRequest};
pub use strategy::{AdStrategy, Analyzer};
pub use synth::Synthesizer;

/// First `max` characters of `text`, never splitting a code point.
pub(crate) fn truncate(text: &str, max: usize) -> String {
  text.chars().take(max).collect()
}
