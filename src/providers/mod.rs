//! Narrow interfaces over the external services the pipeline talks to.
//!
//! Every call is attempted exactly once; retries and fallbacks are decided by
//! the callers.

pub mod gemini;
pub mod mailer;
pub mod razorpay;

pub use gemini::{
  Blob, Gemini, GenerateResponse, ImageRequest, Part, SafetySetting,
};
pub use mailer::{Email, HttpMailer};
pub use razorpay::{NewOrder, Order, PaymentRecord, Razorpay};

use crate::prelude::*;

/// Generative text model used by the strategy analyzer.
#[async_trait]
pub trait StrategyProvider: Send + Sync {
  /// Returns the concatenated text of the first candidate, possibly empty
  /// when the model refuses.
  async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Generative image model used by the poster synthesizer.
#[async_trait]
pub trait ImageProvider: Send + Sync {
  async fn render(&self, request: &ImageRequest) -> Result<GenerateResponse>;
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
  async fn create_order(&self, order: &NewOrder) -> Result<Order>;

  async fn fetch_order(&self, order_id: &str) -> Result<Order>;

  async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentRecord>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: &Email) -> Result<()>;
}
