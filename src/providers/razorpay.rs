use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::PaymentProvider;
use crate::{config, prelude::*};

#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
  /// Minor currency units
  pub amount: i64,
  pub currency: String,
  pub receipt: String,
  /// Razorpay only stores string values here.
  pub notes: json::Map<String, json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Order {
  pub id: String,
  pub amount: i64,
  pub currency: String,
  /// An object, or `[]` when empty.
  #[serde(default)]
  pub notes: json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRecord {
  pub id: String,
  pub status: String,
  #[serde(default)]
  pub order_id: Option<String>,
  #[serde(default)]
  pub amount: i64,
  /// An object, or `[]` when empty.
  #[serde(default)]
  pub notes: json::Value,
}

impl PaymentRecord {
  pub fn is_captured(&self) -> bool {
    self.status == "captured"
  }
}

pub struct Razorpay {
  client: Client,
  config: config::Razorpay,
}

impl Razorpay {
  pub fn new(client: Client, config: config::Razorpay) -> Self {
    Self { client, config }
  }

  fn credentials(&self) -> Result<(&str, &str)> {
    let id = self
      .config
      .key_id
      .as_deref()
      .ok_or_else(|| Error::missing_config("RAZORPAY_KEY_ID"))?;
    let secret = self
      .config
      .key_secret
      .as_deref()
      .ok_or_else(|| Error::missing_config("RAZORPAY_KEY_SECRET"))?;
    Ok((id, secret))
  }

  async fn read<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
  ) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
      let text = resp.text().await.unwrap_or_default();
      return Err(Error::Upstream(format!("Razorpay returned {status}: {text}")));
    }
    Ok(resp.json().await?)
  }
}

#[async_trait]
impl PaymentProvider for Razorpay {
  async fn create_order(&self, order: &NewOrder) -> Result<Order> {
    let (id, secret) = self.credentials()?;
    let resp = self
      .client
      .post(format!("{}/orders", self.config.base_url))
      .basic_auth(id, Some(secret))
      .json(order)
      .send()
      .await?;

    Self::read(resp).await
  }

  async fn fetch_order(&self, order_id: &str) -> Result<Order> {
    let (id, secret) = self.credentials()?;
    let resp = self
      .client
      .get(format!("{}/orders/{}", self.config.base_url, order_id))
      .basic_auth(id, Some(secret))
      .send()
      .await?;

    Self::read(resp).await
  }

  async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentRecord> {
    let (id, secret) = self.credentials()?;
    let resp = self
      .client
      .get(format!("{}/payments/{}", self.config.base_url, payment_id))
      .basic_auth(id, Some(secret))
      .send()
      .await?;

    Self::read(resp).await
  }
}
