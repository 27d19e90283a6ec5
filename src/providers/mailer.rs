use reqwest::Client;
use serde::Serialize;

use super::Mailer;
use crate::{config, prelude::*};

#[derive(Debug, Clone, Serialize)]
pub struct Email {
  pub to: String,
  pub subject: String,
  pub text: String,
}

/// Transactional mail over a JSON HTTP API (`{from, to, subject, text}`
/// with a bearer key).
pub struct HttpMailer {
  client: Client,
  config: config::Mail,
}

impl HttpMailer {
  pub fn new(client: Client, config: config::Mail) -> Self {
    Self { client, config }
  }
}

#[async_trait]
impl Mailer for HttpMailer {
  async fn send(&self, email: &Email) -> Result<()> {
    let url = self
      .config
      .api_url
      .as_deref()
      .ok_or_else(|| Error::missing_config("MAIL_API_URL"))?;

    let mut req = self.client.post(url).json(&json::json!({
      "from": self.config.from,
      "to": email.to,
      "subject": email.subject,
      "text": email.text,
    }));
    if let Some(key) = &self.config.api_key {
      req = req.bearer_auth(key);
    }

    let status = req.send().await?.status();
    if !status.is_success() {
      return Err(Error::Upstream(format!("Mail API returned {status}")));
    }

    debug!("Sent `{}` to {}", email.subject, email.to);
    Ok(())
  }
}
