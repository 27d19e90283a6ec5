use std::env;

use crate::{entity::Plan, prelude::*};

#[derive(Debug, Clone)]
pub struct Gemini {
  pub api_key: Option<String>,
  pub base_url: String,
  pub text_model: String,
  pub image_model: String,
}

#[derive(Debug, Clone)]
pub struct Razorpay {
  pub key_id: Option<String>,
  pub key_secret: Option<String>,
  pub webhook_secret: Option<String>,
  pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Mail {
  pub api_url: Option<String>,
  pub api_key: Option<String>,
  pub from: String,
}

/// Plan prices in minor currency units.
#[derive(Debug, Clone)]
pub struct Pricing {
  pub monthly: i64,
  pub yearly: i64,
  pub currency: String,
}

impl Pricing {
  pub fn amount(&self, plan: Plan) -> i64 {
    match plan {
      Plan::Monthly => self.monthly,
      Plan::Yearly => self.yearly,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub secret: String,
  pub signup_credits: i32,
  pub max_body_bytes: usize,
  pub expiry_sweep: Duration,
  pub gemini: Gemini,
  pub razorpay: Razorpay,
  pub mail: Mail,
  pub pricing: Pricing,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:posters.db?mode=rwc"),
      port: 3000,
      secret: String::new(),
      signup_credits: 2,
      max_body_bytes: 25 * 1024 * 1024,
      expiry_sweep: Duration::from_secs(3600),
      gemini: Gemini {
        api_key: None,
        base_url: String::from(
          "https://generativelanguage.googleapis.com/v1beta",
        ),
        text_model: String::from("gemini-2.0-flash"),
        image_model: String::from("gemini-2.5-flash-image"),
      },
      razorpay: Razorpay {
        key_id: None,
        key_secret: None,
        webhook_secret: None,
        base_url: String::from("https://api.razorpay.com/v1"),
      },
      mail: Mail {
        api_url: None,
        api_key: None,
        from: String::from("Poster Studio <noreply@posterstudio.app>"),
      },
      pricing: Pricing {
        monthly: 49_900,
        yearly: 479_900,
        currency: String::from("INR"),
      },
    }
  }
}

fn var(key: &str) -> Option<String> {
  env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
  T::Err: std::fmt::Display,
{
  var(key)
    .map(|raw| {
      raw.parse::<T>().map_err(|err| anyhow::anyhow!("Invalid {key}: {err}"))
    })
    .transpose()
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let defaults = Self::default();

    let expiry_sweep = match var("EXPIRY_SWEEP_INTERVAL") {
      Some(raw) => humantime::parse_duration(&raw)
        .with_context(|| format!("Invalid EXPIRY_SWEEP_INTERVAL `{raw}`"))?,
      None => defaults.expiry_sweep,
    };

    let config = Self {
      database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
      port: parsed("PORT")?.unwrap_or(defaults.port),
      secret: var("SERVER_SECRET").context("SERVER_SECRET not set")?,
      signup_credits: parsed("SIGNUP_CREDITS")?
        .unwrap_or(defaults.signup_credits),
      max_body_bytes: parsed("MAX_BODY_BYTES")?
        .unwrap_or(defaults.max_body_bytes),
      expiry_sweep,
      gemini: Gemini {
        api_key: var("GEMINI_API_KEY"),
        base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url),
        text_model: var("GEMINI_TEXT_MODEL")
          .unwrap_or(defaults.gemini.text_model),
        image_model: var("GEMINI_IMAGE_MODEL")
          .unwrap_or(defaults.gemini.image_model),
      },
      razorpay: Razorpay {
        key_id: var("RAZORPAY_KEY_ID"),
        key_secret: var("RAZORPAY_KEY_SECRET"),
        webhook_secret: var("RAZORPAY_WEBHOOK_SECRET"),
        base_url: var("RAZORPAY_BASE_URL")
          .unwrap_or(defaults.razorpay.base_url),
      },
      mail: Mail {
        api_url: var("MAIL_API_URL"),
        api_key: var("MAIL_API_KEY"),
        from: var("MAIL_FROM").unwrap_or(defaults.mail.from),
      },
      pricing: Pricing {
        monthly: parsed("PLAN_MONTHLY_PRICE")?
          .unwrap_or(defaults.pricing.monthly),
        yearly: parsed("PLAN_YEARLY_PRICE")?.unwrap_or(defaults.pricing.yearly),
        currency: var("PLAN_CURRENCY").unwrap_or(defaults.pricing.currency),
      },
    };

    if config.gemini.api_key.is_none() {
      warn!("GEMINI_API_KEY not set, poster generation will be unavailable");
    }
    if config.razorpay.key_secret.is_none() {
      warn!("RAZORPAY_KEY_SECRET not set, subscriptions will be unavailable");
    }

    Ok(config)
  }
}
