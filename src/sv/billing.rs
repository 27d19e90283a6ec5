//! Subscription checkout, payment verification and provider webhooks.
//!
//! Activation is all-or-nothing: the signature is checked first, the payment
//! must be captured, and the subscription upsert, credit grant and payment
//! record are committed in one transaction. Payments are deduplicated by
//! payment id, so the synchronous verify call and the asynchronous webhook
//! for the same payment grant credits once.

use sea_orm::sea_query::OnConflict;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  config::Config,
  crypto,
  entity::{Plan, payment, subscription, user},
  prelude::*,
  providers::{Email, Mailer, NewOrder, PaymentProvider},
  sv::{Credits, Ledger, NewSubscription},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  Verify,
  Webhook,
}

impl Source {
  fn as_str(self) -> &'static str {
    match self {
      Source::Verify => "verify",
      Source::Webhook => "webhook",
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
  pub order_id: String,
  pub amount: i64,
  pub currency: String,
  pub key_id: String,
  pub plan: Plan,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPayment {
  pub payment_id: String,
  pub order_id: String,
  pub signature: String,
  pub plan: Plan,
}

#[derive(Debug, Clone)]
pub struct Activated {
  pub subscription: subscription::Model,
  /// False when this payment id had already been processed.
  pub granted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
  Activated { payment_id: String, granted: bool },
  Ignored(String),
}

struct Activation<'p> {
  user_id: i64,
  plan: Plan,
  payment_id: &'p str,
  order_id: &'p str,
  source: Source,
}

pub struct Billing<'a> {
  db: &'a DatabaseConnection,
  provider: &'a dyn PaymentProvider,
  mailer: &'a Arc<dyn Mailer>,
  config: &'a Config,
}

impl<'a> Billing<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    provider: &'a dyn PaymentProvider,
    mailer: &'a Arc<dyn Mailer>,
    config: &'a Config,
  ) -> Self {
    Self { db, provider, mailer, config }
  }

  pub async fn create_order(
    &self,
    user: &user::Model,
    plan: Plan,
  ) -> Result<Checkout> {
    let key_id = self
      .config
      .razorpay
      .key_id
      .clone()
      .ok_or_else(|| Error::missing_config("RAZORPAY_KEY_ID"))?;

    let mut notes = json::Map::new();
    notes.insert("user_id".into(), user.id.to_string().into());
    notes.insert("plan".into(), plan.as_str().into());

    let order = self
      .provider
      .create_order(&NewOrder {
        amount: self.config.pricing.amount(plan),
        currency: self.config.pricing.currency.clone(),
        receipt: format!("sub_{}", Uuid::new_v4().simple()),
        notes,
      })
      .await?;

    info!("Created {} order {} for user {}", plan.as_str(), order.id, user.id);

    Ok(Checkout {
      order_id: order.id,
      amount: order.amount,
      currency: order.currency,
      key_id,
      plan,
    })
  }

  pub async fn verify(
    &self,
    user_id: i64,
    req: &VerifyPayment,
  ) -> Result<Activated> {
    let secret = self
      .config
      .razorpay
      .key_secret
      .as_deref()
      .ok_or_else(|| Error::missing_config("RAZORPAY_KEY_SECRET"))?;

    if !checkout_signature_valid(
      secret,
      &req.order_id,
      &req.payment_id,
      &req.signature,
    ) {
      warn!("Signature mismatch for payment {}", req.payment_id);
      return Err(Payment::SignatureMismatch.into());
    }

    let record = self.provider.fetch_payment(&req.payment_id).await?;
    if !record.is_captured() {
      warn!("Payment {} is `{}`, not captured", record.id, record.status);
      return Err(Payment::NotCaptured(record.status).into());
    }

    if record.order_id.as_deref() != Some(req.order_id.as_str()) {
      warn!("Payment {} was not made for order {}", record.id, req.order_id);
      return Err(mismatch("payment belongs to another order"));
    }

    let order = self.provider.fetch_order(&req.order_id).await?;
    let issued =
      [&order.notes, &record.notes].into_iter().find_map(parse_notes);
    if issued != Some((user_id, req.plan)) {
      warn!(
        "Order {} was not issued to user {user_id} for the {} plan",
        order.id,
        req.plan.as_str()
      );
      return Err(mismatch("order was issued for another user or plan"));
    }

    if record.amount != order.amount {
      warn!(
        "Payment {} amount {} differs from order amount {}",
        record.id, record.amount, order.amount
      );
      return Err(mismatch("amount differs from the order"));
    }

    self
      .activate(Activation {
        user_id,
        plan: req.plan,
        payment_id: &req.payment_id,
        order_id: &req.order_id,
        source: Source::Verify,
      })
      .await
  }

  pub async fn webhook(
    &self,
    body: &[u8],
    signature: Option<&str>,
  ) -> Result<WebhookOutcome> {
    let secret = self
      .config
      .razorpay
      .webhook_secret
      .as_deref()
      .ok_or_else(|| Error::missing_config("RAZORPAY_WEBHOOK_SECRET"))?;

    let signature = signature.ok_or(Payment::SignatureMismatch)?;
    if !crypto::verify_hex(secret, body, signature) {
      warn!("Rejected webhook with invalid signature");
      return Err(Payment::SignatureMismatch.into());
    }

    let event: json::Value = json::from_slice(body)
      .map_err(|err| Payment::MalformedWebhook(err.to_string()))?;
    let kind = event["event"].as_str().unwrap_or_default();

    if !matches!(kind, "payment.captured" | "order.paid") {
      debug!("Ignoring webhook event `{kind}`");
      return Ok(WebhookOutcome::Ignored(kind.to_string()));
    }

    let payload = &event["payload"];
    let payment = &payload["payment"]["entity"];
    let payment_id = payment["id"]
      .as_str()
      .ok_or_else(|| Payment::MalformedWebhook("missing payment id".into()))?;

    if payment["status"].as_str() != Some("captured") {
      debug!("Ignoring webhook for uncaptured payment {payment_id}");
      return Ok(WebhookOutcome::Ignored(kind.to_string()));
    }

    let order_id = payment["order_id"]
      .as_str()
      .or_else(|| payload["order"]["entity"]["id"].as_str())
      .ok_or_else(|| Payment::MalformedWebhook("missing order id".into()))?;

    let (user_id, plan) = [&payload["order"]["entity"]["notes"], &payment["notes"]]
      .into_iter()
      .find_map(parse_notes)
      .ok_or_else(|| {
        Payment::MalformedWebhook("notes carry no user_id/plan".into())
      })?;

    let activated = match self
      .activate(Activation {
        user_id,
        plan,
        payment_id,
        order_id,
        source: Source::Webhook,
      })
      .await
    {
      Ok(activated) => activated,
      Err(Error::UserNotFound) => {
        warn!("Webhook for payment {payment_id} names unknown user {user_id}");
        return Ok(WebhookOutcome::Ignored(kind.to_string()));
      }
      Err(err) => return Err(err),
    };

    Ok(WebhookOutcome::Activated {
      payment_id: payment_id.to_string(),
      granted: activated.granted,
    })
  }

  async fn activate(&self, act: Activation<'_>) -> Result<Activated> {
    let txn = self.db.begin().await?;

    let user = user::Entity::find_by_id(act.user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let now = Utc::now().naive_utc();
    let grant = act.plan.credit_grant();

    let inserted = payment::Entity::insert(payment::ActiveModel {
      payment_id: Set(act.payment_id.to_string()),
      user_id: Set(act.user_id),
      order_id: Set(act.order_id.to_string()),
      plan: Set(act.plan),
      source: Set(act.source.as_str().to_string()),
      granted_credits: Set(grant),
      created_at: Set(now),
    })
    .on_conflict(
      OnConflict::column(payment::Column::PaymentId).do_nothing().to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    if inserted == 0 {
      let recorded = payment::Entity::find_by_id(act.payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
          Error::Internal(format!("payment {} vanished", act.payment_id))
        })?;
      if recorded.user_id != act.user_id {
        warn!(
          "Payment {} is recorded for user {}, not {}",
          act.payment_id, recorded.user_id, act.user_id
        );
        return Err(mismatch("payment was made by another user"));
      }

      let subscription = subscription::Entity::find_by_id(act.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
          Error::Internal(format!(
            "payment {} recorded without subscription",
            act.payment_id
          ))
        })?;
      txn.commit().await?;

      info!(
        "Payment {} already processed, skipping grant ({})",
        act.payment_id,
        act.source.as_str()
      );
      return Ok(Activated { subscription, granted: false });
    }

    let ledger = Credits::new(&txn);
    let subscription = ledger
      .upsert_subscription(&NewSubscription {
        user_id: act.user_id,
        plan: act.plan,
        payment_id: act.payment_id.to_string(),
        order_id: act.order_id.to_string(),
        period_start: now,
      })
      .await?;
    ledger.increment(act.user_id, grant).await?;

    txn.commit().await?;

    info!(
      "Activated {} subscription for user {} (+{grant} credits, {})",
      act.plan.as_str(),
      act.user_id,
      act.source.as_str()
    );

    self.notify(user.email, &subscription);
    Ok(Activated { subscription, granted: true })
  }

  /// Best-effort confirmation mail, never awaited by the caller.
  fn notify(&self, to: String, sub: &subscription::Model) {
    let mailer = self.mailer.clone();
    let email = Email {
      to,
      subject: String::from("Your Poster Studio subscription is active"),
      text: format!(
        "Your {} plan is active until {}.",
        sub.plan.as_str(),
        sub.current_period_end.format("%d.%m.%Y")
      ),
    };

    tokio::spawn(async move {
      if let Err(err) = mailer.send(&email).await {
        warn!("Confirmation mail to {} failed: {err}", email.to);
      }
    });
  }
}

/// `HMAC-SHA256(secret, order_id + "|" + payment_id)` against the checkout
/// signature.
pub fn checkout_signature_valid(
  secret: &str,
  order_id: &str,
  payment_id: &str,
  signature: &str,
) -> bool {
  let payload = format!("{order_id}|{payment_id}");
  crypto::verify_hex(secret, payload.as_bytes(), signature)
}

fn mismatch(reason: &str) -> Error {
  Payment::Mismatch(reason.to_string()).into()
}

fn parse_notes(notes: &json::Value) -> Option<(i64, Plan)> {
  let user_id = match &notes["user_id"] {
    json::Value::String(s) => s.trim().parse().ok()?,
    json::Value::Number(n) => n.as_i64()?,
    _ => return None,
  };
  let plan = Plan::parse(notes["plan"].as_str()?)?;
  Some((user_id, plan))
}
