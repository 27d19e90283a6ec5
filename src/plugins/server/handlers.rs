use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use super::{auth::AuthUser, extract::Payload};
use crate::{
  entity::{Plan, subscription},
  poster::{GenerationRequest, Generator, Poster},
  prelude::*,
  state::AppState,
  sv::{
    Balance,
    billing::{Checkout, VerifyPayment, WebhookOutcome},
  },
};

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Debug, Serialize)]
pub struct GenerateRes {
  pub success: bool,
  #[serde(flatten)]
  pub poster: Poster,
}

pub async fn generate(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Payload(req): Payload<GenerationRequest>,
) -> Result<Json<GenerateRes>> {
  let sv = app.sv();
  let poster =
    Generator::new(&sv.credits, app.strategist.as_ref(), app.images.as_ref())
      .generate(user.id, req)
      .await?;

  Ok(Json(GenerateRes { success: true, poster }))
}

pub async fn credits(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Balance>> {
  use crate::sv::Ledger;

  Ok(Json(app.sv().credits.balance(user.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionReq {
  pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionRes {
  pub success: bool,
  #[serde(flatten)]
  pub checkout: Checkout,
}

pub async fn create_subscription(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Payload(req): Payload<CreateSubscriptionReq>,
) -> Result<Json<CreateSubscriptionRes>> {
  let plan =
    Plan::parse(&req.plan).ok_or_else(|| Payment::UnknownPlan(req.plan))?;
  let checkout = app.sv().billing.create_order(&user, plan).await?;

  Ok(Json(CreateSubscriptionRes { success: true, checkout }))
}

#[derive(Debug, Serialize)]
pub struct VerifyRes {
  pub success: bool,
  pub subscription: subscription::Model,
}

pub async fn verify_subscription(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Payload(req): Payload<VerifyPayment>,
) -> Result<Json<VerifyRes>> {
  let activated = app.sv().billing.verify(user.id, &req).await?;

  Ok(Json(VerifyRes { success: true, subscription: activated.subscription }))
}

pub async fn razorpay_webhook(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<json::Value>> {
  let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
  let outcome = app.sv().billing.webhook(&body, signature).await?;

  let status = match outcome {
    WebhookOutcome::Activated { .. } => "processed",
    WebhookOutcome::Ignored(_) => "ignored",
  };
  Ok(Json(json::json!({ "success": true, "status": status })))
}

pub async fn health() -> &'static str {
  "OK"
}
