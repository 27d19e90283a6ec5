//! Test fixtures: in-memory database and fakes for the provider traits.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use sea_orm::{DbBackend, Schema};

use crate::{
  entity::{payment, subscription, user},
  prelude::*,
  providers::{
    Blob, Email, GenerateResponse, ImageProvider, ImageRequest, Mailer,
    NewOrder, Order, PaymentProvider, PaymentRecord, StrategyProvider,
    gemini::{Candidate, Content, ResponsePart},
  },
};

/// 1x1 transparent PNG
pub const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub async fn setup_db() -> DatabaseConnection {
  let db = Database::connect("sqlite::memory:").await.unwrap();
  let schema = Schema::new(DbBackend::Sqlite);

  let stmt = schema.create_table_from_entity(user::Entity);
  db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

  let stmt = schema.create_table_from_entity(subscription::Entity);
  db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

  let stmt = schema.create_table_from_entity(payment::Entity);
  db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

  db
}

pub async fn user(
  db: &DatabaseConnection,
  email: &str,
  credits: i32,
) -> user::Model {
  user::ActiveModel {
    email: Set(email.to_string()),
    credits: Set(credits),
    created_at: Set(Utc::now().naive_utc()),
    ..Default::default()
  }
  .insert(db)
  .await
  .unwrap()
}

enum TextReply {
  Text(String),
  Unreachable,
  Unconfigured,
}

pub struct FakeStrategist {
  reply: TextReply,
  calls: AtomicUsize,
  prompts: Mutex<Vec<String>>,
}

impl FakeStrategist {
  fn new(reply: TextReply) -> Self {
    Self { reply, calls: AtomicUsize::new(0), prompts: Mutex::default() }
  }

  pub fn reply(text: &str) -> Self {
    Self::new(TextReply::Text(text.to_string()))
  }

  pub fn unreachable() -> Self {
    Self::new(TextReply::Unreachable)
  }

  pub fn unconfigured() -> Self {
    Self::new(TextReply::Unconfigured)
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn last_prompt(&self) -> Option<String> {
    self.prompts.lock().unwrap().last().cloned()
  }
}

#[async_trait]
impl StrategyProvider for FakeStrategist {
  async fn complete(&self, prompt: &str) -> Result<String> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.prompts.lock().unwrap().push(prompt.to_string());

    match &self.reply {
      TextReply::Text(text) => Ok(text.clone()),
      TextReply::Unreachable => {
        Err(Error::Upstream("connection refused".into()))
      }
      TextReply::Unconfigured => Err(Error::missing_config("GEMINI_API_KEY")),
    }
  }
}

enum ImageReply {
  Image(Blob),
  Empty,
  Unreachable,
}

pub struct FakeImages {
  reply: ImageReply,
  calls: AtomicUsize,
}

impl FakeImages {
  fn new(reply: ImageReply) -> Self {
    Self { reply, calls: AtomicUsize::new(0) }
  }

  pub fn image(mime_type: &str, data: &str) -> Self {
    Self::new(ImageReply::Image(Blob {
      mime_type: mime_type.to_string(),
      data: data.to_string(),
    }))
  }

  /// A candidate whose only part is text.
  pub fn empty() -> Self {
    Self::new(ImageReply::Empty)
  }

  pub fn unreachable() -> Self {
    Self::new(ImageReply::Unreachable)
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ImageProvider for FakeImages {
  async fn render(&self, _request: &ImageRequest) -> Result<GenerateResponse> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    let part = match &self.reply {
      ImageReply::Image(blob) => {
        ResponsePart { text: None, inline_data: Some(blob.clone()) }
      }
      ImageReply::Empty => {
        ResponsePart { text: Some("no image".into()), inline_data: None }
      }
      ImageReply::Unreachable => {
        return Err(Error::Upstream("connection refused".into()));
      }
    };

    Ok(GenerateResponse {
      candidates: vec![Candidate {
        content: Some(Content { parts: vec![part] }),
        finish_reason: Some("STOP".into()),
      }],
    })
  }
}

/// Keeps the orders it was asked to create. Payments exist once
/// [`FakePayments::settle`] ties a payment id to one of those orders.
pub struct FakePayments {
  status: String,
  orders: Mutex<Vec<Order>>,
  requests: Mutex<Vec<NewOrder>>,
  settled: Mutex<HashMap<String, String>>,
  fetches: AtomicUsize,
}

impl FakePayments {
  pub fn with_status(status: &str) -> Self {
    Self {
      status: status.to_string(),
      orders: Mutex::default(),
      requests: Mutex::default(),
      settled: Mutex::default(),
      fetches: AtomicUsize::new(0),
    }
  }

  pub fn captured() -> Self {
    Self::with_status("captured")
  }

  pub fn settle(&self, payment_id: &str, order_id: &str) {
    self
      .settled
      .lock()
      .unwrap()
      .insert(payment_id.to_string(), order_id.to_string());
  }

  pub fn orders(&self) -> Vec<NewOrder> {
    self.requests.lock().unwrap().clone()
  }

  /// Provider reads made while verifying.
  pub fn fetches(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }

  fn order(&self, order_id: &str) -> Result<Order> {
    self
      .orders
      .lock()
      .unwrap()
      .iter()
      .find(|order| order.id == order_id)
      .cloned()
      .ok_or_else(|| Error::Upstream(format!("order {order_id} not found")))
  }
}

#[async_trait]
impl PaymentProvider for FakePayments {
  async fn create_order(&self, order: &NewOrder) -> Result<Order> {
    let mut orders = self.orders.lock().unwrap();
    let created = Order {
      id: format!("order_{}", orders.len() + 1),
      amount: order.amount,
      currency: order.currency.clone(),
      notes: json::Value::Object(order.notes.clone()),
    };
    orders.push(created.clone());
    self.requests.lock().unwrap().push(order.clone());

    Ok(created)
  }

  async fn fetch_order(&self, order_id: &str) -> Result<Order> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    self.order(order_id)
  }

  async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentRecord> {
    self.fetches.fetch_add(1, Ordering::SeqCst);

    let order_id =
      self.settled.lock().unwrap().get(payment_id).cloned().ok_or_else(
        || Error::Upstream(format!("payment {payment_id} not found")),
      )?;
    let order = self.order(&order_id)?;

    Ok(PaymentRecord {
      id: payment_id.to_string(),
      status: self.status.clone(),
      order_id: Some(order.id),
      amount: order.amount,
      notes: json::Value::Array(Vec::new()),
    })
  }
}

pub struct FakeMailer;

impl FakeMailer {
  pub fn shared() -> Arc<dyn Mailer> {
    Arc::new(Self)
  }
}

#[async_trait]
impl Mailer for FakeMailer {
  async fn send(&self, email: &Email) -> Result<()> {
    debug!("Fake mail to {}: {}", email.to, email.subject);
    Ok(())
  }
}
