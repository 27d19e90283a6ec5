//! Credit ledger: per-user balance plus subscription status.

use sea_orm::sea_query::{Expr, OnConflict};
use serde::Serialize;

use crate::{
  entity::{Plan, SubscriptionStatus, subscription, user},
  prelude::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
  pub credits: i32,
  pub is_subscribed: bool,
}

impl Balance {
  /// Subscribed users bypass the ledger entirely.
  pub fn can_generate(&self) -> bool {
    self.is_subscribed || self.credits > 0
  }
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
  pub user_id: i64,
  pub plan: Plan,
  pub payment_id: String,
  pub order_id: String,
  pub period_start: DateTime,
}

impl NewSubscription {
  pub fn period_end(&self) -> DateTime {
    self.period_start + TimeDelta::days(self.plan.period_days())
  }
}

#[async_trait]
pub trait Ledger: Send + Sync {
  async fn balance(&self, user_id: i64) -> Result<Balance>;

  /// Consumes one credit if the balance is positive. Returns whether a
  /// credit was consumed.
  async fn decrement(&self, user_id: i64) -> Result<bool>;

  async fn increment(&self, user_id: i64, amount: i32) -> Result<()>;

  /// Insert or overwrite the user's single subscription row as active.
  async fn upsert_subscription(
    &self,
    sub: &NewSubscription,
  ) -> Result<subscription::Model>;
}

/// SeaORM-backed ledger. Generic over the connection so billing can run it
/// inside a transaction.
pub struct Credits<'a, C = DatabaseConnection> {
  db: &'a C,
}

impl<'a, C: ConnectionTrait> Credits<'a, C> {
  pub fn new(db: &'a C) -> Self {
    Self { db }
  }
}

#[async_trait]
impl<C> Ledger for Credits<'_, C>
where
  C: ConnectionTrait + Send + Sync,
{
  async fn balance(&self, user_id: i64) -> Result<Balance> {
    let user = user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;

    let is_subscribed = subscription::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .is_some_and(|sub| sub.status == SubscriptionStatus::Active);

    Ok(Balance { credits: user.credits, is_subscribed })
  }

  async fn decrement(&self, user_id: i64) -> Result<bool> {
    let res = user::Entity::update_many()
      .col_expr(user::Column::Credits, Expr::col(user::Column::Credits).sub(1))
      .filter(user::Column::Id.eq(user_id))
      .filter(user::Column::Credits.gt(0))
      .exec(self.db)
      .await?;

    Ok(res.rows_affected == 1)
  }

  async fn increment(&self, user_id: i64, amount: i32) -> Result<()> {
    let res = user::Entity::update_many()
      .col_expr(
        user::Column::Credits,
        Expr::col(user::Column::Credits).add(amount),
      )
      .filter(user::Column::Id.eq(user_id))
      .exec(self.db)
      .await?;

    if res.rows_affected == 0 {
      return Err(Error::UserNotFound);
    }
    Ok(())
  }

  async fn upsert_subscription(
    &self,
    sub: &NewSubscription,
  ) -> Result<subscription::Model> {
    let now = Utc::now().naive_utc();

    subscription::Entity::insert(subscription::ActiveModel {
      user_id: Set(sub.user_id),
      status: Set(SubscriptionStatus::Active),
      plan: Set(sub.plan),
      current_period_start: Set(sub.period_start),
      current_period_end: Set(sub.period_end()),
      provider_payment_id: Set(sub.payment_id.clone()),
      provider_order_id: Set(sub.order_id.clone()),
      updated_at: Set(now),
    })
    .on_conflict(
      OnConflict::column(subscription::Column::UserId)
        .update_columns([
          subscription::Column::Status,
          subscription::Column::Plan,
          subscription::Column::CurrentPeriodStart,
          subscription::Column::CurrentPeriodEnd,
          subscription::Column::ProviderPaymentId,
          subscription::Column::ProviderOrderId,
          subscription::Column::UpdatedAt,
        ])
        .to_owned(),
    )
    .exec_without_returning(self.db)
    .await?;

    subscription::Entity::find_by_id(sub.user_id)
      .one(self.db)
      .await?
      .ok_or_else(|| Error::Internal("subscription upsert lost".into()))
  }
}
