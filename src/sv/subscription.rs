use sea_orm::sea_query::Expr;

use crate::{
  entity::{SubscriptionStatus, subscription},
  prelude::*,
};

pub struct Subscriptions<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Subscriptions<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Downgrades active subscriptions whose period ended before `now`.
  pub async fn expire_lapsed(&self, now: DateTime) -> Result<u64> {
    let res = subscription::Entity::update_many()
      .col_expr(
        subscription::Column::Status,
        Expr::value(SubscriptionStatus::None),
      )
      .col_expr(subscription::Column::UpdatedAt, Expr::value(now))
      .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
      .filter(subscription::Column::CurrentPeriodEnd.lt(now))
      .exec(self.db)
      .await?;

    Ok(res.rows_affected)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::Plan,
    sv::{Credits, Ledger, NewSubscription},
    testing,
  };

  #[tokio::test]
  async fn test_expire_lapsed() {
    let db = testing::setup_db().await;
    let old = testing::user(&db, "old@example.com", 0).await;
    let fresh = testing::user(&db, "fresh@example.com", 0).await;
    let ledger = Credits::new(&db);
    let now = Utc::now().naive_utc();

    for (user, start) in
      [(&old, now - TimeDelta::days(31)), (&fresh, now - TimeDelta::days(1))]
    {
      ledger
        .upsert_subscription(&NewSubscription {
          user_id: user.id,
          plan: Plan::Monthly,
          payment_id: format!("pay_{}", user.id),
          order_id: format!("order_{}", user.id),
          period_start: start,
        })
        .await
        .unwrap();
    }

    let sv = Subscriptions::new(&db);
    assert_eq!(sv.expire_lapsed(now).await.unwrap(), 1);
    assert_eq!(sv.expire_lapsed(now).await.unwrap(), 0);

    let old_sub = subscription::Entity::find_by_id(old.id)
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(old_sub.status, SubscriptionStatus::None);
    assert!(!ledger.balance(old.id).await.unwrap().is_subscribed);
    assert!(ledger.balance(fresh.id).await.unwrap().is_subscribed);
  }
}
