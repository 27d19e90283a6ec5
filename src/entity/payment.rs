//! Processed provider payments, keyed by payment id so that a payment
//! confirmed twice (verify call and webhook) is only granted once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Plan, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub payment_id: String,
  pub user_id: i64,
  pub order_id: String,
  pub plan: Plan,
  /// `verify` or `webhook`
  pub source: String,
  pub granted_credits: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id"
  )]
  User,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
