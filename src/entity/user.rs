use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{payment, subscription};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  #[sea_orm(unique)]
  pub email: String,
  /// Never negative, see `sv::Credits::decrement`
  pub credits: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_one = "subscription::Entity")]
  Subscription,
  #[sea_orm(has_many = "payment::Entity")]
  Payments,
}

impl Related<subscription::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Subscription.def()
  }
}

impl Related<payment::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Payments.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
