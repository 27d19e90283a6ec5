use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use super::user;

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
  #[default]
  #[sea_orm(string_value = "none")]
  None,
  #[sea_orm(string_value = "active")]
  Active,
}

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Plan {
  #[sea_orm(string_value = "monthly")]
  Monthly,
  #[sea_orm(string_value = "yearly")]
  Yearly,
}

impl Plan {
  pub fn period_days(self) -> i64 {
    match self {
      Plan::Monthly => 30,
      Plan::Yearly => 365,
    }
  }

  /// Bulk credit allowance granted on activation.
  pub fn credit_grant(self) -> i32 {
    match self {
      Plan::Monthly => 45,
      Plan::Yearly => 180,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Plan::Monthly => "monthly",
      Plan::Yearly => "yearly",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "monthly" => Some(Plan::Monthly),
      "yearly" => Some(Plan::Yearly),
      _ => None,
    }
  }
}

/// Accepts plan names in any case, like [`Plan::parse`].
impl<'de> Deserialize<'de> for Plan {
  fn deserialize<D>(de: D) -> std::result::Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(de)?;
    Plan::parse(&raw).ok_or_else(|| {
      serde::de::Error::unknown_variant(&raw, &["monthly", "yearly"])
    })
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  pub status: SubscriptionStatus,
  pub plan: Plan,
  pub current_period_start: DateTime,
  pub current_period_end: DateTime,
  pub provider_payment_id: String,
  pub provider_order_id: String,
  pub updated_at: DateTime,
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
