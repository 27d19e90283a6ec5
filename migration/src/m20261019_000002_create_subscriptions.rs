use sea_orm_migration::prelude::*;

use super::m20261019_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Subscriptions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Subscriptions::UserId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Subscriptions::Status)
              .string()
              .not_null()
              .default("none"),
          )
          .col(ColumnDef::new(Subscriptions::Plan).string().not_null())
          .col(
            ColumnDef::new(Subscriptions::CurrentPeriodStart)
              .date_time()
              .not_null(),
          )
          .col(
            ColumnDef::new(Subscriptions::CurrentPeriodEnd)
              .date_time()
              .not_null(),
          )
          .col(
            ColumnDef::new(Subscriptions::ProviderPaymentId)
              .string()
              .not_null(),
          )
          .col(
            ColumnDef::new(Subscriptions::ProviderOrderId).string().not_null(),
          )
          .col(ColumnDef::new(Subscriptions::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_subscriptions_user")
              .from(Subscriptions::Table, Subscriptions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_subscriptions_period_end")
          .table(Subscriptions::Table)
          .col(Subscriptions::CurrentPeriodEnd)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Subscriptions {
  Table,
  UserId,
  Status,
  Plan,
  CurrentPeriodStart,
  CurrentPeriodEnd,
  ProviderPaymentId,
  ProviderOrderId,
  UpdatedAt,
}
