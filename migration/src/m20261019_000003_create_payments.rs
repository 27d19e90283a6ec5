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
          .table(Payments::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Payments::PaymentId)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(Payments::UserId).big_integer().not_null())
          .col(ColumnDef::new(Payments::OrderId).string().not_null())
          .col(ColumnDef::new(Payments::Plan).string().not_null())
          .col(ColumnDef::new(Payments::Source).string().not_null())
          .col(
            ColumnDef::new(Payments::GrantedCredits)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Payments::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_user")
              .from(Payments::Table, Payments::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_payments_user")
          .table(Payments::Table)
          .col(Payments::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Payments::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Payments {
  Table,
  PaymentId,
  UserId,
  OrderId,
  Plan,
  Source,
  GrantedCredits,
  CreatedAt,
}
