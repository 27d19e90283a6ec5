use sea_orm::sea_query::OnConflict;

use crate::{entity::user, prelude::*};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Auto-registration on first authenticated contact. New users receive
  /// `signup_credits`; existing users are returned untouched.
  pub async fn get_or_create(
    &self,
    email: &str,
    signup_credits: i32,
  ) -> Result<user::Model> {
    if let Some(user) = self.by_email(email).await? {
      return Ok(user);
    }

    let now = Utc::now().naive_utc();
    let inserted = user::Entity::insert(user::ActiveModel {
      email: Set(email.to_string()),
      credits: Set(signup_credits.max(0)),
      created_at: Set(now),
      ..Default::default()
    })
    // concurrent first requests for the same email
    .on_conflict(OnConflict::column(user::Column::Email).do_nothing().to_owned())
    .exec_without_returning(self.db)
    .await?;

    if inserted > 0 {
      info!("Registered user {email} with {signup_credits} credits");
    }

    self.by_email(email).await?.ok_or(Error::UserNotFound)
  }

  pub async fn by_email(&self, email: &str) -> Result<Option<user::Model>> {
    let user = user::Entity::find()
      .filter(user::Column::Email.eq(email))
      .one(self.db)
      .await?;
    Ok(user)
  }
}
