//! Session tokens issued by the identity provider:
//! `<email>.<hex HMAC-SHA256(secret, email)>`.

use std::sync::Arc;

use axum::{
  extract::FromRequestParts,
  http::{header::AUTHORIZATION, request::Parts},
};

use crate::{crypto, entity::user, prelude::*, state::AppState};

pub fn issue_token(secret: &str, email: &str) -> String {
  format!("{email}.{}", crypto::sign_hex(secret, email.as_bytes()))
}

/// Returns the subject of a valid token.
pub fn verify_token<'t>(secret: &str, token: &'t str) -> Option<&'t str> {
  let (email, signature) = token.trim().rsplit_once('.')?;
  (!email.is_empty() && crypto::verify_hex(secret, email.as_bytes(), signature))
    .then_some(email)
}

/// The authenticated caller. Unknown subjects are registered on first
/// contact with the signup credit grant.
pub struct AuthUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AuthUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let token = parts
      .headers
      .get(AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .ok_or(Error::Unauthorized)?;

    let email =
      verify_token(&app.config.secret, token).ok_or(Error::Unauthorized)?;

    let user =
      app.sv().user.get_or_create(email, app.config.signup_credits).await?;
    Ok(Self(user))
  }
}
