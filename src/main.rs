//! Poster Studio - AI marketing poster generation service
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for HTTP API with rate limiting
//! - Gemini for ad strategy and image synthesis
//! - Razorpay for subscription billing

mod config;
mod crypto;
mod entity;
mod error;
mod plugins;
mod poster;
mod prelude;
mod providers;
mod state;
mod sv;
#[cfg(test)]
mod testing;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  config::Config,
  plugins::{Supervisor, expiry, server},
  prelude::*,
  state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "poster_studio=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  // `poster-studio token <email>` prints a session token for local testing
  let mut args = std::env::args().skip(1);
  if let Some("token") = args.next().as_deref() {
    let email = args.next().context("Usage: poster-studio token <email>")?;
    println!("{}", server::issue_token(&config.secret, &email));
    return Ok(());
  }

  info!("Starting Poster Studio v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(config).await?);

  let handles = Supervisor::new()
    .register(server::Plugin)
    .register(expiry::Plugin)
    .run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
  info!("Shutting down...");

  for handle in handles {
    handle.abort();
  }
  Ok(())
}
