use migration::{Migrator, MigratorTrait};
use reqwest::Client;

use crate::{
  config::Config,
  prelude::*,
  providers::{
    Gemini, HttpMailer, ImageProvider, Mailer, PaymentProvider, Razorpay,
    StrategyProvider,
  },
  sv,
};

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub credits: sv::Credits<'a>,
  pub subscriptions: sv::Subscriptions<'a>,
  pub billing: sv::Billing<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub strategist: Arc<dyn StrategyProvider>,
  pub images: Arc<dyn ImageProvider>,
  pub payments: Arc<dyn PaymentProvider>,
  pub mailer: Arc<dyn Mailer>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let client = Client::builder()
      .user_agent(concat!("poster-studio/", env!("CARGO_PKG_VERSION")))
      .build()?;

    let gemini = Arc::new(Gemini::new(client.clone(), config.gemini.clone()));
    let payments = Razorpay::new(client.clone(), config.razorpay.clone());
    let mailer = HttpMailer::new(client, config.mail.clone());

    Ok(Self {
      db,
      strategist: gemini.clone(),
      images: gemini,
      payments: Arc::new(payments),
      mailer: Arc::new(mailer),
      config,
    })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      credits: sv::Credits::new(&self.db),
      subscriptions: sv::Subscriptions::new(&self.db),
      billing: sv::Billing::new(
        &self.db,
        self.payments.as_ref(),
        &self.mailer,
        &self.config,
      ),
    }
  }
}
