use serde::Serialize;

use super::{
  AdStrategy, Analyzer, Brief, GenerationRequest, Synthesizer, fallback,
};
use crate::{
  prelude::*,
  providers::{ImageProvider, StrategyProvider},
  sv::Ledger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PosterSource {
  Ai,
  Fallback,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poster {
  pub poster_url: String,
  pub source: PosterSource,
  pub strategy: AdStrategy,
}

/// Request orchestration:
/// validate -> gate -> analyze -> synthesize (-> fallback) -> consume credit.
///
/// Validation and gating failures happen before any model call. Credits are
/// consumed only for non-subscribed users and only once a poster exists.
pub struct Generator<'a> {
  ledger: &'a dyn Ledger,
  strategist: &'a dyn StrategyProvider,
  images: &'a dyn ImageProvider,
  fallback: fn(&Brief) -> Result<String>,
}

impl<'a> Generator<'a> {
  pub fn new(
    ledger: &'a dyn Ledger,
    strategist: &'a dyn StrategyProvider,
    images: &'a dyn ImageProvider,
  ) -> Self {
    Self { ledger, strategist, images, fallback: fallback::render }
  }

  /// Replaces the local poster renderer used when image synthesis fails.
  #[cfg(test)]
  pub fn with_fallback(self, fallback: fn(&Brief) -> Result<String>) -> Self {
    Self { fallback, ..self }
  }

  pub async fn generate(
    &self,
    user_id: i64,
    req: GenerationRequest,
  ) -> Result<Poster> {
    let brief = req.validate()?;

    let balance = self.ledger.balance(user_id).await?;
    if !balance.can_generate() {
      info!("User {user_id} is out of credits, upgrade required");
      return Err(Error::CreditsExhausted);
    }

    let strategy = match Analyzer::new(self.strategist)
      .analyze(
        &brief.brand_name,
        &brief.description,
        &brief.industry,
        &brief.language,
      )
      .await
    {
      Ok(strategy) => strategy,
      Err(err @ Error::Config(_)) => return Err(err),
      Err(err) => {
        warn!("Strategy analysis failed for user {user_id}: {err}");
        AdStrategy::fallback(&brief.brand_name, &brief.description)
      }
    };

    let (poster_url, source) =
      match Synthesizer::new(self.images).synthesize(&brief, &strategy).await {
        Ok(url) => (url, PosterSource::Ai),
        Err(err @ Error::Config(_)) => return Err(err),
        Err(err) => {
          warn!("Image synthesis failed for user {user_id}: {err}");
          match (self.fallback)(&brief) {
            Ok(url) => (url, PosterSource::Fallback),
            Err(fallback_err) => {
              error!("Fallback poster failed: {fallback_err}");
              return Err(Error::GenerationFailed { detail: err.to_string() });
            }
          }
        }
      };

    if !balance.is_subscribed && !self.ledger.decrement(user_id).await? {
      // another request consumed the last credit after gating
      warn!("User {user_id} had no credit left to consume");
    }

    info!(
      "Generated poster for user {user_id} ({:?}, update: {})",
      source,
      brief.is_update()
    );
    Ok(Poster { poster_url, source, strategy })
  }
}

#[cfg(test)]
mod tests {
  use base64::{Engine, engine::general_purpose::STANDARD};

  use super::*;
  use crate::{
    poster::request::PosterType,
    sv::{Balance, Credits, NewSubscription},
    entity::Plan,
    providers::{GenerateResponse, ImageRequest},
    testing::{self, FakeImages, FakeStrategist, PNG_B64},
  };

  fn aura() -> GenerationRequest {
    GenerationRequest {
      brand_name: "Aura".into(),
      description: "Luxury skincare".into(),
      industry: Some("Beauty".into()),
      language: Some("English".into()),
      product_images: vec![PNG_B64.into()],
      ..Default::default()
    }
  }

  async fn subscribe(db: &DatabaseConnection, user_id: i64) {
    Credits::new(db)
      .upsert_subscription(&NewSubscription {
        user_id,
        plan: Plan::Monthly,
        payment_id: "pay_1".into(),
        order_id: "order_1".into(),
        period_start: Utc::now().naive_utc(),
      })
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_success_consumes_one_credit() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 2).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::image("image/png", "QUJD");

    let poster = Generator::new(&ledger, &strategist, &images)
      .generate(user.id, aura())
      .await
      .unwrap();

    assert_eq!(poster.source, PosterSource::Ai);
    assert_eq!(poster.poster_url, "data:image/png;base64,QUJD");
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 1);
  }

  #[tokio::test]
  async fn test_out_of_credits_makes_no_calls() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 0).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::unreachable();

    let result = Generator::new(&ledger, &strategist, &images)
      .generate(user.id, aura())
      .await;

    assert!(matches!(result, Err(Error::CreditsExhausted)));
    assert_eq!(strategist.calls(), 0);
    assert_eq!(images.calls(), 0);
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 0);
  }

  #[tokio::test]
  async fn test_subscribed_bypasses_ledger() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 0).await;
    subscribe(&db, user.id).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::image("image/png", "QUJD");

    let poster = Generator::new(&ledger, &strategist, &images)
      .generate(user.id, aura())
      .await
      .unwrap();

    assert_eq!(poster.source, PosterSource::Ai);
    assert_eq!(ledger.balance(user.id).await.unwrap(), Balance {
      credits: 0,
      is_subscribed: true
    });
  }

  #[tokio::test]
  async fn test_outage_falls_back_to_vector_poster() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 2).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::unreachable();

    let poster = Generator::new(&ledger, &strategist, &images)
      .generate(user.id, aura())
      .await
      .unwrap();

    assert_eq!(strategist.calls(), 1);
    assert_eq!(images.calls(), 1);
    assert_eq!(poster.source, PosterSource::Fallback);
    assert_eq!(poster.strategy.headline, "Aura");

    let payload = poster
      .poster_url
      .strip_prefix("data:image/svg+xml;base64,")
      .expect("svg data url");
    let svg = String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap();
    assert!(svg.contains(">Aura<"));
    assert!(svg.contains("Luxury skincare"));

    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 1);
  }

  #[tokio::test]
  async fn test_image_without_data_falls_back() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 1).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::empty();

    let poster = Generator::new(&ledger, &strategist, &images)
      .generate(user.id, aura())
      .await
      .unwrap();

    assert_eq!(poster.source, PosterSource::Fallback);
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 0);
  }

  #[tokio::test]
  async fn test_failed_fallback_keeps_image_error() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 2).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::unreachable();

    let result = Generator::new(&ledger, &strategist, &images)
      .with_fallback(|_: &Brief| Err(Error::Internal("svg writer".into())))
      .generate(user.id, aura())
      .await;

    assert!(matches!(
      result,
      Err(Error::GenerationFailed { detail }) if detail.contains("connection refused")
    ));
    assert_eq!(images.calls(), 1);
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 2);
  }

  #[tokio::test]
  async fn test_concurrent_requests_never_overdraw() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 1).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::image("image/png", "QUJD");
    let generator = Generator::new(&ledger, &strategist, &images);

    let (first, second) = tokio::join!(
      generator.generate(user.id, aura()),
      generator.generate(user.id, aura()),
    );

    let served = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert!(served >= 1);
    for result in [first, second] {
      assert!(matches!(result, Ok(_) | Err(Error::CreditsExhausted)));
    }
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 0);
  }

  /// Spends the user's credit while the image is being rendered, as a
  /// concurrent request would.
  struct Spending<'a> {
    ledger: &'a Credits<'a>,
    user_id: i64,
    inner: FakeImages,
  }

  #[async_trait]
  impl ImageProvider for Spending<'_> {
    async fn render(&self, request: &ImageRequest) -> Result<GenerateResponse> {
      assert!(self.ledger.decrement(self.user_id).await?);
      self.inner.render(request).await
    }
  }

  #[tokio::test]
  async fn test_last_credit_spent_mid_request() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 1).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = Spending {
      ledger: &ledger,
      user_id: user.id,
      inner: FakeImages::image("image/png", "QUJD"),
    };

    let poster = Generator::new(&ledger, &strategist, &images)
      .generate(user.id, aura())
      .await
      .unwrap();

    assert_eq!(poster.source, PosterSource::Ai);
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 0);
  }

  #[tokio::test]
  async fn test_festival_without_name_rejected_before_calls() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 2).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::unreachable();

    let req = GenerationRequest { poster_type: PosterType::Festival, ..aura() };
    let result =
      Generator::new(&ledger, &strategist, &images).generate(user.id, req).await;

    assert!(
      matches!(result, Err(Error::Validation(msg)) if msg.contains("Festival name"))
    );
    assert_eq!(strategist.calls(), 0);
    assert_eq!(images.calls(), 0);
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 2);
  }

  #[tokio::test]
  async fn test_missing_key_is_not_absorbed() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "a@example.com", 2).await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unconfigured();
    let images = FakeImages::unreachable();

    let result = Generator::new(&ledger, &strategist, &images)
      .generate(user.id, aura())
      .await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(images.calls(), 0);
    assert_eq!(ledger.balance(user.id).await.unwrap().credits, 2);
  }

  #[tokio::test]
  async fn test_unknown_user() {
    let db = testing::setup_db().await;
    let ledger = Credits::new(&db);
    let strategist = FakeStrategist::unreachable();
    let images = FakeImages::unreachable();

    let result =
      Generator::new(&ledger, &strategist, &images).generate(42, aura()).await;
    assert!(matches!(result, Err(Error::UserNotFound)));
  }
}
