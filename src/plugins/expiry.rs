//! Periodic downgrade of subscriptions whose paid period has ended.

use std::sync::Arc;

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "subscription-expiry"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(app.config.expiry_sweep);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
      interval.tick().await;

      let now = Utc::now().naive_utc();
      match app.sv().subscriptions.expire_lapsed(now).await {
        Ok(0) => debug!("No lapsed subscriptions"),
        Ok(n) => info!("Expired {n} lapsed subscriptions"),
        Err(err) => error!("Subscription sweep failed: {err}"),
      }
    }
  }
}
