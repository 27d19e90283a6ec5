pub mod expiry;
pub mod server;

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::state::AppState;

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// A long-running service. `start` is expected to run forever; returning or
/// failing gets it restarted by the [`Supervisor`].
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct Supervisor {
  plugins: Vec<Arc<dyn Plugin>>,
}

impl Supervisor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Spawns every plugin under a restart loop.
  pub fn run(self, app: Arc<AppState>) -> Vec<JoinHandle<()>> {
    self
      .plugins
      .into_iter()
      .map(|plugin| tokio::spawn(supervise(plugin, app.clone())))
      .collect()
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>) {
  let name = plugin.name();
  info!("Service `{name}` initialized");

  loop {
    let task = {
      let (app, plugin) = (app.clone(), plugin.clone());
      tokio::spawn(async move { plugin.start(app).await })
    };

    match task.await {
      Ok(Ok(())) => warn!("Service `{name}` stopped unexpectedly"),
      Ok(Err(err)) => error!("Service `{name}` crashed: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!("Service `{name}` shut down");
        break;
      }
      Err(_) => error!("Service `{name}` panicked"),
    }

    sleep(RESTART_DELAY).await;
    info!("Restarting service `{name}`...");
  }
}
