//! [`ReloadManager`]: load once, then republish the config on every valid edit.

use std::path::PathBuf;

use novachat_common::ConfigError;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::schema::NovachatConfig;
use crate::toml_loader;
use crate::validation;
use crate::watcher::ConfigWatcher;

/// Publishes validated configs on a [`watch`] channel as the file changes.
///
/// Receivers only wake when the reloaded config differs from the current one.
pub struct ReloadManager {
    pub(crate) config_path: PathBuf,
}

impl ReloadManager {
    /// Load the config (creating a default file if missing) and start watching it.
    ///
    /// The initial config must validate. Later edits that fail to parse or
    /// validate are logged and the previous config stays published.
    pub async fn start(
        config_path: PathBuf,
    ) -> Result<(NovachatConfig, watch::Receiver<NovachatConfig>), ConfigError> {
        let initial = crate::load_config_from(&config_path)?;
        let watcher = ConfigWatcher::new(config_path.clone())?;

        let (config_tx, config_rx) = watch::channel(initial.clone());
        let manager = ReloadManager { config_path };
        tokio::spawn(manager.run(watcher, config_tx));

        Ok((initial, config_rx))
    }

    async fn run(self, watcher: ConfigWatcher, config_tx: watch::Sender<NovachatConfig>) {
        let (change_tx, mut change_rx) = broadcast::channel::<()>(16);
        let watch_task = tokio::spawn(async move {
            if let Err(e) = watcher.watch(change_tx).await {
                error!(error = %e, "config watcher stopped");
            }
        });

        loop {
            match change_rx.recv().await {
                Ok(()) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "coalescing config events"),
                Err(RecvError::Closed) => break,
            }

            match self.reload_config() {
                Ok(config) => {
                    let published = config_tx.send_if_modified(|current| {
                        if *current == config {
                            return false;
                        }
                        *current = config;
                        true
                    });
                    if published {
                        info!(path = %self.config_path.display(), "config reloaded");
                    } else {
                        debug!("config file touched without changes");
                    }
                }
                Err(e) => warn!(error = %e, "config reload failed, keeping previous config"),
            }

            if config_tx.is_closed() {
                debug!("no config subscribers left");
                break;
            }
        }

        watch_task.abort();
    }

    /// Read and validate the file again.
    pub(crate) fn reload_config(&self) -> Result<NovachatConfig, ConfigError> {
        let config = toml_loader::load_from_path(&self.config_path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
