//! Composition root: builds adapters from configuration and runs the service.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapter::outbound::epay::EpayClient;
use crate::adapter::outbound::notifier::LogNotifier;
#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::telegram::{
    notifier::spawn_command_listener, TelegramConfig, TelegramControl, TelegramNotifier,
};
use crate::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteLedger};
use crate::application::polling::{JobRegistry, PollerDeps};
use crate::application::retention::spawn_sweeper;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::polling::PollingControl;
use crate::port::outbound::gateway::PaymentGateway;
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::notifier::Notifier;

/// Open the SQLite ledger and apply pending migrations.
pub fn open_ledger(config: &Config) -> Result<Arc<SqliteLedger>> {
    let pool = create_pool(&config.database.path, config.database.max_connections)?;
    run_migrations(&pool)?;
    info!(path = %config.database.path, "Ledger opened");
    Ok(Arc::new(SqliteLedger::new(pool)))
}

/// Every long-lived component of a running service.
pub struct Runtime {
    config: Config,
    ledger: Arc<SqliteLedger>,
    #[cfg_attr(not(feature = "telegram"), allow(dead_code))]
    gateway: Arc<EpayClient>,
    registry: Arc<JobRegistry>,
    #[cfg(feature = "telegram")]
    bot: Option<teloxide::Bot>,
}

impl Runtime {
    /// Wire adapters together. Nothing is spawned yet.
    pub fn build(config: Config) -> Result<Self> {
        let ledger = open_ledger(&config)?;
        let gateway = Arc::new(EpayClient::new(&config.gateway)?);

        #[cfg(feature = "telegram")]
        let (notifier, bot) = build_notifier(&config);
        #[cfg(not(feature = "telegram"))]
        let notifier = build_notifier(&config);

        info!(notifier = notifier.name(), "Notifier selected");

        let registry = Arc::new(JobRegistry::new(
            PollerDeps {
                gateway: Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
                ledger: Arc::clone(&ledger) as Arc<dyn Ledger>,
                notifier,
            },
            config.polling.to_polling_config(),
        ));

        Ok(Self {
            config,
            ledger,
            gateway,
            registry,
            #[cfg(feature = "telegram")]
            bot,
        })
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<SqliteLedger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// Start polling every active subscriber and serve until `shutdown` resolves.
    ///
    /// On return every worker has been joined.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let started = self.registry.reconcile().await?;
        info!(workers = started, "Polling started");

        let (sweeper_tx, sweeper_rx) = watch::channel(false);
        let sweeper = if self.config.retention.enabled {
            let ledger: Arc<dyn Ledger> = self.ledger();
            Some(spawn_sweeper(ledger, self.config.retention.policy(), sweeper_rx))
        } else {
            None
        };

        let listener = self.spawn_listener();

        shutdown.await;
        info!("Shutdown requested");

        if let Some(listener) = listener {
            listener.abort();
        }
        self.registry.stop_all().await;
        let _ = sweeper_tx.send(true);
        if let Some(sweeper) = sweeper {
            if let Err(e) = sweeper.await {
                warn!(error = %e, "Retention sweeper ended abnormally");
            }
        }

        info!("All workers stopped");
        Ok(())
    }

    #[cfg(feature = "telegram")]
    fn spawn_listener(&self) -> Option<JoinHandle<()>> {
        let bot = self.bot.clone()?;
        let control = TelegramControl::new(
            Arc::clone(&self.registry) as Arc<dyn PollingControl>,
            Arc::clone(&self.ledger) as Arc<dyn Ledger>,
            Arc::clone(&self.gateway) as Arc<dyn PaymentGateway>,
        );
        Some(spawn_command_listener(bot, control))
    }

    #[cfg(not(feature = "telegram"))]
    fn spawn_listener(&self) -> Option<JoinHandle<()>> {
        None
    }
}

/// Build the runtime and serve until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let runtime = Runtime::build(config)?;
    runtime
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
            }
        })
        .await
}

#[cfg(feature = "telegram")]
fn build_notifier(config: &Config) -> (Arc<dyn Notifier>, Option<teloxide::Bot>) {
    if !config.telegram.enabled {
        return (Arc::new(LogNotifier), None);
    }
    match TelegramConfig::from_env(config.telegram.pin_settlements) {
        Some(tg_config) => {
            let notifier = TelegramNotifier::new(&tg_config);
            let bot = notifier.bot();
            (Arc::new(notifier), Some(bot))
        }
        None => {
            warn!("Telegram enabled but TELEGRAM_BOT_TOKEN not set, falling back to log notifier");
            (Arc::new(LogNotifier), None)
        }
    }
}

#[cfg(not(feature = "telegram"))]
fn build_notifier(config: &Config) -> Arc<dyn Notifier> {
    if config.telegram.enabled {
        warn!("Telegram enabled in config but the binary was built without the telegram feature");
    }
    Arc::new(LogNotifier)
}
