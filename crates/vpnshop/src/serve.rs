// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vpnshop serve` implementation.
//!
//! Wires storage, the master node client, payment backends, the order
//! coordinator and the Telegram channel, then long-polls until SIGINT or
//! SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use vpnshop_config::VpnshopConfig;
use vpnshop_coordinator::{
    NodeDirectory, OrderCoordinator, PaymentFlows, PollSettings, PollSupervisor, SupportDesk,
    install_signal_handler,
};
use vpnshop_core::{
    HealthStatus, InvoiceGateway, Notifier, Orchestrator, PluginAdapter, Repository, VpnshopError,
};
use vpnshop_master::MasterNode;
use vpnshop_payments::{CryptoBotClient, PaymentToggles};
use vpnshop_storage::SqliteStorage;
use vpnshop_telegram::{BotState, TelegramChannel};

/// How long in-flight poll loops get to stop after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Runs the bot until a shutdown signal arrives.
pub async fn run_serve(config: VpnshopConfig) -> Result<(), VpnshopError> {
    init_tracing(&config.bot.log_level);

    info!("starting vpnshop serve");

    let repo: Arc<dyn Repository> = Arc::new(SqliteStorage::new(config.storage.clone()));
    repo.initialize().await?;

    let master = Arc::new(MasterNode::new(&config.master)?);
    match master.health_check().await {
        Ok(HealthStatus::Healthy) => info!(url = %config.master.base_url, "master node reachable"),
        Ok(status) => warn!(url = %config.master.base_url, ?status, "master node not healthy"),
        Err(e) => warn!(url = %config.master.base_url, error = %e, "master node health check failed"),
    }
    let orchestrator: Arc<dyn Orchestrator> = master;

    let gateway: Option<Arc<dyn InvoiceGateway>> = match CryptoBotClient::from_config(&config.payments)? {
        Some(client) => Some(Arc::new(client)),
        None => None,
    };
    let toggles = PaymentToggles::from_config(&config.payments);
    info!(
        sbp = toggles.sbp,
        stars = toggles.stars,
        cryptobot = toggles.cryptobot && gateway.is_some(),
        "payment methods configured"
    );

    let cancel = install_signal_handler();
    let supervisor = PollSupervisor::new(cancel.child_token());

    let channel = TelegramChannel::new(config.telegram.clone())?;
    let telegram_notifier = channel.notifier(Arc::clone(&repo));
    let notifier: Arc<dyn Notifier> = telegram_notifier.clone();

    let coordinator = Arc::new(OrderCoordinator::new(
        Arc::clone(&repo),
        Arc::clone(&orchestrator),
        Arc::clone(&notifier),
        supervisor,
        PollSettings::from_config(&config.master),
    ));
    let flows = PaymentFlows::new(Arc::clone(&coordinator), gateway, toggles);
    let support = SupportDesk::new(
        Arc::clone(&repo),
        Arc::clone(&notifier),
        config.support.admin_ids.clone(),
    );
    let nodes = NodeDirectory::new(Arc::clone(&repo), orchestrator);

    let state = Arc::new(BotState::new(
        Arc::clone(&repo),
        Arc::clone(&coordinator),
        flows,
        support,
        nodes,
        config.bot.default_language.clone(),
    ));

    channel.run(state, telegram_notifier, cancel.clone()).await;

    info!("dispatcher stopped, shutting down");
    cancel.cancel();
    coordinator.supervisor().shutdown(SHUTDOWN_GRACE).await;

    if let Err(e) = repo.close().await {
        error!(error = %e, "failed to close storage");
    }

    info!("vpnshop serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vpnshop={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
