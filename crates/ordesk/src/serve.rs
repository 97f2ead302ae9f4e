// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ordesk serve`: storage, event bus, CRM worker, channel backfill, and the
//! HTTP gateway, torn down together on shutdown.

use std::sync::Arc;
use std::time::Duration;

use ordesk_bus::EventBus;
use ordesk_config::model::OrdeskConfig;
use ordesk_core::{ChatTransport, OrdeskError, PluginAdapter, StorageAdapter};
use ordesk_desk::{build_crm, CrmSyncWorker, Desk, LoopbackTransport};
use ordesk_gateway::{start_server, GatewayState, ServerConfig};
use ordesk_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

pub async fn run_serve(config: OrdeskConfig) -> Result<(), OrdeskError> {
    init_tracing(&config.service.log_level);
    info!(service = %config.service.name, "starting ordesk serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let db = storage.database()?.clone();

    let bus = EventBus::default();
    let transport: Arc<dyn ChatTransport> = Arc::new(LoopbackTransport::new());
    info!(transport = transport.name(), "chat transport ready");
    let desk = Desk::new(&config, db, bus.clone(), transport.clone());

    let cancel = shutdown::install_signal_handler();

    let crm = build_crm(&config.crm)?;
    let crm_task = CrmSyncWorker::new(crm.clone()).spawn(&bus, cancel.child_token());

    let backfill_task = if config.chat.backfill_interval_secs > 0 {
        let interval = Duration::from_secs(config.chat.backfill_interval_secs);
        Some(tokio::spawn(desk.backfill().run(interval, cancel.child_token())))
    } else {
        info!("channel backfill disabled");
        None
    };

    let state = GatewayState::new(
        desk,
        Duration::from_secs(config.checkout.duplicate_window_secs),
    );
    let server = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        bearer_token: config.gateway.bearer_token.clone(),
    };
    let served = start_server(server, state, cancel.clone()).await;

    // The gateway may have exited on a bind error; stop the workers either way.
    cancel.cancel();
    if let Err(e) = crm_task.await {
        warn!(error = %e, "crm worker task panicked");
    }
    if let Some(task) = backfill_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "backfill task panicked");
    }

    if let Err(e) = transport.shutdown().await {
        warn!(adapter = transport.name(), error = %e, "adapter shutdown failed");
    }
    if let Err(e) = crm.shutdown().await {
        warn!(adapter = crm.name(), error = %e, "adapter shutdown failed");
    }
    storage.close().await?;

    served?;
    info!("ordesk serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ordesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
