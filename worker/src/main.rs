//! TokenGate background worker
//!
//! Drains the security event outbox and runs the retention purge until
//! Ctrl-C or SIGTERM, then lets the in-flight batch finish.

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tg_core::repositories::OutboxRepository;
use tg_core::services::{OutboxDispatcher, RetentionJob, TracingEventSink};
use tg_infra::cache::RedisCacheStore;
use tg_infra::database::{
    DatabasePool, MySqlLoginAttemptRepository, MySqlOtpRepository, MySqlOutboxRepository,
    MySqlRefreshTokenRepository,
};
use tg_shared::AppConfig;

mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.logging)?;

    info!(environment = %config.environment, "Starting TokenGate worker");

    let database = DatabasePool::new(&config.database)
        .await
        .context("failed to connect to MySQL")?;
    if config.database.run_migrations {
        database
            .run_migrations()
            .await
            .context("failed to apply migrations")?;
    }
    info!(pool = %database.statistics(), "MySQL ready");

    // Jobs only touch MySQL, but the engine cannot run without the shared store
    let cache = RedisCacheStore::connect(&config.cache)
        .await
        .context("failed to connect to Redis")?;
    cache.ping().await.context("Redis ping failed")?;

    let pool = database.pool().clone();
    let outbox: Arc<dyn OutboxRepository> = Arc::new(MySqlOutboxRepository::new(pool.clone()));

    let dispatcher = Arc::new(OutboxDispatcher::new(
        outbox.clone(),
        TracingEventSink,
        config.outbox.clone(),
    ));
    let retention = Arc::new(RetentionJob::new(
        Arc::new(MySqlRefreshTokenRepository::new(pool.clone())),
        Arc::new(MySqlOtpRepository::new(pool.clone())),
        Arc::new(MySqlLoginAttemptRepository::new(pool)),
        outbox,
        config.retention.clone(),
    ));

    let cancel = CancellationToken::new();
    let dispatcher_handle = dispatcher.spawn(cancel.clone());
    let retention_handle = retention.spawn(cancel.clone());

    shutdown_signal().await;
    info!("Shutdown requested, waiting for background jobs");
    cancel.cancel();

    let (dispatcher_result, retention_result) = tokio::join!(dispatcher_handle, retention_handle);
    if let Err(e) = dispatcher_result {
        error!(error = %e, "Outbox dispatcher task failed");
    }
    if let Err(e) = retention_result {
        error!(error = %e, "Retention task failed");
    }

    database.close().await;
    info!("TokenGate worker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
