mod backend;
mod chunker;
mod config;
mod consumer;
mod context;
mod error;
mod ffmpeg;
mod handler;
mod job;
mod notify;
mod orchestrator;
mod publish;
#[cfg(test)]
mod testutil;
mod transfer;
mod watchdog;

use anyhow::Result;
use clap::Parser;
use config::Config;
use consumer::StreamConsumer;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use task_store::TaskStore;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use watchdog::Watchdog;

const REDIS_MAX_RETRIES: u32 = 5;
const REDIS_INITIAL_BACKOFF_MS: u64 = 500;

#[tokio::main]
async fn main() -> Result<()> {
	// Load environment variables
	dotenvy::dotenv().ok();

	// Parse CLI arguments
	let config = Config::parse();
	config.validate().map_err(|e| anyhow::anyhow!(e))?;

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	info!(
		streams = ?config.streams,
		group = %config.consumer_group,
		consumer = %config.consumer_name,
		"🎯 Starting transcription worker"
	);

	// Task store
	let pool = SqlitePoolOptions::new().max_connections(5).connect(&config.database_url).await?;
	let store = TaskStore::new(pool);
	store.init_schema().await?;
	info!(database_url = %config.database_url, "✅ Task store ready");

	let ctx = context::WorkerContext::new(config, store)?;

	// Stuck-task watchdog
	let watchdog = Watchdog::new(
		ctx.store.clone(),
		ctx.notifier.clone(),
		ctx.config.watchdog_interval,
		ctx.config.stuck_task_timeout,
	);
	tokio::spawn(watchdog.run());

	// Stream consumer with connection retry
	let consumer = connect_with_retry(Arc::clone(&ctx)).await?;

	tokio::select! {
		result = consumer.run() => {
			error!("Consumer loop exited unexpectedly: {:?}", result);
			result.map_err(Into::into)
		}
		_ = wait_for_shutdown_signal() => {
			info!("🛑 Shutdown signal received (SIGTERM/SIGINT)");
			Ok(())
		}
	}
}

async fn connect_with_retry(ctx: Arc<context::WorkerContext>) -> Result<StreamConsumer> {
	for attempt in 1..=REDIS_MAX_RETRIES {
		match StreamConsumer::connect(Arc::clone(&ctx)).await {
			Ok(consumer) => {
				info!(url = %ctx.config.redis_url, "✅ Connected to Redis");
				return Ok(consumer);
			}
			Err(e) => {
				if attempt == REDIS_MAX_RETRIES {
					error!(
						error = %e,
						url = %ctx.config.redis_url,
						"❌ Failed to connect to Redis after {} attempts - service cannot continue",
						REDIS_MAX_RETRIES
					);
					return Err(e.into());
				}

				let backoff = REDIS_INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
				warn!(
					attempt,
					max_retries = REDIS_MAX_RETRIES,
					backoff_ms = backoff,
					error = %e,
					"⚠️ Redis connection failed, retrying..."
				);

				tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
			}
		}
	}

	unreachable!()
}

async fn wait_for_shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
