use crate::backend::BackendClient;
use crate::config::Config;
use crate::error::WorkerError;
use crate::notify::Notifier;
use std::sync::Arc;
use task_store::TaskStore;
use tokio::sync::Semaphore;

/// Shared dependencies, constructed once at startup and injected into every
/// component (no global connection state).
pub struct WorkerContext {
	pub config: Config,
	pub http: reqwest::Client,
	pub store: TaskStore,
	pub backend: BackendClient,
	pub notifier: Notifier,
	/// Global throttle on concurrent backend transcription calls, shared
	/// across jobs.
	pub transcribe_permits: Semaphore,
}

impl WorkerContext {
	/// # Errors
	/// Returns an error when the HTTP client cannot be built.
	pub fn new(config: Config, store: TaskStore) -> Result<Arc<Self>, WorkerError> {
		let http = reqwest::Client::builder()
			.timeout(config.request_timeout)
			.build()
			.map_err(|e| WorkerError::Generic(format!("Failed to build HTTP client: {e}")))?;

		let backend = BackendClient::new(
			http.clone(),
			config.openai_api_base.clone(),
			config.openai_api_key.clone(),
			config.whisper_model.clone(),
		);
		let notifier = Notifier::new(http.clone(), config.slack_webhook());
		let transcribe_permits = Semaphore::new(config.max_concurrent_transcriptions);

		Ok(Arc::new(Self {
			config,
			http,
			store,
			backend,
			notifier,
			transcribe_permits,
		}))
	}
}
