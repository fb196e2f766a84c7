use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

/// Best-effort notification channel for stuck tasks and handler failures.
/// Posts formatted messages to a Slack-style webhook; delivery failures are
/// logged and never retried or escalated. Log-only when unconfigured.
#[derive(Clone)]
pub struct Notifier {
	http: reqwest::Client,
	webhook_url: Option<String>,
}

impl Notifier {
	#[must_use]
	pub fn new(http: reqwest::Client, webhook_url: Option<String>) -> Self {
		Self { http, webhook_url }
	}

	pub async fn task_failure(&self, task_uuid: &str, stream: &str, error: &str) {
		let text = format!(
			"🚨 *Transcription Task Failed*\n*Task UUID:* `{task_uuid}`\n*Stream:* `{stream}`\n*Error:* {error}"
		);
		self.send(&text).await;
	}

	pub async fn stuck_task(&self, task_uuid: &str, started_at: Option<DateTime<Utc>>) {
		let started = started_at.map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339());
		let text = format!(
			"🚨 *Stuck Transcription Task Detected*\n*Task UUID:* `{task_uuid}`\n*Started At:* `{started}`\nTask has been running past the stuck-task window and was marked as Failed."
		);
		self.send(&text).await;
	}

	async fn send(&self, text: &str) {
		let Some(url) = &self.webhook_url else {
			debug!("Notification webhook not configured; skipping delivery");
			return;
		};

		match self.http.post(url).json(&json!({ "text": text })).send().await {
			Ok(response) if response.status().is_success() => {}
			Ok(response) => {
				warn!(status = response.status().as_u16(), "Notification delivery failed");
			}
			Err(e) => {
				warn!(error = %e, "Notification delivery failed");
			}
		}
	}
}
