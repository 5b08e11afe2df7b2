//! Runtime configuration for the backend endpoint and the UI tuning constants.

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

const DEFAULT_API_URL: &str = "http://localhost:5009";

/// Id of the optional `<script type="application/json">` element carrying overrides.
pub const CONFIG_ELEMENT_ID: &str = "app-config";

/// Tunables shared by every view. Missing fields fall back to [`AppConfig::default`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
	/// Base URL of the search backend, without trailing slash.
	pub api_base_url: String,
	/// Delay between two status polls.
	pub poll_interval_ms: u32,
	/// Consecutive failed polls before a task is reported as not found.
	pub max_poll_retries: u32,
	/// Interval between two log drain ticks.
	pub log_drain_interval_ms: u32,
	/// Reconnection attempts for the log channel after a transport drop.
	pub reconnect_attempts: u32,
	/// Fixed delay before each reconnection attempt.
	pub reconnect_delay_ms: u32,
	/// Log messages containing any of these phrases are dropped (case-insensitive).
	pub log_noise: Vec<String>,
	/// Admin login; admin mode is unavailable when either part is unset.
	pub admin_username: Option<String>,
	/// Password paired with `admin_username`.
	pub admin_password: Option<String>,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base_url: option_env!("KB_API_URL")
				.unwrap_or(DEFAULT_API_URL)
				.to_string(),
			poll_interval_ms: 5000,
			max_poll_retries: 10,
			log_drain_interval_ms: 10,
			reconnect_attempts: 5,
			reconnect_delay_ms: 1000,
			log_noise: ["health check", "joined room", "connected"]
				.into_iter()
				.map(String::from)
				.collect(),
			admin_username: option_env!("KB_ADMIN_USER").map(String::from),
			admin_password: option_env!("KB_ADMIN_PASSWORD").map(String::from),
		}
	}
}

impl AppConfig {
	/// Parse overrides from JSON, normalizing the base URL.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		let mut config: AppConfig = serde_json::from_str(json)?;
		config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
		Ok(config)
	}

	/// Load overrides from the `app-config` script element, or use defaults.
	pub fn load() -> Self {
		let Some(json_text) = read_config_element() else {
			return Self::default();
		};
		match Self::from_json(&json_text) {
			Ok(config) => {
				info!("config: backend at {}", config.api_base_url);
				config
			}
			Err(e) => {
				warn!("config: ignoring malformed {CONFIG_ELEMENT_ID}: {e}");
				Self::default()
			}
		}
	}

	/// Admin credentials, when both parts are configured.
	pub fn admin_credentials(&self) -> Option<(&str, &str)> {
		match (&self.admin_username, &self.admin_password) {
			(Some(user), Some(pass)) if !user.is_empty() => Some((user, pass)),
			_ => None,
		}
	}
}

fn read_config_element() -> Option<String> {
	let document = web_sys::window()?.document()?;
	let element = document.get_element_by_id(CONFIG_ELEMENT_ID)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_other_defaults() {
		let json = r#"{"api_base_url": "https://kb.example.org/", "max_poll_retries": 3}"#;
		let config = AppConfig::from_json(json).unwrap();
		assert_eq!(config.api_base_url, "https://kb.example.org");
		assert_eq!(config.max_poll_retries, 3);
		assert_eq!(config.poll_interval_ms, 5000);
		assert_eq!(config.log_noise.len(), 3);
	}

	#[test]
	fn admin_requires_both_parts() {
		let mut config = AppConfig {
			admin_username: Some("root".into()),
			admin_password: None,
			..AppConfig::default()
		};
		assert!(config.admin_credentials().is_none());
		config.admin_password = Some("pw".into());
		assert_eq!(config.admin_credentials(), Some(("root", "pw")));
	}
}
