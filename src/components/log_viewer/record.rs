use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
	Debug,
	#[default]
	Info,
	Warning,
	Error,
	/// Anything else the backend sends; shown with the fallback style.
	Other(String),
}

impl LogLevel {
	pub fn parse(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"debug" => LogLevel::Debug,
			"info" => LogLevel::Info,
			"warning" | "warn" => LogLevel::Warning,
			"error" => LogLevel::Error,
			_ => LogLevel::Other(raw.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warning => "warning",
			LogLevel::Error => "error",
			LogLevel::Other(raw) => raw,
		}
	}

	pub fn color(&self) -> &'static str {
		match self {
			LogLevel::Error => "#ef4444",
			LogLevel::Warning => "#eab308",
			LogLevel::Info => "#3b82f6",
			LogLevel::Debug => "#6b7280",
			LogLevel::Other(_) => "#374151",
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for LogLevel {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for LogLevel {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Ok(LogLevel::parse(&raw))
	}
}

/// One `log_message` event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
	#[serde(default)]
	pub timestamp: String,
	#[serde(default)]
	pub level: LogLevel,
	pub message: String,
}

impl LogRecord {
	/// Local wall-clock time of the record, or the raw timestamp if unparseable.
	pub fn display_time(&self) -> String {
		if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
			return dt.with_timezone(&Local).format("%H:%M:%S").to_string();
		}
		if let Ok(naive) = NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
			return naive.format("%H:%M:%S").to_string();
		}
		self.timestamp.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_levels_keep_their_text() {
		let record: LogRecord = serde_json::from_str(
			r#"{"timestamp": "2024-11-27T10:00:04.123", "level": "TRACE", "message": "x"}"#,
		)
		.unwrap();
		assert_eq!(record.level, LogLevel::Other("TRACE".into()));
		assert_eq!(record.level.color(), "#374151");
		assert_eq!(record.display_time(), "10:00:04");
	}

	#[test]
	fn levels_are_case_insensitive() {
		assert_eq!(LogLevel::parse("WARNING"), LogLevel::Warning);
		assert_eq!(LogLevel::parse("Error").color(), "#ef4444");
	}

	#[test]
	fn garbage_timestamp_is_shown_verbatim() {
		let record = LogRecord {
			timestamp: "yesterday".into(),
			..LogRecord::default()
		};
		assert_eq!(record.display_time(), "yesterday");
	}
}
