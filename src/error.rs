//! Errors raised at the backend boundary.

use thiserror::Error;

/// Failure of one backend request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
	/// The request never produced a response (offline, CORS, DNS).
	#[error("network error: {0}")]
	Network(String),
	/// The backend answered with a non-success status.
	#[error("request to {path} failed with status {status}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Request path, without the base URL.
		path: String,
	},
	/// The response body did not match the expected schema.
	#[error("unexpected response: {0}")]
	Decode(String),
	/// The request body could not be serialized.
	#[error("could not encode request: {0}")]
	Encode(String),
}

impl ApiError {
	/// True when the backend reported the resource as missing.
	pub fn is_not_found(&self) -> bool {
		matches!(self, ApiError::Status { status: 404, .. })
	}
}

impl From<gloo_net::Error> for ApiError {
	fn from(e: gloo_net::Error) -> Self {
		match e {
			gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
			other => ApiError::Network(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_message_names_path() {
		let e = ApiError::Status {
			status: 404,
			path: "/api/clustering_status/t1".into(),
		};
		assert!(e.is_not_found());
		assert_eq!(
			e.to_string(),
			"request to /api/clustering_status/t1 failed with status 404"
		);
	}
}
