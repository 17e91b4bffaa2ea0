use serde_json::Value;
use thiserror::Error;

/// Shown when the backend gives no usable explanation.
pub const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
	#[error("network error: {0}")]
	Network(String),

	#[error("unreadable response body: {0}")]
	Body(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
	#[error("invalid credentials: {0}")]
	Credentials(String),

	#[error("session expired, please log in again")]
	SessionExpired,

	#[error("{message}")]
	Status { status: u16, message: String },

	#[error("unexpected response: {0}")]
	Decode(String),

	#[error(transparent)]
	Transport(#[from] TransportError),
}

impl ApiError {
	pub fn status(&self) -> Option<u16> {
		match self {
			ApiError::Status { status, .. } => Some(*status),
			ApiError::Credentials(_) | ApiError::SessionExpired => Some(401),
			_ => None,
		}
	}

	pub fn is_not_found(&self) -> bool {
		self.status() == Some(404)
	}
}

impl From<serde_json::Error> for ApiError {
	fn from(e: serde_json::Error) -> Self {
		ApiError::Decode(e.to_string())
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
	#[error("browser storage is unavailable")]
	Unavailable,

	#[error("could not write {key}: {reason}")]
	Write { key: String, reason: String },
}

/// Pulls the human readable reason out of an error body
/// (`detail`, then `error`, then `message`).
pub fn error_message(body: &Value) -> Option<String> {
	["detail", "error", "message"]
		.iter()
		.find_map(|key| body.get(key).and_then(Value::as_str))
		.map(str::to_string)
}

/// Joins per-field validation errors (`{"username": ["taken"]}`), one line
/// per field.
pub fn field_errors(body: &Value) -> Option<String> {
	let Value::Object(map) = body else {
		return None;
	};
	let lines: Vec<String> = map
		.iter()
		.filter_map(|(field, messages)| {
			let text = match messages {
				Value::String(s) => s.clone(),
				Value::Array(items) => items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", "),
				_ => return None,
			};
			(!text.is_empty()).then(|| format!("{field}: {text}"))
		})
		.collect();
	(!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn message_prefers_detail_then_error_then_message() {
		assert_eq!(
			error_message(&json!({"message": "m", "error": "e", "detail": "d"})).as_deref(),
			Some("d")
		);
		assert_eq!(error_message(&json!({"message": "m", "error": "e"})).as_deref(), Some("e"));
		assert_eq!(error_message(&json!({"message": "m"})).as_deref(), Some("m"));
		assert_eq!(error_message(&json!({"detail": 3})), None);
		assert_eq!(error_message(&json!([1, 2])), None);
	}

	#[test]
	fn validation_errors_are_listed_per_field() {
		let body = json!({"username": ["already taken"], "password": ["too short", "too common"], "code": 7});
		assert_eq!(
			field_errors(&body).as_deref(),
			Some("password: too short, too common\nusername: already taken")
		);
		assert_eq!(field_errors(&json!({})), None);
		assert_eq!(field_errors(&json!("plain")), None);
	}

	#[test]
	fn status_classification() {
		let missing = ApiError::Status {
			status: 404,
			message: "gone".into(),
		};
		assert!(missing.is_not_found());
		assert_eq!(missing.to_string(), "gone");
		assert_eq!(ApiError::SessionExpired.status(), Some(401));
		assert_eq!(ApiError::from(TransportError::Network("down".into())).status(), None);
	}
}
