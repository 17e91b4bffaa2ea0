use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
	Delete,
}

/// What the gateway needs to know about an endpoint's auth semantics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Endpoint {
	Register,
	Login,
	Refresh,
	#[default]
	Protected,
}

impl Endpoint {
	pub fn sends_bearer(self) -> bool {
		!matches!(self, Endpoint::Register | Endpoint::Refresh)
	}

	/// A 401 from these means bad credentials, never a stale token.
	pub fn is_credential_check(self) -> bool {
		matches!(self, Endpoint::Login | Endpoint::Refresh)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	pub method: Method,
	pub path: String,
	pub query: Vec<(String, String)>,
	pub body: Option<Value>,
	pub bearer: Option<String>,
	pub endpoint: Endpoint,
}

impl ApiRequest {
	fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			body: None,
			bearer: None,
			endpoint: Endpoint::default(),
		}
	}

	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	pub fn post(path: impl Into<String>, body: Value) -> Self {
		Self {
			body: Some(body),
			..Self::new(Method::Post, path)
		}
	}

	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
		self.query = query;
		self
	}

	pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
		self.endpoint = endpoint;
		self
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
	pub status: u16,
	pub body: Value,
}

impl ApiResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Moves one request over the wire. Statuses are not interpreted here.
#[async_trait(?Send)]
pub trait Transport {
	async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

pub struct ReqwestTransport {
	client: reqwest::Client,
	base_url: String,
}

impl ReqwestTransport {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.into(),
		}
	}
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
	async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = self.client.request(method, format!("{}{}", self.base_url, request.path));
		if !request.query.is_empty() {
			builder = builder.query(&request.query);
		}
		if let Some(token) = &request.bearer {
			builder = builder.bearer_auth(token);
		}
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder
			.send()
			.await
			.map_err(|e| TransportError::Network(e.to_string()))?;
		let status = response.status().as_u16();
		let text = response
			.text()
			.await
			.map_err(|e| TransportError::Body(e.to_string()))?;
		let body = if text.trim().is_empty() {
			Value::Null
		} else {
			// error pages are often not JSON; keep the text
			serde_json::from_str(&text).unwrap_or(Value::String(text))
		};
		Ok(ApiResponse { status, body })
	}
}
