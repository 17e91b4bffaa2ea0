use std::cell::RefCell;
use std::collections::VecDeque;

use futures::channel::oneshot;
use log::{debug, info, warn};
use serde_json::{Value, json};

use super::transport::{ApiRequest, ApiResponse, Endpoint, Transport};
use crate::error::{ApiError, GENERIC_FAILURE, error_message, field_errors};
use crate::session::{Action, Notification, Store};

pub const REFRESH_PATH: &str = "/token/refresh/";

type Waiter = oneshot::Sender<Result<String, ApiError>>;

enum RefreshState {
	Idle,
	/// A refresh call is out; later 401s wait here in arrival order.
	InFlight(VecDeque<Waiter>),
}

/// Outbound request pipeline: attach bearer token, refresh-and-retry once
/// on 401, report failures as a global notification.
pub struct HttpGateway<T> {
	transport: T,
	store: Store,
	refresh: RefCell<RefreshState>,
}

impl<T: Transport> HttpGateway<T> {
	pub fn new(transport: T, store: Store) -> Self {
		Self {
			transport,
			store,
			refresh: RefCell::new(RefreshState::Idle),
		}
	}

	pub fn store(&self) -> &Store {
		&self.store
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
		let result = self.send_quiet(request).await;
		if let Err(e) = &result {
			self.report(e);
		}
		result
	}

	/// Like [`send`](Self::send) but leaves error reporting to the caller.
	pub async fn send_quiet(&self, mut request: ApiRequest) -> Result<Value, ApiError> {
		if request.endpoint.sends_bearer() {
			request.bearer = self.store.access_token();
		}
		let response = self.transport.send(&request).await?;
		if response.status != 401 {
			return into_result(response);
		}

		if request.endpoint.is_credential_check() {
			self.store.dispatch(Action::LoggedOut);
			return Err(ApiError::Credentials(
				error_message(&response.body).unwrap_or_else(|| "invalid credentials".into()),
			));
		}
		if request.endpoint != Endpoint::Protected || self.store.refresh_token().is_none() {
			return into_result(response);
		}

		// a refresh finished while this request was out: replay with its token
		let current = self.store.access_token();
		let access = match current {
			Some(access) if request.bearer.as_ref() != Some(&access) => access,
			_ => self.refreshed_access_token().await?,
		};
		request.bearer = Some(access);
		debug!("retrying {} after token refresh", request.path);
		into_result(self.transport.send(&request).await?)
	}

	async fn refreshed_access_token(&self) -> Result<String, ApiError> {
		let queued = {
			let mut state = self.refresh.borrow_mut();
			match &mut *state {
				RefreshState::InFlight(waiters) => {
					let (tx, rx) = oneshot::channel();
					waiters.push_back(tx);
					Some(rx)
				}
				RefreshState::Idle => {
					*state = RefreshState::InFlight(VecDeque::new());
					None
				}
			}
		};
		if let Some(rx) = queued {
			return rx.await.unwrap_or(Err(ApiError::SessionExpired));
		}

		let outcome = self.perform_refresh().await;
		let waiters = match std::mem::replace(&mut *self.refresh.borrow_mut(), RefreshState::Idle) {
			RefreshState::InFlight(waiters) => waiters,
			RefreshState::Idle => VecDeque::new(),
		};
		if !waiters.is_empty() {
			debug!("releasing {} requests queued behind refresh", waiters.len());
		}
		for waiter in waiters {
			let _ = waiter.send(outcome.clone());
		}
		outcome
	}

	async fn perform_refresh(&self) -> Result<String, ApiError> {
		let Some(refresh) = self.store.refresh_token() else {
			self.store.dispatch(Action::LoggedOut);
			return Err(ApiError::SessionExpired);
		};
		let request = ApiRequest::post(REFRESH_PATH, json!({ "refresh": refresh })).endpoint(Endpoint::Refresh);
		let outcome = match self.transport.send(&request).await {
			Ok(response) if response.is_success() => token_pair(&response.body),
			Ok(response) if response.status == 401 => Err(ApiError::Credentials(
				error_message(&response.body).unwrap_or_else(|| "refresh token rejected".into()),
			)),
			Ok(response) => Err(into_result(response).err().unwrap_or(ApiError::SessionExpired)),
			Err(e) => Err(e.into()),
		};

		match outcome {
			Ok((access, refresh)) => {
				info!("access token refreshed{}", if refresh.is_some() { ", refresh token rotated" } else { "" });
				self.store.dispatch(Action::TokenRefreshed {
					access: access.clone(),
					refresh,
				});
				Ok(access)
			}
			Err(e) => {
				warn!("token refresh failed: {e}");
				self.store.dispatch(Action::LoggedOut);
				Err(e)
			}
		}
	}

	fn report(&self, error: &ApiError) {
		match error {
			ApiError::Credentials(_) => {}
			other => self.store.dispatch(Action::Notify(Notification::error(other.to_string()))),
		}
	}
}

/// Access token from a refresh response, plus the rotated refresh token if any.
fn token_pair(body: &Value) -> Result<(String, Option<String>), ApiError> {
	let access = body
		.get("access")
		.and_then(Value::as_str)
		.ok_or_else(|| ApiError::Decode("refresh response carries no access token".into()))?;
	let refresh = body.get("refresh").and_then(Value::as_str).map(str::to_string);
	Ok((access.to_string(), refresh))
}

fn into_result(response: ApiResponse) -> Result<Value, ApiError> {
	if response.is_success() {
		return Ok(response.body);
	}
	Err(ApiError::Status {
		status: response.status,
		message: error_message(&response.body)
			.or_else(|| field_errors(&response.body))
			.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
	})
}
