use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: u64,
	pub username: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
	pub access_token: Option<String>,
	pub refresh_token: Option<String>,
	pub is_admin: bool,
	pub user: Option<User>,
}

impl AuthState {
	pub fn is_authenticated(&self) -> bool {
		self.access_token.is_some()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
	Error,
	Info,
	Success,
}

/// Transient, dismissible message shown above every view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
	pub kind: NoticeKind,
	pub message: String,
}

impl Notification {
	pub fn error(message: impl Into<String>) -> Self {
		Self {
			kind: NoticeKind::Error,
			message: message.into(),
		}
	}

	pub fn info(message: impl Into<String>) -> Self {
		Self {
			kind: NoticeKind::Info,
			message: message.into(),
		}
	}

	pub fn success(message: impl Into<String>) -> Self {
		Self {
			kind: NoticeKind::Success,
			message: message.into(),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
	pub auth: AuthState,
	pub notification: Option<Notification>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
	LoggedIn {
		access: String,
		refresh: String,
		is_admin: bool,
		user: Option<User>,
	},
	/// `refresh` is set when the backend rotated the refresh token.
	TokenRefreshed {
		access: String,
		refresh: Option<String>,
	},
	LoggedOut,
	Notify(Notification),
	ClearNotification,
	/// Clears the notification only if it is still this one.
	ExpireNotification(Notification),
}

impl Action {
	pub fn touches_auth(&self) -> bool {
		matches!(
			self,
			Action::LoggedIn { .. } | Action::TokenRefreshed { .. } | Action::LoggedOut
		)
	}
}

pub fn reduce(state: &AppState, action: Action) -> AppState {
	let mut next = state.clone();
	match action {
		Action::LoggedIn {
			access,
			refresh,
			is_admin,
			user,
		} => {
			next.auth = AuthState {
				access_token: Some(access),
				refresh_token: Some(refresh),
				is_admin,
				user,
			};
		}
		Action::TokenRefreshed { access, refresh } => {
			next.auth.access_token = Some(access);
			if refresh.is_some() {
				next.auth.refresh_token = refresh;
			}
		}
		Action::LoggedOut => {
			next.auth = AuthState::default();
		}
		Action::Notify(notification) => {
			next.notification = Some(notification);
		}
		Action::ClearNotification => {
			next.notification = None;
		}
		Action::ExpireNotification(expired) => {
			if next.notification.as_ref() == Some(&expired) {
				next.notification = None;
			}
		}
	}
	next
}

#[cfg(test)]
mod tests {
	use super::*;

	fn logged_in() -> AppState {
		reduce(
			&AppState::default(),
			Action::LoggedIn {
				access: "mockToken123".into(),
				refresh: "refresh123".into(),
				is_admin: true,
				user: Some(User {
					id: 7,
					username: "ann".into(),
				}),
			},
		)
	}

	#[test]
	fn initial_state_is_logged_out() {
		let state = AppState::default();
		assert!(!state.auth.is_authenticated());
		assert!(!state.auth.is_admin);
	}

	#[test]
	fn login_then_refresh_keeps_identity() {
		let state = logged_in();
		assert_eq!(state.auth.access_token.as_deref(), Some("mockToken123"));
		assert!(state.auth.is_admin);

		let state = reduce(
			&state,
			Action::TokenRefreshed {
				access: "fresh".into(),
				refresh: None,
			},
		);
		assert_eq!(state.auth.access_token.as_deref(), Some("fresh"));
		assert_eq!(state.auth.refresh_token.as_deref(), Some("refresh123"));
		assert_eq!(state.auth.user.as_ref().map(|u| u.id), Some(7));
	}

	#[test]
	fn rotated_refresh_token_replaces_the_old_one() {
		let state = reduce(
			&logged_in(),
			Action::TokenRefreshed {
				access: "fresh".into(),
				refresh: Some("rotated".into()),
			},
		);
		assert_eq!(state.auth.refresh_token.as_deref(), Some("rotated"));
		assert!(state.auth.is_admin);
	}

	#[test]
	fn logout_clears_everything_but_notification() {
		let state = reduce(&logged_in(), Action::Notify(Notification::info("bye")));
		let state = reduce(&state, Action::LoggedOut);
		assert_eq!(state.auth, AuthState::default());
		assert_eq!(state.notification, Some(Notification::info("bye")));
		assert_eq!(reduce(&state, Action::ClearNotification).notification, None);
	}

	#[test]
	fn expiry_only_clears_the_matching_notification() {
		let state = reduce(&AppState::default(), Action::Notify(Notification::error("first")));
		let state = reduce(&state, Action::Notify(Notification::info("second")));

		let kept = reduce(&state, Action::ExpireNotification(Notification::error("first")));
		assert_eq!(kept.notification, Some(Notification::info("second")));

		let cleared = reduce(&kept, Action::ExpireNotification(Notification::info("second")));
		assert_eq!(cleared.notification, None);
	}
}
