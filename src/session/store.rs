use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use super::state::{Action, AppState, AuthState, reduce};
use super::storage::{IS_ADMIN_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS, TOKEN_KEY, TokenStorage, USER_KEY};

type Subscriber = Box<dyn Fn(&AppState)>;

struct StoreInner {
	state: RefCell<AppState>,
	storage: Box<dyn TokenStorage>,
	subscribers: RefCell<Vec<Subscriber>>,
}

/// Process-wide session and notification state.
///
/// Cheap to clone; all clones share one state. Changes only happen through
/// [`Store::dispatch`], which runs the reducer, mirrors auth fields into
/// durable storage and then informs subscribers.
#[derive(Clone)]
pub struct Store {
	inner: Rc<StoreInner>,
}

impl Store {
	/// Opens a store, restoring any session left in `storage`.
	pub fn new(storage: impl TokenStorage + 'static) -> Self {
		let state = AppState {
			auth: restore(&storage),
			notification: None,
		};
		Self {
			inner: Rc::new(StoreInner {
				state: RefCell::new(state),
				storage: Box::new(storage),
				subscribers: RefCell::new(Vec::new()),
			}),
		}
	}

	pub fn state(&self) -> AppState {
		self.inner.state.borrow().clone()
	}

	pub fn auth(&self) -> AuthState {
		self.inner.state.borrow().auth.clone()
	}

	pub fn access_token(&self) -> Option<String> {
		self.inner.state.borrow().auth.access_token.clone()
	}

	pub fn refresh_token(&self) -> Option<String> {
		self.inner.state.borrow().auth.refresh_token.clone()
	}

	pub fn subscribe(&self, subscriber: impl Fn(&AppState) + 'static) {
		self.inner.subscribers.borrow_mut().push(Box::new(subscriber));
	}

	pub fn dispatch(&self, action: Action) {
		debug!("dispatch {action:?}");
		if action.touches_auth() {
			self.persist(&action);
		}
		let next = reduce(&self.inner.state.borrow(), action);
		*self.inner.state.borrow_mut() = next.clone();
		for subscriber in self.inner.subscribers.borrow().iter() {
			subscriber(&next);
		}
	}

	fn persist(&self, action: &Action) {
		let storage = &self.inner.storage;
		let result = match action {
			Action::LoggedIn {
				access,
				refresh,
				is_admin,
				user,
			} => storage
				.set(TOKEN_KEY, access)
				.and_then(|_| storage.set(REFRESH_TOKEN_KEY, refresh))
				.and_then(|_| storage.set(IS_ADMIN_KEY, if *is_admin { "true" } else { "false" }))
				.and_then(|_| match user.as_ref().map(serde_json::to_string) {
					Some(Ok(json)) => storage.set(USER_KEY, &json),
					_ => {
						storage.remove(USER_KEY);
						Ok(())
					}
				}),
			Action::TokenRefreshed { access, refresh } => storage.set(TOKEN_KEY, access).and_then(|_| match refresh {
				Some(refresh) => storage.set(REFRESH_TOKEN_KEY, refresh),
				None => Ok(()),
			}),
			Action::LoggedOut => {
				SESSION_KEYS.iter().for_each(|key| storage.remove(key));
				Ok(())
			}
			_ => Ok(()),
		};
		if let Err(e) = result {
			warn!("session not persisted: {e}");
		}
	}
}

fn restore(storage: &dyn TokenStorage) -> AuthState {
	let access_token = storage.get(TOKEN_KEY);
	if access_token.is_none() {
		return AuthState::default();
	}
	AuthState {
		access_token,
		refresh_token: storage.get(REFRESH_TOKEN_KEY),
		is_admin: storage.get(IS_ADMIN_KEY).as_deref() == Some("true"),
		user: storage.get(USER_KEY).and_then(|raw| serde_json::from_str(&raw).ok()),
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::session::state::{Notification, User};
	use crate::session::storage::MemoryStorage;

	/// Storage handle whose contents stay inspectable after the store takes it.
	#[derive(Clone, Default)]
	struct Shared(Rc<MemoryStorage>);

	impl TokenStorage for Shared {
		fn get(&self, key: &str) -> Option<String> {
			self.0.get(key)
		}

		fn set(&self, key: &str, value: &str) -> Result<(), crate::error::StorageError> {
			self.0.set(key, value)
		}

		fn remove(&self, key: &str) {
			self.0.remove(key)
		}
	}

	fn login() -> Action {
		Action::LoggedIn {
			access: "a1".into(),
			refresh: "r1".into(),
			is_admin: true,
			user: Some(User {
				id: 3,
				username: "ann".into(),
			}),
		}
	}

	#[test]
	fn login_is_persisted_and_restored() {
		let storage = Shared::default();
		let store = Store::new(storage.clone());
		store.dispatch(login());
		assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("a1"));
		assert_eq!(storage.get(IS_ADMIN_KEY).as_deref(), Some("true"));

		let reloaded = Store::new(storage.clone());
		assert_eq!(reloaded.auth(), store.auth());
	}

	#[test]
	fn refresh_updates_only_the_access_token() {
		let storage = Shared::default();
		let store = Store::new(storage.clone());
		store.dispatch(login());
		store.dispatch(Action::TokenRefreshed {
			access: "a2".into(),
			refresh: None,
		});
		assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("a2"));
		assert_eq!(store.refresh_token().as_deref(), Some("r1"));
	}

	#[test]
	fn rotated_refresh_token_is_persisted() {
		let storage = Shared::default();
		let store = Store::new(storage.clone());
		store.dispatch(login());
		store.dispatch(Action::TokenRefreshed {
			access: "a2".into(),
			refresh: Some("r2".into()),
		});
		assert_eq!(storage.get(REFRESH_TOKEN_KEY).as_deref(), Some("r2"));
		assert_eq!(Store::new(storage.clone()).refresh_token().as_deref(), Some("r2"));
	}

	#[test]
	fn logout_wipes_storage() {
		let storage = Shared::default();
		let store = Store::new(storage.clone());
		store.dispatch(login());
		store.dispatch(Action::LoggedOut);
		assert!(storage.0.is_empty());
		assert!(!store.auth().is_authenticated());
	}

	#[test]
	fn subscribers_see_each_state() {
		let store = Store::new(MemoryStorage::new());
		let seen = Rc::new(Cell::new(0));
		let counter = seen.clone();
		store.subscribe(move |state| {
			if state.notification.is_some() {
				counter.set(counter.get() + 1);
			}
		});
		store.dispatch(Action::Notify(Notification::error("boom")));
		store.dispatch(Action::ClearNotification);
		assert_eq!(seen.get(), 1);
	}

	#[test]
	fn stray_refresh_token_without_access_is_ignored() {
		let storage = MemoryStorage::new();
		storage.set(REFRESH_TOKEN_KEY, "r").unwrap();
		let store = Store::new(storage);
		assert_eq!(store.auth(), AuthState::default());
	}
}
