//! App-wide handles shared through Leptos context.

use leptos::prelude::*;
use log::warn;

use crate::config::ClientConfig;
use crate::http::Api;
use crate::session::{Action, AppState, BrowserStorage, MemoryStorage, Notification, Store};

/// The store and API client are single-threaded, so they live in local
/// stored values; the session is mirrored into a signal for the views.
#[derive(Clone, Copy)]
pub struct AppContext {
	api: StoredValue<Api, LocalStorage>,
	config: StoredValue<ClientConfig>,
	pub session: RwSignal<AppState>,
}

impl AppContext {
	pub fn new(config: ClientConfig) -> Self {
		let store = match BrowserStorage::open() {
			Ok(storage) => Store::new(storage),
			Err(e) => {
				warn!("{e}; the session will not survive a reload");
				Store::new(MemoryStorage::new())
			}
		};
		let session = RwSignal::new(store.state());
		store.subscribe(move |state| session.set(state.clone()));
		let api = Api::connect(&config, store);
		Self {
			api: StoredValue::new_local(api),
			config: StoredValue::new(config),
			session,
		}
	}

	pub fn api(&self) -> Api {
		self.api.get_value()
	}

	pub fn config(&self) -> ClientConfig {
		self.config.get_value()
	}

	pub fn dispatch(&self, action: Action) {
		self.api.with_value(|api| api.store().dispatch(action));
	}

	pub fn notify(&self, notification: Notification) {
		self.dispatch(Action::Notify(notification));
	}

	pub fn is_authenticated(&self) -> bool {
		self.session.with(|s| s.auth.is_authenticated())
	}

	pub fn is_admin(&self) -> bool {
		self.session.with(|s| s.auth.is_authenticated() && s.auth.is_admin)
	}
}

pub fn provide_app_context(config: ClientConfig) -> AppContext {
	let app = AppContext::new(config);
	provide_context(app);
	app
}

pub fn use_app() -> AppContext {
	expect_context::<AppContext>()
}
