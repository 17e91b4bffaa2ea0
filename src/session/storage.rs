use std::cell::RefCell;
use std::collections::HashMap;

use log::warn;

use crate::error::StorageError;

pub const TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const IS_ADMIN_KEY: &str = "is_admin";
pub const USER_KEY: &str = "user";

pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, REFRESH_TOKEN_KEY, IS_ADMIN_KEY, USER_KEY];

/// Durable key/value storage that survives a page reload.
pub trait TokenStorage {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
	fn remove(&self, key: &str);
}

/// `window.localStorage`.
pub struct BrowserStorage {
	inner: web_sys::Storage,
}

impl BrowserStorage {
	pub fn open() -> Result<Self, StorageError> {
		let inner = web_sys::window()
			.and_then(|w| w.local_storage().ok().flatten())
			.ok_or(StorageError::Unavailable)?;
		Ok(Self { inner })
	}
}

impl TokenStorage for BrowserStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.inner.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self.inner.set_item(key, value).map_err(|e| StorageError::Write {
			key: key.to_string(),
			reason: format!("{e:?}"),
		})
	}

	fn remove(&self, key: &str) {
		if self.inner.remove_item(key).is_err() {
			warn!("failed to remove {key} from local storage");
		}
	}
}

/// Non-persistent fallback, also used by tests.
#[derive(Default)]
pub struct MemoryStorage {
	items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.borrow().is_empty()
	}
}

impl TokenStorage for MemoryStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.items.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self.items.borrow_mut().insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) {
		self.items.borrow_mut().remove(key);
	}
}
