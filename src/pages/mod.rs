//! Routed pages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;

pub mod admin;
pub mod graph;
pub mod home;
pub mod login;
pub mod not_found;
pub mod quiz;
pub mod register;

/// Cleared when the owning page unmounts. Async completions check it before
/// touching page state; their results are dropped otherwise.
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
	pub fn new() -> Self {
		let flag = Arc::new(AtomicBool::new(true));
		let on_unmount = flag.clone();
		on_cleanup(move || on_unmount.store(false, Ordering::Relaxed));
		Self(flag)
	}

	pub fn is_alive(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}
