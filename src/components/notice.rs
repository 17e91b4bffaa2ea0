use std::time::Duration;

use leptos::prelude::*;

use crate::context::use_app;
use crate::session::{Action, NoticeKind};

const NOTICE_TIMEOUT: Duration = Duration::from_millis(4000);

fn class_of(kind: NoticeKind) -> &'static str {
	match kind {
		NoticeKind::Error => "notice notice-error",
		NoticeKind::Info => "notice notice-info",
		NoticeKind::Success => "notice notice-success",
	}
}

/// The one global notification. Dismissible, and hides itself after a few seconds.
#[component]
pub fn NoticeBanner() -> impl IntoView {
	let app = use_app();
	let notice = Memo::new(move |_| app.session.with(|s| s.notification.clone()));

	Effect::new(move |_| {
		if let Some(shown) = notice.get() {
			set_timeout(move || app.dispatch(Action::ExpireNotification(shown)), NOTICE_TIMEOUT);
		}
	});

	move || {
		notice.get().map(|n| {
			view! {
				<div class=class_of(n.kind) role="status">
					<span>{n.message}</span>
					<button
						class="notice-close"
						aria-label="Dismiss"
						on:click=move |_| app.dispatch(Action::ClearNotification)
					>
						"×"
					</button>
				</div>
			}
		})
	}
}
