use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;

use crate::context::use_app;

#[component]
pub fn Header() -> impl IntoView {
	let app = use_app();
	let navigate = use_navigate();
	let username = move || app.session.with(|s| s.auth.user.as_ref().map(|u| u.username.clone()));

	let logout = move |_| {
		app.api().logout();
		navigate("/login", Default::default());
	};

	view! {
		<header class="app-header">
			<nav>
				<A href="/">"Font associations"</A>
				<Show when=move || app.is_authenticated()>
					<A href="/quiz">"Take the test"</A>
					<A href="/graph">"Association graph"</A>
				</Show>
				<Show when=move || app.is_admin()>
					<A href="/admin">"Users"</A>
				</Show>
			</nav>
			<div class="session">
				<Show
					when=move || app.is_authenticated()
					fallback=|| view! { <A href="/login">"Log in"</A> }
				>
					<span class="username">{username}</span>
					<button on:click=logout.clone()>"Log out"</button>
				</Show>
			</div>
		</header>
	}
}
