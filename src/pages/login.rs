use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;
use log::info;
use web_sys::SubmitEvent;

use crate::context::use_app;
use crate::error::ApiError;
use crate::http::LoginForm;
use crate::session::Action;

#[component]
pub fn Login() -> impl IntoView {
	let app = use_app();
	let navigate = use_navigate();
	let username = RwSignal::new(String::new());
	let password = RwSignal::new(String::new());
	let failure = RwSignal::new(None::<String>);
	let pending = RwSignal::new(false);

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		if pending.get_untracked() {
			return;
		}
		let form = LoginForm {
			username: username.get_untracked().trim().to_string(),
			password: password.get_untracked(),
		};
		if form.username.is_empty() || form.password.is_empty() {
			failure.set(Some("Enter your username and password.".into()));
			return;
		}
		failure.set(None);
		app.dispatch(Action::ClearNotification);
		pending.set(true);

		let (api, navigate) = (app.api(), navigate.clone());
		spawn_local(async move {
			let result = api.login(&form).await;
			pending.set(false);
			match result {
				Ok(_) => {
					info!("signed in as {}", form.username);
					navigate("/", Default::default());
				}
				Err(ApiError::Credentials(message)) => failure.set(Some(message)),
				Err(e) => failure.set(Some(e.to_string())),
			}
		});
	};

	view! {
		<section class="page auth">
			<h1>"Sign in"</h1>
			<form on:submit=on_submit>
				<label>
					"Username" <input type="text" autocomplete="username" bind:value=username />
				</label>
				<label>
					"Password"
					<input type="password" autocomplete="current-password" bind:value=password />
				</label>
				{move || failure.get().map(|message| view! { <p class="form-error">{message}</p> })}
				<button type="submit" disabled=move || pending.get()>
					{move || if pending.get() { "Signing in..." } else { "Sign in" }}
				</button>
			</form>
			<p>"No account yet? " <A href="/register">"Register"</A></p>
		</section>
	}
}
