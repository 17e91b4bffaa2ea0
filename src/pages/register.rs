use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;
use log::info;
use web_sys::SubmitEvent;

use crate::context::use_app;
use crate::http::RegistrationForm;
use crate::session::Action;

fn optional(value: String) -> Option<String> {
	let value = value.trim();
	(!value.is_empty()).then(|| value.to_string())
}

#[component]
pub fn Register() -> impl IntoView {
	let app = use_app();
	let navigate = use_navigate();
	let username = RwSignal::new(String::new());
	let email = RwSignal::new(String::new());
	let password = RwSignal::new(String::new());
	let first_name = RwSignal::new(String::new());
	let last_name = RwSignal::new(String::new());
	let gender = RwSignal::new(String::new());
	let age = RwSignal::new(String::new());
	let education_level = RwSignal::new(String::new());
	let specialty = RwSignal::new(String::new());
	let failure = RwSignal::new(None::<String>);
	let pending = RwSignal::new(false);

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		if pending.get_untracked() {
			return;
		}
		let form = RegistrationForm {
			username: username.get_untracked().trim().to_string(),
			email: email.get_untracked().trim().to_string(),
			password: password.get_untracked(),
			first_name: first_name.get_untracked().trim().to_string(),
			last_name: last_name.get_untracked().trim().to_string(),
			gender: optional(gender.get_untracked()),
			age: age.get_untracked().trim().parse().ok(),
			education_level: optional(education_level.get_untracked()),
			specialty: optional(specialty.get_untracked()),
		};
		if form.username.is_empty() || form.password.is_empty() || form.email.is_empty() {
			failure.set(Some("Username, e-mail and password are required.".into()));
			return;
		}
		failure.set(None);
		app.dispatch(Action::ClearNotification);
		pending.set(true);

		let (api, navigate) = (app.api(), navigate.clone());
		spawn_local(async move {
			let result = api.register_and_login(&form).await;
			pending.set(false);
			match result {
				Ok(_) => {
					info!("registered {}", form.username);
					navigate("/", Default::default());
				}
				Err(e) => failure.set(Some(e.to_string())),
			}
		});
	};

	view! {
		<section class="page auth">
			<h1>"Create an account"</h1>
			<form on:submit=on_submit>
				<label>"Username" <input type="text" bind:value=username /></label>
				<label>"E-mail" <input type="email" bind:value=email /></label>
				<label>"Password" <input type="password" autocomplete="new-password" bind:value=password /></label>
				<label>"First name" <input type="text" bind:value=first_name /></label>
				<label>"Last name" <input type="text" bind:value=last_name /></label>
				<label>
					"Gender"
					<select bind:value=gender>
						<option value="">"Prefer not to say"</option>
						<option value="male">"Male"</option>
						<option value="female">"Female"</option>
					</select>
				</label>
				<label>"Age" <input type="number" min="1" bind:value=age /></label>
				<label>"Education" <input type="text" bind:value=education_level /></label>
				<label>"Specialty" <input type="text" bind:value=specialty /></label>
				{move || failure.get().map(|message| view! { <pre class="form-error">{message}</pre> })}
				<button type="submit" disabled=move || pending.get()>
					"Register"
				</button>
			</form>
			<p>"Already registered? " <A href="/login">"Sign in"</A></p>
		</section>
	}
}
