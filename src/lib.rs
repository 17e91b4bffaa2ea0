//! Leptos client for the font/reaction association study: session and HTTP
//! plumbing, graph post-processing, the timed survey and the routed pages.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

mod config;
mod error;
mod graph;
mod http;
mod quiz;
mod session;

// UI
mod components;
mod context;
mod pages;

use crate::components::{Header, NoticeBanner};
use crate::config::ClientConfig;
use crate::context::provide_app_context;
use crate::pages::admin::AdminPage;
use crate::pages::graph::GraphPage;
use crate::pages::home::Home;
use crate::pages::login::Login;
use crate::pages::not_found::NotFound;
use crate::pages::quiz::QuizPage;
use crate::pages::register::Register;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// The study app: session context, header, global notice and routes.
/// Survey and graph need a session; the user list needs an admin one.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();
	let config = ClientConfig::load();
	info!("API at {}", config.api_base_url);
	let app = provide_app_context(config);

	let signed_in = move || Some(app.is_authenticated());
	let admin = move || Some(app.is_admin());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		<Title text="Font associations" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Header />
			<NoticeBanner />
			<main>
				<Routes fallback=|| view! { <NotFound /> }>
					<Route path=path!("/") view=Home />
					<Route path=path!("/login") view=Login />
					<Route path=path!("/register") view=Register />
					<ProtectedRoute
						path=path!("/quiz")
						view=QuizPage
						condition=signed_in
						redirect_path=|| "/login"
					/>
					<ProtectedRoute
						path=path!("/graph")
						view=GraphPage
						condition=signed_in
						redirect_path=|| "/login"
					/>
					<ProtectedRoute path=path!("/admin") view=AdminPage condition=admin redirect_path=|| "/" />
				</Routes>
			</main>
		</Router>
	}
}
