use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use serde_json::Value;

use super::Liveness;
use crate::context::use_app;
use crate::error::ApiError;
use crate::http::{GroupingStrategy, NlpParams};

/// Which NLP report the panel shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Report {
	Text,
	AllAssociations,
	Grouped,
}

fn pretty(value: &Value) -> String {
	serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Text analysis and grouped-reaction reports from the backend NLP service.
#[component]
fn NlpPanel() -> impl IntoView {
	let app = use_app();
	let live = Liveness::new();
	let text = RwSignal::new(String::new());
	let grouping = RwSignal::new(GroupingStrategy::default());
	let pending = RwSignal::new(false);
	let report = RwSignal::new(None::<Result<Value, ApiError>>);

	let run = move |kind: Report| {
		if pending.get_untracked() {
			return;
		}
		let params = NlpParams {
			grouping_strategy: grouping.get_untracked(),
			..NlpParams::default()
		};
		let input = text.get_untracked();
		if kind == Report::Text && input.trim().is_empty() {
			return;
		}
		pending.set(true);
		let (api, live) = (app.api(), live.clone());
		spawn_local(async move {
			let result = match kind {
				Report::Text => api.analyze_text(&input, &params).await,
				Report::AllAssociations => api.analyze_all_associations(&params).await,
				Report::Grouped => api.fast_grouped(&params).await,
			};
			if live.is_alive() {
				pending.set(false);
				report.set(Some(result));
			}
		});
	};
	let run = StoredValue::new_local(run);

	view! {
		<section class="nlp-panel">
			<h2>"Reaction language"</h2>
			<textarea rows="3" placeholder="Type a reaction to analyse" bind:value=text></textarea>
			<label>
				"Grouping"
				<select on:change=move |ev| grouping.set(GroupingStrategy::parse(&event_target_value(&ev)))>
					{GroupingStrategy::ALL
						.into_iter()
						.map(|s| {
							view! {
								<option value=s.as_str() selected=move || grouping.get() == s>
									{s.as_str()}
								</option>
							}
						})
						.collect_view()}
				</select>
			</label>
			<div class="nlp-actions">
				<button disabled=move || pending.get() on:click=move |_| run.with_value(|run| run(Report::Text))>
					"Analyse text"
				</button>
				<button
					disabled=move || pending.get()
					on:click=move |_| run.with_value(|run| run(Report::AllAssociations))
				>
					"All associations"
				</button>
				<button disabled=move || pending.get() on:click=move |_| run.with_value(|run| run(Report::Grouped))>
					"Grouped reactions"
				</button>
			</div>
			<ErrorBoundary fallback=|errors| {
				view! {
					<div class="nlp-error">
						<p>"The analysis failed:"</p>
						<ul>
							{move || {
								errors
									.get()
									.into_iter()
									.map(|(_, e)| view! { <li>{e.to_string()}</li> })
									.collect_view()
							}}
						</ul>
					</div>
				}
			}>
				{move || report.get().map(|result| result.map(|value| view! { <pre class="nlp-report">{pretty(&value)}</pre> }))}
			</ErrorBoundary>
		</section>
	}
}

/// Start page: entry points into the study and, once signed in, NLP reports.
#[component]
pub fn Home() -> impl IntoView {
	let app = use_app();
	let greeting = move || {
		app.session.with(|s| match &s.auth.user {
			Some(user) => format!("Welcome, {}!", user.username),
			None => "Welcome!".to_string(),
		})
	};

	view! {
		<section class="page home">
			<h1>{greeting}</h1>
			<p>
				"This study collects the feelings different fonts evoke. "
				"Each test shows up to twenty font variations; describe each one in a few words."
			</p>
			<Show
				when=move || app.is_authenticated()
				fallback=|| {
					view! {
						<div class="home-actions">
							<A href="/login">"Sign in"</A>
							<A href="/register">"Create an account"</A>
						</div>
					}
				}
			>
				<div class="home-actions">
					<A href="/quiz">"Take the test"</A>
					<A href="/graph">"Show the association graph"</A>
				</div>
				<NlpPanel />
			</Show>
		</section>
	}
}
