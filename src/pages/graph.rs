use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, info};
use web_sys::SubmitEvent;

use super::Liveness;
use crate::components::force_graph::ForceGraphCanvas;
use crate::context::use_app;
use crate::graph::{EdgeRule, FilterState, Graph, aggregate};
use crate::http::{AssociationQuery, GroupingStrategy, MultiWordLogic, NlpParams, SearchHit, SearchOutcome};

fn nlp_toggle(
	nlp: RwSignal<NlpParams>,
	label: &'static str,
	get: fn(&NlpParams) -> bool,
	set: fn(&mut NlpParams, bool),
) -> impl IntoView {
	view! {
		<label class="toggle">
			<input
				type="checkbox"
				prop:checked=move || nlp.with(get)
				on:change=move |ev| nlp.update(|p| set(p, event_target_checked(&ev)))
			/>
			{label}
		</label>
	}
}

fn hit_row(hit: SearchHit, keyword: RwSignal<String>) -> impl IntoView {
	let name = hit.cipher_name().unwrap_or("Unknown font").to_string();
	let focus = hit.cipher_name().map(str::to_string);
	let reaction = hit.best_reaction().map(|r| format!("\u{201c}{r}\u{201d}"));
	let relevance = hit.relevance_percent().map(|p| format!("{p:.0}% match"));
	let frequency = format!("seen {} times", hit.frequency());

	view! {
		<li class="search-hit">
			<strong>{name}</strong>
			{reaction.map(|r| view! { <span class="hit-reaction">{r}</span> })}
			{relevance.map(|r| view! { <span class="hit-relevance">{r}</span> })}
			<span class="hit-frequency">{frequency}</span>
			{focus
				.map(|font| {
					view! {
						<button on:click=move |_| keyword.set(font.clone())>"Show in graph"</button>
					}
				})}
		</li>
	}
}

/// Association graph with keyword focus, edge narrowing and reaction search.
#[component]
pub fn GraphPage() -> impl IntoView {
	let app = use_app();
	let live = Liveness::new();
	let options = app.config().graph;

	let base = RwSignal::new(Graph::default());
	let loading = RwSignal::new(false);
	let nlp = RwSignal::new(NlpParams::default());
	let keyword = RwSignal::new(String::new());
	let rule_kind = RwSignal::new(EdgeRule::None.kind().to_string());
	let rule_value = RwSignal::new(String::new());

	let filter = Memo::new(move |_| FilterState {
		keyword: keyword.get(),
		edge_rule: EdgeRule::parse(&rule_kind.get(), &rule_value.get()),
	});
	let display = Memo::new(move |_| {
		let filter = filter.get();
		base.with(|graph| filter.apply(graph))
	});

	let load = {
		let live = live.clone();
		move || {
			if loading.get_untracked() {
				return;
			}
			loading.set(true);
			let (api, params, live) = (app.api(), nlp.get_untracked(), live.clone());
			spawn_local(async move {
				let result = api.graph_records(&params).await;
				if !live.is_alive() {
					debug!("graph page closed before records arrived");
					return;
				}
				loading.set(false);
				// failures already went to the notification banner
				if let Ok(records) = result {
					let graph = aggregate(&records, &options);
					info!(
						"graph: {} records -> {} nodes, {} edges",
						records.len(),
						graph.nodes.len(),
						graph.edges.len()
					);
					base.set(graph);
				}
			});
		}
	};
	load();

	let search_text = RwSignal::new(String::new());
	let match_all_words = RwSignal::new(false);
	let use_embeddings = RwSignal::new(false);
	let outcome = RwSignal::new(None::<SearchOutcome>);
	let searching = RwSignal::new(false);

	let on_search = move |ev: SubmitEvent| {
		ev.prevent_default();
		let text = search_text.get_untracked();
		if text.trim().is_empty() {
			outcome.set(Some(SearchOutcome::Message("Enter a reaction to search for.".into())));
			return;
		}
		let query = AssociationQuery {
			use_embeddings: use_embeddings.get_untracked(),
			multi_word_logic: if match_all_words.get_untracked() { MultiWordLogic::And } else { MultiWordLogic::Or },
			nlp: nlp.get_untracked(),
			..AssociationQuery::new(text)
		};
		searching.set(true);
		let (api, live) = (app.api(), live.clone());
		spawn_local(async move {
			let result = api.search_associations(&query).await;
			if !live.is_alive() {
				return;
			}
			searching.set(false);
			outcome.set(result.ok());
		});
	};

	let reload = load.clone();
	let stats = move || {
		display.with(|d| {
			let mut line = format!("{} nodes, {} links", d.graph.nodes.len(), d.graph.edges.len());
			if d.highlighted_count() > 0 {
				line.push_str(&format!(", {} matched", d.highlighted_count()));
			}
			line
		})
	};
	let empty_message = move || {
		if loading.get() {
			"Loading associations...".to_string()
		} else if filter.with(FilterState::is_keyword_active) {
			format!("Nothing matches \u{201c}{}\u{201d}.", keyword.get().trim())
		} else {
			"No associations to show yet.".to_string()
		}
	};

	view! {
		<section class="page graph-page">
			<aside class="graph-toolbar">
				<fieldset>
					<legend>"Text processing"</legend>
					{nlp_toggle(nlp, "Preprocess", |p| p.preprocess, |p, v| p.preprocess = v)}
					{nlp_toggle(nlp, "Remove stop words", |p| p.remove_stops, |p, v| p.remove_stops = v)}
					{nlp_toggle(nlp, "Lemmatize", |p| p.lemmatize, |p, v| p.lemmatize = v)}
					{nlp_toggle(nlp, "Group synonyms", |p| p.group_syns, |p, v| p.group_syns = v)}
					<label>
						"Grouping"
						<select
							prop:value=move || nlp.with(|p| p.grouping_strategy.as_str())
							on:change=move |ev| {
								nlp.update(|p| p.grouping_strategy = GroupingStrategy::parse(&event_target_value(&ev)))
							}
						>
							{GroupingStrategy::ALL
								.into_iter()
								.map(|s| view! { <option value=s.as_str()>{s.as_str()}</option> })
								.collect_view()}
						</select>
					</label>
					<button on:click=move |_| reload() disabled=move || loading.get()>
						"Reload graph"
					</button>
				</fieldset>

				<fieldset>
					<legend>"Focus"</legend>
					<label>
						"Keyword" <input type="search" placeholder="font or reaction" bind:value=keyword />
					</label>
					<label>
						"Links"
						<select bind:value=rule_kind>
							<option value="all">"All"</option>
							<option value="frequency_above">"Frequency at least"</option>
							<option value="top_n">"Top N"</option>
						</select>
					</label>
					<Show when=move || rule_kind.get() != "all">
						<input type="number" min="1" bind:value=rule_value />
					</Show>
					<p class="graph-stats">{stats}</p>
				</fieldset>

				<form class="association-search" on:submit=on_search>
					<h2>"Find fonts by reaction"</h2>
					<input type="search" placeholder="e.g. calm, strict" bind:value=search_text />
					<label class="toggle">
						<input type="checkbox" bind:checked=match_all_words />
						"Match every word"
					</label>
					<label class="toggle">
						<input type="checkbox" bind:checked=use_embeddings />
						"Semantic search"
					</label>
					<button type="submit" disabled=move || searching.get()>
						"Search"
					</button>
					{move || match outcome.get() {
						None => ().into_any(),
						Some(SearchOutcome::Message(message)) => {
							view! { <p class="search-message">{message}</p> }.into_any()
						}
						Some(SearchOutcome::Hits(hits)) => {
							view! {
								<ul class="search-hits">
									{hits.into_iter().map(|hit| hit_row(hit, keyword)).collect_view()}
								</ul>
							}
								.into_any()
						}
					}}
				</form>
			</aside>

			<div class="graph-area">
				<Show
					when=move || display.with(|d| !d.graph.nodes.is_empty())
					fallback=move || view! { <p class="graph-empty">{empty_message}</p> }
				>
					<ForceGraphCanvas data=display />
				</Show>
			</div>
		</section>
	}
}
