use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use log::{debug, warn};
use parking_lot::Mutex;

use super::Liveness;
use crate::config::QuizSettings;
use crate::context::{AppContext, use_app};
use crate::http::VariationOutcome;
use crate::quiz::{
	MAX_CUSTOM_TEXTS, QuizCommand, QuizController, QuizEvent, QuizPhase, QuizSnapshot, Variation, VariationConfig,
	format_clock,
};
use crate::session::Notification;

const SAMPLE_TEXT: &str = "The quick brown fox jumps over the lazy dog";

/// Runs the controller's commands and feeds their results back in.
#[derive(Clone)]
struct QuizDriver {
	controller: Arc<Mutex<QuizController>>,
	snapshot: RwSignal<QuizSnapshot>,
	app: AppContext,
	navigate: Rc<dyn Fn(&str)>,
	live: Liveness,
}

impl QuizDriver {
	fn send(&self, event: QuizEvent) {
		if !self.live.is_alive() {
			return;
		}
		let (commands, snapshot) = {
			let mut controller = self.controller.lock();
			let commands = controller.handle(event);
			(commands, controller.snapshot())
		};
		self.snapshot.set(snapshot);
		for command in commands {
			self.run(command);
		}
	}

	fn run(&self, command: QuizCommand) {
		match command {
			QuizCommand::FetchVariation(config) => {
				let driver = self.clone();
				spawn_local(async move {
					let outcome = driver.app.api().random_variation(&config).await;
					driver.send(match outcome {
						Ok(VariationOutcome::Next(variation)) => QuizEvent::VariationLoaded(variation),
						Ok(VariationOutcome::AllSeen(message)) => QuizEvent::AllSeen(message),
						Ok(VariationOutcome::NotFound) => QuizEvent::VariationNotFound,
						Err(e) => QuizEvent::FetchFailed(e.to_string()),
					});
				});
			}
			QuizCommand::Submit(batch) => {
				let driver = self.clone();
				debug!("quiz: saving {} answers", batch.len());
				spawn_local(async move {
					let saved = driver.app.api().save_study(&batch).await;
					driver.send(match saved {
						Ok(message) => QuizEvent::SubmitSucceeded(message),
						Err(e) => {
							warn!("quiz: save failed: {e}");
							QuizEvent::SubmitFailed(e.to_string())
						}
					});
				});
			}
			QuizCommand::Notify(notification) => self.app.notify(notification),
			QuizCommand::Navigate(notification) => {
				self.app.notify(notification);
				(self.navigate)("/");
			}
		}
	}
}

fn config_toggle(
	snapshot: RwSignal<QuizSnapshot>,
	send: impl Fn(QuizEvent) + Copy + Send + Sync + 'static,
	label: &'static str,
	get: fn(&VariationConfig) -> bool,
	set: fn(&mut VariationConfig, bool),
) -> impl IntoView {
	view! {
		<label class="toggle">
			<input
				type="checkbox"
				prop:checked=move || snapshot.with(|s| get(&s.config))
				on:change=move |ev| {
					let mut config = snapshot.with_untracked(|s| s.config);
					set(&mut config, event_target_checked(&ev));
					send(QuizEvent::UpdateConfig(config));
				}
			/>
			{label}
		</label>
	}
}

fn presenting(
	variation: Variation,
	snapshot: RwSignal<QuizSnapshot>,
	send: impl Fn(QuizEvent) + Copy + Send + Sync + 'static,
) -> impl IntoView {
	let css = variation.css();
	let custom_css = css.clone();
	let custom_text = RwSignal::new(String::new());

	view! {
		<div class="quiz-question">
			<p class="variation-name">{variation.display_name()}</p>
			<p class="font-sample" style=css>
				{SAMPLE_TEXT}
			</p>
			<ul class="custom-samples">
				{move || {
					let css = custom_css.clone();
					snapshot
						.with(|s| s.custom_texts.clone())
						.into_iter()
						.enumerate()
						.map(|(i, text)| {
							view! {
								<li>
									<span style=css.clone()>{text}</span>
									<button
										aria-label="Remove sample"
										on:click=move |_| send(QuizEvent::RemoveCustomText(i))
									>
										"×"
									</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
			<Show when=move || snapshot.with(|s| s.custom_texts.len() < MAX_CUSTOM_TEXTS)>
				<form on:submit=move |ev| {
					ev.prevent_default();
					send(QuizEvent::AddCustomText(custom_text.get_untracked()));
					custom_text.set(String::new());
				}>
					<input type="text" placeholder="Try your own text" bind:value=custom_text />
					<button type="submit">"Preview"</button>
				</form>
			</Show>
			<label class="reaction">
				"What does this font make you feel or think of?"
				<textarea
					rows="3"
					prop:value=move || snapshot.with(|s| s.reaction.clone())
					on:input=move |ev| send(QuizEvent::ReactionChanged(event_target_value(&ev)))
				></textarea>
			</label>
			<button class="next" on:click=move |_| send(QuizEvent::Next)>
				{move || {
					if snapshot.with(|s| s.question >= s.question_count) { "Finish" } else { "Next" }
				}}
			</button>
		</div>
	}
}

/// The timed survey: one font variation per question, a reaction per font.
#[component]
pub fn QuizPage() -> impl IntoView {
	let app = use_app();
	let live = Liveness::new();
	let settings: QuizSettings = app.config().quiz;
	let controller = Arc::new(Mutex::new(QuizController::new(settings)));
	let snapshot = RwSignal::new(controller.lock().snapshot());

	let navigate = use_navigate();
	let driver = QuizDriver {
		controller: controller.clone(),
		snapshot,
		app,
		navigate: Rc::new(move |path: &str| navigate(path, Default::default())),
		live,
	};

	let ticker = driver.clone();
	match set_interval_with_handle(move || ticker.send(QuizEvent::Tick), QuizSettings::tick()) {
		Ok(handle) => on_cleanup(move || {
			handle.clear();
			controller.lock().handle(QuizEvent::Unmount);
		}),
		Err(e) => {
			warn!("quiz: timer unavailable: {e:?}");
			app.notify(Notification::error("The test timer could not be started."));
			on_cleanup(move || {
				controller.lock().handle(QuizEvent::Unmount);
			});
		}
	}
	driver.send(QuizEvent::Start);

	let driver = StoredValue::new_local(driver);
	let send = move |event: QuizEvent| driver.get_value().send(event);

	// rebuild the question view only when the phase itself changes
	let phase = Memo::new(move |_| snapshot.with(|s| s.phase.clone()));
	let body = move || match phase.get() {
		QuizPhase::AwaitingVariation => {
			view! {
				<div class="quiz-waiting">
					<Show
						when=move || snapshot.with(|s| s.loading)
						fallback=move || {
							view! {
								<p>"The next font could not be loaded."</p>
								<button on:click=move |_| send(QuizEvent::Start)>"Try again"</button>
							}
						}
					>
						<p>"Loading the next font..."</p>
					</Show>
				</div>
			}
				.into_any()
		}
		QuizPhase::Presenting(variation) => presenting(variation, snapshot, send).into_any(),
		QuizPhase::Finished => {
			view! {
				<div class="quiz-saving">
					<Show
						when=move || snapshot.with(|s| s.saving)
						fallback=move || {
							view! {
								<p>"Your answers are kept. Saving failed, please retry."</p>
								<button on:click=move |_| send(QuizEvent::RetrySubmit)>"Save again"</button>
							}
						}
					>
						<p>{move || format!("Saving {} answers...", snapshot.with(|s| s.answered))}</p>
					</Show>
				</div>
			}
				.into_any()
		}
		QuizPhase::Done | QuizPhase::Cancelled => view! { <p>"The study is over. Thank you!"</p> }.into_any(),
	};

	view! {
		<section class="page quiz-page">
			<header class="quiz-status">
				<span>
					{move || snapshot.with(|s| format!("Question {} of {}", s.question, s.question_count))}
				</span>
				<span class="clock" title="Time left for the whole test">
					{move || format_clock(snapshot.with(|s| s.total_left))}
				</span>
				<span class="clock" title="Time left for this font">
					{move || format_clock(snapshot.with(|s| s.question_left))}
				</span>
			</header>
			<details class="variation-config">
				<summary>"What may vary"</summary>
				{config_toggle(snapshot, send, "Weight", |c| c.vary_weight, |c, v| c.vary_weight = v)}
				{config_toggle(snapshot, send, "Style", |c| c.vary_style, |c, v| c.vary_style = v)}
				{config_toggle(snapshot, send, "Letter spacing", |c| c.vary_spacing, |c, v| c.vary_spacing = v)}
				{config_toggle(snapshot, send, "Size", |c| c.vary_size, |c, v| c.vary_size = v)}
				{config_toggle(snapshot, send, "Line height", |c| c.vary_leading, |c, v| c.vary_leading = v)}
			</details>
			{body}
		</section>
	}
}
