use log::{debug, info};

use super::types::{StudyReaction, Variation, VariationConfig};
use crate::config::QuizSettings;
use crate::session::Notification;

pub const MAX_CUSTOM_TEXTS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub enum QuizPhase {
	AwaitingVariation,
	Presenting(Variation),
	/// Collected answers are being (or failed to be) saved.
	Finished,
	Done,
	Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub enum QuizEvent {
	Start,
	VariationLoaded(Variation),
	AllSeen(Option<String>),
	VariationNotFound,
	FetchFailed(String),
	/// One second of wall time passed.
	Tick,
	ReactionChanged(String),
	Next,
	SubmitSucceeded(Option<String>),
	SubmitFailed(String),
	RetrySubmit,
	UpdateConfig(VariationConfig),
	AddCustomText(String),
	RemoveCustomText(usize),
	Unmount,
}

/// Side effects the owner must perform; results come back as events.
#[derive(Clone, Debug, PartialEq)]
pub enum QuizCommand {
	FetchVariation(VariationConfig),
	Submit(Vec<StudyReaction>),
	Notify(Notification),
	Navigate(Notification),
}

/// Read-only view of the controller for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizSnapshot {
	pub phase: QuizPhase,
	pub question: u32,
	pub question_count: u32,
	pub total_left: u32,
	pub question_left: u32,
	pub reaction: String,
	pub custom_texts: Vec<String>,
	pub config: VariationConfig,
	pub answered: usize,
	pub loading: bool,
	pub saving: bool,
}

/// Timed survey state machine.
///
/// It never touches timers or the network itself: the owner feeds it
/// [`QuizEvent`]s (including a `Tick` per second) and carries out the
/// returned [`QuizCommand`]s.
pub struct QuizController {
	settings: QuizSettings,
	phase: QuizPhase,
	question: u32,
	total_left: u32,
	question_left: u32,
	reaction: String,
	custom_texts: Vec<String>,
	config: VariationConfig,
	results: Vec<StudyReaction>,
	fetch_in_flight: bool,
	submitting: bool,
	finish_message: Option<String>,
}

impl QuizController {
	pub fn new(settings: QuizSettings) -> Self {
		Self {
			settings,
			phase: QuizPhase::AwaitingVariation,
			question: 1,
			total_left: settings.total_secs,
			question_left: settings.question_secs,
			reaction: String::new(),
			custom_texts: Vec::new(),
			config: VariationConfig::default(),
			results: Vec::new(),
			fetch_in_flight: false,
			submitting: false,
			finish_message: None,
		}
	}

	pub fn phase(&self) -> &QuizPhase {
		&self.phase
	}

	pub fn results(&self) -> &[StudyReaction] {
		&self.results
	}

	fn is_running(&self) -> bool {
		matches!(self.phase, QuizPhase::AwaitingVariation | QuizPhase::Presenting(_))
	}

	pub fn snapshot(&self) -> QuizSnapshot {
		QuizSnapshot {
			phase: self.phase.clone(),
			question: self.question.min(self.settings.question_count),
			question_count: self.settings.question_count,
			total_left: self.total_left,
			question_left: self.question_left,
			reaction: self.reaction.clone(),
			custom_texts: self.custom_texts.clone(),
			config: self.config,
			answered: self.results.len(),
			loading: self.fetch_in_flight,
			saving: self.submitting,
		}
	}

	pub fn handle(&mut self, event: QuizEvent) -> Vec<QuizCommand> {
		if self.phase == QuizPhase::Cancelled {
			debug!("quiz: ignoring {event:?} after unmount");
			return Vec::new();
		}
		match event {
			QuizEvent::Unmount => {
				self.phase = QuizPhase::Cancelled;
				Vec::new()
			}
			QuizEvent::Start => {
				if self.phase == QuizPhase::AwaitingVariation {
					self.request_fetch()
				} else {
					Vec::new()
				}
			}
			QuizEvent::VariationLoaded(variation) => {
				self.fetch_in_flight = false;
				if self.phase == QuizPhase::AwaitingVariation {
					self.question_left = self.settings.question_secs;
					self.phase = QuizPhase::Presenting(variation);
				}
				Vec::new()
			}
			QuizEvent::AllSeen(message) => {
				self.fetch_in_flight = false;
				if !self.is_running() {
					return Vec::new();
				}
				self.finish(Some(
					message.unwrap_or_else(|| "You have completed every available variation!".into()),
				))
			}
			QuizEvent::VariationNotFound => {
				self.fetch_in_flight = false;
				if !self.is_running() {
					return Vec::new();
				}
				self.finish(Some("No fonts were found.".into()))
			}
			QuizEvent::FetchFailed(reason) => {
				self.fetch_in_flight = false;
				vec![QuizCommand::Notify(Notification::error(format!(
					"Could not load the next font: {reason}"
				)))]
			}
			QuizEvent::Tick => self.tick(),
			QuizEvent::ReactionChanged(text) => {
				if matches!(self.phase, QuizPhase::Presenting(_)) {
					self.reaction = text;
				}
				Vec::new()
			}
			QuizEvent::Next => self.advance(),
			QuizEvent::SubmitSucceeded(message) => {
				if self.phase != QuizPhase::Finished || !self.submitting {
					return Vec::new();
				}
				self.submitting = false;
				self.phase = QuizPhase::Done;
				let message = message
					.or_else(|| self.finish_message.clone())
					.unwrap_or_else(|| "Study completed and saved!".into());
				info!("quiz: {} answers saved", self.results.len());
				vec![QuizCommand::Navigate(Notification::success(message))]
			}
			QuizEvent::SubmitFailed(reason) => {
				if self.phase != QuizPhase::Finished {
					return Vec::new();
				}
				self.submitting = false;
				vec![QuizCommand::Notify(Notification::error(format!(
					"Could not save your answers: {reason}"
				)))]
			}
			QuizEvent::RetrySubmit => {
				if self.phase != QuizPhase::Finished || self.submitting || self.results.is_empty() {
					return Vec::new();
				}
				self.submitting = true;
				vec![QuizCommand::Submit(self.results.clone())]
			}
			QuizEvent::UpdateConfig(config) => {
				self.config = config;
				Vec::new()
			}
			QuizEvent::AddCustomText(text) => {
				let text = text.trim();
				if !text.is_empty() && self.custom_texts.len() < MAX_CUSTOM_TEXTS {
					self.custom_texts.push(text.to_string());
				}
				Vec::new()
			}
			QuizEvent::RemoveCustomText(index) => {
				if index < self.custom_texts.len() {
					self.custom_texts.remove(index);
				}
				Vec::new()
			}
		}
	}

	fn request_fetch(&mut self) -> Vec<QuizCommand> {
		if self.fetch_in_flight {
			return Vec::new();
		}
		self.fetch_in_flight = true;
		self.question_left = self.settings.question_secs;
		vec![QuizCommand::FetchVariation(self.config)]
	}

	fn tick(&mut self) -> Vec<QuizCommand> {
		if !self.is_running() {
			return Vec::new();
		}
		self.total_left = self.total_left.saturating_sub(1);
		if self.total_left == 0 {
			info!("quiz: overall time expired at question {}", self.question);
			let mut commands = vec![QuizCommand::Notify(Notification::error("Overall test time has expired!"))];
			commands.extend(self.finish(None));
			return commands;
		}
		if matches!(self.phase, QuizPhase::Presenting(_)) {
			self.question_left = self.question_left.saturating_sub(1);
			if self.question_left == 0 {
				debug!("quiz: question {} timed out", self.question);
				self.reaction.clear();
				return self.advance();
			}
		}
		Vec::new()
	}

	/// Records the current answer and moves on. Leaving `Presenting` is what
	/// stops the question countdown, so a timeout racing a manual `Next`
	/// cannot advance twice.
	fn advance(&mut self) -> Vec<QuizCommand> {
		let QuizPhase::Presenting(variation) = &self.phase else {
			return Vec::new();
		};
		self.results.push(StudyReaction::new(variation, &self.reaction));
		self.reaction.clear();
		self.custom_texts.clear();

		self.question += 1;
		if self.question <= self.settings.question_count {
			self.phase = QuizPhase::AwaitingVariation;
			self.request_fetch()
		} else {
			self.finish(None)
		}
	}

	fn finish(&mut self, message: Option<String>) -> Vec<QuizCommand> {
		self.phase = QuizPhase::Finished;
		self.finish_message = message;
		if self.results.is_empty() {
			self.phase = QuizPhase::Done;
			let message = self
				.finish_message
				.clone()
				.unwrap_or_else(|| "The study is over, but no answers were given.".into());
			return vec![QuizCommand::Navigate(Notification::info(message))];
		}
		self.submitting = true;
		let skipped = self.results.iter().filter(|r| r.is_skipped()).count();
		info!("quiz: submitting {} answers, {skipped} skipped", self.results.len());
		vec![QuizCommand::Submit(self.results.clone())]
	}
}
