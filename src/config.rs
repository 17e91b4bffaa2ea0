use std::{fmt::Display, str::FromStr, time::Duration};

use log::{info, warn};

use crate::graph::{AggregateOptions, DEFAULT_WEIGHT_SCALE, EdgeMerge};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Timing budget of one survey run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSettings {
	pub question_count: u32,
	pub total_secs: u32,
	pub question_secs: u32,
}

impl Default for QuizSettings {
	fn default() -> Self {
		Self {
			question_count: 20,
			total_secs: 3600,
			question_secs: 60,
		}
	}
}

impl QuizSettings {
	pub fn tick() -> Duration {
		Duration::from_secs(1)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
	pub api_base_url: String,
	pub quiz: QuizSettings,
	pub graph: AggregateOptions,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_base_url: DEFAULT_API_BASE_URL.to_string(),
			quiz: QuizSettings::default(),
			graph: AggregateOptions::default(),
		}
	}
}

impl ClientConfig {
	/// Reads build-time settings; the bundle has no runtime environment.
	pub fn load() -> Self {
		Self::from_lookup(|key| match key {
			"API_BASE_URL" => option_env!("API_BASE_URL"),
			"QUIZ_QUESTIONS" => option_env!("QUIZ_QUESTIONS"),
			"QUIZ_TOTAL_SECS" => option_env!("QUIZ_TOTAL_SECS"),
			"QUIZ_QUESTION_SECS" => option_env!("QUIZ_QUESTION_SECS"),
			"GRAPH_WEIGHT_SCALE" => option_env!("GRAPH_WEIGHT_SCALE"),
			"GRAPH_EDGE_MERGE" => option_env!("GRAPH_EDGE_MERGE"),
			_ => None,
		})
	}

	pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
		let quiz_defaults = QuizSettings::default();
		let api_base_url: String = try_load("API_BASE_URL", lookup("API_BASE_URL"), DEFAULT_API_BASE_URL.to_string());
		Self {
			api_base_url: api_base_url.trim_end_matches('/').to_string(),
			quiz: QuizSettings {
				question_count: try_load("QUIZ_QUESTIONS", lookup("QUIZ_QUESTIONS"), quiz_defaults.question_count),
				total_secs: try_load("QUIZ_TOTAL_SECS", lookup("QUIZ_TOTAL_SECS"), quiz_defaults.total_secs),
				question_secs: try_load(
					"QUIZ_QUESTION_SECS",
					lookup("QUIZ_QUESTION_SECS"),
					quiz_defaults.question_secs,
				),
			},
			graph: AggregateOptions {
				weight_scale: try_load("GRAPH_WEIGHT_SCALE", lookup("GRAPH_WEIGHT_SCALE"), DEFAULT_WEIGHT_SCALE),
				edge_merge: lookup("GRAPH_EDGE_MERGE").map_or(EdgeMerge::default(), parse_edge_merge),
			},
		}
	}
}

fn parse_edge_merge(raw: &str) -> EdgeMerge {
	match raw.trim() {
		"per_record" => EdgeMerge::PerRecord,
		"sum" => EdgeMerge::SumPairs,
		"last" => EdgeMerge::LastWins,
		other => {
			warn!("Invalid GRAPH_EDGE_MERGE value: {other}, using per_record");
			EdgeMerge::PerRecord
		}
	}
}

fn try_load<T: FromStr + Display>(key: &str, raw: Option<&str>, default: T) -> T
where
	T::Err: Display,
{
	let Some(raw) = raw else {
		info!("{key} not set, using default: {default}");
		return default;
	};
	raw.trim().parse().unwrap_or_else(|e| {
		warn!("Invalid {key} value: {e}, using default: {default}");
		default
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_when_nothing_is_set() {
		assert_eq!(ClientConfig::from_lookup(|_| None), ClientConfig::default());
	}

	#[test]
	fn values_are_parsed_and_bad_ones_fall_back() {
		let config = ClientConfig::from_lookup(|key| match key {
			"API_BASE_URL" => Some("https://study.example/api/"),
			"QUIZ_QUESTIONS" => Some("5"),
			"QUIZ_TOTAL_SECS" => Some("soon"),
			"GRAPH_EDGE_MERGE" => Some("sum"),
			_ => None,
		});
		assert_eq!(config.api_base_url, "https://study.example/api");
		assert_eq!(config.quiz.question_count, 5);
		assert_eq!(config.quiz.total_secs, 3600);
		assert_eq!(config.graph.edge_merge, EdgeMerge::SumPairs);
	}
}
