use serde::{Deserialize, Serialize};

/// Recorded when a question times out or is answered blank.
pub const SKIPPED: &str = "[skipped]";

/// Which typographic axes the backend may vary when picking a variation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationConfig {
	pub vary_weight: bool,
	pub vary_style: bool,
	pub vary_spacing: bool,
	pub vary_size: bool,
	pub vary_leading: bool,
}

impl Default for VariationConfig {
	fn default() -> Self {
		Self {
			vary_weight: true,
			vary_style: true,
			vary_spacing: true,
			vary_size: true,
			vary_leading: true,
		}
	}
}

fn default_weight() -> u32 {
	400
}

fn default_style() -> String {
	"normal".into()
}

fn default_size() -> f64 {
	16.0
}

fn default_leading() -> f64 {
	1.5
}

/// One font rendering presented to the participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variation {
	pub cipher_id: u64,
	/// Font family name.
	#[serde(default)]
	pub result: String,
	#[serde(default = "default_weight")]
	pub font_weight: u32,
	#[serde(default = "default_style")]
	pub font_style: String,
	#[serde(default)]
	pub letter_spacing: f64,
	#[serde(default = "default_size")]
	pub font_size: f64,
	#[serde(default = "default_leading")]
	pub line_height: f64,
}

impl Variation {
	pub fn display_name(&self) -> String {
		let style = if self.font_style == "normal" { "" } else { self.font_style.as_str() };
		format!(
			"{} {} {} LS:{} SZ:{} LH:{}",
			self.result, self.font_weight, style, self.letter_spacing, self.font_size, self.line_height
		)
		.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ")
	}

	/// Inline CSS for the sample text.
	pub fn css(&self) -> String {
		let family = if self.result.is_empty() { "sans-serif" } else { self.result.as_str() };
		format!(
			"font-family: {family}; font-weight: {}; font-style: {}; letter-spacing: {}px; font-size: {}pt; line-height: {}; word-break: break-word;",
			self.font_weight, self.font_style, self.letter_spacing, self.font_size, self.line_height
		)
	}
}

/// One answer in the submitted batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyReaction {
	pub cipher_id: u64,
	pub reaction_description: String,
	pub font_weight: u32,
	pub font_style: String,
	pub letter_spacing: f64,
	pub font_size: f64,
	pub line_height: f64,
}

impl StudyReaction {
	pub fn new(variation: &Variation, reaction: &str) -> Self {
		let reaction = reaction.trim();
		Self {
			cipher_id: variation.cipher_id,
			reaction_description: if reaction.is_empty() { SKIPPED.into() } else { reaction.into() },
			font_weight: variation.font_weight,
			font_style: variation.font_style.clone(),
			letter_spacing: variation.letter_spacing,
			font_size: variation.font_size,
			line_height: variation.line_height,
		}
	}

	pub fn is_skipped(&self) -> bool {
		self.reaction_description == SKIPPED
	}
}

/// `m:ss`
pub fn format_clock(secs: u32) -> String {
	format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn variation_defaults_and_display() {
		let v: Variation = serde_json::from_str(r#"{"cipher_id": 2, "result": "Lora"}"#).unwrap();
		assert_eq!(v.font_weight, 400);
		assert_eq!(v.display_name(), "Lora 400 LS:0 SZ:16 LH:1.5");

		let italic = Variation {
			font_style: "italic".into(),
			..v
		};
		assert_eq!(italic.display_name(), "Lora 400 italic LS:0 SZ:16 LH:1.5");
	}

	#[test]
	fn blank_reaction_is_skipped() {
		let v: Variation = serde_json::from_str(r#"{"cipher_id": 2}"#).unwrap();
		assert!(StudyReaction::new(&v, "   ").is_skipped());
		assert_eq!(StudyReaction::new(&v, " warm ").reaction_description, "warm");
	}

	#[test]
	fn clock_format() {
		assert_eq!(format_clock(3600), "60:00");
		assert_eq!(format_clock(65), "1:05");
		assert_eq!(format_clock(0), "0:00");
	}
}
