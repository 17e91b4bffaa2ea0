use crate::graph::{Highlight, NodeKind};

pub const FONT_COLOR: &str = "#1f77b4";
pub const REACTION_COLOR: &str = "#2ca02c";
pub const MATCHED_FONT_COLOR: &str = "#ff7f0e";
pub const MATCHED_REACTION_COLOR: &str = "#d62728";

/// World-space radius of a weight-1 node.
pub const BASE_RADIUS: f64 = 5.0;

/// How one graph node is painted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub color: &'static str,
	pub radius: f64,
	pub italic: bool,
	pub matched: bool,
}

impl NodeStyle {
	pub fn new(kind: NodeKind, highlight: Highlight, weight: f64) -> Self {
		let color = match (kind, highlight) {
			(NodeKind::Font, Highlight::MatchedFont) => MATCHED_FONT_COLOR,
			(NodeKind::Reaction, Highlight::MatchedReaction) => MATCHED_REACTION_COLOR,
			(NodeKind::Font, _) => FONT_COLOR,
			(NodeKind::Reaction, _) => REACTION_COLOR,
		};
		Self {
			color,
			// weight grows logarithmically; sqrt keeps hubs readable
			radius: BASE_RADIUS * weight.max(1.0).sqrt(),
			italic: kind == NodeKind::Reaction,
			matched: highlight != Highlight::None,
		}
	}

	pub fn mass(&self) -> f32 {
		(10.0 * self.radius / BASE_RADIUS) as f32
	}
}

/// Stroke width for an edge of the given frequency, before zoom scaling.
pub fn edge_width(weight: u64) -> f64 {
	1.0 + (weight.max(1) as f64).ln()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn matched_nodes_switch_color() {
		let plain = NodeStyle::new(NodeKind::Font, Highlight::None, 1.0);
		let matched = NodeStyle::new(NodeKind::Font, Highlight::MatchedFont, 1.0);
		assert_eq!(plain.color, FONT_COLOR);
		assert_eq!(matched.color, MATCHED_FONT_COLOR);
		assert!(matched.matched && !plain.matched);

		let reaction = NodeStyle::new(NodeKind::Reaction, Highlight::MatchedReaction, 1.0);
		assert_eq!(reaction.color, MATCHED_REACTION_COLOR);
		assert!(reaction.italic);
	}

	#[test]
	fn heavier_nodes_are_larger() {
		let light = NodeStyle::new(NodeKind::Reaction, Highlight::None, 1.0);
		let heavy = NodeStyle::new(NodeKind::Reaction, Highlight::None, 9.0);
		assert_eq!(light.radius, BASE_RADIUS);
		assert_eq!(heavy.radius, 3.0 * BASE_RADIUS);
		assert!(heavy.mass() > light.mass());
		assert_eq!(edge_width(1), 1.0);
		assert!(edge_width(20) > edge_width(2));
	}
}
