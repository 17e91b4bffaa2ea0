use std::collections::HashMap;

use super::neighborhood::expand;
use super::threshold::{EdgeRule, filter_edges};
use super::types::{Graph, NodeId, NodeKind};

/// Ids of nodes whose id or plain label contains `keyword`, ignoring case.
/// A blank keyword matches nothing.
pub fn match_nodes(graph: &Graph, keyword: &str) -> Vec<NodeId> {
	let needle = keyword.trim().to_lowercase();
	if needle.is_empty() {
		return Vec::new();
	}
	graph
		.nodes
		.iter()
		.filter(|n| n.id.to_lowercase().contains(&needle) || n.plain_label().to_lowercase().contains(&needle))
		.map(|n| n.id.clone())
		.collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Highlight {
	#[default]
	None,
	MatchedFont,
	MatchedReaction,
}

/// A graph ready for the canvas plus per-node styling overlays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayGraph {
	pub graph: Graph,
	highlights: HashMap<NodeId, Highlight>,
}

impl DisplayGraph {
	pub fn plain(graph: Graph) -> Self {
		Self {
			graph,
			highlights: HashMap::new(),
		}
	}

	pub fn highlight_of(&self, id: &str) -> Highlight {
		self.highlights.get(id).copied().unwrap_or_default()
	}

	pub fn highlighted_count(&self) -> usize {
		self.highlights.len()
	}
}

/// Keyword and edge rule currently set in the graph toolbar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterState {
	pub keyword: String,
	pub edge_rule: EdgeRule,
}

impl FilterState {
	pub fn is_keyword_active(&self) -> bool {
		!self.keyword.trim().is_empty()
	}

	/// Derives the view of `base`; `base` itself is left untouched.
	pub fn apply(&self, base: &Graph) -> DisplayGraph {
		if !self.is_keyword_active() {
			return DisplayGraph::plain(filter_edges(base, self.edge_rule));
		}

		let matched = match_nodes(base, &self.keyword);
		let focused = filter_edges(&expand(&matched, base), self.edge_rule);
		let highlights = matched
			.into_iter()
			.filter_map(|id| {
				let kind = focused.node(&id)?.kind;
				let style = match kind {
					NodeKind::Font => Highlight::MatchedFont,
					NodeKind::Reaction => Highlight::MatchedReaction,
				};
				Some((id, style))
			})
			.collect();

		DisplayGraph {
			graph: focused,
			highlights,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::aggregate::{AggregateOptions, aggregate};
	use crate::graph::types::RawAssociationRecord;

	fn base() -> Graph {
		aggregate(
			&[
				RawAssociationRecord::new("Arial", "calm", 3),
				RawAssociationRecord::new("Arial", "bold feel", 1),
				RawAssociationRecord::new("Times", "calm", 2),
				RawAssociationRecord::new("Georgia", "Warm and cozy", 4),
			],
			&AggregateOptions::default(),
		)
	}

	#[test]
	fn matching_is_case_insensitive_over_id_and_label() {
		let g = base();
		assert_eq!(match_nodes(&g, "ARI"), ["Arial"]);
		assert_eq!(match_nodes(&g, "warm"), ["Warm and cozy"]);
		// markup is not matchable text
		assert!(match_nodes(&g, "<i>").is_empty());
	}

	#[test]
	fn blank_keyword_matches_nothing() {
		let g = base();
		assert!(match_nodes(&g, "").is_empty());
		assert!(match_nodes(&g, "   ").is_empty());
	}

	#[test]
	fn blank_filter_only_applies_edge_rule() {
		let g = base();
		let view = FilterState {
			keyword: " ".into(),
			edge_rule: EdgeRule::TopN(1),
		}
		.apply(&g);
		assert_eq!(view.graph.edges.len(), 1);
		assert_eq!(view.highlighted_count(), 0);
	}

	#[test]
	fn keyword_focuses_neighborhood_and_highlights_matches() {
		let g = base();
		let view = FilterState {
			keyword: "calm".into(),
			edge_rule: EdgeRule::None,
		}
		.apply(&g);
		let ids: Vec<&str> = view.graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["calm", "Arial", "Times", "bold feel"]);
		assert_eq!(view.highlight_of("calm"), Highlight::MatchedReaction);
		assert_eq!(view.highlight_of("Arial"), Highlight::None);

		let view = FilterState {
			keyword: "times".into(),
			edge_rule: EdgeRule::None,
		}
		.apply(&g);
		assert_eq!(view.highlight_of("Times"), Highlight::MatchedFont);
		// base graph untouched
		assert_eq!(g, base());
	}

	#[test]
	fn keyword_without_match_yields_empty_view() {
		let view = FilterState {
			keyword: "helvetica".into(),
			edge_rule: EdgeRule::None,
		}
		.apply(&base());
		assert!(view.graph.is_empty());
	}

	#[test]
	fn edge_rule_can_drop_highlighted_nodes() {
		let view = FilterState {
			keyword: "bold".into(),
			edge_rule: EdgeRule::MinFrequency(2),
		}
		.apply(&base());
		assert!(view.graph.node("bold feel").is_none());
		assert_eq!(view.highlight_of("bold feel"), Highlight::None);
	}
}
