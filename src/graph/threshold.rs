use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::types::Graph;

/// Edge narrowing rule chosen in the graph toolbar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeRule {
	#[default]
	None,
	MinFrequency(u64),
	TopN(usize),
}

impl EdgeRule {
	/// Builds a rule from the toolbar's select value and free-text number.
	/// Anything that is not a positive integer yields `None`.
	pub fn parse(kind: &str, value: &str) -> Self {
		let Ok(n) = value.trim().parse::<u64>() else {
			return EdgeRule::None;
		};
		if n == 0 {
			return EdgeRule::None;
		}
		match kind {
			"frequency_above" => EdgeRule::MinFrequency(n),
			"top_n" => usize::try_from(n).map_or(EdgeRule::None, EdgeRule::TopN),
			_ => EdgeRule::None,
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			EdgeRule::None => "all",
			EdgeRule::MinFrequency(_) => "frequency_above",
			EdgeRule::TopN(_) => "top_n",
		}
	}
}

/// Applies `rule` and drops every node left without an edge.
pub fn filter_edges(graph: &Graph, rule: EdgeRule) -> Graph {
	let edges = match rule {
		EdgeRule::None | EdgeRule::MinFrequency(0) | EdgeRule::TopN(0) => return graph.clone(),
		EdgeRule::MinFrequency(n) => graph.edges.iter().filter(|e| e.weight >= n).cloned().collect::<Vec<_>>(),
		EdgeRule::TopN(n) => {
			let mut sorted = graph.edges.clone();
			// stable: equal weights keep their input order
			sorted.sort_by(|a, b| b.weight.cmp(&a.weight));
			sorted.truncate(n);
			sorted
		}
	};

	let connected: HashSet<&str> = edges
		.iter()
		.flat_map(|e| [e.from.as_str(), e.to.as_str()])
		.collect();
	let nodes = graph
		.nodes
		.iter()
		.filter(|n| connected.contains(n.id.as_str()))
		.cloned()
		.collect();

	Graph { nodes, edges }
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::graph::aggregate::{AggregateOptions, aggregate};
	use crate::graph::types::RawAssociationRecord;

	fn sample() -> Graph {
		aggregate(
			&[
				RawAssociationRecord::new("Arial", "calm", 3),
				RawAssociationRecord::new("Arial", "bold feel", 1),
				RawAssociationRecord::new("Times", "calm", 2),
				RawAssociationRecord::new("Georgia", "warm", 2),
			],
			&AggregateOptions::default(),
		)
	}

	#[test]
	fn parse_rejects_non_positive_values() {
		assert_eq!(EdgeRule::parse("frequency_above", "3"), EdgeRule::MinFrequency(3));
		assert_eq!(EdgeRule::parse("top_n", " 2 "), EdgeRule::TopN(2));
		assert_eq!(EdgeRule::parse("top_n", "0"), EdgeRule::None);
		assert_eq!(EdgeRule::parse("top_n", "-1"), EdgeRule::None);
		assert_eq!(EdgeRule::parse("top_n", "abc"), EdgeRule::None);
		assert_eq!(EdgeRule::parse("all", "5"), EdgeRule::None);
	}

	#[test]
	fn none_is_identity() {
		let g = sample();
		assert_eq!(filter_edges(&g, EdgeRule::None), g);
	}

	#[test]
	fn min_frequency_prunes_orphans() {
		let out = filter_edges(&sample(), EdgeRule::MinFrequency(2));
		let ids: Vec<&str> = out.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["Arial", "calm", "Times", "Georgia", "warm"]);
		assert_eq!(out.edges.len(), 3);
	}

	#[test]
	fn top_n_keeps_heaviest_with_stable_ties() {
		let out = filter_edges(&sample(), EdgeRule::TopN(2));
		let pairs: Vec<(&str, u64)> = out.edges.iter().map(|e| (e.from.as_str(), e.weight)).collect();
		assert_eq!(pairs, [("Arial", 3), ("Times", 2)]);
		let ids: Vec<&str> = out.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["Arial", "calm", "Times"]);
	}

	fn graph_strategy() -> impl Strategy<Value = Graph> {
		let font = prop_oneof![Just("Arial"), Just("Times"), Just("Georgia")];
		let reaction = prop_oneof![Just("calm"), Just("bold"), Just("warm"), Just("cold")];
		prop::collection::vec((font, reaction, 1u64..10), 0..20).prop_map(|rows| {
			let records: Vec<_> = rows
				.into_iter()
				.map(|(f, r, c)| RawAssociationRecord::new(f, r, c))
				.collect();
			aggregate(&records, &AggregateOptions::default())
		})
	}

	proptest! {
		#[test]
		fn min_frequency_never_leaves_isolated_nodes(g in graph_strategy(), n in 0u64..12) {
			let out = filter_edges(&g, EdgeRule::MinFrequency(n));
			for node in &out.nodes {
				prop_assert!(out.edges.iter().any(|e| e.from == node.id || e.to == node.id));
			}
			prop_assert!(out.is_consistent());
		}

		#[test]
		fn top_n_is_bounded_and_sorted(g in graph_strategy(), k in 1usize..25) {
			let out = filter_edges(&g, EdgeRule::TopN(k));
			prop_assert_eq!(out.edges.len(), k.min(g.edges.len()));
			for pair in out.edges.windows(2) {
				prop_assert!(pair[0].weight >= pair[1].weight);
				if pair[0].weight == pair[1].weight {
					let pos = |id: &str| g.edges.iter().position(|e| e.id == id);
					prop_assert!(pos(&pair[0].id) < pos(&pair[1].id));
				}
			}
		}
	}
}
