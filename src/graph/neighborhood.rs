use std::collections::{HashMap, HashSet};

use super::types::{Graph, GraphEdge, GraphNode, NodeId};

/// Nodes keyed by id, remembering insertion order.
#[derive(Default)]
struct Level<'a> {
	order: Vec<&'a GraphNode>,
	ids: HashSet<&'a str>,
}

impl<'a> Level<'a> {
	fn insert(&mut self, node: &'a GraphNode) {
		if self.ids.insert(node.id.as_str()) {
			self.order.push(node);
		}
	}

	fn contains(&self, id: &str) -> bool {
		self.ids.contains(id)
	}
}

#[derive(Default)]
struct EdgeSet {
	order: Vec<GraphEdge>,
	ids: HashSet<String>,
}

impl EdgeSet {
	fn keep(&mut self, edge: &GraphEdge) {
		if self.ids.insert(edge.id.clone()) {
			self.order.push(edge.clone());
		}
	}
}

/// Induced two-hop neighborhood around `seed_ids`.
///
/// Only edges walked while stepping from the seeds outwards are kept, so two
/// second-ring nodes that happen to be adjacent are not joined.
pub fn expand(seed_ids: &[NodeId], graph: &Graph) -> Graph {
	if seed_ids.is_empty() {
		return Graph::default();
	}
	let by_id: HashMap<&str, &GraphNode> = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

	let mut level0 = Level::default();
	for id in seed_ids {
		if let Some(&node) = by_id.get(id.as_str()) {
			level0.insert(node);
		}
	}
	if level0.order.is_empty() {
		return Graph::default();
	}

	let edges: Vec<GraphEdge> = graph
		.edges
		.iter()
		.enumerate()
		.map(|(i, e)| {
			if e.id.is_empty() {
				GraphEdge {
					id: format!("edge-{i}"),
					..e.clone()
				}
			} else {
				e.clone()
			}
		})
		.collect();

	let mut level1 = Level::default();
	let mut kept = EdgeSet::default();

	for edge in &edges {
		let (from0, to0) = (level0.contains(&edge.from), level0.contains(&edge.to));
		let outward = match (from0, to0) {
			(true, false) => Some(edge.to.as_str()),
			(false, true) => Some(edge.from.as_str()),
			(true, true) => {
				kept.keep(edge);
				None
			}
			(false, false) => None,
		};
		if let Some(&node) = outward.and_then(|id| by_id.get(id)) {
			level1.insert(node);
			kept.keep(edge);
		}
	}

	let mut level2 = Level::default();
	for edge in &edges {
		let (from1, to1) = (level1.contains(&edge.from), level1.contains(&edge.to));
		let (from0, to0) = (level0.contains(&edge.from), level0.contains(&edge.to));
		let outward = if from1 && !to0 && !to1 {
			Some(edge.to.as_str())
		} else if to1 && !from0 && !from1 {
			Some(edge.from.as_str())
		} else {
			if from1 && to1 {
				kept.keep(edge);
			}
			None
		};
		if let Some(&node) = outward.and_then(|id| by_id.get(id)) {
			level2.insert(node);
			kept.keep(edge);
		}
	}

	let mut seen: HashSet<&str> = HashSet::new();
	let nodes = level0
		.order
		.into_iter()
		.chain(level1.order)
		.chain(level2.order)
		.filter(|&n| seen.insert(n.id.as_str()))
		.cloned()
		.collect();

	Graph {
		nodes,
		edges: kept.order,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::aggregate::{AggregateOptions, aggregate};
	use crate::graph::types::{NodeKind, RawAssociationRecord};

	fn node(id: &str) -> GraphNode {
		GraphNode {
			id: id.to_string(),
			kind: NodeKind::Font,
			label: id.to_string(),
			degree: 1,
			weight: 1.0,
		}
	}

	fn edge(id: &str, from: &str, to: &str) -> GraphEdge {
		GraphEdge {
			id: id.to_string(),
			from: from.to_string(),
			to: to.to_string(),
			weight: 1,
		}
	}

	fn ids(g: &Graph) -> Vec<&str> {
		g.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn empty_or_unknown_seeds_give_empty_graph() {
		let g = aggregate(
			&[RawAssociationRecord::new("Arial", "calm", 1)],
			&AggregateOptions::default(),
		);
		assert!(expand(&[], &g).is_empty());
		assert!(expand(&["nonexistent-id".to_string()], &g).is_empty());
	}

	#[test]
	fn arial_expands_through_calm_to_times() {
		let g = aggregate(
			&[
				RawAssociationRecord::new("Arial", "calm", 3),
				RawAssociationRecord::new("Arial", "bold feel", 1),
				RawAssociationRecord::new("Times", "calm", 2),
			],
			&AggregateOptions::default(),
		);
		let out = expand(&["Arial".to_string()], &g);
		assert_eq!(ids(&out), ["Arial", "calm", "bold feel", "Times"]);
		let edges: Vec<(&str, &str)> = out.edges.iter().map(|e| (e.from.as_str(), e.to.as_str())).collect();
		assert_eq!(edges, [("Arial", "calm"), ("Arial", "bold feel"), ("Times", "calm")]);
		assert!(out.is_consistent());
	}

	#[test]
	fn edges_between_outer_ring_nodes_are_not_kept() {
		// a - b - c, a - b - d, and c - d directly
		let g = Graph {
			nodes: ["a", "b", "c", "d", "e"].into_iter().map(node).collect(),
			edges: vec![
				edge("ab", "a", "b"),
				edge("bc", "b", "c"),
				edge("bd", "b", "d"),
				edge("cd", "c", "d"),
				edge("de", "d", "e"),
			],
		};
		let out = expand(&["a".to_string()], &g);
		assert_eq!(ids(&out), ["a", "b", "c", "d"]);
		let kept: Vec<&str> = out.edges.iter().map(|e| e.id.as_str()).collect();
		assert_eq!(kept, ["ab", "bc", "bd"]);
	}

	#[test]
	fn edges_among_seeds_and_first_ring_are_kept() {
		let g = Graph {
			nodes: ["a", "b", "c", "d"].into_iter().map(node).collect(),
			edges: vec![
				edge("ab", "a", "b"),
				edge("ac", "a", "c"),
				edge("bc", "b", "c"),
				edge("ad", "a", "d"),
			],
		};
		let out = expand(&["a".to_string(), "d".to_string()], &g);
		assert_eq!(ids(&out), ["a", "d", "b", "c"]);
		let kept: Vec<&str> = out.edges.iter().map(|e| e.id.as_str()).collect();
		assert_eq!(kept, ["ab", "ac", "ad", "bc"]);
	}

	#[test]
	fn missing_and_duplicate_edge_ids_are_tolerated() {
		let g = Graph {
			nodes: ["a", "b", "c"].into_iter().map(node).collect(),
			edges: vec![edge("", "a", "b"), edge("dup", "a", "c"), edge("dup", "c", "a"), edge("x", "a", "ghost")],
		};
		let out = expand(&["a".to_string()], &g);
		assert_eq!(ids(&out), ["a", "b", "c"]);
		let kept: Vec<&str> = out.edges.iter().map(|e| e.id.as_str()).collect();
		assert_eq!(kept, ["edge-0", "dup"]);
	}
}
