use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::types::{Graph, GraphEdge, GraphNode, NodeKind, RawAssociationRecord};

/// Reaction labels longer than this are cut.
pub const LABEL_MAX_CHARS: usize = 50;
const LABEL_KEEP_CHARS: usize = 47;

pub const DEFAULT_WEIGHT_SCALE: f64 = 5.0;

/// How records sharing the same (font, reaction) pair become edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeMerge {
	/// One edge per record, each carrying its own count.
	#[default]
	PerRecord,
	/// One edge per pair, counts summed.
	SumPairs,
	/// One edge per pair, the last record's count wins.
	LastWins,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateOptions {
	pub edge_merge: EdgeMerge,
	pub weight_scale: f64,
}

impl Default for AggregateOptions {
	fn default() -> Self {
		Self {
			edge_merge: EdgeMerge::default(),
			weight_scale: DEFAULT_WEIGHT_SCALE,
		}
	}
}

/// Sub-linear visual size: `1 + ln(1 + degree) * scale`.
pub fn node_weight(degree: u64, scale: f64) -> f64 {
	1.0 + (degree as f64).ln_1p() * scale
}

pub fn reaction_label(text: &str) -> String {
	let shown = if text.chars().count() > LABEL_MAX_CHARS {
		let head: String = text.chars().take(LABEL_KEEP_CHARS).collect();
		format!("{head}...")
	} else if text.is_empty() {
		" ".to_string()
	} else {
		text.to_string()
	};
	format!("<i>{shown}</i>")
}

struct NodeTable {
	nodes: Vec<GraphNode>,
	index: HashMap<String, usize>,
}

impl NodeTable {
	fn ensure(&mut self, id: &str, kind: NodeKind) -> usize {
		if let Some(&i) = self.index.get(id) {
			return i;
		}
		let label = match kind {
			NodeKind::Font => id.to_string(),
			NodeKind::Reaction => reaction_label(id),
		};
		self.nodes.push(GraphNode {
			id: id.to_string(),
			kind,
			label,
			degree: 0,
			weight: 0.0,
		});
		self.index.insert(id.to_string(), self.nodes.len() - 1);
		self.nodes.len() - 1
	}
}

/// Builds the association graph from backend rows.
///
/// Rows without a font name or reaction text are dropped. Output order is
/// the order of first appearance.
pub fn aggregate(records: &[RawAssociationRecord], options: &AggregateOptions) -> Graph {
	let mut table = NodeTable {
		nodes: Vec::new(),
		index: HashMap::new(),
	};
	let mut edges: Vec<GraphEdge> = Vec::new();
	let mut pair_index: HashMap<(String, String), usize> = HashMap::new();
	let mut skipped = 0usize;

	for (index, record) in records.iter().enumerate() {
		let (Some(source), Some(target)) = (record.name.as_deref(), record.description.as_deref())
		else {
			skipped += 1;
			continue;
		};
		if source.is_empty() {
			skipped += 1;
			continue;
		}
		let count = record.effective_count();

		let s = table.ensure(source, NodeKind::Font);
		table.nodes[s].degree += count;
		let t = table.ensure(target, NodeKind::Reaction);
		table.nodes[t].degree += count;

		match options.edge_merge {
			EdgeMerge::PerRecord => edges.push(GraphEdge {
				id: format!("edge-{source}--->{target}-{index}"),
				from: source.to_string(),
				to: target.to_string(),
				weight: count,
			}),
			merge => {
				let key = (source.to_string(), target.to_string());
				match pair_index.get(&key) {
					Some(&i) if merge == EdgeMerge::SumPairs => edges[i].weight += count,
					Some(&i) => edges[i].weight = count,
					None => {
						pair_index.insert(key, edges.len());
						edges.push(GraphEdge {
							id: format!("edge-{source}--->{target}"),
							from: source.to_string(),
							to: target.to_string(),
							weight: count,
						});
					}
				}
			}
		}
	}

	let mut nodes = table.nodes;
	for node in &mut nodes {
		node.weight = node_weight(node.degree, options.weight_scale);
	}
	if skipped > 0 {
		debug!("aggregate: dropped {skipped} malformed records");
	}
	let graph = Graph { nodes, edges };
	debug_assert!(graph.is_consistent());
	graph
}
