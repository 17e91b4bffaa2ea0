use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::types::NodeStyle;
use crate::graph::{DisplayGraph, NodeId};

/// Extra world-space slack around a node when hit testing.
pub const HIT_SLACK: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: NodeId,
	pub label: String,
	pub tooltip: String,
	pub style: Option<NodeStyle>,
}

impl NodeInfo {
	pub fn radius(&self) -> f64 {
		self.style.map_or(super::types::BASE_RADIUS, |s| s.radius)
	}
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	node_count: usize,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
	/// Summed frequency of every edge between an ordered node pair.
	weights: HashMap<(DefaultNodeIdx, DefaultNodeIdx), u64>,
}

impl ForceGraphState {
	pub fn new(display: &DisplayGraph, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut id_to_idx = HashMap::new();
		let mut edges = Vec::new();
		let mut weights = HashMap::new();
		let count = display.graph.nodes.len().max(1) as f64;
		// spread the initial ring with the graph so big graphs settle faster
		let ring = 100.0 + 4.0 * count.sqrt();

		for (i, node) in display.graph.nodes.iter().enumerate() {
			let style = NodeStyle::new(node.kind, display.highlight_of(&node.id), node.weight);
			let angle = (i as f64) * 2.0 * PI / count;
			let (x, y) = ((width / 2.0 + ring * angle.cos()) as f32, (height / 2.0 + ring * angle.sin()) as f32);

			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: style.mass(),
				is_anchor: false,
				user_data: NodeInfo {
					id: node.id.clone(),
					label: node.plain_label(),
					tooltip: node.tooltip(),
					style: Some(style),
				},
			});
			id_to_idx.insert(node.id.as_str(), idx);
		}

		for edge in &display.graph.edges {
			let (Some(&src), Some(&tgt)) = (id_to_idx.get(edge.from.as_str()), id_to_idx.get(edge.to.as_str())) else {
				continue;
			};
			// parallel per-record edges share one spring
			match weights.entry((src, tgt)) {
				Entry::Occupied(mut summed) => *summed.get_mut() += edge.weight,
				Entry::Vacant(slot) => {
					slot.insert(edge.weight);
					graph.add_edge(src, tgt, EdgeData::default());
					edges.push((src, tgt));
				}
			}
		}

		Self {
			graph,
			node_count: display.graph.nodes.len(),
			edges,
			weights,
			transform: ViewTransform {
				x: 0.0,
				y: 0.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
		}
	}

	/// Swaps in a new graph, keeping the current pan and zoom.
	pub fn replace(&mut self, display: &DisplayGraph) {
		let transform = self.transform.clone();
		*self = Self::new(display, self.width, self.height);
		self.transform = transform;
	}

	pub fn node_count(&self) -> usize {
		self.node_count
	}

	pub fn edge_weight(&self, src: DefaultNodeIdx, tgt: DefaultNodeIdx) -> u64 {
		self.weights.get(&(src, tgt)).copied().unwrap_or(1)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.transform.x) / self.transform.k, (sy - self.transform.y) / self.transform.k)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < node.data.user_data.radius() + HIT_SLACK {
				found = Some(node.index());
			}
		});
		found
	}

	/// Tooltip of the node under the pointer.
	pub fn hovered_tooltip(&self) -> Option<String> {
		let idx = self.hover.node?;
		let mut tooltip = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				tooltip = Some(node.data.user_data.tooltip.clone());
			}
		});
		tooltip
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the old neighborhood around while it fades out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in &self.edges {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let (target, delay, speed) = if self.hover.node.is_some() { (1.0, 0.08, 1.8) } else { (0.0, 0.0, 1.26) };

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{AggregateOptions, EdgeMerge, FilterState, RawAssociationRecord, aggregate};

	fn display(merge: EdgeMerge) -> DisplayGraph {
		let records = [
			RawAssociationRecord::new("Arial", "calm", 2),
			RawAssociationRecord::new("Arial", "calm", 3),
			RawAssociationRecord::new("Times", "calm", 1),
		];
		let options = AggregateOptions {
			edge_merge: merge,
			..AggregateOptions::default()
		};
		DisplayGraph::plain(aggregate(&records, &options))
	}

	fn index_of(state: &ForceGraphState, id: &str) -> DefaultNodeIdx {
		let mut found = None;
		state.graph.visit_nodes(|node| {
			if node.data.user_data.id == id {
				found = Some(node.index());
			}
		});
		found.unwrap()
	}

	#[test]
	fn parallel_edges_collapse_into_one_spring() {
		let state = ForceGraphState::new(&display(EdgeMerge::PerRecord), 800.0, 600.0);
		assert_eq!(state.node_count(), 3);
		assert_eq!(state.edges.len(), 2);
		let (arial, calm) = (index_of(&state, "Arial"), index_of(&state, "calm"));
		assert_eq!(state.edge_weight(arial, calm), 5);
	}

	#[test]
	fn springs_follow_first_appearance_of_each_pair() {
		let fonts = ["Arial", "Times", "Lora"];
		let records: Vec<_> = (0..300)
			.map(|i| RawAssociationRecord::new(fonts[i % 3], "calm", 1))
			.collect();
		let state = ForceGraphState::new(&DisplayGraph::plain(aggregate(&records, &AggregateOptions::default())), 800.0, 600.0);

		let calm = index_of(&state, "calm");
		let springs: Vec<_> = fonts.iter().map(|f| (index_of(&state, f), calm)).collect();
		assert_eq!(state.edges, springs);
		for (src, tgt) in springs {
			assert_eq!(state.edge_weight(src, tgt), 100);
		}
	}

	#[test]
	fn hover_collects_neighbors_and_tooltip() {
		let mut state = ForceGraphState::new(&display(EdgeMerge::SumPairs), 800.0, 600.0);
		let calm = index_of(&state, "calm");
		state.set_hover(Some(calm));
		assert_eq!(state.hover.neighbors.len(), 2);
		assert!(state.is_highlighted(index_of(&state, "Times")));
		assert_eq!(state.hovered_tooltip().unwrap(), "Reaction: calm\nWeighted links: 6");

		state.set_hover(None);
		assert!(state.has_active_highlight());
		assert!(state.hovered_tooltip().is_none());
	}

	#[test]
	fn hit_test_uses_node_radius() {
		let state = ForceGraphState::new(&display(EdgeMerge::SumPairs), 800.0, 600.0);
		let mut position = None;
		state.graph.visit_nodes(|node| {
			if node.data.user_data.id == "calm" {
				position = Some((node.x() as f64, node.y() as f64, node.data.user_data.radius()));
			}
		});
		let (x, y, radius) = position.unwrap();
		assert_eq!(state.node_at_position(x + radius, y), Some(index_of(&state, "calm")));
		assert_eq!(state.node_at_position(x + radius + HIT_SLACK + 50.0, y + 500.0), None);
	}

	#[test]
	fn replace_keeps_view_transform() {
		let mut state = ForceGraphState::new(&display(EdgeMerge::SumPairs), 800.0, 600.0);
		state.transform.k = 2.5;
		let focused = FilterState {
			keyword: "Times".into(),
			..FilterState::default()
		};
		state.replace(&focused.apply(&display(EdgeMerge::SumPairs).graph));
		assert_eq!(state.transform.k, 2.5);
		assert_eq!(state.node_count(), 3);
	}
}
