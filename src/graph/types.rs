use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

/// Identifier shared by nodes and edge endpoints. Compared case-sensitively.
pub type NodeId = String;

/// One co-occurrence row as served by `GET /graph/`.
///
/// Fields of the wrong JSON type deserialize as absent so that one bad row
/// does not reject the whole payload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawAssociationRecord {
	#[serde(default, deserialize_with = "lenient_string")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub description: Option<String>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub count: Option<u64>,
}

impl RawAssociationRecord {
	pub fn new(name: impl Into<String>, description: impl Into<String>, count: u64) -> Self {
		Self {
			name: Some(name.into()),
			description: Some(description.into()),
			count: Some(count),
		}
	}

	/// Count with the falsy-means-one rule applied.
	pub fn effective_count(&self) -> u64 {
		match self.count {
			Some(0) | None => 1,
			Some(n) => n,
		}
	}
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = serde_json::Value::deserialize(deserializer)?;
	Ok(match value {
		serde_json::Value::String(s) => Some(s),
		_ => None,
	})
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = serde_json::Value::deserialize(deserializer)?;
	Ok(value.as_u64())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
	Font,
	Reaction,
}

impl NodeKind {
	pub fn caption(self) -> &'static str {
		match self {
			NodeKind::Font => "Font",
			NodeKind::Reaction => "Reaction",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: NodeId,
	pub kind: NodeKind,
	/// Display text. Reaction labels are wrapped in `<i>` markup.
	pub label: String,
	/// Sum of counts over every record touching this node.
	pub degree: u64,
	pub weight: f64,
}

impl GraphNode {
	/// Label with markup removed.
	pub fn plain_label(&self) -> String {
		strip_markup(&self.label)
	}

	pub fn tooltip(&self) -> String {
		format!("{}: {}\nWeighted links: {}", self.kind.caption(), self.id, self.degree)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
	pub id: String,
	pub from: NodeId,
	pub to: NodeId,
	pub weight: u64,
}

impl GraphEdge {
	pub fn tooltip(&self) -> String {
		format!("Link: {} - {}\nCount: {}", self.from, self.to, self.weight)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl Graph {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// True when every edge endpoint names a node of this graph.
	pub fn is_consistent(&self) -> bool {
		let ids: std::collections::HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
		self.edges
			.iter()
			.all(|e| ids.contains(e.from.as_str()) && ids.contains(e.to.as_str()))
	}
}

pub fn strip_markup(text: &str) -> String {
	MARKUP.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn malformed_fields_deserialize_as_absent() {
		let rows: Vec<RawAssociationRecord> = serde_json::from_str(
			r#"[
				{"name": "Arial", "description": "calm", "count": 3},
				{"name": 12, "description": "calm"},
				{"description": null, "count": "many"}
			]"#,
		)
		.unwrap();

		assert_eq!(rows[0], RawAssociationRecord::new("Arial", "calm", 3));
		assert_eq!(rows[1].name, None);
		assert_eq!(rows[1].effective_count(), 1);
		assert_eq!(rows[2].description, None);
		assert_eq!(rows[2].count, None);
	}

	#[test]
	fn zero_count_is_treated_as_one() {
		let row = RawAssociationRecord {
			count: Some(0),
			..RawAssociationRecord::new("a", "b", 1)
		};
		assert_eq!(row.effective_count(), 1);
	}

	#[test]
	fn strip_markup_removes_tags() {
		assert_eq!(strip_markup("<i>bold feel</i>"), "bold feel");
		assert_eq!(strip_markup("plain"), "plain");
	}
}
