//! Seed graph: the structured concept graph extracted from designer output.
//!
//! A `SeedGraph` is only ever built from parsed nodes via
//! [`SeedGraph::from_nodes`], which derives the per-area statistics and the
//! coverage metrics, or deserialized from a previous export.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default number of nodes that counts as a "full" formulation area.
pub const DEFAULT_AREA_FILL_TARGET: u32 = 3;

/// One of the eight fixed formulation areas used to classify concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FormulationArea {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl FormulationArea {
    pub const ALL: [FormulationArea; 8] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
        Self::H,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::H => "H",
        }
    }
}

impl fmt::Display for FormulationArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulationArea {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let tag = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == tag)
            .ok_or_else(|| {
                crate::Error::Validation(format!(
                    "Unknown formulation area '{}': expected one of A-H",
                    s.trim()
                ))
            })
    }
}

impl TryFrom<String> for FormulationArea {
    type Error = crate::Error;

    fn try_from(s: String) -> crate::Result<Self> {
        s.parse()
    }
}

/// A single concept record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedNode {
    pub id: String,

    /// The text the concept was drawn from.
    #[serde(default)]
    pub source_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Dimension tags (e.g. `experiential_avoidance`).
    #[serde(default)]
    pub dimensions: Vec<String>,

    pub area: FormulationArea,

    #[serde(default)]
    pub weight: f64,

    /// Ids of linked nodes.
    #[serde(default)]
    pub links: Vec<String>,
}

/// Per-area totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaStats {
    pub node_count: usize,
    pub total_weight: f64,
}

/// Derived coverage metrics, all percentages in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Share of the eight areas holding at least one node.
    pub breadth_percentage: f64,
    /// Mean per-area fill against the fill target.
    pub depth_percentage: f64,
    pub total_nodes: usize,
    pub total_weight: f64,
}

/// The seed export structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedGraph {
    pub nodes: Vec<SeedNode>,
    pub area_summary_stats: BTreeMap<FormulationArea, AreaStats>,
    pub final_graph_metrics: GraphMetrics,
}

impl SeedGraph {
    /// Build a graph from parsed nodes, deriving stats and metrics.
    ///
    /// `fill_target` is clamped to at least 1.
    pub fn from_nodes(nodes: Vec<SeedNode>, fill_target: u32) -> Self {
        let mut stats: BTreeMap<FormulationArea, AreaStats> = FormulationArea::ALL
            .into_iter()
            .map(|a| (a, AreaStats::default()))
            .collect();

        for node in &nodes {
            let entry = stats.entry(node.area).or_default();
            entry.node_count += 1;
            entry.total_weight += node.weight;
        }

        let target = fill_target.max(1) as f64;
        let area_count = FormulationArea::ALL.len() as f64;
        let covered = stats.values().filter(|s| s.node_count > 0).count() as f64;
        let fill_sum: f64 = stats
            .values()
            .map(|s| (s.node_count as f64 / target).min(1.0))
            .sum();

        let final_graph_metrics = GraphMetrics {
            breadth_percentage: covered / area_count * 100.0,
            depth_percentage: fill_sum / area_count * 100.0,
            total_nodes: nodes.len(),
            total_weight: nodes.iter().map(|n| n.weight).sum(),
        };

        Self {
            nodes,
            area_summary_stats: stats,
            final_graph_metrics,
        }
    }

    /// Stats for one area (zeroed when absent).
    pub fn area_stats(&self, area: FormulationArea) -> AreaStats {
        self.area_summary_stats.get(&area).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, area: FormulationArea, weight: f64) -> SeedNode {
        SeedNode {
            id: id.into(),
            source_text: format!("text for {id}"),
            summary: None,
            keywords: vec![],
            dimensions: vec![],
            area,
            weight,
            links: vec![],
        }
    }

    #[test]
    fn stats_count_nodes_per_area() {
        let graph = SeedGraph::from_nodes(
            vec![
                node("n1", FormulationArea::C, 0.8),
                node("n2", FormulationArea::C, 0.5),
                node("n3", FormulationArea::D, 0.9),
            ],
            DEFAULT_AREA_FILL_TARGET,
        );
        assert_eq!(graph.area_stats(FormulationArea::C).node_count, 2);
        assert!((graph.area_stats(FormulationArea::C).total_weight - 1.3).abs() < 1e-9);
        assert_eq!(graph.area_stats(FormulationArea::D).node_count, 1);
        assert_eq!(graph.area_stats(FormulationArea::A).node_count, 0);
        assert_eq!(graph.final_graph_metrics.total_nodes, 3);
    }

    #[test]
    fn metrics_are_percentages() {
        let graph = SeedGraph::from_nodes(
            vec![
                node("a", FormulationArea::A, 1.0),
                node("b", FormulationArea::B, 1.0),
            ],
            1,
        );
        // 2 of 8 areas covered, each fully filled at target 1
        assert!((graph.final_graph_metrics.breadth_percentage - 25.0).abs() < 1e-9);
        assert!((graph.final_graph_metrics.depth_percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn empty_graph_has_zero_metrics() {
        let graph = SeedGraph::from_nodes(vec![], DEFAULT_AREA_FILL_TARGET);
        assert_eq!(graph.final_graph_metrics.breadth_percentage, 0.0);
        assert_eq!(graph.final_graph_metrics.depth_percentage, 0.0);
        assert_eq!(graph.area_summary_stats.len(), 8);
    }

    #[test]
    fn area_parsing_is_case_insensitive() {
        assert_eq!("c".parse::<FormulationArea>().unwrap(), FormulationArea::C);
        assert_eq!(" H ".parse::<FormulationArea>().unwrap(), FormulationArea::H);
        assert!("Z".parse::<FormulationArea>().is_err());
    }

    #[test]
    fn export_shape_uses_area_letters_as_keys() {
        let graph = SeedGraph::from_nodes(vec![node("x", FormulationArea::E, 0.4)], 3);
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["area_summary_stats"]["E"]["node_count"], 1);
        assert!(json["final_graph_metrics"]["breadth_percentage"].is_number());
        assert_eq!(json["nodes"][0]["area"], "E");
    }

    #[test]
    fn area_deserializes_like_from_str() {
        let area: FormulationArea = serde_json::from_str("\"g\"").unwrap();
        assert_eq!(area, FormulationArea::G);
        assert!(serde_json::from_str::<FormulationArea>("\"Z\"").is_err());

        let stats: BTreeMap<FormulationArea, AreaStats> =
            serde_json::from_str(r#"{"b":{"node_count":1,"total_weight":0.5}}"#).unwrap();
        assert_eq!(stats[&FormulationArea::B].node_count, 1);
    }
}
