//! Controller configuration.
//!
//! Which element types render nodes and edges, and which dataset keys feed
//! their options. Loadable from JSON:
//!
//! ```json
//! { "edgeElementType": "edgeLine", "edgeElementOptions": { "borderColor": "edgeColor" } }
//! ```
//!
//! Missing fields take the graph defaults.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::element::{EdgeLine, ElementConfig, ElementKind, PointElement};
use crate::error::Result;

/// Line options forwarded to edges under a `line` prefix
/// (`borderColor` reads `lineBorderColor`).
const LINE_OPTIONS: &[&str] = &[
    "backgroundColor",
    "borderCapStyle",
    "borderColor",
    "borderDash",
    "borderDashOffset",
    "borderJoinStyle",
    "borderWidth",
    "capBezierPoints",
    "cubicInterpolationMode",
    "fill",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    /// Registered type name of node elements.
    pub data_element_type: String,

    /// Node option name to dataset key.
    pub data_element_options: IndexMap<String, String>,

    /// Registered type name of edge elements.
    pub edge_element_type: String,

    /// Edge option name to dataset key.
    pub edge_element_options: IndexMap<String, String>,
}

impl ControllerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn node_config(&self) -> ElementConfig {
        ElementConfig::new(ElementKind::Node, &self.data_element_type, self.data_element_options.clone())
    }

    pub fn edge_config(&self) -> ElementConfig {
        ElementConfig::new(ElementKind::Edge, &self.edge_element_type, self.edge_element_options.clone())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            data_element_type: PointElement::ID.to_owned(),
            data_element_options: default_point_options(),
            edge_element_type: EdgeLine::ID.to_owned(),
            edge_element_options: default_edge_options(),
        }
    }
}

fn mapping(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs.iter().map(|(name, key)| (name.to_string(), key.to_string())).collect()
}

fn default_point_options() -> IndexMap<String, String> {
    mapping(&[
        ("backgroundColor", "pointBackgroundColor"),
        ("borderColor", "pointBorderColor"),
        ("borderWidth", "pointBorderWidth"),
        ("hitRadius", "pointHitRadius"),
        ("hoverRadius", "pointHoverRadius"),
        ("pointStyle", "pointStyle"),
        ("radius", "pointRadius"),
        ("rotation", "pointRotation"),
    ])
}

fn default_edge_options() -> IndexMap<String, String> {
    let mut options = mapping(&[
        ("tension", "lineTension"),
        ("stepped", "lineStepped"),
        ("directed", "directed"),
        ("arrowHeadSize", "arrowHeadSize"),
        ("arrowHeadOffset", "pointRadius"),
    ]);
    for name in LINE_OPTIONS {
        options.insert(name.to_string(), line_key(name));
    }
    options
}

fn line_key(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("line{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "line".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();

        assert_eq!(config.edge_element_type, "edgeLine");
        assert_eq!(config.data_element_type, "point");
        assert_eq!(config.edge_element_options["tension"], "lineTension");
        assert_eq!(config.edge_element_options["arrowHeadOffset"], "pointRadius");
        assert_eq!(config.edge_element_options["borderColor"], "lineBorderColor");
        assert_eq!(config.edge_element_options["cubicInterpolationMode"], "lineCubicInterpolationMode");
        assert_eq!(config.data_element_options["radius"], "pointRadius");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ControllerConfig::from_json(r#"{"edgeElementType": "arc"}"#).unwrap();

        assert_eq!(config.edge_element_type, "arc");
        assert_eq!(config.data_element_type, "point");
        assert!(!config.edge_element_options.is_empty());
    }

    #[test]
    fn element_configs_carry_the_mapping() {
        let config = ControllerConfig::default();
        let edge = config.edge_config();

        assert_eq!(edge.kind(), ElementKind::Edge);
        assert_eq!(edge.element_type(), "edgeLine");
        assert_eq!(edge.option_keys()["directed"], "directed");
    }
}
