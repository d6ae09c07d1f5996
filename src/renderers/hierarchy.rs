use crate::utils::colormap::qualitative;
use serde_json::{json, Value};
use std::collections::HashMap;

const ROOT_COLOR: &str = "#f0f0f0";

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub id: String,
    pub label: String,
    pub parent: String,
    pub value: f64,
    /// Label of the first level below the root; drives the colour
    pub branch: Option<String>,
}

/// Weighted tree for treemap and sunburst traces.
///
/// Values are added along whole paths, so every parent carries exactly the
/// sum of its children (`branchvalues = "total"`).
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    index: HashMap<String, usize>,
}

impl Hierarchy {
    pub fn new(root_label: &str) -> Self {
        let root = HierarchyNode {
            id: root_label.to_string(),
            label: root_label.to_string(),
            parent: String::new(),
            value: 0.0,
            branch: None,
        };
        Self {
            index: HashMap::from([(root.id.clone(), 0)]),
            nodes: vec![root],
        }
    }

    pub fn root(&self) -> &HierarchyNode {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&HierarchyNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a HierarchyNode> + 'a {
        self.nodes.iter().filter(move |n| n.parent == id)
    }

    /// Add `value` to the root and to every node on `path` below it
    pub fn add_path(&mut self, path: &[&str], value: f64) {
        self.nodes[0].value += value;

        let branch = path.first().map(|s| s.to_string());
        let mut parent_id = self.nodes[0].id.clone();
        for label in path {
            let id = format!("{}/{}", parent_id, label);
            let position = match self.index.get(&id) {
                Some(&i) => i,
                None => {
                    self.nodes.push(HierarchyNode {
                        id: id.clone(),
                        label: label.to_string(),
                        parent: parent_id.clone(),
                        value: 0.0,
                        branch: branch.clone(),
                    });
                    self.index.insert(id.clone(), self.nodes.len() - 1);
                    self.nodes.len() - 1
                }
            };
            self.nodes[position].value += value;
            parent_id = id;
        }
    }

    /// Distinct first-level labels in insertion order
    pub fn branches(&self) -> Vec<&str> {
        self.children(&self.nodes[0].id)
            .map(|n| n.label.as_str())
            .collect()
    }

    /// Plotly trace of `kind` ("treemap" or "sunburst") coloured by branch
    pub fn to_trace(&self, kind: &str, value_label: &str) -> Value {
        let branch_colors: HashMap<&str, &str> = self
            .branches()
            .into_iter()
            .enumerate()
            .map(|(i, b)| (b, qualitative(i)))
            .collect();

        let colors: Vec<&str> = self
            .nodes
            .iter()
            .map(|n| {
                n.branch
                    .as_deref()
                    .and_then(|b| branch_colors.get(b).copied())
                    .unwrap_or(ROOT_COLOR)
            })
            .collect();

        json!({
            "type": kind,
            "ids": self.nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            "labels": self.nodes.iter().map(|n| n.label.as_str()).collect::<Vec<_>>(),
            "parents": self.nodes.iter().map(|n| n.parent.as_str()).collect::<Vec<_>>(),
            "values": self.nodes.iter().map(|n| n.value).collect::<Vec<_>>(),
            "branchvalues": "total",
            "marker": { "colors": colors },
            "hovertemplate": format!("<b>%{{label}}</b><br>{}: %{{value:,.0f}}<extra></extra>", value_label),
        })
    }
}
