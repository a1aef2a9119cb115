use crate::ir::{EdgeKind, Graph, GraphNode, NodeData, NodeKind};
use crate::model::{DeliveryType, Labels, ResourceState};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Serializable snapshot of a laid-out graph, shaped for node-graph
/// renderers: flat node records with positions, and kind-tagged edges.
#[derive(Debug, Serialize)]
pub struct GraphDump {
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ResourceState>,
    #[serde(skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack_deadline_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_event_publisher: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publishing_topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl NodeDump {
    fn from_node(node: &GraphNode) -> Self {
        let mut dump = NodeDump {
            id: node.id.clone(),
            kind: node.kind(),
            label: node.label.clone(),
            name: node.name.clone(),
            project_id: node.project_id.clone(),
            x: node.position.x,
            y: node.position.y,
            state: None,
            labels: Labels::new(),
            delivery: None,
            push_endpoint: None,
            ack_deadline_seconds: None,
            is_event_publisher: None,
            event_id: None,
            endpoint_url: None,
            event_ids: Vec::new(),
            publishing_topics: Vec::new(),
        };
        match &node.data {
            NodeData::Topic(attrs) => {
                dump.state = attrs.state;
                dump.labels = attrs.labels.clone();
            }
            NodeData::Subscription(attrs) => {
                dump.state = attrs.state;
                dump.labels = attrs.labels.clone();
                dump.delivery = Some(attrs.delivery());
                dump.push_endpoint = attrs.push_endpoint.clone();
                dump.ack_deadline_seconds = attrs.ack_deadline_seconds;
                dump.is_event_publisher = Some(attrs.is_event_publisher());
                dump.event_id = attrs.event_id.clone();
            }
            NodeData::Endpoint(attrs) => {
                dump.endpoint_url = Some(attrs.url.clone());
                dump.event_ids = attrs.event_ids.clone();
                dump.publishing_topics = attrs.publishing_topics.clone();
            }
        }
        dump
    }
}

impl GraphDump {
    pub fn from_graph(graph: &Graph) -> Self {
        GraphDump {
            nodes: graph.nodes().iter().map(NodeDump::from_node).collect(),
            edges: graph
                .edges()
                .iter()
                .map(|edge| EdgeDump {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    kind: edge.kind,
                })
                .collect(),
        }
    }
}

pub fn graph_to_json(graph: &Graph) -> serde_json::Result<String> {
    serde_json::to_string(&GraphDump::from_graph(graph))
}

/// Writes the pretty-printed dump to `path`, or stdout when `path` is `None`.
pub fn write_graph_dump(graph: &Graph, path: Option<&Path>) -> anyhow::Result<()> {
    let dump = GraphDump::from_graph(graph);
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &dump)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
