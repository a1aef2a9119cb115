use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::model::{DeliveryType, Labels, ResourceState};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Topic,
    Subscription,
    Endpoint,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Subscription => "subscription",
            Self::Endpoint => "endpoint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// topic -> subscription
    Subscription,
    /// subscription -> endpoint
    Push,
    /// endpoint -> topic
    Publishing,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Push => "push",
            Self::Publishing => "publishing",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicAttrs {
    pub state: Option<ResourceState>,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionAttrs {
    pub state: Option<ResourceState>,
    pub labels: Labels,
    /// Full resource name of the referenced topic.
    pub topic: String,
    pub push_endpoint: Option<String>,
    pub ack_deadline_seconds: Option<u32>,
    /// Set when the subscription is classified as an event publisher.
    pub event_id: Option<String>,
}

impl SubscriptionAttrs {
    pub fn is_event_publisher(&self) -> bool {
        self.event_id.is_some()
    }

    pub fn delivery(&self) -> DeliveryType {
        if self.push_endpoint.is_some() {
            DeliveryType::Push
        } else {
            DeliveryType::Pull
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointAttrs {
    pub url: String,
    /// Union of the declared event ids of every subscription pushing here.
    pub event_ids: Vec<String>,
    /// Short names of the topics this endpoint is inferred to publish into.
    pub publishing_topics: Vec<String>,
    /// Full names of the subscriptions pushing to this endpoint.
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Topic(TopicAttrs),
    Subscription(SubscriptionAttrs),
    Endpoint(EndpointAttrs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Source name: the full resource name, or the URL for endpoints.
    pub name: String,
    pub project_id: Option<String>,
    pub data: NodeData,
    pub position: Position,
}

impl GraphNode {
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Topic(_) => NodeKind::Topic,
            NodeData::Subscription(_) => NodeKind::Subscription,
            NodeData::Endpoint(_) => NodeKind::Endpoint,
        }
    }

    pub fn topic_id(short_name: &str) -> String {
        format!("topic-{short_name}")
    }

    pub fn subscription_id(full_name: &str) -> String {
        format!("subscription-{full_name}")
    }

    pub fn endpoint_id(url: &str) -> String {
        format!("endpoint-{url}")
    }

    pub fn as_subscription(&self) -> Option<&SubscriptionAttrs> {
        match &self.data {
            NodeData::Subscription(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_endpoint(&self) -> Option<&EndpointAttrs> {
        match &self.data {
            NodeData::Endpoint(attrs) => Some(attrs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn new(source: &str, target: &str, kind: EdgeKind) -> Self {
        Self {
            id: format!("edge-{source}-{target}-{kind}"),
            source: source.to_string(),
            target: target.to_string(),
            kind,
        }
    }
}

/// Node/edge graph with unique node ids and referentially intact edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
    edge_ids: HashMap<String, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node` unless its id is already present. Returns whether it
    /// was inserted.
    pub fn insert_node(&mut self, node: GraphNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Adds `edge` when both endpoints exist and no edge with the same id was
    /// added before. Returns whether it was added.
    pub fn push_edge(&mut self, edge: GraphEdge) -> bool {
        if !self.contains_node(&edge.source) || !self.contains_node(&edge.target) {
            return false;
        }
        if self.edge_ids.contains_key(&edge.id) {
            return false;
        }
        self.edge_ids.insert(edge.id.clone(), self.edges.len());
        self.edges.push(edge);
        true
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edge_ids.get(id).map(|&idx| &self.edges[idx])
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |node| node.kind() == kind)
    }

    pub fn count_of(&self, kind: NodeKind) -> usize {
        self.nodes_of_kind(kind).count()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn set_position(&mut self, id: &str, position: Position) {
        if let Some(&idx) = self.index.get(id) {
            self.nodes[idx].position = position;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
