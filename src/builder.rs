//! Turns flat topic and subscription lists into a topology graph.
//!
//! Nodes are emitted in three bands (topics, subscriptions, push endpoints)
//! with provisional positions from a running column counter; the layout
//! engine replaces those positions. Edges follow the delivery pipeline:
//! topic -> subscription -> endpoint -> republished topic.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BuildConfig;
use crate::ir::{
    EdgeKind, EndpointAttrs, Graph, GraphEdge, GraphNode, NodeData, Position, SubscriptionAttrs,
    TopicAttrs,
};
use crate::model::{Labels, Subscription, Topic};

const EVENT_ID_KEY: &str = "publishing_event_id";

static NAME_EVENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"publishing_event_id_(\d+)").unwrap());
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

pub fn build_graph(topics: &[Topic], subscriptions: &[Subscription]) -> Graph {
    build_graph_with(topics, subscriptions, &BuildConfig::default())
}

pub fn build_graph_with(
    topics: &[Topic],
    subscriptions: &[Subscription],
    config: &BuildConfig,
) -> Graph {
    let mut builder = GraphBuilder::new(config);
    builder.add_topics(topics);
    builder.add_subscriptions(subscriptions);
    let endpoints = collect_endpoints(subscriptions, config.max_event_ids);
    builder.add_endpoints(&endpoints);

    builder.link_subscriptions(subscriptions);
    builder.link_pushes(&endpoints);
    builder.link_publishing();

    let graph = builder.graph;
    info!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "graph built"
    );
    graph
}

/// Event id embedded in a subscription name as `publishing_event_id_{n}`.
pub fn event_id_from_name(subscription_name: &str) -> Option<String> {
    NAME_EVENT_ID_RE
        .captures(subscription_name)
        .map(|caps| caps[1].to_string())
}

/// First numeric run of the first label whose key mentions
/// `publishing_event_id`. A matching key with a digit-free value yields
/// `None` without looking at later keys.
pub fn event_id_from_labels(labels: &Labels) -> Option<String> {
    let (_, value) = labels.iter().find(|(key, _)| key.contains(EVENT_ID_KEY))?;
    DIGITS_RE.find(value).map(|m| m.as_str().to_string())
}

/// Publisher classification: the name pattern wins over labels.
pub fn classify_publisher(subscription: &Subscription) -> Option<String> {
    event_id_from_name(subscription.short_name())
        .or_else(|| event_id_from_labels(&subscription.labels))
}

/// Values of `publishing_event_id_1`, `publishing_event_id_2`, ... up to the
/// first missing index, scanning at most `cap` keys.
pub fn declared_event_ids(labels: &Labels, cap: usize) -> Vec<String> {
    (1..=cap)
        .map_while(|idx| labels.get(&format!("{EVENT_ID_KEY}_{idx}")).cloned())
        .collect()
}

/// Host plus path of an endpoint URL, without port, query or fragment.
pub fn endpoint_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    Some(format!("{}{}", parsed.host_str().unwrap_or(""), parsed.path()))
}

/// Topic names that equal one of the declared event ids, in event-id order.
/// Both the endpoint's `publishing_topics` attribute and its publishing
/// edges come from this one function.
pub fn match_publishing_topics<'a>(
    event_ids: &[String],
    topic_names: &[&'a str],
) -> Vec<&'a str> {
    let mut matched = Vec::new();
    for event_id in event_ids {
        for &topic in topic_names {
            if topic == event_id.as_str() && !matched.contains(&topic) {
                matched.push(topic);
            }
        }
    }
    matched
}

/// Push endpoint aggregated over every subscription delivering to it.
#[derive(Debug, Clone)]
struct EndpointEntry<'a> {
    url: &'a str,
    event_ids: Vec<String>,
    subscriptions: Vec<&'a str>,
}

fn collect_endpoints(subscriptions: &[Subscription], cap: usize) -> Vec<EndpointEntry<'_>> {
    let mut entries: Vec<EndpointEntry<'_>> = Vec::new();
    let mut by_url: HashMap<&str, usize> = HashMap::new();
    for subscription in subscriptions {
        let Some(url) = subscription.push_endpoint() else {
            continue;
        };
        let idx = *by_url.entry(url).or_insert_with(|| {
            entries.push(EndpointEntry {
                url,
                event_ids: Vec::new(),
                subscriptions: Vec::new(),
            });
            entries.len() - 1
        });
        let entry = &mut entries[idx];
        for event_id in declared_event_ids(&subscription.labels, cap) {
            if !entry.event_ids.contains(&event_id) {
                entry.event_ids.push(event_id);
            }
        }
        entry.subscriptions.push(&subscription.name);
        debug!(
            endpoint = url,
            subscription = %subscription.name,
            event_ids = ?entry.event_ids,
            "push endpoint found"
        );
    }
    entries
}

struct GraphBuilder<'a> {
    config: &'a BuildConfig,
    graph: Graph,
    next_column: usize,
    topic_names: Vec<&'a str>,
}

impl<'a> GraphBuilder<'a> {
    fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            graph: Graph::new(),
            next_column: 0,
            topic_names: Vec::new(),
        }
    }

    fn provisional(&mut self, band: usize) -> Position {
        let position = Position::new(
            self.next_column as f32 * self.config.node_spacing_x,
            band as f32 * self.config.node_spacing_y,
        );
        self.next_column += 1;
        position
    }

    fn add_topics(&mut self, topics: &'a [Topic]) {
        for topic in topics {
            let label = topic.short_name();
            let id = GraphNode::topic_id(label);
            if self.graph.contains_node(&id) {
                debug!(topic = %topic.name, "duplicate topic short name, keeping first");
                continue;
            }
            let position = self.provisional(0);
            self.graph.insert_node(GraphNode {
                id,
                label: label.to_string(),
                name: topic.name.clone(),
                project_id: topic.project_id().map(str::to_string),
                data: NodeData::Topic(TopicAttrs {
                    state: topic.state,
                    labels: topic.labels.clone(),
                }),
                position,
            });
            self.topic_names.push(label);
        }
        debug!(count = self.topic_names.len(), "topic nodes created");
    }

    fn add_subscriptions(&mut self, subscriptions: &'a [Subscription]) {
        let known: HashSet<&str> = self.topic_names.iter().copied().collect();
        let mut by_topic: HashMap<&str, Vec<&Subscription>> = HashMap::new();
        for subscription in subscriptions {
            let topic = subscription.topic_short_name();
            if known.contains(topic) {
                by_topic.entry(topic).or_default().push(subscription);
            }
        }

        let topic_names = self.topic_names.clone();
        let mut created = 0usize;
        for topic in topic_names {
            let Some(group) = by_topic.get(topic) else {
                continue;
            };
            for subscription in group {
                let id = GraphNode::subscription_id(&subscription.name);
                if self.graph.contains_node(&id) {
                    continue;
                }
                let position = self.provisional(1);
                self.graph.insert_node(GraphNode {
                    id,
                    label: subscription.short_name().to_string(),
                    name: subscription.name.clone(),
                    project_id: subscription.project_id().map(str::to_string),
                    data: NodeData::Subscription(SubscriptionAttrs {
                        state: subscription.state,
                        labels: subscription.labels.clone(),
                        topic: subscription.topic.clone(),
                        push_endpoint: subscription.push_endpoint().map(str::to_string),
                        ack_deadline_seconds: subscription.ack_deadline_seconds,
                        event_id: classify_publisher(subscription),
                    }),
                    position,
                });
                created += 1;
            }
        }
        debug!(count = created, "subscription nodes created");
    }

    fn add_endpoints(&mut self, endpoints: &[EndpointEntry<'_>]) {
        for entry in endpoints {
            let id = GraphNode::endpoint_id(entry.url);
            if self.graph.contains_node(&id) {
                continue;
            }
            let label = endpoint_label(entry.url).unwrap_or_else(|| {
                warn!(endpoint = entry.url, "unparseable push endpoint, using raw url");
                entry.url.to_string()
            });
            let publishing_topics: Vec<String> =
                match_publishing_topics(&entry.event_ids, &self.topic_names)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
            debug!(
                endpoint = entry.url,
                topics = ?publishing_topics,
                "endpoint publishing topics resolved"
            );
            let position = self.provisional(2);
            self.graph.insert_node(GraphNode {
                id,
                label,
                name: entry.url.to_string(),
                project_id: None,
                data: NodeData::Endpoint(EndpointAttrs {
                    url: entry.url.to_string(),
                    event_ids: entry.event_ids.clone(),
                    publishing_topics,
                    subscriptions: entry.subscriptions.iter().map(|s| s.to_string()).collect(),
                }),
                position,
            });
        }
        debug!(count = endpoints.len(), "endpoint nodes created");
    }

    fn link_subscriptions(&mut self, subscriptions: &[Subscription]) {
        for subscription in subscriptions {
            let topic_id = GraphNode::topic_id(subscription.topic_short_name());
            let subscription_id = GraphNode::subscription_id(&subscription.name);
            self.graph.push_edge(GraphEdge::new(
                &topic_id,
                &subscription_id,
                EdgeKind::Subscription,
            ));
        }
    }

    fn link_pushes(&mut self, endpoints: &[EndpointEntry<'_>]) {
        for entry in endpoints {
            let endpoint_id = GraphNode::endpoint_id(entry.url);
            for name in &entry.subscriptions {
                let subscription_id = GraphNode::subscription_id(name);
                self.graph
                    .push_edge(GraphEdge::new(&subscription_id, &endpoint_id, EdgeKind::Push));
            }
        }
    }

    fn link_publishing(&mut self) {
        let links: Vec<(String, String)> = self
            .graph
            .nodes()
            .iter()
            .filter_map(|node| Some((node.id.clone(), node.as_endpoint()?)))
            .flat_map(|(endpoint_id, attrs)| {
                attrs
                    .publishing_topics
                    .iter()
                    .map(move |topic| (endpoint_id.clone(), GraphNode::topic_id(topic)))
            })
            .collect();
        for (endpoint_id, topic_id) in links {
            debug!(from = %endpoint_id, to = %topic_id, "publishing edge");
            self.graph
                .push_edge(GraphEdge::new(&endpoint_id, &topic_id, EdgeKind::Publishing));
        }
    }
}
