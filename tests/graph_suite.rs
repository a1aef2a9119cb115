use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pubsub_graph::layout::{PlacementOutcome, connected_components};
use pubsub_graph::model::{load_subscriptions, load_topics};
use pubsub_graph::{
    EdgeKind, Graph, LayoutConfig, NodeKind, Subscription, Topic, auto_layout, build_graph,
    build_topology, graph_to_json, plan_layout,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn shop() -> (Vec<Topic>, Vec<Subscription>) {
    let topics = load_topics(&fixture("shop/topics.json")).expect("topics fixture");
    let subscriptions =
        load_subscriptions(&fixture("shop/subscriptions.json")).expect("subscriptions fixture");
    (topics, subscriptions)
}

fn node_ids(graph: &Graph) -> BTreeSet<String> {
    graph.nodes().iter().map(|node| node.id.clone()).collect()
}

fn edge_ids(graph: &Graph) -> BTreeSet<String> {
    graph.edges().iter().map(|edge| edge.id.clone()).collect()
}

fn assert_referential_integrity(graph: &Graph) {
    for edge in graph.edges() {
        assert!(graph.contains_node(&edge.source), "{}: dangling source", edge.id);
        assert!(graph.contains_node(&edge.target), "{}: dangling target", edge.id);
        assert_eq!(graph.edge(&edge.id), Some(edge), "{}: not indexed", edge.id);
    }
    assert_eq!(edge_ids(graph).len(), graph.edges().len(), "duplicate edge ids");
    assert_eq!(node_ids(graph).len(), graph.nodes().len(), "duplicate node ids");
}

#[test]
fn shop_fixture_counts() {
    let (topics, subscriptions) = shop();
    assert_eq!(topics.len(), 5);
    assert_eq!(subscriptions.len(), 7);

    let graph = build_graph(&topics, &subscriptions);
    assert_eq!(graph.count_of(NodeKind::Topic), 5);
    // The subscription on a deleted topic is dropped.
    assert_eq!(graph.count_of(NodeKind::Subscription), 6);
    assert_eq!(graph.count_of(NodeKind::Endpoint), 4);
    assert_eq!(graph.edges_of_kind(EdgeKind::Subscription).count(), 6);
    assert_eq!(graph.edges_of_kind(EdgeKind::Push).count(), 4);
    assert_eq!(graph.edges_of_kind(EdgeKind::Publishing).count(), 3);
    assert_referential_integrity(&graph);
}

#[test]
fn empty_push_config_is_pull() {
    let (topics, subscriptions) = shop();
    let graph = build_graph(&topics, &subscriptions);
    let fulfillment = graph
        .node("subscription-projects/shop-prod/subscriptions/orders-fulfillment")
        .and_then(|node| node.as_subscription())
        .expect("fulfillment node");
    assert!(fulfillment.push_endpoint.is_none());
    assert_eq!(fulfillment.delivery().as_str(), "Pull");
}

#[test]
fn publisher_classification_prefers_name() {
    let (topics, subscriptions) = shop();
    let graph = build_graph(&topics, &subscriptions);
    let publisher = |short: &str| {
        graph
            .node(&format!("subscription-projects/shop-prod/subscriptions/{short}"))
            .and_then(|node| node.as_subscription())
            .map(|attrs| attrs.event_id.clone())
            .expect("subscription node")
    };
    assert_eq!(
        publisher("payments-to-invoices-publishing_event_id_3"),
        Some("3".to_string())
    );
    // Label values without digits do not classify.
    assert_eq!(publisher("orders-to-payments"), None);
    assert_eq!(publisher("notifications-audit"), None);
}

#[test]
fn shared_endpoint_aggregates_event_ids() {
    let (topics, subscriptions) = shop();
    let graph = build_graph(&topics, &subscriptions);
    let billing = graph
        .node("endpoint-https://billing.example.com/hooks?key=abc")
        .expect("billing endpoint");
    assert_eq!(billing.label, "billing.example.com/hooks");
    let attrs = billing.as_endpoint().expect("endpoint attrs");
    assert_eq!(attrs.event_ids, vec!["invoices", "notifications"]);
    assert_eq!(attrs.publishing_topics, vec!["invoices", "notifications"]);
    assert_eq!(attrs.subscriptions.len(), 2);

    let pushes_in: Vec<&str> = graph
        .edges_of_kind(EdgeKind::Push)
        .filter(|edge| edge.target == billing.id)
        .map(|edge| edge.source.as_str())
        .collect();
    assert_eq!(pushes_in.len(), 2);
}

#[test]
fn publishing_edges_match_attribute() {
    let (topics, subscriptions) = shop();
    let graph = build_graph(&topics, &subscriptions);
    for node in graph.nodes_of_kind(NodeKind::Endpoint) {
        let attrs = node.as_endpoint().expect("endpoint attrs");
        let from_attr: BTreeSet<String> = attrs
            .publishing_topics
            .iter()
            .map(|topic| format!("topic-{topic}"))
            .collect();
        let from_edges: BTreeSet<String> = graph
            .edges_of_kind(EdgeKind::Publishing)
            .filter(|edge| edge.source == node.id)
            .map(|edge| edge.target.clone())
            .collect();
        assert_eq!(from_attr, from_edges, "{}", node.id);
    }
}

#[test]
fn build_is_deterministic() {
    let (topics, subscriptions) = shop();
    let first = graph_to_json(&build_topology(&topics, &subscriptions)).unwrap();
    let second = graph_to_json(&build_topology(&topics, &subscriptions)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn input_order_does_not_change_identities() {
    let (topics, subscriptions) = shop();
    let forward = build_graph(&topics, &subscriptions);

    let mut topics_rev = topics.clone();
    topics_rev.reverse();
    let mut subscriptions_rev = subscriptions.clone();
    subscriptions_rev.reverse();
    let backward = build_graph(&topics_rev, &subscriptions_rev);

    assert_eq!(node_ids(&forward), node_ids(&backward));
    assert_eq!(edge_ids(&forward), edge_ids(&backward));
}

#[test]
fn duplicate_topics_collapse() {
    let (mut topics, subscriptions) = shop();
    topics.push(Topic::new("projects/shop-staging/topics/orders"));
    let graph = build_graph(&topics, &subscriptions);
    assert_eq!(graph.count_of(NodeKind::Topic), 5);
    let orders = graph.node("topic-orders").expect("orders topic");
    assert_eq!(orders.project_id.as_deref(), Some("shop-prod"));
    assert_referential_integrity(&graph);
}

#[test]
fn shop_layout_groups() {
    let (topics, subscriptions) = shop();
    let graph = build_graph(&topics, &subscriptions);
    let plan = plan_layout(&graph, &LayoutConfig::default());

    assert_eq!(plan.groups.len(), 3);
    assert_eq!(connected_components(&graph).len(), 3);

    let main = &plan.groups[0];
    assert_eq!(main.nodes.len(), 13);
    assert_eq!(main.nodes[0], "topic-orders");
    assert_eq!(main.outcome, PlacementOutcome::Converged);
    assert!(main.forced.is_empty());

    let audit = &plan.groups[1];
    assert_eq!(audit.nodes, vec!["topic-audit-log"]);
    assert_eq!(audit.origin_x, 1400.0);
    assert_eq!(audit.passes, 0);

    let legacy = &plan.groups[2];
    assert_eq!(legacy.origin_x, 2800.0);
    assert_eq!(legacy.outcome, PlacementOutcome::Stalled);
    assert_eq!(legacy.forced, vec!["endpoint-https://legacy.example.com"]);
}

#[test]
fn shop_layout_columns() {
    let (topics, subscriptions) = shop();
    let graph = auto_layout(build_graph(&topics, &subscriptions));
    assert_referential_integrity(&graph);

    let orders = graph.node("topic-orders").unwrap();
    assert_eq!((orders.position.x, orders.position.y), (0.0, 0.0));
    let audit = graph.node("topic-audit-log").unwrap();
    assert_eq!((audit.position.x, audit.position.y), (1400.0, 0.0));
    let legacy = graph.node("endpoint-https://legacy.example.com").unwrap();
    assert_eq!((legacy.position.x, legacy.position.y), (3600.0, 0.0));

    // Within the main group every kind keeps to its own column, one row apart.
    let main: BTreeSet<String> = connected_components(&graph)[0].iter().cloned().collect();
    for (kind, column_x) in [
        (NodeKind::Topic, 0.0),
        (NodeKind::Subscription, 400.0),
        (NodeKind::Endpoint, 800.0),
    ] {
        let mut rows: Vec<f32> = graph
            .nodes_of_kind(kind)
            .filter(|node| main.contains(&node.id))
            .inspect(|node| assert_eq!(node.position.x, column_x, "{}", node.id))
            .map(|node| node.position.y)
            .collect();
        rows.sort_by(f32::total_cmp);
        let expected: Vec<f32> = (0..rows.len()).map(|row| row as f32 * 300.0).collect();
        assert_eq!(rows, expected, "{kind:?}");
    }
}

#[test]
fn single_pull_subscription() {
    let topics = [Topic::new("projects/p1/topics/orders")];
    let subscriptions = [Subscription::new(
        "projects/p1/subscriptions/orders-sub",
        "projects/p1/topics/orders",
    )];
    let graph = build_topology(&topics, &subscriptions);

    assert_eq!(graph.nodes().len(), 2);
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.edges()[0].kind, EdgeKind::Subscription);

    let topic = graph.node("topic-orders").unwrap();
    let sub = graph
        .node("subscription-projects/p1/subscriptions/orders-sub")
        .unwrap();
    assert_eq!((topic.position.x, topic.position.y), (0.0, 0.0));
    assert_eq!((sub.position.x, sub.position.y), (400.0, 0.0));
    assert_eq!(connected_components(&graph).len(), 1);
}

#[test]
fn publish_back_cycle_terminates() {
    let topics = [Topic::new("projects/p1/topics/orders")];
    let subscriptions = [Subscription::new(
        "projects/p1/subscriptions/relay",
        "projects/p1/topics/orders",
    )
    .with_push_endpoint("https://relay.example.com/push")
    .with_label("publishing_event_id_1", "orders")];
    let graph = build_graph(&topics, &subscriptions);

    assert_eq!(graph.nodes().len(), 3);
    let kinds: Vec<EdgeKind> = graph.edges().iter().map(|edge| edge.kind).collect();
    assert_eq!(
        kinds,
        vec![EdgeKind::Subscription, EdgeKind::Push, EdgeKind::Publishing]
    );

    let plan = plan_layout(&graph, &LayoutConfig::default());
    assert_eq!(plan.groups.len(), 1);
    assert_eq!(plan.groups[0].outcome, PlacementOutcome::Converged);
    assert!(plan.groups[0].passes <= 3 * 3);

    let graph = auto_layout(graph);
    let endpoint = graph.node("endpoint-https://relay.example.com/push").unwrap();
    assert_eq!((endpoint.position.x, endpoint.position.y), (800.0, 0.0));
}

#[test]
fn zero_budget_still_places_everything() {
    let (topics, subscriptions) = shop();
    let graph = build_graph(&topics, &subscriptions);
    let config = LayoutConfig {
        iteration_factor: 0,
        ..LayoutConfig::default()
    };
    let plan = plan_layout(&graph, &config);
    assert_eq!(plan.positions.len(), graph.nodes().len());
    assert_eq!(plan.groups[0].outcome, PlacementOutcome::BudgetExhausted);
    assert_eq!(plan.groups[0].forced.len(), 12);
}

#[test]
fn empty_input() {
    let graph = build_topology(&[], &[]);
    assert!(graph.is_empty());
    assert!(plan_layout(&graph, &LayoutConfig::default()).groups.is_empty());
}
