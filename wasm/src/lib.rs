use pubsub_graph::config::parse_config;
use pubsub_graph::model::{parse_subscriptions, parse_topics};
use pubsub_graph::{Config, auto_layout_with, build_graph_with, graph_to_json, render_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopologyOptions {
    /// Same shape as the CLI config file.
    config: Option<serde_json::Value>,
    skip_layout: Option<bool>,
}

fn build_config(options: &TopologyOptions) -> Result<Config, String> {
    match &options.config {
        Some(value) => parse_config(&value.to_string()).map_err(|error| error.to_string()),
        None => Ok(Config::default()),
    }
}

fn parse_options(options_json: Option<String>) -> Result<TopologyOptions, String> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(TopologyOptions::default()),
    }
}

fn topology(
    topics_json: &str,
    subscriptions_json: &str,
    options: &TopologyOptions,
) -> Result<(pubsub_graph::Graph, Config), String> {
    let config = build_config(options)?;
    let topics = parse_topics(topics_json).map_err(|error| error.to_string())?;
    let subscriptions =
        parse_subscriptions(subscriptions_json).map_err(|error| error.to_string())?;
    let mut graph = build_graph_with(&topics, &subscriptions, &config.build);
    if !options.skip_layout.unwrap_or(false) {
        graph = auto_layout_with(graph, &config.layout);
    }
    Ok((graph, config))
}

fn topology_json(
    topics_json: &str,
    subscriptions_json: &str,
    options_json: Option<String>,
) -> Result<String, String> {
    let options = parse_options(options_json)?;
    let (graph, _) = topology(topics_json, subscriptions_json, &options)?;
    graph_to_json(&graph).map_err(|error| error.to_string())
}

fn topology_svg(
    topics_json: &str,
    subscriptions_json: &str,
    options_json: Option<String>,
) -> Result<String, String> {
    let options = parse_options(options_json)?;
    let (graph, config) = topology(topics_json, subscriptions_json, &options)?;
    Ok(render_svg(&graph, &config.theme, &config.render))
}

/// Builds and lays out the topology; returns `{nodes, edges}` JSON for a
/// node-graph renderer.
#[wasm_bindgen]
pub fn build_topology(
    topics_json: &str,
    subscriptions_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    topology_json(topics_json, subscriptions_json, options_json)
        .map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn render_topology_svg(
    topics_json: &str,
    subscriptions_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    topology_svg(topics_json, subscriptions_json, options_json)
        .map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use crate::{topology_json, topology_svg};

    const TOPICS: &str = r#"{"topics": [
        {"name": "projects/demo/topics/orders"},
        {"name": "projects/demo/topics/invoices"}
    ]}"#;

    const SUBSCRIPTIONS: &str = r#"{"subscriptions": [
        {
            "name": "projects/demo/subscriptions/orders-to-billing",
            "topic": "projects/demo/topics/orders",
            "pushConfig": {"pushEndpoint": "https://billing.example.com/events"},
            "labels": {"publishing_event_id_1": "invoices"}
        },
        {
            "name": "projects/demo/subscriptions/invoices-archive",
            "topic": "projects/demo/topics/invoices"
        }
    ]}"#;

    #[test]
    fn builds_topology_json_with_positions() {
        let json = topology_json(TOPICS, SUBSCRIPTIONS, None).expect("topology should build");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 5);
        assert_eq!(value["edges"].as_array().unwrap().len(), 4);
        assert_eq!(value["nodes"][0]["x"], 0.0);
    }

    #[test]
    fn options_can_override_layout() {
        let options = r#"{"config": {"layout": {"columnSpacing": 100}}}"#.to_string();
        let json = topology_json(TOPICS, SUBSCRIPTIONS, Some(options)).unwrap();
        assert!(json.contains("\"x\":100.0"));
    }

    #[test]
    fn renders_svg_and_reports_bad_input() {
        let svg = topology_svg(TOPICS, SUBSCRIPTIONS, None).unwrap();
        assert!(svg.contains("billing.example.com/events"));
        assert!(topology_json("[1]", SUBSCRIPTIONS, None).is_err());
    }
}
