//! Builds a directed topology graph from Pub/Sub topics and subscriptions
//! (topics -> subscriptions -> push endpoints -> republished topics) and
//! assigns it a deterministic column layout.

pub mod builder;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod graph_dump;
pub mod ir;
pub mod layout;
pub mod model;
pub mod render;
pub mod theme;

pub use builder::{build_graph, build_graph_with};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{BuildConfig, Config, LayoutConfig, RenderConfig};
pub use error::GraphError;
pub use graph_dump::{GraphDump, graph_to_json};
pub use ir::{EdgeKind, Graph, GraphEdge, GraphNode, NodeKind, Position};
pub use layout::{auto_layout, auto_layout_with, plan_layout};
pub use model::{Subscription, Topic};
pub use render::render_svg;
pub use theme::Theme;

/// Builds the graph and lays it out in one step with default settings.
pub fn build_topology(topics: &[Topic], subscriptions: &[Subscription]) -> Graph {
    auto_layout(build_graph(topics, subscriptions))
}
