use crate::config::RenderConfig;
use crate::ir::{EdgeKind, Graph, GraphNode, NodeData};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const EDGE_KINDS: [EdgeKind; 3] = [EdgeKind::Subscription, EdgeKind::Push, EdgeKind::Publishing];

/// Draws a laid-out graph as an SVG preview. Nodes are boxes anchored at
/// their layout position; edges leave a node on its right side and enter
/// the target on its left side.
pub fn render_svg(graph: &Graph, theme: &Theme, config: &RenderConfig) -> String {
    let (min_x, min_y, max_x, max_y) = bounds(graph, config);
    let offset_x = config.padding - min_x;
    let offset_y = config.padding - min_y;
    let width = (max_x - min_x + config.padding * 2.0).max(200.0);
    let height = (max_y - min_y + config.padding * 2.0).max(200.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    for kind in EDGE_KINDS {
        let stroke = theme.edge_stroke(kind);
        svg.push_str(&format!(
            "<marker id=\"arrow-{}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
            kind.as_str(),
            stroke.color
        ));
    }
    svg.push_str("</defs>");

    for edge in graph.edges() {
        let (Some(source), Some(target)) = (graph.node(&edge.source), graph.node(&edge.target))
        else {
            continue;
        };
        let sx = source.position.x + offset_x + config.node_width;
        let sy = source.position.y + offset_y + config.node_height / 2.0;
        let tx = target.position.x + offset_x;
        let ty = target.position.y + offset_y + config.node_height / 2.0;
        let bend = ((tx - sx).abs() / 2.0).max(40.0);
        let stroke = theme.edge_stroke(edge.kind);
        let dash = stroke
            .dasharray
            .map(|d| format!(" stroke-dasharray=\"{d}\""))
            .unwrap_or_default();
        svg.push_str(&format!(
            "<path class=\"edge edge-{kind}\" d=\"M {sx:.2} {sy:.2} C {c1:.2} {sy:.2}, {c2:.2} {ty:.2}, {tx:.2} {ty:.2}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{w}\"{dash} marker-end=\"url(#arrow-{kind})\"/>",
            kind = edge.kind.as_str(),
            c1 = sx + bend,
            c2 = tx - bend,
            color = stroke.color,
            w = stroke.width,
        ));
    }

    for node in graph.nodes() {
        render_node(&mut svg, node, offset_x, offset_y, theme, config);
    }

    svg.push_str("</svg>");
    svg
}

fn render_node(
    svg: &mut String,
    node: &GraphNode,
    offset_x: f32,
    offset_y: f32,
    theme: &Theme,
    config: &RenderConfig,
) {
    let x = node.position.x + offset_x;
    let y = node.position.y + offset_y;
    let publisher = node
        .as_subscription()
        .is_some_and(|attrs| attrs.is_event_publisher());
    let (fill, border) = theme.node_colors(node.kind(), publisher);

    svg.push_str(&format!(
        "<g class=\"node node-{}\"><rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{fill}\" stroke=\"{border}\" stroke-width=\"1.5\"/>",
        node.kind().as_str(),
        config.node_width,
        config.node_height,
    ));
    let text_x = x + 12.0;
    svg.push_str(&format!(
        "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        y + 24.0,
        theme.font_family,
        theme.font_size,
        theme.text_color,
        escape_xml(&node.label)
    ));
    if let Some(detail) = node_detail(node) {
        svg.push_str(&format!(
            "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            y + 48.0,
            theme.font_family,
            theme.font_size - 2.0,
            theme.muted_text_color,
            escape_xml(&detail)
        ));
    }
    svg.push_str("</g>");
}

/// Second line under the node label.
fn node_detail(node: &GraphNode) -> Option<String> {
    match &node.data {
        NodeData::Topic(attrs) => attrs.state.map(|state| state.as_str().to_string()),
        NodeData::Subscription(attrs) => {
            let mut line = attrs.delivery().as_str().to_string();
            if let Some(event_id) = &attrs.event_id {
                line.push_str(&format!(" · Event {event_id}"));
            }
            Some(line)
        }
        NodeData::Endpoint(attrs) if !attrs.publishing_topics.is_empty() => {
            Some(format!("publishes {}", attrs.publishing_topics.join(", ")))
        }
        NodeData::Endpoint(_) => None,
    }
}

fn bounds(graph: &Graph, config: &RenderConfig) -> (f32, f32, f32, f32) {
    if graph.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for node in graph.nodes() {
        min_x = min_x.min(node.position.x);
        min_y = min_y.min(node.position.y);
        max_x = max_x.max(node.position.x + config.node_width);
        max_y = max_y.max(node.position.y + config.node_height);
    }
    (min_x, min_y, max_x, max_y)
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
