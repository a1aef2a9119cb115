use serde::{Deserialize, Serialize};

use crate::ir::{EdgeKind, NodeKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub topic_fill: String,
    pub topic_border: String,
    pub subscription_fill: String,
    pub subscription_border: String,
    pub publisher_fill: String,
    pub publisher_border: String,
    pub endpoint_fill: String,
    pub endpoint_border: String,
    pub subscription_edge: String,
    pub push_edge: String,
    pub publishing_edge: String,
}

/// Stroke for one edge kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStroke<'a> {
    pub color: &'a str,
    pub width: f32,
    pub dasharray: Option<&'static str>,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            text_color: "#1C2430".to_string(),
            muted_text_color: "#5B6577".to_string(),
            topic_fill: "#FFF4E5".to_string(),
            topic_border: "#FF9800".to_string(),
            subscription_fill: "#F3E5F5".to_string(),
            subscription_border: "#9C27B0".to_string(),
            publisher_fill: "#E3F2FD".to_string(),
            publisher_border: "#2196F3".to_string(),
            endpoint_fill: "#E8F5E9".to_string(),
            endpoint_border: "#4CAF50".to_string(),
            subscription_edge: "#E91E63".to_string(),
            push_edge: "#4CAF50".to_string(),
            publishing_edge: "#2196F3".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: "#11151C".to_string(),
            text_color: "#E6EAF2".to_string(),
            muted_text_color: "#97A1B3".to_string(),
            topic_fill: "#3A2A12".to_string(),
            subscription_fill: "#2E1C33".to_string(),
            publisher_fill: "#132A3D".to_string(),
            endpoint_fill: "#17301B".to_string(),
            ..Self::light()
        }
    }

    /// Fill and border for a node; event publishers get their own accent.
    pub fn node_colors(&self, kind: NodeKind, event_publisher: bool) -> (&str, &str) {
        match kind {
            NodeKind::Topic => (self.topic_fill.as_str(), self.topic_border.as_str()),
            NodeKind::Subscription if event_publisher => {
                (self.publisher_fill.as_str(), self.publisher_border.as_str())
            }
            NodeKind::Subscription => (
                self.subscription_fill.as_str(),
                self.subscription_border.as_str(),
            ),
            NodeKind::Endpoint => (self.endpoint_fill.as_str(), self.endpoint_border.as_str()),
        }
    }

    pub fn edge_stroke(&self, kind: EdgeKind) -> EdgeStroke<'_> {
        match kind {
            EdgeKind::Subscription => EdgeStroke {
                color: &self.subscription_edge,
                width: 2.0,
                dasharray: None,
            },
            EdgeKind::Push => EdgeStroke {
                color: &self.push_edge,
                width: 2.5,
                dasharray: Some("3,3"),
            },
            EdgeKind::Publishing => EdgeStroke {
                color: &self.publishing_edge,
                width: 3.0,
                dasharray: Some("5,5"),
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
