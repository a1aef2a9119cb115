use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Provisional placement and label scanning used by the graph builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    pub node_spacing_x: f32,
    pub node_spacing_y: f32,
    /// Upper bound for the `publishing_event_id_{n}` label scan.
    pub max_event_ids: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            node_spacing_x: 300.0,
            node_spacing_y: 150.0,
            max_event_ids: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Horizontal distance between the topic, subscription and endpoint columns.
    pub column_spacing: f32,
    /// Vertical distance between stacked nodes in one column.
    pub row_spacing: f32,
    /// Extra gap between neighbouring groups.
    pub group_margin: f32,
    /// Placement passes are capped at `iteration_factor * node count`.
    pub iteration_factor: usize,
}

impl LayoutConfig {
    /// Horizontal advance from one group band to the next.
    pub fn group_stride(&self) -> f32 {
        self.column_spacing * 3.0 + self.group_margin
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_spacing: 400.0,
            row_spacing: 300.0,
            group_margin: 200.0,
            iteration_factor: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub padding: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            node_width: 240.0,
            node_height: 72.0,
            padding: 40.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub build: BuildConfig,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    build: Option<BuildConfig>,
    layout: Option<LayoutConfig>,
    render: Option<RenderConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    text_color: Option<String>,
    topic_color: Option<String>,
    subscription_color: Option<String>,
    endpoint_color: Option<String>,
    subscription_edge_color: Option<String>,
    push_edge_color: Option<String>,
    publishing_edge_color: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    // Hand-written config files may carry comments or trailing commas.
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(strict) => json5::from_str(contents).map_err(|_| strict)?,
    };

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "dark" => config.theme = Theme::dark(),
            "default" | "light" => config.theme = Theme::light(),
            other => anyhow::bail!("unknown theme: {other}"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.topic_color {
            config.theme.topic_fill = v;
        }
        if let Some(v) = vars.subscription_color {
            config.theme.subscription_fill = v;
        }
        if let Some(v) = vars.endpoint_color {
            config.theme.endpoint_fill = v;
        }
        if let Some(v) = vars.subscription_edge_color {
            config.theme.subscription_edge = v;
        }
        if let Some(v) = vars.push_edge_color {
            config.theme.push_edge = v;
        }
        if let Some(v) = vars.publishing_edge_color {
            config.theme.publishing_edge = v;
        }
    }

    if let Some(build) = parsed.build {
        config.build = build;
    }
    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    if let Some(render) = parsed.render {
        config.render = render;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.column_spacing, 400.0);
        assert_eq!(config.layout.group_stride(), 1400.0);
        assert_eq!(config.build.max_event_ids, 100);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = parse_config(
            r##"{
                "theme": "dark",
                "themeVariables": {"pushEdgeColor": "#00ff00"},
                "layout": {"rowSpacing": 120}
            }"##,
        )
        .unwrap();
        assert_eq!(config.layout.row_spacing, 120.0);
        assert_eq!(config.layout.column_spacing, 400.0);
        assert_eq!(config.theme.push_edge, "#00ff00");
        assert_eq!(config.theme.background, Theme::dark().background);
    }

    #[test]
    fn accepts_commented_config() {
        let config = parse_config(
            r#"{
                // wider bands for long subscription names
                layout: {columnSpacing: 520,},
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.column_spacing, 520.0);
        assert!(parse_config("{ not json").is_err());
    }

    #[test]
    fn rejects_unknown_theme() {
        assert!(parse_config(r#"{"theme": "neon"}"#).is_err());
    }
}
