use crate::builder::build_graph_with;
use crate::catalog::{self, TopicEntry, associate, filter_entries, graph_inputs};
use crate::config::load_config;
use crate::graph_dump::write_graph_dump;
use crate::ir::{Graph, NodeKind};
use crate::layout::auto_layout_with;
use crate::model::{load_subscriptions, load_topics, parse_subscription_name, parse_topic_name};
use crate::render::{render_svg, write_output_svg};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "psgraph", version, about = "Pub/Sub topology graph builder")]
pub struct Args {
    /// Topics document (REST topics.list response or JSON array), '-' for stdin
    #[arg(short = 't', long = "topics")]
    pub topics: PathBuf,

    /// Subscriptions document (REST subscriptions.list response or JSON array)
    #[arg(short = 's', long = "subscriptions")]
    pub subscriptions: PathBuf,

    /// Output file. Defaults to stdout for json, svg and list.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config JSON file (spacing, render size, theme)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Keep only topics whose names, subscriptions or label values contain this text
    #[arg(short = 'f', long = "filter")]
    pub filter: Option<String>,

    /// Skip auto layout and keep the builder's provisional positions
    #[arg(long = "no-layout")]
    pub no_layout: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Svg,
    Png,
    List,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = load_config(args.config.as_deref())?;

    let topics = load_topics(&args.topics)?;
    let subscriptions = load_subscriptions(&args.subscriptions)?;

    let mut entries = associate(&topics, &subscriptions);
    catalog::sort_by_topic_name(&mut entries);
    let selected = filter_entries(&entries, args.filter.as_deref().unwrap_or(""));

    if args.output_format == OutputFormat::List {
        let listing = render_listing(&selected)?;
        return write_text(&listing, args.output.as_deref());
    }

    let (topics, subscriptions) = graph_inputs(selected.iter().copied());
    let mut graph = build_graph_with(&topics, &subscriptions, &config.build);
    if !args.no_layout {
        graph = auto_layout_with(graph, &config.layout);
    }

    info!("{}", summarize(&graph));

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&graph, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => write_png(&graph, &config, args.output.as_deref())?,
        _ => write_graph_dump(&graph, args.output.as_deref())?,
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(feature = "png")]
fn write_png(graph: &Graph, config: &crate::config::Config, output: Option<&Path>) -> Result<()> {
    let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
    let svg = render_svg(graph, &config.theme, &config.render);
    crate::render::write_output_png(&svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_graph: &Graph, _config: &crate::config::Config, _output: Option<&Path>) -> Result<()> {
    Err(anyhow::anyhow!("png output requires the `png` feature"))
}

fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

/// Plain-text topic list: one block per topic with its subscriptions.
fn render_listing(entries: &[&TopicEntry]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if entries.is_empty() {
        writeln!(out, "No topics found.")?;
        return Ok(out);
    }
    for entry in entries {
        write_entry(&mut out, entry)?;
    }
    Ok(out)
}

/// Topics show their project; subscriptions only when it differs from the
/// topic's. Malformed names are listed anyway and logged.
fn write_entry(out: &mut String, entry: &TopicEntry) -> fmt::Result {
    let topic = &entry.topic;
    let project = match parse_topic_name(&topic.name) {
        Ok(resource) => Some(resource.project_id),
        Err(err) => {
            warn!("{err}");
            None
        }
    };

    write!(out, "{}", topic.short_name())?;
    if let Some(project) = &project {
        write!(out, " ({project})")?;
    }
    if let Some(state) = topic.state {
        write!(out, " [{}]", state.as_str())?;
    }
    writeln!(out)?;
    for (key, value) in &topic.labels {
        writeln!(out, "    {key}: {value}")?;
    }

    for sub in &entry.subscriptions {
        write!(out, "  - {} ({})", sub.short_name(), sub.delivery().as_str())?;
        match parse_subscription_name(&sub.name) {
            Ok(resource) if project.as_deref() != Some(resource.project_id.as_str()) => {
                write!(out, " [project {}]", resource.project_id)?;
            }
            Ok(_) => {}
            Err(err) => warn!("{err}"),
        }
        if let Some(endpoint) = sub.push_endpoint() {
            write!(out, " -> {endpoint}")?;
        }
        writeln!(out)?;
        for (key, value) in catalog::visible_labels(&sub.labels) {
            writeln!(out, "      {key}: {value}")?;
        }
    }
    Ok(())
}

/// Node counts per kind, as shown next to the graph legend.
pub fn summarize(graph: &Graph) -> String {
    format!(
        "topics: {}, subscriptions: {}, endpoints: {}, edges: {}",
        graph.count_of(NodeKind::Topic),
        graph.count_of(NodeKind::Subscription),
        graph.count_of(NodeKind::Endpoint),
        graph.edges().len()
    )
}
