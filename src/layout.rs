//! Column layout for topology graphs.
//!
//! Every connected component gets its own band of three columns (topics,
//! subscriptions, endpoints). Nodes are stacked into their column in the
//! order they become reachable along edge direction from a seed topic, so
//! the reading order left to right follows publish -> deliver -> push.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use crate::config::LayoutConfig;
use crate::ir::{EdgeKind, Graph, NodeKind, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Topics,
    Subscriptions,
    Endpoints,
}

impl Column {
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Topic => Self::Topics,
            NodeKind::Subscription => Self::Subscriptions,
            NodeKind::Endpoint => Self::Endpoints,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Topics => 0,
            Self::Subscriptions => 1,
            Self::Endpoints => 2,
        }
    }
}

/// How placement of one group finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// Every node was reached through its column rule.
    Converged,
    /// A full pass placed nothing; the rest was force-placed.
    Stalled,
    /// The pass budget ran out; the rest was force-placed.
    BudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct GroupPlan {
    /// Node ids in breadth-first discovery order.
    pub nodes: Vec<String>,
    pub origin_x: f32,
    pub passes: usize,
    /// Nodes placed by the fallback, in placement order.
    pub forced: Vec<String>,
    pub outcome: PlacementOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutPlan {
    pub groups: Vec<GroupPlan>,
    /// Final position per node, indexed like `Graph::nodes`.
    pub positions: Vec<Position>,
}

pub fn auto_layout(graph: Graph) -> Graph {
    auto_layout_with(graph, &LayoutConfig::default())
}

pub fn auto_layout_with(mut graph: Graph, config: &LayoutConfig) -> Graph {
    let plan = plan_layout(&graph, config);
    let ids: Vec<String> = graph.nodes().iter().map(|node| node.id.clone()).collect();
    for (id, position) in ids.iter().zip(plan.positions) {
        graph.set_position(id, position);
    }
    info!(groups = plan.groups.len(), "auto layout completed");
    graph
}

/// Computes positions without touching the graph.
pub fn plan_layout(graph: &Graph, config: &LayoutConfig) -> LayoutPlan {
    let topology = Topology::new(graph);
    let mut positions: Vec<Position> = graph.nodes().iter().map(|node| node.position).collect();
    let budget = graph.nodes().len().saturating_mul(config.iteration_factor);

    let mut groups = Vec::new();
    let mut origin_x = 0.0;
    for group in topology.components() {
        let plan = topology.place_group(&group, origin_x, budget, config, &mut positions);
        debug!(
            nodes = plan.nodes.len(),
            passes = plan.passes,
            forced = plan.forced.len(),
            outcome = ?plan.outcome,
            "group placed"
        );
        groups.push(plan);
        origin_x += config.group_stride();
    }
    LayoutPlan { groups, positions }
}

/// Connected components ignoring edge direction, as lists of node ids.
pub fn connected_components(graph: &Graph) -> Vec<Vec<String>> {
    let topology = Topology::new(graph);
    topology
        .components()
        .into_iter()
        .map(|group| group.iter().map(|&idx| topology.ids[idx].clone()).collect())
        .collect()
}

struct Topology {
    ids: Vec<String>,
    kinds: Vec<NodeKind>,
    neighbors: Vec<Vec<usize>>,
    directed: HashSet<(usize, usize)>,
    /// Incoming publishing edges from endpoints, per node.
    fed_back: Vec<usize>,
}

impl Topology {
    fn new(graph: &Graph) -> Self {
        let count = graph.nodes().len();
        let mut topology = Self {
            ids: graph.nodes().iter().map(|node| node.id.clone()).collect(),
            kinds: graph.nodes().iter().map(|node| node.kind()).collect(),
            neighbors: vec![Vec::new(); count],
            directed: HashSet::new(),
            fed_back: vec![0; count],
        };
        for edge in graph.edges() {
            let (Some(source), Some(target)) =
                (graph.node_index(&edge.source), graph.node_index(&edge.target))
            else {
                continue;
            };
            if !topology.neighbors[source].contains(&target) {
                topology.neighbors[source].push(target);
            }
            if !topology.neighbors[target].contains(&source) {
                topology.neighbors[target].push(source);
            }
            topology.directed.insert((source, target));
            if edge.kind == EdgeKind::Publishing && topology.kinds[source] == NodeKind::Endpoint {
                topology.fed_back[target] += 1;
            }
        }
        topology
    }

    fn components(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.ids.len()];
        let mut groups = Vec::new();
        for start in 0..self.ids.len() {
            if visited[start] {
                continue;
            }
            let mut group = Vec::new();
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            while let Some(idx) = queue.pop_front() {
                group.push(idx);
                for &next in &self.neighbors[idx] {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            groups.push(group);
        }
        groups
    }

    /// Whether `node` may be placed because of its already placed neighbour
    /// `from`: the edge must point from `from` into `node`, and subscriptions
    /// and endpoints only follow a topic and a subscription respectively.
    fn admits(&self, node: usize, from: usize) -> bool {
        if !self.directed.contains(&(from, node)) {
            return false;
        }
        match self.kinds[node] {
            NodeKind::Topic => true,
            NodeKind::Subscription => self.kinds[from] == NodeKind::Topic,
            NodeKind::Endpoint => self.kinds[from] == NodeKind::Subscription,
        }
    }

    fn place_group(
        &self,
        group: &[usize],
        origin_x: f32,
        budget: usize,
        config: &LayoutConfig,
        positions: &mut [Position],
    ) -> GroupPlan {
        let mut stacks = ColumnStacks::new(origin_x, config);
        let mut placed: HashSet<usize> = HashSet::new();

        let mut topics: Vec<usize> = group
            .iter()
            .copied()
            .filter(|&idx| self.kinds[idx] == NodeKind::Topic)
            .collect();
        topics.sort_by_key(|&idx| self.fed_back[idx]);
        if let Some(&seed) = topics.first() {
            positions[seed] = stacks.push(Column::Topics);
            placed.insert(seed);
        }

        let mut passes = 0;
        let mut outcome = PlacementOutcome::Converged;
        while placed.len() < group.len() {
            if passes >= budget {
                outcome = PlacementOutcome::BudgetExhausted;
                break;
            }
            passes += 1;
            let mut placed_this_pass = 0;
            for &idx in group {
                if placed.contains(&idx) {
                    continue;
                }
                let reachable = self.neighbors[idx]
                    .iter()
                    .any(|&from| placed.contains(&from) && self.admits(idx, from));
                if reachable {
                    positions[idx] = stacks.push(Column::for_kind(self.kinds[idx]));
                    placed.insert(idx);
                    placed_this_pass += 1;
                }
            }
            if placed_this_pass == 0 {
                outcome = PlacementOutcome::Stalled;
                break;
            }
        }

        let mut forced = Vec::new();
        if outcome != PlacementOutcome::Converged {
            for &idx in group {
                if placed.insert(idx) {
                    positions[idx] = stacks.push(Column::for_kind(self.kinds[idx]));
                    forced.push(self.ids[idx].clone());
                }
            }
        }

        GroupPlan {
            nodes: group.iter().map(|&idx| self.ids[idx].clone()).collect(),
            origin_x,
            passes,
            forced,
            outcome,
        }
    }
}

/// Per-group column cursors. Nodes are only ever appended to the bottom.
struct ColumnStacks {
    origin_x: f32,
    column_spacing: f32,
    row_spacing: f32,
    heights: [f32; 3],
}

impl ColumnStacks {
    fn new(origin_x: f32, config: &LayoutConfig) -> Self {
        Self {
            origin_x,
            column_spacing: config.column_spacing,
            row_spacing: config.row_spacing,
            heights: [0.0; 3],
        }
    }

    fn push(&mut self, column: Column) -> Position {
        let slot = column.index();
        let position = Position::new(
            self.origin_x + slot as f32 * self.column_spacing,
            self.heights[slot],
        );
        self.heights[slot] += self.row_spacing;
        position
    }
}
