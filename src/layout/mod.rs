//! Hub-and-ring placement of the graph.
//!
//! The hub sits at the origin. Every other node lands on a ring whose index
//! is its BFS distance from the hub, ordered around the ring by where it sat
//! before so the picture stays stable between refreshes. Overlaps are then
//! relaxed pairwise (see [`collision`]).

pub mod collision;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};

use crate::nodes::{Edge, Node, Tone, is_hub_id, normalize_node_key};

pub use collision::resolve_collisions;

const RING_ROTATION_STEP: f32 = 0.3;

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    pub canvas_size: f32,
    pub ring_base_radius: f32,
    pub ring_step: f32,
    pub min_arc_spacing: f32,
    pub collision_gap: f32,
    pub padding: f32,
    pub collision_iterations: usize,
    pub hub_min_size: f32,
    pub node_min_size: f32,
    pub node_max_size: f32,
    pub min_pan_range: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_size: 1400.0,
            ring_base_radius: 210.0,
            ring_step: 180.0,
            min_arc_spacing: 120.0,
            collision_gap: 18.0,
            padding: 34.0,
            collision_iterations: 80,
            hub_min_size: 112.0,
            node_min_size: 58.0,
            node_max_size: 84.0,
            min_pan_range: 180.0,
        }
    }
}

impl LayoutConfig {
    pub fn half_canvas(&self) -> f32 {
        self.canvas_size / 2.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub key: String,
    pub label: String,
    pub position: Vec2,
    pub size: f32,
    pub tone: Tone,
    pub depth: usize,
    pub angle: f32,
    pub is_hub: bool,
}

impl LayoutNode {
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn is_anchor(&self) -> bool {
        self.is_hub || is_hub_id(&self.id)
    }
}

/// Places `nodes` on rings around the hub and relaxes overlaps.
pub fn compute_layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Vec<LayoutNode> {
    resolve_collisions(ring_layout(nodes, edges, config), config)
}

pub fn ring_layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Vec<LayoutNode> {
    if nodes.is_empty() {
        return Vec::new();
    }

    // Later duplicates replace earlier ones but keep their slot.
    let mut keys: Vec<String> = Vec::with_capacity(nodes.len());
    let mut by_key: HashMap<String, &Node> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let key = normalize_node_key(&node.id);
        if by_key.insert(key.clone(), node).is_none() {
            keys.push(key);
        }
    }
    let index_by_key = keys
        .iter()
        .enumerate()
        .map(|(index, key)| (key.as_str(), index))
        .collect::<HashMap<_, _>>();

    let mut adjacency = vec![HashSet::new(); keys.len()];
    for edge in edges {
        let from = index_by_key.get(normalize_node_key(&edge.from).as_str()).copied();
        let to = index_by_key.get(normalize_node_key(&edge.to).as_str()).copied();
        if let (Some(from), Some(to)) = (from, to) {
            adjacency[from].insert(to);
            adjacency[to].insert(from);
        }
    }

    let hub = keys
        .iter()
        .position(|key| is_hub_id(key))
        .unwrap_or_else(|| busiest(&adjacency));
    let depths = ring_depths(hub, &adjacency);

    let mut rings: BTreeMap<usize, Vec<LayoutNode>> = BTreeMap::new();
    for (index, key) in keys.iter().enumerate() {
        let node = by_key[key.as_str()];
        let is_hub = index == hub;
        let size = if is_hub {
            node.size.max(config.hub_min_size)
        } else {
            node.size.max(config.node_min_size).min(config.node_max_size)
        };

        rings.entry(depths[index]).or_default().push(LayoutNode {
            id: node.id.clone(),
            key: key.clone(),
            label: node.display_label().to_owned(),
            position: vec2(node.x, node.y),
            size,
            tone: node.tone,
            depth: depths[index],
            angle: 0.0,
            is_hub,
        });
    }

    let mut layout = Vec::with_capacity(keys.len());
    for (depth, mut ring) in rings {
        if depth == 0 {
            for mut hub in ring {
                hub.position = Vec2::ZERO;
                hub.angle = 0.0;
                layout.push(hub);
            }
            continue;
        }

        ring.sort_by(|a, b| a.position.angle().total_cmp(&b.position.angle()));

        let count = ring.len() as f32;
        let radius = ring_radius(depth, ring.len(), config);
        let rotation = -FRAC_PI_2 + depth as f32 * RING_ROTATION_STEP;
        for (index, mut node) in ring.into_iter().enumerate() {
            let angle = rotation + (index as f32 / count) * TAU;
            node.angle = angle;
            node.position = Vec2::angled(angle) * radius;
            layout.push(node);
        }
    }

    layout
}

pub fn ring_radius(depth: usize, count: usize, config: &LayoutConfig) -> f32 {
    let base = config.ring_base_radius + depth.saturating_sub(1) as f32 * config.ring_step;
    let crowded = count as f32 * config.min_arc_spacing / TAU;
    base.max(crowded)
}

pub fn ring_radii(layout: &[LayoutNode]) -> Vec<f32> {
    let mut by_depth: BTreeMap<usize, f32> = BTreeMap::new();
    for node in layout.iter().filter(|node| node.depth > 0) {
        let distance = node.position.length();
        let radius = by_depth.entry(node.depth).or_default();
        *radius = radius.max(distance);
    }
    by_depth.into_values().collect()
}

fn busiest(adjacency: &[HashSet<usize>]) -> usize {
    let mut best = 0;
    for (index, neighbors) in adjacency.iter().enumerate() {
        if neighbors.len() > adjacency[best].len() {
            best = index;
        }
    }
    best
}

fn ring_depths(hub: usize, adjacency: &[HashSet<usize>]) -> Vec<usize> {
    let mut depths: Vec<Option<usize>> = vec![None; adjacency.len()];
    depths[hub] = Some(0);
    let mut queue = VecDeque::from([hub]);
    while let Some(current) = queue.pop_front() {
        let next = depths[current].unwrap_or_default() + 1;
        for &neighbor in &adjacency[current] {
            if depths[neighbor].is_none() {
                depths[neighbor] = Some(next);
                queue.push_back(neighbor);
            }
        }
    }

    let deepest = depths.iter().flatten().copied().max().unwrap_or_default();
    let mut detached = (deepest + 1).max(1);
    depths
        .into_iter()
        .map(|depth| {
            depth.unwrap_or_else(|| {
                detached += 1;
                detached - 1
            })
        })
        .collect()
}
