use std::cmp::Ordering;
use std::collections::HashMap;

use super::key::{HUB_NODE_ID, HUB_NODE_LABEL, normalize_node_key};
use super::model::{Edge, GraphSnapshot, Node, Post, Tone};

const HUB_DEFAULT_SIZE: f32 = 84.0;

/// Merges two post lists of one node, keeping the freshest copy of each id.
///
/// Incoming posts are considered first, so they win ties. The result is
/// sorted newest first when any post carries a readable timestamp and is
/// truncated to `cap`.
pub fn merge_posts(previous: &[Post], incoming: &[Post], cap: usize) -> Vec<Post> {
    if previous.is_empty() && incoming.is_empty() {
        return Vec::new();
    }

    let mut merged: Vec<(Option<f64>, &Post)> = Vec::with_capacity(previous.len() + incoming.len());
    let mut index_by_id: HashMap<&str, usize> = HashMap::new();

    for post in incoming.iter().chain(previous) {
        if post.id.is_empty() {
            continue;
        }

        let time = post.resolved_timestamp();
        let Some(index) = index_by_id.get(post.id.as_str()).copied() else {
            index_by_id.insert(post.id.as_str(), merged.len());
            merged.push((time, post));
            continue;
        };

        let replace = match (merged[index].0, time) {
            (None, Some(_)) => true,
            (Some(existing), Some(candidate)) => candidate > existing,
            _ => false,
        };
        if replace {
            merged[index] = (time, post);
        }
    }

    if merged.iter().any(|(time, _)| time.is_some()) {
        merged.sort_by(|(a, _), (b, _)| newest_first(*a, *b));
    }

    merged
        .into_iter()
        .take(cap)
        .map(|(_, post)| post.clone())
        .collect()
}

fn newest_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn merge_nodes(previous: &[Node], incoming: &[Node], post_cap: usize) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(previous.len() + incoming.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for node in previous.iter().chain(incoming) {
        let key = normalize_node_key(&node.id);
        match index_by_key.get(&key).copied() {
            Some(index) => {
                let existing = &mut merged[index];
                let posts = merge_posts(&existing.posts, &node.posts, post_cap);
                let label = node.label.clone().or_else(|| existing.label.take());
                *existing = Node {
                    id: key,
                    label,
                    x: node.x,
                    y: node.y,
                    size: node.size,
                    tone: node.tone,
                    posts,
                };
            }
            None => {
                index_by_key.insert(key.clone(), merged.len());
                merged.push(Node {
                    id: key,
                    label: node.label.clone(),
                    x: node.x,
                    y: node.y,
                    size: node.size,
                    tone: node.tone,
                    posts: merge_posts(&[], &node.posts, post_cap),
                });
            }
        }
    }

    merged
}

pub fn merge_edges(previous: &[Edge], incoming: &[Edge]) -> Vec<Edge> {
    let mut merged: Vec<Edge> = Vec::with_capacity(previous.len() + incoming.len());
    let mut index_by_key: HashMap<(String, String, u8), usize> = HashMap::new();

    for edge in incoming {
        let edge = normalize_edge(edge);
        let key = (edge.from.clone(), edge.to.clone(), edge.strength);
        match index_by_key.get(&key).copied() {
            Some(index) => merged[index] = edge,
            None => {
                index_by_key.insert(key, merged.len());
                merged.push(edge);
            }
        }
    }

    for edge in previous {
        let edge = normalize_edge(edge);
        let key = (edge.from.clone(), edge.to.clone(), edge.strength);
        if !index_by_key.contains_key(&key) {
            index_by_key.insert(key, merged.len());
            merged.push(edge);
        }
    }

    merged
}

fn normalize_edge(edge: &Edge) -> Edge {
    Edge {
        from: normalize_node_key(&edge.from),
        to: normalize_node_key(&edge.to),
        strength: edge.strength,
    }
}

pub(super) fn build_hub(existing: Option<Node>, posts: Vec<Post>) -> Node {
    match existing {
        Some(hub) => Node {
            id: HUB_NODE_ID.to_owned(),
            label: hub.label.or_else(|| Some(HUB_NODE_LABEL.to_owned())),
            posts,
            ..hub
        },
        None => Node {
            id: HUB_NODE_ID.to_owned(),
            label: Some(HUB_NODE_LABEL.to_owned()),
            x: 0.0,
            y: 0.0,
            size: HUB_DEFAULT_SIZE,
            tone: Tone::Primary,
            posts,
        },
    }
}

pub fn ensure_hub(nodes: Vec<Node>, post_cap: usize) -> Vec<Node> {
    if !nodes.iter().any(|node| !node.is_hub()) {
        return nodes;
    }

    let mut existing_hub = None;
    let mut topics = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.is_hub() {
            if existing_hub.is_none() {
                existing_hub = Some(node);
            }
        } else {
            topics.push(node);
        }
    }

    let topic_posts = topics
        .iter()
        .flat_map(|node| node.posts.iter().cloned())
        .collect::<Vec<_>>();
    let hub_posts = merge_posts(
        existing_hub
            .as_ref()
            .map(|hub| hub.posts.as_slice())
            .unwrap_or_default(),
        &topic_posts,
        post_cap,
    );

    let mut result = Vec::with_capacity(topics.len() + 1);
    result.push(build_hub(existing_hub, hub_posts));
    result.extend(topics);
    result
}

/// Merges a freshly fetched snapshot into the cached one.
///
/// Returns `None` when neither side has any node.
pub fn merge_graph(
    previous: Option<&GraphSnapshot>,
    incoming: &GraphSnapshot,
    post_cap: usize,
) -> Option<GraphSnapshot> {
    let (previous_nodes, previous_edges) = previous
        .map(|snapshot| (snapshot.nodes.as_slice(), snapshot.edges.as_slice()))
        .unwrap_or_default();

    if previous_nodes.is_empty() && incoming.nodes.is_empty() {
        return None;
    }

    Some(GraphSnapshot {
        nodes: ensure_hub(merge_nodes(previous_nodes, &incoming.nodes, post_cap), post_cap),
        edges: merge_edges(previous_edges, &incoming.edges),
    })
}

pub fn with_hub(snapshot: GraphSnapshot, post_cap: usize) -> GraphSnapshot {
    GraphSnapshot {
        nodes: ensure_hub(merge_nodes(&[], &snapshot.nodes, post_cap), post_cap),
        edges: merge_edges(&[], &snapshot.edges),
    }
}
