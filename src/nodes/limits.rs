use std::collections::HashSet;

use crate::config::DataLimits;

use super::key::{HUB_NODE_ID, normalize_node_key};
use super::merge::{build_hub, merge_posts};
use super::model::{GraphSnapshot, Node, Post};

pub fn post_freshness(posts: &[Post]) -> f64 {
    posts
        .iter()
        .filter_map(Post::resolved_timestamp)
        .fold(0.0, f64::max)
}

/// Keeps the strongest topics, drops edges to pruned nodes and rebuilds the
/// hub from the survivors.
///
/// Topics rank by post count, then freshness, then label. Survivors keep
/// their original relative order.
pub fn apply_limits(snapshot: GraphSnapshot, limits: &DataLimits) -> GraphSnapshot {
    let mut existing_hub = None;
    let mut topics = Vec::with_capacity(snapshot.nodes.len());
    for node in snapshot.nodes {
        if node.is_hub() {
            if existing_hub.is_none() {
                existing_hub = Some(node);
            }
        } else {
            topics.push(node);
        }
    }

    if topics.len() > limits.max_topic_nodes {
        topics = keep_strongest(topics, limits.max_topic_nodes);
    }

    let mut allowed = topics
        .iter()
        .map(|node| normalize_node_key(&node.id))
        .collect::<HashSet<_>>();
    allowed.insert(normalize_node_key(HUB_NODE_ID));
    if let Some(hub) = &existing_hub {
        allowed.insert(normalize_node_key(&hub.id));
    }

    let edges = snapshot
        .edges
        .into_iter()
        .filter(|edge| {
            allowed.contains(&normalize_node_key(&edge.from))
                && allowed.contains(&normalize_node_key(&edge.to))
        })
        .collect();

    if topics.is_empty() {
        return GraphSnapshot {
            nodes: existing_hub.into_iter().collect(),
            edges,
        };
    }

    let topic_posts = topics
        .iter()
        .flat_map(|node| node.posts.iter().cloned())
        .collect::<Vec<_>>();
    let hub = build_hub(
        existing_hub,
        merge_posts(&[], &topic_posts, limits.max_posts_per_node),
    );

    let mut nodes = Vec::with_capacity(topics.len() + 1);
    nodes.push(hub);
    nodes.extend(topics);
    GraphSnapshot { nodes, edges }
}

fn keep_strongest(topics: Vec<Node>, keep: usize) -> Vec<Node> {
    let mut ranked = topics
        .iter()
        .enumerate()
        .map(|(index, node)| {
            (
                index,
                node.posts.len(),
                post_freshness(&node.posts),
                node.display_label(),
            )
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.2.total_cmp(&a.2))
            .then_with(|| a.3.cmp(b.3))
    });

    let kept = ranked
        .into_iter()
        .take(keep)
        .map(|(index, ..)| index)
        .collect::<HashSet<_>>();

    topics
        .into_iter()
        .enumerate()
        .filter_map(|(index, node)| kept.contains(&index).then_some(node))
        .collect()
}

/// Distinct posts across topic nodes: by id, plus every id-less post.
pub fn distinct_topic_post_count(snapshot: &GraphSnapshot) -> usize {
    let mut ids = HashSet::new();
    let mut anonymous = 0usize;
    for post in snapshot.topics().flat_map(|node| node.posts.iter()) {
        if post.id.is_empty() {
            anonymous += 1;
        } else {
            ids.insert(post.id.as_str());
        }
    }
    ids.len() + anonymous
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::key::is_hub_id;
    use crate::nodes::model::{Edge, PostMedia, Timestamp, Tone};

    fn post(id: &str, timestamp: f64) -> Post {
        Post {
            id: id.to_owned(),
            source: None,
            user_name: None,
            user_handle: None,
            user_avatar: None,
            content: None,
            media: PostMedia::Text,
            timestamp: Some(Timestamp::Number(timestamp)),
            retweeted: None,
        }
    }

    fn topic(index: usize, posts: Vec<Post>) -> Node {
        Node {
            id: format!("topic-{index}"),
            label: Some(format!("Topic {index}")),
            x: index as f32 * 10.0,
            y: index as f32 * 5.0,
            size: 60.0,
            tone: Tone::Primary,
            posts,
        }
    }

    fn chain(count: usize) -> GraphSnapshot {
        GraphSnapshot {
            nodes: (1..=count)
                .map(|index| topic(index, vec![post(&format!("p-{index}"), index as f64)]))
                .collect(),
            edges: (1..count)
                .map(|index| Edge {
                    from: format!("topic-{index}"),
                    to: format!("topic-{}", index + 1),
                    strength: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn keeps_thirty_freshest_topics_and_their_edges() {
        let limits = DataLimits::default();
        let limited = apply_limits(chain(35), &limits);

        assert_eq!(limited.nodes.len(), 31);
        assert!(is_hub_id(&limited.nodes[0].id));
        assert_eq!(limited.topics().count(), 30);
        assert!(limited.find_node("topic-5").is_none());
        assert!(limited.find_node("topic-6").is_some());
        assert_eq!(limited.edges.len(), 29);
        assert!(limited.edges.iter().all(|edge| edge.from != "topic-5"));

        let hub = limited.hub().expect("hub present");
        assert!(hub.posts.len() >= limits.min_posts_per_node);
        assert!(hub.posts.len() <= limits.max_posts_per_node);
        assert!(hub.posts.iter().all(|post| post.id != "p-1"));
    }

    #[test]
    fn ranks_by_count_then_freshness_then_label() {
        let limits = DataLimits {
            max_topic_nodes: 2,
            ..DataLimits::default()
        };
        let mut quiet = topic(1, vec![post("a", 1.0)]);
        quiet.label = Some("Alpha".into());
        let mut busy = topic(2, vec![post("b", 1.0), post("c", 2.0)]);
        busy.label = Some("Zulu".into());
        let mut fresh = topic(3, vec![post("d", 9.0)]);
        fresh.label = Some("Beta".into());
        let mut tie = topic(4, vec![post("e", 9.0)]);
        tie.label = Some("Aardvark".into());

        let limited = apply_limits(
            GraphSnapshot {
                nodes: vec![quiet, busy, fresh, tie],
                edges: Vec::new(),
            },
            &limits,
        );

        let kept = limited.topics().map(Node::display_label).collect::<Vec<_>>();
        assert_eq!(kept, ["Zulu", "Aardvark"]);
    }

    #[test]
    fn hub_is_created_for_topics_and_kept_alone() {
        let limits = DataLimits::default();
        let seeded = apply_limits(chain(1), &limits);
        assert_eq!(seeded.nodes.len(), 2);
        assert_eq!(seeded.hub().map(|hub| hub.posts.len()), Some(1));

        let only_hub = GraphSnapshot {
            nodes: vec![Node {
                id: "for you".into(),
                ..topic(0, Vec::new())
            }],
            edges: Vec::new(),
        };
        assert_eq!(apply_limits(only_hub.clone(), &limits), only_hub);
    }

    #[test]
    fn counts_distinct_topic_posts() {
        let mut snapshot = chain(3);
        snapshot.nodes[1].posts.push(post("p-1", 1.0));
        snapshot.nodes[2].posts.push(post("", 0.0));
        snapshot.nodes[2].posts.push(post("", 0.0));
        let snapshot = apply_limits(snapshot, &DataLimits::default());

        assert_eq!(distinct_topic_post_count(&snapshot), 5);
        assert_eq!(post_freshness(&snapshot.nodes[1].posts), 1000.0);
        assert_eq!(post_freshness(&[]), 0.0);
    }
}
