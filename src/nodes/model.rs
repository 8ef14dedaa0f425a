use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::DataLimits;

use super::key::{is_hub_id, normalize_node_key};
use super::parse::{RawPost, null_as_default, resolve_timestamp};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Primary,
    Secondary,
    Accent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Number(f64),
    Text(String),
}

impl Timestamp {
    pub fn resolve(&self) -> Option<f64> {
        resolve_timestamp(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PostMedia {
    Text,
    Image {
        url: Option<String>,
    },
    Video {
        url: Option<String>,
        thumbnail: Option<String>,
    },
}

impl PostMedia {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
        }
    }

    pub fn thumbnail(&self) -> Option<&str> {
        match self {
            Self::Text => None,
            Self::Image { url } => url.as_deref(),
            Self::Video { url, thumbnail } => thumbnail.as_deref().or(url.as_deref()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPost", into = "RawPost")]
pub struct Post {
    pub id: String,
    pub source: Option<String>,
    pub user_name: Option<String>,
    pub user_handle: Option<String>,
    pub user_avatar: Option<String>,
    pub content: Option<String>,
    pub media: PostMedia,
    pub timestamp: Option<Timestamp>,
    pub retweeted: Option<Box<Post>>,
}

impl Post {
    pub fn resolved_timestamp(&self) -> Option<f64> {
        self.timestamp.as_ref().and_then(Timestamp::resolve)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub size: f32,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<Post>,
}

impl Node {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn is_hub(&self) -> bool {
        is_hub_id(&self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default = "default_strength")]
    pub strength: u8,
}

fn default_strength() -> u8 {
    1
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Edge>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicSummary {
    pub id: String,
    pub label: String,
    pub post_count: usize,
}

impl GraphSnapshot {
    pub fn hub(&self) -> Option<&Node> {
        self.nodes.iter().find(|node| node.is_hub())
    }

    pub fn topics(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| !node.is_hub())
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        let key = normalize_node_key(id);
        self.nodes
            .iter()
            .find(|node| normalize_node_key(&node.id) == key)
    }

    pub fn has_posts(&self) -> bool {
        self.nodes.iter().any(|node| !node.posts.is_empty())
    }

    pub fn feed_for(&self, id: &str, limits: &DataLimits) -> Vec<&Post> {
        if is_hub_id(id) {
            return match self.hub() {
                Some(hub) => hub.posts.iter().take(limits.visible_hub_posts).collect(),
                None => self
                    .topics()
                    .flat_map(|node| node.posts.iter())
                    .take(limits.visible_hub_posts)
                    .collect(),
            };
        }

        self.find_node(id)
            .map(|node| node.posts.iter().collect())
            .unwrap_or_default()
    }

    pub fn topic_label_by_post(&self) -> HashMap<&str, &str> {
        let mut topics = self.topics().collect::<Vec<_>>();
        topics.sort_by(|a, b| b.posts.len().cmp(&a.posts.len()));

        let mut labels = HashMap::new();
        for node in topics {
            for post in &node.posts {
                if post.id.is_empty() {
                    continue;
                }
                labels.entry(post.id.as_str()).or_insert(node.display_label());
            }
        }
        labels
    }

    pub fn topic_summaries(&self) -> Vec<TopicSummary> {
        self.topics()
            .map(|node| TopicSummary {
                id: node.id.clone(),
                label: node.display_label().to_owned(),
                post_count: node.posts.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot() -> GraphSnapshot {
        serde_json::from_value(json!({
            "nodes": [
                { "id": "for_you", "label": "For you", "x": 0, "y": 0, "size": 84, "tone": "primary",
                  "posts": [{ "id": "1" }, { "id": "2" }, { "id": "3" }] },
                { "id": "ai", "x": 1, "y": 2, "size": 60, "tone": "accent",
                  "posts": [{ "id": "1" }] },
                { "id": "design", "label": "Design", "x": 1, "y": 2, "size": 60, "tone": "secondary",
                  "posts": [{ "id": "1" }, { "id": "2" }] },
                { "id": "empty", "posts": null }
            ],
            "edges": [{ "from": "ai", "to": "design", "strength": 2 }]
        }))
        .expect("valid snapshot")
    }

    #[test]
    fn decodes_wire_snapshot_with_defaults() {
        let snapshot = snapshot();
        let empty = snapshot.find_node("EMPTY").expect("normalized lookup");
        assert!(empty.posts.is_empty());
        assert_eq!(empty.tone, Tone::Primary);
        assert_eq!(snapshot.find_node("ai").map(Node::display_label), Some("ai"));
        assert_eq!(snapshot.edges[0].strength, 2);

        let decoded: GraphSnapshot =
            serde_json::from_value(json!({ "nodes": null, "edges": null })).expect("valid");
        assert_eq!(decoded, GraphSnapshot::default());
    }

    #[test]
    fn hub_feed_is_bounded_and_topic_feed_is_complete() {
        let snapshot = snapshot();
        let limits = DataLimits {
            visible_hub_posts: 2,
            ..DataLimits::default()
        };

        let hub_feed = snapshot.feed_for("For You", &limits);
        assert_eq!(hub_feed.len(), 2);
        assert_eq!(snapshot.feed_for("design", &limits).len(), 2);
        assert!(snapshot.feed_for("missing", &limits).is_empty());
    }

    #[test]
    fn posts_are_tagged_with_heaviest_topic() {
        let snapshot = snapshot();
        let labels = snapshot.topic_label_by_post();
        assert_eq!(labels.get("1"), Some(&"Design"));
        assert_eq!(labels.get("2"), Some(&"Design"));
        assert_eq!(labels.get("3"), None);

        let summaries = snapshot.topic_summaries();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].label, "ai");
        assert_eq!(summaries[1].post_count, 2);
    }
}
