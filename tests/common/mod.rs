//! Builders and a scripted snapshot source shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use knowledge_feed::api::ApiError;
use knowledge_feed::nodes::{Edge, GraphSnapshot, Node, NodesSource, Post, PostMedia, Timestamp, Tone};

pub fn post(id: &str, timestamp: f64) -> Post {
    Post {
        id: id.to_owned(),
        source: None,
        user_name: None,
        user_handle: None,
        user_avatar: None,
        content: Some(format!("post {id}")),
        media: PostMedia::Text,
        timestamp: Some(Timestamp::Number(timestamp)),
        retweeted: None,
    }
}

pub fn node(id: &str, posts: Vec<Post>) -> Node {
    Node {
        id: id.to_owned(),
        label: None,
        x: 0.0,
        y: 0.0,
        size: 60.0,
        tone: Tone::Primary,
        posts,
    }
}

pub fn edge(from: &str, to: &str) -> Edge {
    Edge {
        from: from.to_owned(),
        to: to.to_owned(),
        strength: 1,
    }
}

pub fn snapshot(nodes: Vec<Node>) -> GraphSnapshot {
    GraphSnapshot {
        nodes,
        edges: Vec::new(),
    }
}

pub fn post_ids(node: &Node) -> Vec<&str> {
    node.posts.iter().map(|post| post.id.as_str()).collect()
}

pub enum Reply {
    Snapshot(GraphSnapshot),
    Failure,
}

/// Answers fetches from a queue of replies after an optional delay and
/// records every call.
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<VecDeque<(Duration, Reply)>>,
    calls: AtomicUsize,
    limits: Mutex<Vec<Option<u32>>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, delay: Duration, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .push_back((delay, reply));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn limits(&self) -> Vec<Option<u32>> {
        self.limits.lock().unwrap().clone()
    }
}

impl NodesSource for ScriptedSource {
    async fn fetch_nodes(&self, limit: Option<u32>) -> Result<GraphSnapshot, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.limits.lock().unwrap().push(limit);
        let next = self.replies.lock().unwrap().pop_front();
        let Some((delay, reply)) = next else {
            return Ok(GraphSnapshot::default());
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Reply::Snapshot(snapshot) => Ok(snapshot),
            Reply::Failure => Err(ApiError::InvalidBaseUrl("scripted failure".to_owned())),
        }
    }
}
