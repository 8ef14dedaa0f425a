mod key;
mod limits;
mod merge;
mod model;
mod parse;
mod poll;
mod store;

pub use key::{HUB_NODE_ID, HUB_NODE_LABEL, is_hub_id, normalize_node_key, same_node};
pub use limits::{apply_limits, distinct_topic_post_count, post_freshness};
pub use merge::{ensure_hub, merge_edges, merge_graph, merge_nodes, merge_posts, with_hub};
pub use model::{Edge, GraphSnapshot, Node, Post, PostMedia, Timestamp, Tone, TopicSummary};
pub use poll::background_target_reached;
pub use store::{NodesSource, NodesState, NodesStatus, NodesStore, NodesView, RefreshOptions};
