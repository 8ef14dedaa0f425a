use std::sync::{Arc, Weak};

use tracing::{debug, info};

use crate::config::DataLimits;

use super::limits::distinct_topic_post_count;
use super::model::GraphSnapshot;
use super::store::{Inner, NodesSource, NodesStore, Poller, RefreshOptions};

pub fn background_target_reached(snapshot: Option<&GraphSnapshot>, limits: &DataLimits) -> bool {
    snapshot.is_some_and(|snapshot| {
        distinct_topic_post_count(snapshot) >= limits.background_stop_total_topic_posts
    })
}

impl<S: NodesSource> NodesStore<S> {
    pub fn start_background_refresh(&self) {
        let mut control = self.inner.control();
        if control.poller.is_some() {
            return;
        }

        control.poller_generation += 1;
        let generation = control.poller_generation;
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(poll_loop(weak, generation));
        control.poller = Some(Poller {
            generation,
            abort: task.abort_handle(),
        });
        info!(interval = ?self.inner.polling.interval, "background refresh started");
    }

    pub fn stop_background_refresh(&self) {
        if let Some(poller) = self.inner.control().poller.take() {
            poller.abort.abort();
            debug!("background refresh stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.inner.control().poller.is_some()
    }
}

async fn poll_loop<S: NodesSource>(weak: Weak<Inner<S>>, generation: u64) {
    loop {
        let interval = match weak.upgrade() {
            Some(inner) => inner.polling.interval,
            None => return,
        };
        tokio::time::sleep(interval).await;

        let Some(inner) = weak.upgrade() else {
            return;
        };
        if background_target_reached(inner.current_data().as_deref(), &inner.limits) {
            info!(
                threshold = inner.limits.background_stop_total_topic_posts,
                "background refresh target reached"
            );
            let mut control = inner.control();
            if control
                .poller
                .as_ref()
                .is_some_and(|poller| poller.generation == generation)
            {
                control.poller = None;
            }
            return;
        }

        let store = NodesStore { inner };
        let limit = store.inner.limits.background_fetch_limit;
        store
            .refresh_nodes(RefreshOptions::limit(limit).silent())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::ApiError;
    use crate::config::PollingConfig;
    use crate::nodes::model::{Node, Post, PostMedia, Timestamp};

    struct Empty;

    impl NodesSource for Empty {
        async fn fetch_nodes(&self, _limit: Option<u32>) -> Result<GraphSnapshot, ApiError> {
            Ok(GraphSnapshot::default())
        }
    }

    fn seeded_store() -> NodesStore<Empty> {
        let post = Post {
            id: "p1".to_owned(),
            source: None,
            user_name: None,
            user_handle: None,
            user_avatar: None,
            content: None,
            media: PostMedia::Text,
            timestamp: Some(Timestamp::Number(1.0)),
            retweeted: None,
        };
        let seed = GraphSnapshot {
            nodes: vec![Node {
                id: "ai".to_owned(),
                label: None,
                x: 0.0,
                y: 0.0,
                size: 60.0,
                tone: Default::default(),
                posts: vec![post],
            }],
            edges: Vec::new(),
        };
        let limits = DataLimits {
            background_stop_total_topic_posts: 1,
            ..DataLimits::default()
        };
        let polling = PollingConfig {
            interval: Duration::from_secs(10),
            auto_load: false,
            background: true,
        };
        NodesStore::new(Empty, limits, polling, Some(seed))
    }

    #[tokio::test(start_paused = true)]
    async fn finished_loop_leaves_a_newer_poller_alone() {
        let store = seeded_store();
        store.start_background_refresh();
        store.stop_background_refresh();
        tokio::spawn(poll_loop(Arc::downgrade(&store.inner), 1));

        tokio::time::sleep(Duration::from_secs(5)).await;
        store.start_background_refresh();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.is_polling());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!store.is_polling());
    }
}
