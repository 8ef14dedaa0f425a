use std::sync::Arc;

use tracing::debug;

use knowledge_feed::layout::{compute_layout, ring_radii};
use knowledge_feed::nodes::GraphSnapshot;

use super::super::{LayoutCache, ViewModel};

impl ViewModel {
    pub(in crate::app) fn ensure_layout(&mut self, snapshot: &Arc<GraphSnapshot>) {
        if self
            .layout_cache
            .as_ref()
            .is_some_and(|cache| Arc::ptr_eq(&cache.snapshot, snapshot))
        {
            return;
        }

        let nodes = compute_layout(&snapshot.nodes, &snapshot.edges, &self.layout_config);
        let rings = ring_radii(&nodes);
        debug!(nodes = nodes.len(), rings = rings.len(), "graph laid out");

        self.layout_cache = Some(LayoutCache {
            snapshot: Arc::clone(snapshot),
            nodes,
            rings,
        });
    }
}
