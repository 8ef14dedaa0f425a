use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use knowledge_feed::interaction::{graph_point, hit_test};
use knowledge_feed::nodes::{GraphSnapshot, HUB_NODE_ID, normalize_node_key, same_node};
use knowledge_feed::util::truncate_label;

use super::super::ViewModel;
use super::super::render_utils::{
    HUB_COLOR, blend_color, canvas_to_screen, circle_visible, dim_color, draw_background,
    edge_visible, tone_color,
};

impl ViewModel {
    pub(in crate::app) fn draw_graph(
        &mut self,
        ui: &mut Ui,
        snapshot: &Arc<GraphSnapshot>,
        elasticity: f32,
    ) {
        self.ensure_layout(snapshot);

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.handle_graph_pointer(ui, rect, &response, elasticity);

        let Some(cache) = self.layout_cache.as_ref() else {
            return;
        };

        let painter = ui.painter_at(rect);
        let pan = self.pan.offset();
        draw_background(&painter, rect, pan);

        let origin = canvas_to_screen(rect, pan, egui::Vec2::ZERO);
        for radius in &cache.rings {
            painter.circle_stroke(
                origin,
                *radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(106, 198, 255, 40)),
            );
        }

        let index_by_key = cache
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.key.as_str(), index))
            .collect::<HashMap<_, _>>();
        let selected_key = normalize_node_key(&self.selected);

        for edge in &snapshot.edges {
            let from = index_by_key.get(normalize_node_key(&edge.from).as_str());
            let to = index_by_key.get(normalize_node_key(&edge.to).as_str());
            let (Some(&from), Some(&to)) = (from, to) else {
                continue;
            };

            let start = canvas_to_screen(rect, pan, cache.nodes[from].position);
            let end = canvas_to_screen(rect, pan, cache.nodes[to].position);
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let touches_selection =
                cache.nodes[from].key == selected_key || cache.nodes[to].key == selected_key;
            let width = 0.8 + f32::from(edge.strength.min(5)) * 0.35;
            let color = if touches_selection {
                Color32::from_rgba_unmultiplied(246, 206, 104, 200)
            } else {
                Color32::from_rgba_unmultiplied(110, 120, 134, 140)
            };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        let hovered = ui.input(|input| input.pointer.hover_pos()).and_then(|pointer| {
            let point = graph_point(pointer, rect.center(), pan, &self.layout_config);
            hit_test(&cache.nodes, point, &self.layout_config).map(|node| node.key.as_str())
        });
        if hovered.is_some() && !self.pan.is_dragging() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        // Hub last, so neighbours never cover it.
        let mut draw_order = (0..cache.nodes.len()).collect::<Vec<_>>();
        draw_order.sort_by_key(|&index| cache.nodes[index].is_hub);

        let selection_active = !same_node(&self.selected, HUB_NODE_ID);
        let mut selection_animating = false;

        for index in draw_order {
            let node = &cache.nodes[index];
            let position = canvas_to_screen(rect, pan, node.position);
            let radius = node.radius();
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let is_selected = node.key == selected_key;
            let is_hovered = hovered == Some(node.key.as_str());
            let base_color = if node.is_hub {
                HUB_COLOR
            } else {
                tone_color(node.tone)
            };
            let unselected = if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.25)
            } else if selection_active && !node.is_hub {
                dim_color(base_color, 0.7)
            } else {
                base_color
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.key.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }
            let color = blend_color(unselected, base_color, selection_mix);

            painter.circle_filled(position, radius, color);
            if selection_mix > 0.0 {
                let halo_alpha = (60.0 + selection_mix * 140.0) as u8;
                painter.circle_stroke(
                    position,
                    radius + 4.0 + (1.0 - selection_mix) * 6.0,
                    Stroke::new(
                        1.0 + selection_mix * 1.6,
                        Color32::from_rgba_unmultiplied(245, 206, 93, halo_alpha),
                    ),
                );
            }
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            let label_size = if node.is_hub { 14.0 } else { 12.0 };
            painter.text(
                position,
                Align2::CENTER_CENTER,
                truncate_label(&node.label, if node.is_hub { 14 } else { 10 }),
                FontId::proportional(label_size),
                Color32::from_rgb(15, 18, 24),
            );
            if is_hovered {
                let post_count = snapshot
                    .find_node(&node.id)
                    .map(|node| node.posts.len())
                    .unwrap_or_default();
                painter.text(
                    position + vec2(radius + 6.0, 0.0),
                    Align2::LEFT_CENTER,
                    format!("{}  |  {post_count} posts", node.label),
                    FontId::proportional(13.0),
                    Color32::from_gray(238),
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }
    }
}
