use eframe::egui::{self, Rect, Ui};

use knowledge_feed::interaction::{PanBounds, Release};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        elasticity: f32,
    ) {
        let bounds = PanBounds::for_view(rect.size(), &self.layout_config);
        let (pressed, down, released, pointer, velocity, dt) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_down(),
                input.pointer.primary_released(),
                input.pointer.interact_pos(),
                input.pointer.velocity(),
                input.stable_dt.min(0.1),
            )
        });

        if pressed
            && response.contains_pointer()
            && let Some(pointer) = pointer
        {
            let layout = self
                .layout_cache
                .as_ref()
                .map(|cache| cache.nodes.as_slice())
                .unwrap_or_default();
            self.pan
                .begin(pointer, rect.center(), layout, &self.layout_config);
        }

        if down
            && self.pan.is_dragging()
            && let Some(pointer) = pointer
        {
            self.pan.drag(pointer, &bounds, elasticity);
        }

        let ended = released || (!down && self.pan.is_dragging());
        if ended && let Some(pointer) = pointer.or_else(|| self.pan.last_pointer()) {
            // egui reports points per second.
            let velocity = velocity / 1000.0;
            if let Some(Release::Tap(id)) = self.pan.release(pointer, velocity, &bounds) {
                self.select(id);
            }
        }

        if self.pan.is_animating() {
            self.pan.step(dt * 1000.0, &bounds);
            ui.ctx().request_repaint();
        }

        if self.pan.is_dragging() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
        }
    }
}
