use eframe::egui::{self, Align, Context, FontId, Layout, RichText, TextStyle, Ui};

use knowledge_feed::config::{UiSettings, UiSize};
use knowledge_feed::nodes::{
    GraphSnapshot, HUB_NODE_ID, NodesState, NodesView, RefreshOptions, distinct_topic_post_count,
};
use knowledge_feed::util::display_handle;

use super::super::{FeedApp, ViewModel};

impl FeedApp {
    pub(in crate::app) fn apply_style(&self, ctx: &Context) {
        let settings = self.settings;
        ctx.style_mut(|style| {
            style.text_styles.insert(
                TextStyle::Body,
                FontId::proportional(settings.font(14.0)),
            );
            style.text_styles.insert(
                TextStyle::Button,
                FontId::proportional(settings.font(14.0)),
            );
            style.text_styles.insert(
                TextStyle::Heading,
                FontId::proportional(settings.font(20.0)),
            );
            style.text_styles.insert(
                TextStyle::Small,
                FontId::proportional(settings.font(11.0)),
            );
            style.spacing.item_spacing = egui::vec2(settings.spacing(8.0), settings.spacing(6.0));
        });
    }

    pub(in crate::app) fn draw_top_bar(
        &mut self,
        ui: &mut Ui,
        state: &NodesState,
        sync_requested: &mut bool,
    ) {
        ui.horizontal(|ui| {
            ui.heading("knowledge feed");
            ui.separator();
            ui.label(status_text(state));
            if let Some(data) = &state.data {
                ui.label(format!(
                    "topics: {}  posts: {}",
                    data.topics().count(),
                    distinct_topic_post_count(data)
                ));
            }

            let refresh = ui.add_enabled(!state.is_loading(), egui::Button::new("Refresh"));
            if refresh.clicked() {
                self.nodes.request_refresh(RefreshOptions::default());
            }
            if ui.button("Clear").clicked() {
                self.nodes.clear_nodes();
                self.view.pan.reset();
            }
            let syncing = self.sync_rx.is_some();
            if ui
                .add_enabled(!syncing, egui::Button::new("Sync Twitter"))
                .clicked()
            {
                *sync_requested = true;
            }
            if let Some(message) = &self.sync_message {
                ui.label(message.as_str());
            }
            if let Some(auth_url) = self.auth.pending_auth_url() {
                ui.hyperlink_to("Link account", auth_url);
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                self.draw_settings(ui);
                self.draw_profile(ui);
            });
        });
    }

    fn draw_settings(&mut self, ui: &mut Ui) {
        let mut elasticity = self.settings.elasticity();
        ui.label(self.settings.elasticity_label());
        let slider = egui::Slider::new(
            &mut elasticity,
            UiSettings::ELASTICITY_MIN..=UiSettings::ELASTICITY_MAX,
        )
        .step_by(0.05)
        .text("elasticity");
        if ui.add(slider).changed() {
            self.settings.set_elasticity(elasticity);
        }

        egui::ComboBox::from_id_salt("ui_size")
            .selected_text(self.settings.size.label())
            .show_ui(ui, |ui| {
                for size in UiSize::ALL {
                    ui.selectable_value(&mut self.settings.size, size, size.label());
                }
            });
    }

    fn draw_profile(&self, ui: &mut Ui) {
        let profile = self.profile.state();
        let Some(user) = profile.data.filter(|user| user.has_identity()) else {
            return;
        };
        let name = user.name.unwrap_or_default();
        let handle = user.handle.as_deref().map(display_handle).unwrap_or_default();
        ui.label(RichText::new(format!("{name} {handle}").trim().to_owned()).strong());
        ui.separator();
    }

    pub(in crate::app) fn draw_center(&mut self, ui: &mut Ui, state: &NodesState) {
        match (state.view(), &state.data) {
            (NodesView::Ready, Some(data)) => {
                let elasticity = self.settings.elasticity();
                self.view.draw_graph(ui, data, elasticity);
            }
            (NodesView::Loading, _) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Loading knowledge graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            }
            (NodesView::Failed, _) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        self.nodes.request_refresh(RefreshOptions::default());
                    }
                });
            }
            (NodesView::Cleared, _) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Graph cleared");
                    ui.add_space(10.0);
                    if ui.button("Load again").clicked() {
                        self.nodes.request_refresh(RefreshOptions::default());
                    }
                });
            }
            _ => {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Nothing loaded yet");
                    ui.add_space(10.0);
                    if ui.button("Load").clicked() {
                        self.nodes.request_refresh(RefreshOptions::default());
                    }
                });
            }
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn sync_selection(&mut self, data: Option<&GraphSnapshot>) {
        let exists = data.is_some_and(|data| data.find_node(&self.selected).is_some());
        if !exists && self.selected != HUB_NODE_ID {
            self.selected = HUB_NODE_ID.to_owned();
        }
    }
}

fn status_text(state: &NodesState) -> String {
    let label = match state.view() {
        NodesView::Empty => "idle",
        NodesView::Loading => "loading",
        NodesView::Ready if state.is_loading() => "refreshing",
        NodesView::Ready => "ready",
        NodesView::Failed => "failed",
        NodesView::Cleared => "cleared",
    };
    match state.last_updated {
        Some(updated) => format!("{label} · {}", updated.format("%H:%M:%S")),
        None => label.to_owned(),
    }
}
