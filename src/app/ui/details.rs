use std::collections::HashMap;

use chrono::Utc;
use eframe::egui::{self, Color32, RichText, Ui};

use knowledge_feed::config::{DataLimits, UiSettings};
use knowledge_feed::nodes::{GraphSnapshot, Post, PostMedia, is_hub_id};
use knowledge_feed::util::{display_handle, format_post_age, truncate_label};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_feed(
        &self,
        ui: &mut Ui,
        data: Option<&GraphSnapshot>,
        limits: &DataLimits,
        settings: &UiSettings,
    ) {
        let Some(data) = data else {
            ui.heading("Feed");
            ui.label("Nothing to show yet.");
            return;
        };

        let title = data
            .find_node(&self.selected)
            .map(|node| node.display_label().to_owned())
            .unwrap_or_else(|| self.selected.clone());
        ui.heading(title);

        let posts = data.feed_for(&self.selected, limits);
        ui.label(format!("{} posts", posts.len()));
        ui.separator();

        if posts.is_empty() {
            ui.label("No posts for this topic yet.");
            return;
        }

        // Hub posts are tagged with the topic they came from.
        let topic_labels = if is_hub_id(&self.selected) {
            data.topic_label_by_post()
        } else {
            HashMap::new()
        };

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for post in posts {
                    draw_post(ui, post, topic_labels.get(post.id.as_str()).copied(), settings);
                    ui.add_space(settings.spacing(6.0));
                    ui.separator();
                }
            });
    }
}

fn draw_post(ui: &mut Ui, post: &Post, topic: Option<&str>, settings: &UiSettings) {
    ui.horizontal_wrapped(|ui| {
        if let Some(name) = post.user_name.as_deref().filter(|name| !name.is_empty()) {
            ui.label(RichText::new(name).strong());
        }
        if let Some(handle) = post.user_handle.as_deref().filter(|handle| !handle.is_empty()) {
            ui.label(RichText::new(display_handle(handle)).weak());
        }
        if let Some(timestamp) = post.resolved_timestamp() {
            ui.label(RichText::new(format_post_age(timestamp, Utc::now())).weak());
        }
        if let Some(topic) = topic {
            ui.label(
                RichText::new(truncate_label(topic, 24))
                    .small()
                    .color(Color32::from_rgb(103, 196, 255)),
            );
        }
    });

    if let Some(content) = post.content.as_deref().filter(|content| !content.is_empty()) {
        ui.label(content);
    }

    match &post.media {
        PostMedia::Text => {}
        PostMedia::Image { url } => {
            if let Some(url) = url {
                ui.hyperlink_to("image", url);
            }
        }
        PostMedia::Video { .. } => {
            if let Some(thumbnail) = post.media.thumbnail() {
                ui.hyperlink_to("▶ video", thumbnail);
            }
        }
    }

    if let Some(retweeted) = &post.retweeted {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(RichText::new("retweeted").small().weak());
            draw_post(ui, retweeted, None, settings);
        });
    }

    if let Some(source) = post.source.as_deref().filter(|source| !source.is_empty()) {
        ui.label(RichText::new(source).small().weak());
    }
}
