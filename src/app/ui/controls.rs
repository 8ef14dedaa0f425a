use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use knowledge_feed::nodes::{GraphSnapshot, HUB_NODE_ID, HUB_NODE_LABEL, TopicSummary, same_node};

use super::super::ViewModel;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn filter_topics(topics: Vec<TopicSummary>, query: &str) -> Vec<TopicSummary> {
    let query = query.trim();
    if query.is_empty() {
        return topics;
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = topics
        .into_iter()
        .filter_map(|topic| {
            fuzzy_match_score(&matcher, &topic.label, query).map(|score| (score, topic))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, topic)| topic).collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_topics(&mut self, ui: &mut Ui, data: Option<&GraphSnapshot>) {
        ui.heading("Topics");
        ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("filter topics"));
        ui.separator();

        let Some(data) = data else {
            ui.label("No topics loaded.");
            return;
        };

        let hub_selected = same_node(&self.selected, HUB_NODE_ID);
        if ui
            .selectable_label(hub_selected, RichText::new(HUB_NODE_LABEL).strong())
            .clicked()
        {
            self.select(HUB_NODE_ID.to_owned());
        }

        let topics = filter_topics(data.topic_summaries(), &self.search);
        if topics.is_empty() {
            ui.label("No matching topics.");
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for topic in &topics {
                    let selected = same_node(&self.selected, &topic.id);
                    let text = format!("{}  ({})", topic.label, topic.post_count);
                    if ui.selectable_label(selected, text).clicked() {
                        clicked = Some(topic.id.clone());
                    }
                }
            });

        if let Some(id) = clicked {
            self.select(id);
        }
    }

    pub(in crate::app) fn select(&mut self, id: String) {
        if !same_node(&self.selected, &id) {
            self.selected = id;
        }
    }
}
