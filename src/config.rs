use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataLimits {
    pub max_topic_nodes: usize,
    pub min_posts_per_node: usize,
    pub max_posts_per_node: usize,
    pub visible_hub_posts: usize,
    pub background_fetch_limit: u32,
    pub background_stop_total_topic_posts: usize,
    pub sync_bootstrap_fetch_limits: Vec<u32>,
    pub sync_steady_fetch_limit: u32,
}

impl Default for DataLimits {
    fn default() -> Self {
        Self {
            max_topic_nodes: 30,
            min_posts_per_node: 30,
            max_posts_per_node: 100,
            visible_hub_posts: 30,
            background_fetch_limit: 100,
            background_stop_total_topic_posts: 500,
            sync_bootstrap_fetch_limits: vec![5, 10],
            sync_steady_fetch_limit: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    pub auto_load: bool,
    pub background: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10_000),
            auto_load: true,
            background: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl UiSize {
    pub const ALL: [UiSize; 3] = [UiSize::Small, UiSize::Medium, UiSize::Large];

    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn scale(self) -> f32 {
        match self {
            Self::Small => 0.9,
            Self::Medium => 1.0,
            Self::Large => 1.1,
        }
    }
}

impl std::str::FromStr for UiSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown ui size `{value}` (expected small, medium or large)"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UiSettings {
    pub size: UiSize,
    elasticity: f32,
}

impl UiSettings {
    pub const ELASTICITY_MIN: f32 = 0.2;
    pub const ELASTICITY_MAX: f32 = 0.5;

    pub fn new(size: UiSize, elasticity: f32) -> Self {
        let mut settings = Self {
            size,
            elasticity: 0.3,
        };
        settings.set_elasticity(elasticity);
        settings
    }

    pub fn elasticity(&self) -> f32 {
        self.elasticity
    }

    pub fn set_elasticity(&mut self, value: f32) {
        if value.is_finite() {
            self.elasticity = value.clamp(Self::ELASTICITY_MIN, Self::ELASTICITY_MAX);
        }
    }

    pub fn elasticity_label(&self) -> &'static str {
        if self.elasticity >= 0.4 {
            "soft"
        } else if self.elasticity <= 0.25 {
            "firm"
        } else {
            "medium"
        }
    }

    pub fn font(&self, value: f32) -> f32 {
        (value * self.size.scale()).round()
    }

    pub fn spacing(&self, value: f32) -> f32 {
        (value * self.size.scale()).round()
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self::new(UiSize::Medium, 0.3)
    }
}
