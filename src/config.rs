//! Showcase configuration.
//!
//! Every field has a default, so a partial (or missing) `showcase.json`
//! still yields a complete configuration.

use crate::engine::{Asset, AssetBundle, Point, Size};
use serde::Deserialize;

pub const CONFIG_PATH: &str = "showcase.json";

pub const DIALOGUE_ENDPOINT: &str =
    "https://private-624120-softgamesassignment.apiary-mock.com/magicwords";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    /// logical canvas every scene is laid out on
    pub design: Size,
    pub fit: FitPolicy,
    pub bundle: AssetBundle,
    pub cards: CardStackConfig,
    pub dialogue: DialogueConfig,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        ShowcaseConfig {
            design: Size {
                width: 1920.0,
                height: 1080.0,
            },
            fit: FitPolicy::default(),
            bundle: AssetBundle::default(),
            cards: CardStackConfig::default(),
            dialogue: DialogueConfig::default(),
        }
    }
}

/// How the design canvas is mapped into the viewport
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// whole canvas visible, never upscaled past 1:1
    #[default]
    Contain,
    /// fit the constrained axis, the other one may overflow
    Cover,
}

impl Default for AssetBundle {
    fn default() -> Self {
        let asset = |key: &str, path: &str| Asset {
            key: key.to_string(),
            path: path.to_string(),
        };
        AssetBundle {
            name: "main".to_string(),
            assets: vec![
                asset("card-back-black", "assets/card-back-black.png"),
                asset("card-back-red", "assets/card-back-red.png"),
                asset("fire", "assets/Fire.png"),
                asset("particle", "assets/particle.png"),
            ],
        }
    }
}

/// Ace of Shadows layout and timings, times in milliseconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CardStackConfig {
    pub count: usize,
    pub base: Point,
    /// vertical offset between neighbouring cards of the stack
    pub spacing: f64,
    pub deal_interval: f64,
    pub move_duration: f64,
    pub reset_delay: f64,
    /// every dealt card lands right of this x
    pub min_x: f64,
    pub x_spread: (f64, f64),
    pub y_jitter: f64,
    pub textures: (String, String),
}

impl Default for CardStackConfig {
    fn default() -> Self {
        CardStackConfig {
            count: 144,
            base: Point::new(630.0, 384.0),
            spacing: 1.5,
            deal_interval: 1000.0,
            move_duration: 2000.0,
            reset_delay: 1000.0,
            min_x: 1100.0,
            x_spread: (50.0, 250.0),
            y_jitter: 20.0,
            textures: ("card-back-black".to_string(), "card-back-red".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CharacterSlot {
    pub name: String,
    pub position: Point,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct ScalePunch {
    pub scale: f64,
    pub duration: f64,
}

/// Magic Words layout and timings, times in milliseconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub endpoint: String,
    /// only characters named here get a sprite, other speakers are skipped
    pub slots: Vec<CharacterSlot>,
    /// text display offset from its character
    pub text_offset: Point,
    pub font_size: f64,
    pub wrap_width: f64,
    pub fade_in: f64,
    pub speaker_fade: f64,
    pub type_interval: f64,
    pub pause_after_line: f64,
    pub line_gap: f64,
    pub skip_delay: f64,
    pub restart_delay: f64,
    /// scale the speaker up while typing, `None` keeps it at 1x
    pub scale_punch: Option<ScalePunch>,
    /// fade every character out before a restart, `None` restarts in place
    pub fade_out: Option<f64>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        let slot = |name: &str, x: f64, y: f64| CharacterSlot {
            name: name.to_string(),
            position: Point::new(x, y),
        };
        DialogueConfig {
            endpoint: DIALOGUE_ENDPOINT.to_string(),
            slots: vec![
                slot("Sheldon", 246.0, 534.0),
                slot("Penny", 856.0, 534.0),
                slot("Leonard", 586.0, 304.0),
            ],
            text_offset: Point::new(0.0, -100.0),
            font_size: 20.0,
            wrap_width: 400.0,
            fade_in: 1000.0,
            speaker_fade: 500.0,
            type_interval: 50.0,
            pause_after_line: 500.0,
            line_gap: 1000.0,
            skip_delay: 1000.0,
            restart_delay: 5000.0,
            scale_punch: Some(ScalePunch {
                scale: 1.5,
                duration: 300.0,
            }),
            fade_out: Some(1000.0),
        }
    }
}

impl DialogueConfig {
    pub fn slot(&self, name: &str) -> Option<Point> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ShowcaseConfig = serde_json::from_str("{}").expect("valid json");
        assert_eq!(config, ShowcaseConfig::default());
        assert_eq!(config.bundle.assets.len(), 4);
        assert_eq!(config.cards.count, 144);
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let config: ShowcaseConfig = serde_json::from_str(
            r#"{
                "fit": "cover",
                "dialogue": { "scale_punch": null, "fade_out": null, "type_interval": 30 }
            }"#,
        )
        .expect("valid json");

        assert_eq!(config.fit, FitPolicy::Cover);
        assert_eq!(config.dialogue.scale_punch, None);
        assert_eq!(config.dialogue.fade_out, None);
        assert_eq!(config.dialogue.type_interval, 30.0);
        assert_eq!(config.dialogue.restart_delay, 5000.0);
        assert_eq!(config.cards, CardStackConfig::default());
    }

    #[test]
    fn slots_resolve_known_names_only() {
        let dialogue = DialogueConfig::default();
        assert_eq!(dialogue.slot("Penny"), Some(Point::new(856.0, 534.0)));
        assert_eq!(dialogue.slot("Leonard"), Some(Point::new(586.0, 304.0)));
        assert_eq!(dialogue.slot("Howard"), None);
    }
}
