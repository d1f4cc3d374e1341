use serde::{Deserialize, Serialize};

pub const VECTOR_MAP_PATH: &str = "/ukraine.svg";
/// Region descriptions and test questions, served next to the map.
pub const QUIZ_DATA_PATH: &str = "/regions.json";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Attribute carrying the region identifier on every map shape.
pub const REGION_ATTRIBUTE: &str = "name";

pub const DEFAULT_FILL: &str = "#6f9c76";
pub const HIGHLIGHT_FILL: &str = "#4a7c5a";
pub const HIGHLIGHT_FILTER: &str = "brightness(1.2)";

pub const TOOLTIP_GAP_PX: f64 = 15.0;
/// Tabs and padding above the map; a tooltip whose top edge lands above this flips below.
pub const MIN_VISIBLE_TOP_PX: f64 = 80.0;

pub const RESIZE_DEBOUNCE_MS: f64 = 100.0;

pub const RADIAL_RADIUS: f64 = 30.0;
pub const RADIAL_STEP_DEG: f64 = 60.0;

/// At or below this viewport width region labels stay visible without hovering.
pub const COMPACT_MAX_WIDTH_PX: f64 = 768.0;

pub const CARD_WIDTH: f64 = 250.0;
pub const CARD_HEIGHT: f64 = 90.0;
pub const CARD_SPACING_VERTICAL: f64 = 120.0;
pub const CARD_SPACING_HORIZONTAL: f64 = 270.0;
pub const CARD_OFFSET: f64 = 50.0;

/// Pins per region requested from the backend in one page.
pub const PINS_PAGE_LIMIT: u32 = 50;
/// Images attached to a single pin submission.
pub const MAX_PIN_IMAGES: usize = 5;

/// Tunables read by the interaction engine. Every field falls back to the
/// compiled-in constant when missing from a serialized config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub tooltip_gap_px: f64,
    pub min_visible_top_px: f64,
    pub resize_debounce_ms: f64,
    pub radial_radius: f64,
    pub compact_max_width_px: f64,
    pub card: CardLayoutConfig,
    pub highlight_fill: String,
    pub highlight_filter: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tooltip_gap_px: TOOLTIP_GAP_PX,
            min_visible_top_px: MIN_VISIBLE_TOP_PX,
            resize_debounce_ms: RESIZE_DEBOUNCE_MS,
            radial_radius: RADIAL_RADIUS,
            compact_max_width_px: COMPACT_MAX_WIDTH_PX,
            card: CardLayoutConfig::default(),
            highlight_fill: HIGHLIGHT_FILL.to_string(),
            highlight_filter: HIGHLIGHT_FILTER.to_string(),
        }
    }
}

impl MapConfig {
    /// Small screens get the always-on label presentation.
    pub fn is_compact(&self, viewport_width: f64) -> bool {
        viewport_width <= self.compact_max_width_px
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardLayoutConfig {
    pub width: f64,
    pub height: f64,
    pub spacing_vertical: f64,
    pub spacing_horizontal: f64,
    pub offset: f64,
}

impl Default for CardLayoutConfig {
    fn default() -> Self {
        Self {
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
            spacing_vertical: CARD_SPACING_VERTICAL,
            spacing_horizontal: CARD_SPACING_HORIZONTAL,
            offset: CARD_OFFSET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: MapConfig =
            serde_json::from_str(r#"{"min_visible_top_px": 120.0, "card": {"width": 300.0}}"#)
                .expect("config should parse");
        assert_eq!(cfg.min_visible_top_px, 120.0);
        assert_eq!(cfg.tooltip_gap_px, TOOLTIP_GAP_PX);
        assert_eq!(cfg.card.width, 300.0);
        assert_eq!(cfg.card.height, CARD_HEIGHT);
        assert_eq!(cfg.highlight_fill, HIGHLIGHT_FILL);
    }

    #[test]
    fn narrow_viewports_are_compact() {
        let cfg = MapConfig::default();
        assert!(cfg.is_compact(375.0));
        assert!(cfg.is_compact(COMPACT_MAX_WIDTH_PX));
        assert!(!cfg.is_compact(1280.0));

        let cfg: MapConfig = serde_json::from_str(r#"{"compact_max_width_px": 1024.0}"#)
            .expect("config should parse");
        assert!(cfg.is_compact(900.0));
    }
}
