/// Layout configuration for a gallery
///
/// This value object is owned by the session and stored next to the
/// item list. The catalog keeps it as JSON in the `settings` column and
/// restores it leniently: unknown fields are ignored, missing fields fall
/// back to their defaults and out-of-range values are clamped.
use serde::{Deserialize, Serialize};

/// Which arrangement the scene uses
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Sphere,
    Tile,
    Carousel,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Sphere, ViewMode::Tile, ViewMode::Carousel];
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ViewMode::Sphere => "Sphere",
            ViewMode::Tile => "Tile",
            ViewMode::Carousel => "Carousel",
        };
        f.write_str(name)
    }
}

/// Allowed ranges for the numeric settings
pub const MEDIA_SCALE_RANGE: (f32, f32) = (0.3, 3.0);
pub const SPHERE_BASE_RANGE: (f32, f32) = (24.0, 200.0);
pub const TILE_GAP_RANGE: (f32, f32) = (0.0, 80.0);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub view_mode: ViewMode,

    /// Card size multiplier
    /// - 1.0 = default card size
    pub media_scale: f32,

    /// Base sphere radius in world units, before density and scale factors
    pub sphere_base: f32,

    /// Gap between cards in tile mode, in world units
    pub tile_gap: f32,

    /// Background colour as `#rrggbb`
    pub bg_color: String,

    /// Opacity of the drop shadow under each card (0.0 to 1.0)
    pub shadow_opacity: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Sphere,
            media_scale: 1.0,
            sphere_base: 60.0,
            tile_gap: 16.0,
            bg_color: "#0b0b10".to_string(),
            shadow_opacity: 0.35,
        }
    }
}

impl LayoutConfig {
    /// Restore from the catalog's `settings` value, clamped into range
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<Self>(value).map(Self::sanitized)
    }

    /// Clamp numeric values into their ranges and repair a bad colour
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.media_scale = clamp_or(self.media_scale, MEDIA_SCALE_RANGE, defaults.media_scale);
        self.sphere_base = clamp_or(self.sphere_base, SPHERE_BASE_RANGE, defaults.sphere_base);
        self.tile_gap = clamp_or(self.tile_gap, TILE_GAP_RANGE, defaults.tile_gap);
        self.shadow_opacity = clamp_or(self.shadow_opacity, (0.0, 1.0), defaults.shadow_opacity);
        if parse_hex_color(&self.bg_color).is_none() {
            self.bg_color = defaults.bg_color;
        }
        self
    }

    /// Background colour as linear 0..1 RGB components
    pub fn bg_rgb(&self) -> [f32; 3] {
        let [r, g, b] = parse_hex_color(&self.bg_color).unwrap_or([11, 11, 16]);
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Parse `#rgb` or `#rrggbb`
pub fn parse_hex_color(text: &str) -> Option<[u8; 3]> {
    let hex = text.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 => Some([
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization() {
        let mut config = LayoutConfig::default();
        config.view_mode = ViewMode::Carousel;
        config.media_scale = 1.5;
        config.bg_color = "#ffffff".into();

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["viewMode"], "carousel");
        assert_eq!(value["mediaScale"], 1.5);

        let restored = LayoutConfig::from_value(value).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_partial_value_uses_defaults() {
        let restored = LayoutConfig::from_value(serde_json::json!({
            "viewMode": "tile",
            "sphereBase": 900.0,
            "unknown": 3
        }))
        .unwrap();
        assert_eq!(restored.view_mode, ViewMode::Tile);
        assert_eq!(restored.sphere_base, 200.0);
        assert_eq!(restored.tile_gap, 16.0);
    }

    #[test]
    fn test_sanitized_clamps() {
        let config = LayoutConfig {
            media_scale: 50.0,
            sphere_base: 1.0,
            tile_gap: f32::NAN,
            shadow_opacity: -1.0,
            bg_color: "blue".into(),
            ..LayoutConfig::default()
        }
        .sanitized();

        assert_eq!(config.media_scale, 3.0);
        assert_eq!(config.sphere_base, 24.0);
        assert_eq!(config.tile_gap, 16.0);
        assert_eq!(config.shadow_opacity, 0.0);
        assert_eq!(config.bg_color, "#0b0b10");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("ff8000"), None);
        assert_eq!(parse_hex_color("#ff80"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }
}
