//! Editor configuration.
//!
//! Embedders pass a JSON blob; every field is optional and falls back to
//! the defaults below.

use canvas_render::ShapeConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid spacing for drag snapping; `None` disables the grid.
    pub grid_size: Option<f64>,
    /// Minimum vertical overlap, as a fraction of the smaller height, for
    /// an element to count as a row neighbour in insert mode.
    pub row_overlap_ratio: f64,
    pub elbow_corner_radius: f64,
    /// Gap kept between a bound arrow endpoint and its target.
    pub default_binding_gap: f64,
    pub undo_depth: usize,
    pub bound_text_padding: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: None,
            row_overlap_ratio: 0.25,
            elbow_corner_radius: 16.0,
            default_binding_gap: 5.0,
            undo_depth: 100,
            bound_text_padding: canvas_core::text::BOUND_TEXT_PADDING,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("invalid editor config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(g) = self.grid_size
            && !(g.is_finite() && g > 0.0)
        {
            return Err(format!("grid_size must be positive, got {g}"));
        }
        if !(self.row_overlap_ratio > 0.0 && self.row_overlap_ratio <= 1.0) {
            return Err(format!(
                "row_overlap_ratio must be in (0, 1], got {}",
                self.row_overlap_ratio
            ));
        }
        for (name, v) in [
            ("elbow_corner_radius", self.elbow_corner_radius),
            ("default_binding_gap", self.default_binding_gap),
            ("bound_text_padding", self.bound_text_padding),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(format!("{name} must be non-negative, got {v}"));
            }
        }
        if self.undo_depth == 0 {
            return Err("undo_depth must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn shape_config(&self) -> ShapeConfig {
        ShapeConfig {
            elbow_corner_radius: self.elbow_corner_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "grid_size": 20, "undo_depth": 5 }"#).unwrap();
        assert_eq!(
            config,
            EditorConfig {
                grid_size: Some(20.0),
                undo_depth: 5,
                ..EditorConfig::default()
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(EditorConfig::from_json(r#"{ "row_overlap_ratio": 0 }"#).is_err());
        assert!(EditorConfig::from_json(r#"{ "grid_size": -4 }"#).is_err());
        assert!(EditorConfig::from_json("not json").is_err());
    }
}
