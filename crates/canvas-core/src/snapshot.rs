//! Serializable scene snapshot handed to persistence and history.

use crate::cuboid::ViewKind;
use crate::id::ElementId;
use crate::model::{Color, Element};
use serde::{Deserialize, Serialize};

/// Scene-wide state that travels with the elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub view_background_color: Color,
    pub grid_size: Option<f64>,
    pub current_view: ViewKind,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view_background_color: Color::rgba(1.0, 1.0, 1.0, 1.0),
            grid_size: None,
            current_view: ViewKind::Top,
        }
    }
}

/// Every element back to front (tombstones included) plus the app state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub elements: Vec<Element>,
    pub app_state: AppState,
}

impl SceneSnapshot {
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn live_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_live())
    }

    /// Same scene content, ignoring version bookkeeping.
    pub fn same_content(&self, other: &SceneSnapshot) -> bool {
        self.app_state == other.app_state
            && self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| crate::mutate::same_content(a, b))
    }
}
