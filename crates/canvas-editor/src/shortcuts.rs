//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s so every
//! embedder shares one keymap.
//!
//! - single letters pick tools
//! - Shift = constrain (square shapes, 15° lines), Alt = draw from center
//!   (pointer modifiers, handled by the tools)
//! - Alt+I toggles insert mode, Alt+V the dual view, Alt+A picks the elbow arrow
//! - Escape cancels a drag in progress before it deselects

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolRectangle,
    ToolDiamond,
    ToolEllipse,
    ToolArrow,
    ToolElbowArrow,
    ToolLine,
    ToolText,
    ToolFrame,
    ToolCuboid,
    ToolFreeDraw,
    /// Toggle between current and previous tool.
    ToggleLastTool,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    SelectAll,

    // ── Modes ──
    ToggleInsertMode,
    /// Switch every cuboid between top and elevation view.
    ToggleView,
    /// Hide the selection.
    ToggleVisibility,
    /// Unhide everything.
    ShowAll,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,

    // ── UI ──
    /// Cancel a drag in progress, otherwise clear the selection.
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "h" | "H" => Some(ShortcutAction::ToggleVisibility),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd && alt {
            return match key {
                "h" | "H" => Some(ShortcutAction::ShowAll),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        if alt {
            return match key {
                "i" | "I" => Some(ShortcutAction::ToggleInsertMode),
                "v" | "V" => Some(ShortcutAction::ToggleView),
                "a" | "A" => Some(ShortcutAction::ToolElbowArrow),
                _ => None,
            };
        }

        if shift {
            return None;
        }

        // ── Single keys (no modifiers) ──
        match key {
            "v" | "V" => Some(ShortcutAction::ToolSelect),
            "r" | "R" => Some(ShortcutAction::ToolRectangle),
            "d" | "D" => Some(ShortcutAction::ToolDiamond),
            "o" | "O" => Some(ShortcutAction::ToolEllipse),
            "a" | "A" => Some(ShortcutAction::ToolArrow),
            "l" | "L" => Some(ShortcutAction::ToolLine),
            "t" | "T" => Some(ShortcutAction::ToolText),
            "f" | "F" => Some(ShortcutAction::ToolFrame),
            "c" | "C" => Some(ShortcutAction::ToolCuboid),
            "p" | "P" => Some(ShortcutAction::ToolFreeDraw),
            "Tab" => Some(ShortcutAction::ToggleLastTool),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }

    /// [`resolve`](Self::resolve) with a [`Modifiers`] bundle.
    pub fn resolve_with(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        Self::resolve(key, modifiers.ctrl, modifiers.shift, modifiers.alt, modifiers.meta)
    }
}
