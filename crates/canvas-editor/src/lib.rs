pub mod config;
pub mod drag;
pub mod editor;
pub mod history;
pub mod input;
pub mod reflow;
pub mod shortcuts;
pub mod tools;

pub use config::EditorConfig;
pub use drag::{DragContext, DragEngine, DragPhase, NewElementDrag, drag_new_element};
pub use editor::Editor;
pub use history::{History, UndoStack};
pub use input::{InputEvent, Modifiers};
pub use reflow::{RowPlan, plan_row};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{SelectTool, Tool, ToolEffect, ToolKind};
