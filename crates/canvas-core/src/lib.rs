pub mod binding;
pub mod cuboid;
pub mod frame;
pub mod geometry;
pub mod id;
pub mod model;
pub mod mutate;
pub mod snapshot;
pub mod store;
pub mod text;

pub use binding::{BindingContext, BindingError, update_bound_elements};
pub use cuboid::{DualView, ViewKind};
pub use id::ElementId;
pub use model::*;
pub use mutate::{ChangeRecord, ElementUpdate, Scene};
pub use snapshot::{AppState, SceneSnapshot};
pub use store::ElementStore;

// Re-export kurbo so downstream crates agree on geometry types
pub use kurbo;
