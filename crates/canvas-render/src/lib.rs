pub mod cache;
pub mod hit;
pub mod shape;
pub mod sketch;

pub use cache::{CacheStats, ShapeCache};
pub use hit::{bindable_at, hit_test, hit_test_rect, is_drawn};
pub use shape::{Drawable, Paint, Shape, ShapeConfig, ShapeError, generate_shape, shape_transform};
