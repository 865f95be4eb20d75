pub mod engine;
pub mod format;
pub mod models;

pub use engine::*;
pub use format::*;
pub use models::*;
