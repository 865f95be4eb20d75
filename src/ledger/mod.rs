pub mod id_source;
pub mod models;
pub mod service;

pub use id_source::*;
pub use models::*;
pub use service::*;
