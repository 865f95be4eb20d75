// Persistence
//
// Mirrors calculator state into a durable key-value store and rehydrates it
// at startup. Storage is a collaborator: the core hands over snapshots and
// never relies on the backend's transactional behaviour.

pub mod state;
pub mod store;

pub use state::*;
pub use store::*;
