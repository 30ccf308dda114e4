//! Hash-consed quadtrees and the Hashlife stepping engine.

pub mod node;
pub mod step;
pub mod store;

pub use node::{Node, QuadId};
pub use step::Destiny;
pub use store::Store;
