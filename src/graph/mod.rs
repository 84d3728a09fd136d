//! Graph data model: the id space and the node/edge store

pub mod id_allocator;
pub mod store;

pub use id_allocator::IdAllocator;
pub use store::GraphStore;
