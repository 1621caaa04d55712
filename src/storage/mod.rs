pub mod graph;

pub use graph::{GraphStore, UniqueConstraint};
