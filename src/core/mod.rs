pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{Node, NodeId, Params};
pub use value::Value;
