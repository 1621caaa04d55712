pub mod record;

pub use record::{Counters, QueryResult, Record};
