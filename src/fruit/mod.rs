pub mod model;
pub mod resource;

pub use model::{Fruit, NewFruit};
pub use resource::FruitResource;
